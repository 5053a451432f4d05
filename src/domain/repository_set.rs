use serde_json::{Map, Value};
use std::collections::HashMap;
use crate::domain::entities::Repository;
use crate::ports::backing_store::BackingStoreRegistry;
use crate::shared::error::BorgxError;
use crate::shared::result::Result;

/// 按名称唯一的仓库集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositorySet {
    repositories: HashMap<String, Repository>,
}

impl RepositorySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入仓库，名称已存在时失败
    pub fn add(&mut self, repo: Repository) -> Result<()> {
        if self.repositories.contains_key(repo.name()) {
            return Err(BorgxError::NameTaken(repo.name().to_string()));
        }
        self.repositories.insert(repo.name().to_string(), repo);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Repository> {
        self.repositories
            .remove(name)
            .ok_or_else(|| BorgxError::RepositoryNotFound(name.to_string()))
    }

    /// 与 `remove` 相同，但名称不存在时不报错
    pub fn discard(&mut self, name: &str) -> Option<Repository> {
        self.repositories.remove(name)
    }

    pub fn get(&self, name: &str) -> Result<&Repository> {
        self.repositories
            .get(name)
            .ok_or_else(|| BorgxError::RepositoryNotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Repository> {
        self.repositories
            .get_mut(name)
            .ok_or_else(|| BorgxError::RepositoryNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.repositories.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Repository> {
        self.repositories.values()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    pub fn dump(&self) -> Result<Value> {
        let mut map = Map::new();
        for repo in self.repositories.values() {
            map.insert(repo.name().to_string(), repo.dump()?);
        }
        Ok(Value::Object(map))
    }

    /// 从持久化形态重建集合，逐条经 `add` 插入以重新校验唯一性
    pub fn load(obj: &Value, stores: &dyn BackingStoreRegistry) -> Result<Self> {
        let entries = obj
            .as_object()
            .ok_or_else(|| BorgxError::InvalidType("repositories is not a mapping".to_string()))?;

        let mut set = Self::new();
        for (name, entry) in entries {
            set.add(Repository::load(name, entry, stores)?)?;
        }
        Ok(set)
    }
}

impl<'a> IntoIterator for &'a RepositorySet {
    type Item = &'a Repository;
    type IntoIter = std::collections::hash_map::Values<'a, String, Repository>;

    fn into_iter(self) -> Self::IntoIter {
        self.repositories.values()
    }
}
