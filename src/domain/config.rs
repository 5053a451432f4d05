use serde_json::{json, Value};
use crate::domain::repository_set::RepositorySet;
use crate::ports::backing_store::BackingStoreRegistry;
use crate::shared::error::BorgxError;
use crate::shared::result::Result;

/// 持久化的根聚合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub repositories: RepositorySet,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dump(&self) -> Result<Value> {
        Ok(json!({ "repositories": self.repositories.dump()? }))
    }

    /// 缺少 `repositories` 键时返回 `CorruptedConfig`，由调用方决定是否从空配置开始
    pub fn load(obj: &Value, stores: &dyn BackingStoreRegistry) -> Result<Self> {
        let map = obj
            .as_object()
            .ok_or_else(|| BorgxError::CorruptedConfig("root is not a mapping".to_string()))?;
        let repositories = map
            .get("repositories")
            .ok_or_else(|| BorgxError::CorruptedConfig("missing 'repositories' key".to_string()))?;

        Ok(Self {
            repositories: RepositorySet::load(repositories, stores)?,
        })
    }
}
