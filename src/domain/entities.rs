use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use crate::domain::value_objects::{EncryptionMode, Location};
use crate::ports::backing_store::BackingStoreRegistry;
use crate::shared::error::BorgxError;
use crate::shared::result::Result;

/// 备份任务
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    pub sources: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(name: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            name: name.into(),
            sources,
            excludes: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }
}

/// 仓库实体
///
/// 除 `jobs` 外创建后不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    name: String,
    location: Location,
    encryption_mode: EncryptionMode,
    jobs: BTreeMap<String, Job>,
}

/// 持久化形态，名称作为外层 map 的键
#[derive(Debug, Serialize, Deserialize)]
struct RepositoryRecord {
    location: Location,
    encryption_mode: String,
    #[serde(default)]
    jobs: BTreeMap<String, Job>,
}

impl Repository {
    pub fn new(name: impl Into<String>, location: Location, encryption_mode: EncryptionMode) -> Self {
        Self {
            name: name.into(),
            location,
            encryption_mode,
            jobs: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn encryption_mode(&self) -> EncryptionMode {
        self.encryption_mode
    }

    pub fn jobs(&self) -> &BTreeMap<String, Job> {
        &self.jobs
    }

    /// 添加任务，同名任务已存在时返回 false
    pub fn add_job(&mut self, job: Job) -> bool {
        if self.jobs.contains_key(&job.name) {
            return false;
        }
        self.jobs.insert(job.name.clone(), job);
        true
    }

    pub fn remove_job(&mut self, name: &str) -> Option<Job> {
        self.jobs.remove(name)
    }

    pub fn dump(&self) -> Result<Value> {
        let record = RepositoryRecord {
            location: self.location.clone(),
            encryption_mode: self.encryption_mode.to_string(),
            jobs: self.jobs.clone(),
        };
        Ok(serde_json::to_value(record)?)
    }

    /// 从持久化形态重建仓库，加密模式与存储后端均需可解析
    pub fn load(name: &str, obj: &Value, stores: &dyn BackingStoreRegistry) -> Result<Self> {
        if !obj.is_object() {
            return Err(BorgxError::InvalidType(format!(
                "repository '{}' is not a mapping",
                name
            )));
        }
        let record: RepositoryRecord = serde_json::from_value(obj.clone())?;
        let encryption_mode: EncryptionMode = record.encryption_mode.parse()?;

        if stores.resolve(record.location.backing_store_id()).is_none() {
            return Err(BorgxError::UnknownBackingStore(
                record.location.backing_store_id().to_string(),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            location: record.location,
            encryption_mode,
            jobs: record.jobs,
        })
    }
}
