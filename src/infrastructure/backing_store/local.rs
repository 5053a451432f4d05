use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use crate::domain::value_objects::Location;
use crate::ports::backing_store::{BackingStore, BackingStoreRegistry};
use crate::shared::config::BackingStoreConfig;

/// 本地目录存储后端，仓库路径相对于 `root`
#[derive(Debug, Clone)]
pub struct LocalBackingStore {
    id: String,
    root: PathBuf,
}

impl LocalBackingStore {
    pub fn new(id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            root: root.into(),
        }
    }
}

impl BackingStore for LocalBackingStore {
    fn id(&self) -> &str {
        &self.id
    }

    fn repository_url(&self, location: &Location) -> String {
        self.root.join(location.path()).display().to_string()
    }
}

/// 启动时根据设置构建的固定存储后端表
#[derive(Default)]
pub struct StaticBackingStores {
    stores: HashMap<String, Arc<dyn BackingStore>>,
}

impl StaticBackingStores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(configs: &[BackingStoreConfig]) -> Self {
        let mut registry = Self::new();
        for config in configs {
            registry.register(Arc::new(LocalBackingStore::new(&config.id, &config.root)));
        }
        registry
    }

    pub fn register(&mut self, store: Arc<dyn BackingStore>) {
        if self.stores.insert(store.id().to_string(), store).is_some() {
            tracing::warn!("Backing store registered twice, keeping the latest");
        }
    }

    #[cfg(test)]
    pub fn with_ids(ids: &[&str]) -> Self {
        let mut registry = Self::new();
        for id in ids {
            registry.register(Arc::new(LocalBackingStore::new(*id, "/srv/backup")));
        }
        registry
    }
}

impl BackingStoreRegistry for StaticBackingStores {
    fn resolve(&self, id: &str) -> Option<Arc<dyn BackingStore>> {
        self.stores.get(id).cloned()
    }

    fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.stores.keys().cloned().collect();
        ids.sort();
        ids
    }
}
