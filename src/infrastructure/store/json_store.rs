use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::debug;
use crate::domain::config::Config;
use crate::ports::backing_store::BackingStoreRegistry;
use crate::ports::config_store::ConfigStorePort;
use crate::shared::result::Result;

/// 以 JSON 文件保存仓库配置
pub struct JsonConfigStore {
    path: PathBuf,
    stores: Arc<dyn BackingStoreRegistry>,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>, stores: Arc<dyn BackingStoreRegistry>) -> Self {
        Self {
            path: path.into(),
            stores,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ConfigStorePort for JsonConfigStore {
    async fn load(&self) -> Result<Config> {
        if !fs::try_exists(&self.path).await? {
            debug!("Config file {} not found, starting empty", self.path.display());
            return Ok(Config::new());
        }
        let content = fs::read_to_string(&self.path).await?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        Config::load(&value, self.stores.as_ref())
    }

    async fn save(&self, config: &Config) -> Result<()> {
        // 确保父目录存在
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(&config.dump()?)?;
        let temp = self.temp_path();
        fs::write(&temp, content).await?;
        fs::rename(&temp, &self.path).await?;

        debug!("Config saved to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Repository;
    use crate::domain::value_objects::{EncryptionMode, Location};
    use crate::infrastructure::backing_store::StaticBackingStores;
    use crate::shared::error::BorgxError;

    fn store(path: PathBuf) -> JsonConfigStore {
        JsonConfigStore::new(path, Arc::new(StaticBackingStores::with_ids(&["local"])))
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path().join("borgx.json"));
        assert_eq!(store.load().await.unwrap(), Config::new());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path().join("nested").join("borgx.json"));

        let mut config = Config::new();
        config
            .repositories
            .add(Repository::new("home", Location::new("local", "home"), EncryptionMode::Repokey))
            .unwrap();
        store.save(&config).await.unwrap();

        assert!(!store.temp_path().exists());
        assert_eq!(store.load().await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_missing_repositories_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("borgx.json");
        std::fs::write(&path, r#"{"repos": {}}"#).unwrap();

        let err = store(path).load().await.unwrap_err();
        assert!(matches!(err, BorgxError::CorruptedConfig(_)));
    }

    #[tokio::test]
    async fn test_invalid_json_is_not_corrupted_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("borgx.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = store(path).load().await.unwrap_err();
        assert!(matches!(err, BorgxError::Json(_)));
    }
}
