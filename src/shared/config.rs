use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::shared::result::Result;

/// 应用设置（区别于持久化的仓库配置 `domain::config::Config`）
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub borg: BorgConfig,
    pub process: ProcessConfig,
    pub passphrase: PassphraseConfig,
    pub backing_stores: Vec<BackingStoreConfig>,
    pub log: LogConfig,
}

/// 仓库配置文件的存放位置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub config_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("borgx.json"),
        }
    }
}

/// Borg 可执行文件配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BorgConfig {
    pub binary: PathBuf,
    pub extra_env: HashMap<String, String>,
}

impl Default for BorgConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("borg"),
            extra_env: HashMap::new(),
        }
    }
}

/// 外部进程配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// 未设置时不限时
    pub timeout_secs: Option<u64>,
}

impl ProcessConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// 口令缓存配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PassphraseConfig {
    pub max_capacity: u64,
    pub ttl_secs: u64,
}

impl Default for PassphraseConfig {
    fn default() -> Self {
        Self {
            max_capacity: 256,
            ttl_secs: 3600,
        }
    }
}

/// 存储后端配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackingStoreConfig {
    pub id: String,
    pub root: PathBuf,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// 从命令行参数和文件加载配置
    pub fn from_args_and_file(
        settings_path: &Path,
        config_path: Option<PathBuf>,
        borg_binary: Option<PathBuf>,
    ) -> Result<Self> {
        let mut config = if settings_path.exists() {
            Self::from_file(settings_path)?
        } else {
            tracing::debug!(
                "Settings file {} not found, using defaults",
                settings_path.display()
            );
            AppConfig::default()
        };

        // 命令行参数覆盖配置文件
        if let Some(path) = config_path {
            config.store.config_path = path;
        }
        if let Some(binary) = borg_binary {
            config.borg.binary = binary;
        }

        if config.backing_stores.is_empty() {
            config.backing_stores.push(BackingStoreConfig {
                id: "local".to_string(),
                root: PathBuf::from("."),
            });
        }

        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::shared::error::BorgxError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [process]
            timeout_secs = 30

            [[backing_stores]]
            id = "nas"
            root = "/mnt/nas"
            "#,
        )
        .unwrap();

        assert_eq!(config.process.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.borg.binary, PathBuf::from("borg"));
        assert_eq!(config.backing_stores.len(), 1);
        assert_eq!(config.backing_stores[0].id, "nas");
    }

    #[test]
    fn test_args_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("borgx.toml");
        let mut config = AppConfig::default();
        config.borg.binary = PathBuf::from("/usr/bin/borg");
        config.save_to_file(&settings).unwrap();

        let loaded = AppConfig::from_args_and_file(
            &settings,
            Some(dir.path().join("repos.json")),
            None,
        )
        .unwrap();

        assert_eq!(loaded.borg.binary, PathBuf::from("/usr/bin/borg"));
        assert_eq!(loaded.store.config_path, dir.path().join("repos.json"));
        assert_eq!(loaded.backing_stores[0].id, "local");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded =
            AppConfig::from_args_and_file(&dir.path().join("absent.toml"), None, None).unwrap();
        assert_eq!(loaded.store.config_path, PathBuf::from("borgx.json"));
        assert!(loaded.process.timeout().is_none());
    }
}
