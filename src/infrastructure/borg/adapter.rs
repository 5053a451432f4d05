use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use crate::domain::value_objects::{EncryptionMode, Location};
use crate::infrastructure::process::CommandProcess;
use crate::ports::adapter::BackendAdapter;
use crate::ports::backing_store::BackingStoreRegistry;
use crate::ports::delegate::CommandDelegate;
use crate::ports::process::ProcessHandle;
use crate::shared::config::{BorgConfig, ProcessConfig};
use crate::shared::error::BorgxError;
use crate::shared::result::Result;

const PASSPHRASE_ENV: &str = "BORG_PASSPHRASE";

/// 基于 borg 命令行的备份引擎适配器
pub struct BorgAdapter {
    binary: PathBuf,
    extra_env: HashMap<String, String>,
    timeout: Option<Duration>,
    stores: Arc<dyn BackingStoreRegistry>,
}

impl BorgAdapter {
    pub fn new(
        borg: &BorgConfig,
        process: &ProcessConfig,
        stores: Arc<dyn BackingStoreRegistry>,
    ) -> Self {
        Self {
            binary: borg.binary.clone(),
            extra_env: borg.extra_env.clone(),
            timeout: process.timeout(),
            stores,
        }
    }

    fn repository_url(&self, location: &Location) -> Result<String> {
        let store = self
            .stores
            .resolve(location.backing_store_id())
            .ok_or_else(|| BorgxError::UnknownBackingStore(location.backing_store_id().to_string()))?;
        Ok(store.repository_url(location))
    }
}

impl BackendAdapter for BorgAdapter {
    fn supported_encryption_modes(&self) -> &[EncryptionMode] {
        &EncryptionMode::ALL
    }

    fn init_repository(
        &self,
        location: &Location,
        encryption_mode: EncryptionMode,
        password: &str,
        delegate: Box<dyn CommandDelegate>,
    ) -> Result<Box<dyn ProcessHandle>> {
        let url = self.repository_url(location)?;
        let command = vec![
            self.binary.display().to_string(),
            "init".to_string(),
            format!("--encryption={}", encryption_mode),
            url.clone(),
        ];
        let mut process = CommandProcess::new(command, delegate)
            .with_envs(&self.extra_env)
            .with_env(PASSPHRASE_ENV, password)
            .with_timeout(self.timeout);
        info!(
            "Initializing borg repository at {} ({}) as command {}",
            url,
            encryption_mode,
            process.id()
        );
        process.start();
        Ok(Box::new(process))
    }
}
