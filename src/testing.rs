//! 测试用的 delegate 与端口替身

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use crate::domain::config::Config;
use crate::domain::value_objects::{EncryptionMode, Location};
use crate::infrastructure::process::CommandProcess;
use crate::ports::adapter::BackendAdapter;
use crate::ports::config_store::ConfigStorePort;
use crate::ports::delegate::CommandDelegate;
use crate::ports::passphrase::PassphrasePort;
use crate::ports::process::{ProcessHandle, Termination};
use crate::services::context::AppContext;
use crate::shared::error::BorgxError;
use crate::shared::result::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Stdout(String),
    Stderr(String),
    Terminated(Termination),
}

/// 记录收到的所有事件
#[derive(Debug, Default)]
pub struct RecordingDelegate {
    events: Arc<Mutex<Vec<Event>>>,
    last_error: Option<String>,
}

impl RecordingDelegate {
    pub fn events(&self) -> Arc<Mutex<Vec<Event>>> {
        Arc::clone(&self.events)
    }

    pub fn with_last_error(mut self, message: &str) -> Self {
        self.last_error = Some(message.to_string());
        self
    }
}

#[async_trait]
impl CommandDelegate for RecordingDelegate {
    async fn on_stdout_line(&mut self, line: &str) {
        self.events.lock().push(Event::Stdout(line.to_string()));
    }

    async fn on_stderr_line(&mut self, line: &str) {
        self.events.lock().push(Event::Stderr(line.to_string()));
    }

    async fn on_terminated(&mut self, termination: &Termination) {
        self.events.lock().push(Event::Terminated(termination.clone()));
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }
}

#[derive(Debug, Clone)]
pub struct InitCall {
    pub location: Location,
    pub encryption_mode: EncryptionMode,
    pub password: String,
}

/// 以真实进程运行固定命令的后端替身
pub struct FakeAdapter {
    command: Vec<String>,
    modes: Vec<EncryptionMode>,
    calls: Arc<Mutex<Vec<InitCall>>>,
}

impl FakeAdapter {
    pub fn with_command(command: Vec<String>) -> Self {
        Self {
            command,
            modes: EncryptionMode::ALL.to_vec(),
            calls: Arc::default(),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_command(vec!["true".into()])
    }

    pub fn failing() -> Self {
        Self::with_command(vec![
            "sh".into(),
            "-c".into(),
            "echo 'A repository already exists' >&2; exit 2".into(),
        ])
    }

    pub fn with_modes(mut self, modes: Vec<EncryptionMode>) -> Self {
        self.modes = modes;
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<InitCall>>> {
        Arc::clone(&self.calls)
    }
}

impl BackendAdapter for FakeAdapter {
    fn supported_encryption_modes(&self) -> &[EncryptionMode] {
        &self.modes
    }

    fn init_repository(
        &self,
        location: &Location,
        encryption_mode: EncryptionMode,
        password: &str,
        delegate: Box<dyn CommandDelegate>,
    ) -> Result<Box<dyn ProcessHandle>> {
        self.calls.lock().push(InitCall {
            location: location.clone(),
            encryption_mode,
            password: password.to_string(),
        });
        let mut process = CommandProcess::new(self.command.clone(), delegate);
        process.start();
        Ok(Box::new(process))
    }
}

/// 记录口令写入的缓存替身
#[derive(Debug, Default)]
pub struct RecordingPassphrases {
    entries: Mutex<Vec<(String, String)>>,
}

impl RecordingPassphrases {
    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl PassphrasePort for RecordingPassphrases {
    async fn set(&self, repository_name: &str, password: &str) -> Result<()> {
        self.entries
            .lock()
            .push((repository_name.to_string(), password.to_string()));
        Ok(())
    }

    async fn get(&self, repository_name: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .iter()
            .rev()
            .find(|(name, _)| name == repository_name)
            .map(|(_, password)| password.clone()))
    }

    async fn forget(&self, repository_name: &str) -> Result<()> {
        self.entries.lock().retain(|(name, _)| name != repository_name);
        Ok(())
    }
}

/// 内存中的配置存储，可模拟写入失败
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    initial: Config,
    saved: Mutex<Vec<Config>>,
    fail_writes: bool,
}

impl MemoryConfigStore {
    pub fn with_config(initial: Config) -> Self {
        Self {
            initial,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Vec<Config> {
        self.saved.lock().clone()
    }
}

#[async_trait]
impl ConfigStorePort for MemoryConfigStore {
    async fn load(&self) -> Result<Config> {
        Ok(self
            .saved
            .lock()
            .last()
            .cloned()
            .unwrap_or_else(|| self.initial.clone()))
    }

    async fn save(&self, config: &Config) -> Result<()> {
        if self.fail_writes {
            return Err(BorgxError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "config store is read-only",
            )));
        }
        self.saved.lock().push(config.clone());
        Ok(())
    }
}

pub fn test_context_with(
    adapter: FakeAdapter,
    store: MemoryConfigStore,
) -> (Arc<AppContext>, Arc<MemoryConfigStore>, Arc<RecordingPassphrases>) {
    let store = Arc::new(store);
    let passphrases = Arc::new(RecordingPassphrases::default());
    let ctx = AppContext::new(
        Config::new(),
        store.clone(),
        passphrases.clone(),
        Arc::new(adapter),
    );
    (Arc::new(ctx), store, passphrases)
}

pub fn test_context(
    adapter: FakeAdapter,
) -> (Arc<AppContext>, Arc<MemoryConfigStore>, Arc<RecordingPassphrases>) {
    test_context_with(adapter, MemoryConfigStore::default())
}
