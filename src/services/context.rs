use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use crate::domain::config::Config;
use crate::ports::adapter::BackendAdapter;
use crate::ports::config_store::ConfigStorePort;
use crate::ports::passphrase::PassphrasePort;
use crate::shared::error::BorgxError;
use crate::shared::result::Result;

/// 用例共享的依赖
///
/// `config` 的修改只发生在内存中；落盘统一经 `persist`，
/// 在同一把锁内取快照并写入，保证后完成的写入总是包含先前的修改。
pub struct AppContext {
    pub config: RwLock<Config>,
    pub config_store: Arc<dyn ConfigStorePort>,
    pub passphrases: Arc<dyn PassphrasePort>,
    pub adapter: Arc<dyn BackendAdapter>,
    persist_lock: Mutex<()>,
    /// 正在初始化、尚未登记的仓库名称
    pending: parking_lot::Mutex<HashSet<String>>,
}

impl AppContext {
    pub fn new(
        config: Config,
        config_store: Arc<dyn ConfigStorePort>,
        passphrases: Arc<dyn PassphrasePort>,
        adapter: Arc<dyn BackendAdapter>,
    ) -> Self {
        Self {
            config: RwLock::new(config),
            config_store,
            passphrases,
            adapter,
            persist_lock: Mutex::new(()),
            pending: parking_lot::Mutex::new(HashSet::new()),
        }
    }

    /// 从存储加载配置并构建上下文
    pub async fn load(
        config_store: Arc<dyn ConfigStorePort>,
        passphrases: Arc<dyn PassphrasePort>,
        adapter: Arc<dyn BackendAdapter>,
    ) -> Result<Self> {
        let config = config_store.load().await?;
        Ok(Self::new(config, config_store, passphrases, adapter))
    }

    /// 将当前内存中的配置写入存储
    pub async fn persist(&self) -> Result<()> {
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.config.read().clone();
        self.config_store.save(&snapshot).await
    }

    /// 预留仓库名称，直到返回的 `NameReservation` 被丢弃
    ///
    /// 名称已登记或正被另一次初始化占用时返回 `NameTaken`。
    pub fn reserve_name(self: &Arc<Self>, name: &str) -> Result<NameReservation> {
        let mut pending = self.pending.lock();
        if pending.contains(name) || self.config.read().repositories.contains(name) {
            return Err(BorgxError::NameTaken(name.to_string()));
        }
        pending.insert(name.to_string());
        Ok(NameReservation {
            ctx: Arc::clone(self),
            name: name.to_string(),
        })
    }
}

/// 名称预留，丢弃时释放
pub struct NameReservation {
    ctx: Arc<AppContext>,
    name: String,
}

impl NameReservation {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for NameReservation {
    fn drop(&mut self) {
        self.ctx.pending.lock().remove(&self.name);
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("repositories", &self.config.read().repositories.len())
            .field("pending", &self.pending.lock().len())
            .finish()
    }
}
