use async_trait::async_trait;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info};
use crate::domain::entities::Repository;
use crate::domain::value_objects::{EncryptionMode, Location};
use crate::ports::delegate::{CommandDelegate, NoopDelegate};
use crate::ports::process::{ProcessHandle, Termination};
use crate::services::context::{AppContext, NameReservation};
use crate::services::wrapper::{TerminationAction, WrapperDelegate};
use crate::shared::error::BorgxError;
use crate::shared::result::Result;

/// 初始化成功并写入配置后，以新仓库调用
pub type CompletionCallback = Box<dyn FnOnce(&Repository) + Send>;

/// 初始化请求
#[derive(Debug, Clone)]
pub struct InitRepositoryRequest {
    pub name: String,
    pub location: Location,
    pub encryption_mode: String,
    pub password: String,
}

/// 创建仓库的唯一入口
///
/// 名称与加密模式的校验在启动进程前同步完成并直接返回错误；
/// 进程启动失败或非零退出只经 delegate 的终止回调报告。
pub struct InitRepositoryUseCase {
    ctx: Arc<AppContext>,
}

impl InitRepositoryUseCase {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// 校验并启动初始化，立即返回进程句柄
    pub fn execute(
        &self,
        request: InitRepositoryRequest,
        delegate: Option<Box<dyn CommandDelegate>>,
        on_complete: Option<CompletionCallback>,
    ) -> Result<Box<dyn ProcessHandle>> {
        let reservation = self.validate_name(&request.name)?;
        let encryption_mode = self.resolve_encryption_mode(&request.encryption_mode)?;
        if encryption_mode.requires_passphrase() && request.password.is_empty() {
            return Err(BorgxError::PassphraseRequired(encryption_mode.to_string()));
        }

        let repository = Repository::new(
            request.name.clone(),
            request.location.clone(),
            encryption_mode,
        );
        let action = RegisterRepository {
            ctx: Arc::clone(&self.ctx),
            repository: Some(repository),
            password: request.password.clone(),
            on_complete,
            _reservation: reservation,
        };
        let inner = delegate.unwrap_or_else(|| Box::new(NoopDelegate));
        let wrapped = WrapperDelegate::new(inner, Box::new(action));

        info!(
            "Initializing repository {} at {} ({})",
            request.name, request.location, encryption_mode
        );
        self.ctx.adapter.init_repository(
            &request.location,
            encryption_mode,
            &request.password,
            Box::new(wrapped),
        )
    }

    /// 名称在进程结束前保持预留，并发的同名请求会得到 `NameTaken`
    fn validate_name(&self, name: &str) -> Result<NameReservation> {
        if name.trim().is_empty() {
            return Err(BorgxError::NameEmpty);
        }
        self.ctx.reserve_name(name)
    }

    fn resolve_encryption_mode(&self, requested: &str) -> Result<EncryptionMode> {
        let mode: EncryptionMode = requested.parse()?;
        if !self.ctx.adapter.supported_encryption_modes().contains(&mode) {
            return Err(BorgxError::UnsupportedEncryption(requested.to_string()));
        }
        Ok(mode)
    }
}

/// 成功时登记仓库、落盘、缓存口令，最后调用完成回调
struct RegisterRepository {
    ctx: Arc<AppContext>,
    repository: Option<Repository>,
    password: String,
    on_complete: Option<CompletionCallback>,
    /// 随 delegate 一起丢弃，届时仓库已登记或初始化已失败
    _reservation: NameReservation,
}

#[async_trait]
impl TerminationAction for RegisterRepository {
    async fn on_success(&mut self) {
        let Some(repository) = self.repository.take() else {
            return;
        };
        let name = repository.name().to_string();

        let added = self.ctx.config.write().repositories.add(repository.clone());
        if let Err(e) = added {
            error!("Repository {} initialized but could not be registered: {}", name, e);
            return;
        }

        match self.ctx.persist().await {
            Ok(()) => info!("Repository {} added to config", name),
            Err(e) => error!("Failed to persist config after initializing {}: {}", name, e),
        }

        if let Err(e) = self.ctx.passphrases.set(&name, &self.password).await {
            error!("Failed to cache passphrase for {}: {}", name, e);
        }

        if let Some(callback) = self.on_complete.take() {
            if catch_unwind(AssertUnwindSafe(|| callback(&repository))).is_err() {
                error!("Completion callback for repository {} panicked", name);
            }
        }
    }

    async fn on_failure(&mut self, termination: &Termination, last_error: Option<String>) {
        let name = self
            .repository
            .as_ref()
            .map(|r| r.name().to_string())
            .unwrap_or_default();
        error!(
            "Failed to initialize repository {}: {} ({})",
            name,
            termination,
            last_error.as_deref().unwrap_or("no error output")
        );
    }
}
