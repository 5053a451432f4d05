use crate::domain::value_objects::{EncryptionMode, Location};
use crate::ports::delegate::CommandDelegate;
use crate::ports::process::ProcessHandle;
use crate::shared::result::Result;

/// 备份引擎适配器
pub trait BackendAdapter: Send + Sync {
    fn supported_encryption_modes(&self) -> &[EncryptionMode];

    /// 启动初始化进程并立即返回句柄
    ///
    /// 只有在进程启动前即可发现的问题（如未知存储后端）才以 `Err` 返回；
    /// 启动失败与非零退出都通过 `delegate.on_terminated` 报告。
    fn init_repository(
        &self,
        location: &Location,
        encryption_mode: EncryptionMode,
        password: &str,
        delegate: Box<dyn CommandDelegate>,
    ) -> Result<Box<dyn ProcessHandle>>;
}
