use std::sync::Arc;
use tracing::{info, warn};
use crate::domain::entities::Repository;
use crate::services::context::AppContext;
use crate::shared::result::Result;

/// 从配置中移除仓库（不删除备份数据）
pub struct RemoveRepositoryUseCase {
    ctx: Arc<AppContext>,
}

impl RemoveRepositoryUseCase {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    pub async fn execute(&self, name: &str) -> Result<Repository> {
        let removed = self.ctx.config.write().repositories.remove(name)?;

        if let Err(e) = self.ctx.persist().await {
            // 落盘失败时恢复内存状态，保持与存储一致
            warn!("Failed to persist removal of {}, restoring: {}", name, e);
            let restored = self.ctx.config.write().repositories.add(removed);
            if let Err(restore_err) = restored {
                warn!("Could not restore repository {}: {}", name, restore_err);
            }
            return Err(e);
        }

        if let Err(e) = self.ctx.passphrases.forget(name).await {
            warn!("Failed to forget passphrase for {}: {}", name, e);
        }

        info!("Repository {} removed from config", name);
        Ok(removed)
    }
}
