use async_trait::async_trait;
use crate::shared::result::Result;

/// 仓库口令缓存接口
#[async_trait]
pub trait PassphrasePort: Send + Sync {
    async fn set(&self, repository_name: &str, password: &str) -> Result<()>;

    async fn get(&self, repository_name: &str) -> Result<Option<String>>;

    async fn forget(&self, repository_name: &str) -> Result<()>;
}
