use async_trait::async_trait;
use crate::domain::config::Config;
use crate::shared::result::Result;

/// 仓库配置的持久化接口
#[async_trait]
pub trait ConfigStorePort: Send + Sync {
    /// 读取配置；尚未保存过时返回空配置
    async fn load(&self) -> Result<Config>;

    async fn save(&self, config: &Config) -> Result<()>;
}
