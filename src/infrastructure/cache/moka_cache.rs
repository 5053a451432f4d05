use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;
use crate::ports::passphrase::PassphrasePort;
use crate::shared::result::Result;

/// Moka 内存口令缓存，按仓库名称存放，过期后需重新输入
pub struct MokaPassphraseCache {
    cache: Cache<String, String>,
}

impl MokaPassphraseCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }
}

#[async_trait]
impl PassphrasePort for MokaPassphraseCache {
    async fn set(&self, repository_name: &str, password: &str) -> Result<()> {
        self.cache
            .insert(repository_name.to_string(), password.to_string())
            .await;
        Ok(())
    }

    async fn get(&self, repository_name: &str) -> Result<Option<String>> {
        Ok(self.cache.get(repository_name).await)
    }

    async fn forget(&self, repository_name: &str) -> Result<()> {
        self.cache.invalidate(repository_name).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_forget() {
        let cache = MokaPassphraseCache::new(16, Duration::from_secs(60));
        assert_eq!(cache.get("home").await.unwrap(), None);

        cache.set("home", "s3cret").await.unwrap();
        assert_eq!(cache.get("home").await.unwrap().as_deref(), Some("s3cret"));

        cache.set("home", "rotated").await.unwrap();
        assert_eq!(cache.get("home").await.unwrap().as_deref(), Some("rotated"));

        cache.forget("home").await.unwrap();
        assert_eq!(cache.get("home").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = MokaPassphraseCache::new(16, Duration::from_millis(50));
        cache.set("home", "s3cret").await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(cache.get("home").await.unwrap(), None);
    }
}
