use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::error::StorageError;
use super::traits::ObjectStore;

/// In-process [`ObjectStore`] for tests.
///
/// Issues fake URLs and records the keys deleted against it so test
/// assertions can observe cleanup behavior.
#[derive(Default)]
pub struct MemoryStore {
    base_url: String,
    deleted: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            deleted: Mutex::new(Vec::new()),
        }
    }

    /// Keys deleted so far, in call order.
    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn presign_put(
        &self,
        key: &str,
        _content_type: &str,
        _expiry: Duration,
    ) -> Result<String, StorageError> {
        Ok(format!("{}/upload/{key}?signature=test", self.base_url))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url)
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&format!("{}/", self.base_url))
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.deleted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(key.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn url_roundtrip() {
        let store = MemoryStore::new("https://media.test");
        let url = store.public_url("posts/abc.png");
        assert_eq!(url, "https://media.test/posts/abc.png");
        assert_eq!(store.key_for_url(&url), Some("posts/abc.png".to_string()));
        assert_eq!(store.key_for_url("https://elsewhere.test/x.png"), None);
    }

    #[tokio::test]
    async fn delete_is_recorded() {
        let store = MemoryStore::new("https://media.test");
        store.delete("posts/abc.png").await.unwrap();
        assert_eq!(store.deleted_keys(), vec!["posts/abc.png".to_string()]);
    }
}
