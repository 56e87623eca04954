use std::time::Duration;

use async_trait::async_trait;

use super::error::StorageError;

/// Object storage used for user media.
///
/// Clients upload directly against presigned URLs; the API only ever
/// issues URLs and deletes objects it previously issued keys for.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Presigned PUT URL for a direct client upload of `key`.
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expiry: Duration,
    ) -> Result<String, StorageError>;

    /// Publicly readable URL for a stored object.
    fn public_url(&self, key: &str) -> String;

    /// Recover the object key from a public URL issued by this store.
    /// Returns `None` for URLs that do not belong to this store.
    fn key_for_url(&self, url: &str) -> Option<String>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
