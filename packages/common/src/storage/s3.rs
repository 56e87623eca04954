use std::time::Duration;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};

use super::error::StorageError;
use super::traits::ObjectStore;

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct S3Options {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, R2, ...).
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
    /// Base URL under which uploaded objects are publicly served.
    pub public_base_url: String,
}

/// S3-backed [`ObjectStore`].
pub struct S3Store {
    bucket: Box<Bucket>,
    public_base_url: String,
}

impl S3Store {
    pub fn new(options: &S3Options) -> Result<Self, StorageError> {
        let region = match &options.endpoint {
            Some(endpoint) => Region::Custom {
                region: options.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => options
                .region
                .parse()
                .map_err(|e| StorageError::Config(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            Some(&options.access_key),
            Some(&options.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Config(format!("invalid credentials: {e}")))?;

        let bucket = Bucket::new(&options.bucket, region, credentials)
            .map_err(|e| StorageError::Config(format!("invalid bucket: {e}")))?
            .with_path_style();

        Ok(Self {
            bucket,
            public_base_url: options.public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn presign_put(
        &self,
        key: &str,
        _content_type: &str,
        expiry: Duration,
    ) -> Result<String, StorageError> {
        self.bucket
            .presign_put(key, expiry.as_secs() as u32, None, None)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&format!("{}/", self.public_base_url))
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.bucket
            .delete_object(key)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }
}
