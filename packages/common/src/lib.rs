pub mod cache;
pub mod retry;
pub mod storage;

pub use cache::{CacheError, InMemoryCache, KeyValueCache, RedisCache};
pub use storage::{MemoryStore, ObjectStore, S3Store, StorageError};
