mod error;
mod memory;
mod s3;
mod traits;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use s3::{S3Options, S3Store};
pub use traits::ObjectStore;
