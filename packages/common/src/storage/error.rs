use std::fmt;

/// Errors that can occur talking to the object store.
#[derive(Debug)]
pub enum StorageError {
    /// The store rejected the configuration (bad region, credentials, ...).
    Config(String),
    /// A backend request failed.
    Backend(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "object store configuration error: {msg}"),
            Self::Backend(msg) => write!(f, "object store error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}
