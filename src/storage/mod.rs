pub mod http;
pub mod keys;
pub mod local;
pub mod memory;

use async_trait::async_trait;
use std::fmt;

pub use http::HttpObjectStore;
pub use local::LocalStore;
pub use memory::MemoryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    Io,
    Network,
    Backend,
    InvalidKey,
    Corrupt,
}

impl StorageErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Io => "io_error",
            Self::Network => "network_error",
            Self::Backend => "backend_error",
            Self::InvalidKey => "invalid_key",
            Self::Corrupt => "corrupt_object",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageError {
    pub code: StorageErrorCode,
    pub message: String,
}

impl StorageError {
    pub fn new(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for StorageError {}

/// Flat key/value object storage holding question CSVs, response documents
/// and uploaded attachments.
///
/// A missing object is `Ok(None)`, never an error. Implementations do not
/// retry; a failed call is reported to the caller as-is.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError>;

    fn backend_name(&self) -> &'static str;
}
