use thiserror::Error;

pub mod driver;
pub mod paths;

/// An object read back from the store, together with the version the store
/// attached to it (an entity tag for S3, a content hash on disk).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub version: Option<String>,
}

/// Condition attached to a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// Overwrite whatever is stored.
    Any,
    /// Only write if the stored object still carries this version.
    IfMatch(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("precondition failed for object {0}")]
    PreconditionFailed(String),

    #[error("object {key} is malformed: {reason}")]
    Malformed { key: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object store backend error: {0}")]
    Backend(String),
}

#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns `Ok(None)` when the key does not exist.
    async fn get_object(&self, key: &str) -> Result<Option<StoredObject>, StorageError>;

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        precondition: Precondition,
    ) -> Result<(), StorageError>;
}
