//! Blob-storage errors

/// Result alias for blob-store calls
pub type StorageResult<T> = Result<T, StorageError>;

/// Failure reported by a [`BlobStore`](crate::collaborators::BlobStore)
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No object at that key
    #[error("object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// The store rejected or failed the request
    #[error("{operation} s3://{bucket}/{key} failed: {message}")]
    Request {
        operation: &'static str,
        bucket: String,
        key: String,
        message: String,
    },
}

impl StorageError {
    pub fn not_found(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn request(
        operation: &'static str,
        bucket: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Request {
            operation,
            bucket: bucket.into(),
            key: key.into(),
            message: message.into(),
        }
    }
}
