#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]
#![allow(clippy::result_large_err)]

// Tracing target constants for consistent logging
pub const TRACING_TARGET_CLIENT: &str = "s3nav_storage::client";
pub const TRACING_TARGET_OPERATIONS: &str = "s3nav_storage::operations";
pub const TRACING_TARGET_BUCKETS: &str = "s3nav_storage::buckets";
pub const TRACING_TARGET_OBJECTS: &str = "s3nav_storage::objects";

pub mod client;
pub mod operations;
mod storage;

// Re-export for convenience
pub use crate::client::{S3Client, S3Config, S3Credentials};
pub use crate::operations::{BucketOperations, ObjectOperations, ObjectStat};
pub use crate::storage::classify_message;

/// Error type for S3 storage operations.
#[derive(Debug, thiserror::Error)]
#[must_use = "errors should be handled appropriately"]
pub enum Error {
    /// Configuration error.
    ///
    /// Invalid endpoint, missing credentials or a client that could not be
    /// built from the configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid request or malformed data.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Reading a response body failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Underlying SDK error.
    #[error("S3 client error: {0}")]
    Client(#[from] minio::s3::error::Error),
}

/// Specialized [`Result`] type for storage operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
