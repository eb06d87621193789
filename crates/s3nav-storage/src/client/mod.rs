//! S3 client with configuration and credentials.
//!
//! [`S3Client`] wraps the MinIO SDK client built from an [`S3Config`]. It
//! hands out [`BucketOperations`](crate::BucketOperations) and
//! [`ObjectOperations`](crate::ObjectOperations), and implements
//! `s3nav_core::StorageClient` so the navigator can drive it directly.

mod s3_client;
mod s3_config;
mod s3_credentials;

pub use s3_client::S3Client;
pub use s3_config::S3Config;
pub use s3_credentials::S3Credentials;
