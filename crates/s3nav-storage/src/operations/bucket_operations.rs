//! Bucket operations.

use minio::s3::types::S3Api;
use tracing::{debug, error, info, instrument};

use crate::{Error, Result, S3Client, TRACING_TARGET_BUCKETS, TRACING_TARGET_OPERATIONS};

/// Bucket-level calls against the service.
#[derive(Debug, Clone)]
pub struct BucketOperations {
    client: S3Client,
}

impl BucketOperations {
    /// Creates a new BucketOperations instance.
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Creates a bucket in the client's region.
    ///
    /// # Errors
    ///
    /// Fails when the name is invalid or already taken, by this account or
    /// any other.
    #[instrument(skip(self), target = TRACING_TARGET_BUCKETS, fields(bucket = %bucket_name))]
    pub async fn create_bucket(&self, bucket_name: &str) -> Result<()> {
        debug!(
            target: TRACING_TARGET_OPERATIONS,
            bucket = %bucket_name,
            "Creating bucket"
        );

        let start = std::time::Instant::now();
        let result = self
            .client
            .as_inner()
            .create_bucket(bucket_name)
            .send()
            .await
            .map_err(Error::Client);

        let elapsed = start.elapsed();

        match result {
            Ok(_response) => {
                info!(
                    target: TRACING_TARGET_BUCKETS,
                    bucket = %bucket_name,
                    elapsed = ?elapsed,
                    "Bucket created successfully"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    target: TRACING_TARGET_BUCKETS,
                    bucket = %bucket_name,
                    error = %e,
                    elapsed = ?elapsed,
                    "Failed to create bucket"
                );
                Err(e)
            }
        }
    }

    /// Lists the names of every bucket owned by the current identity.
    #[instrument(skip(self), target = TRACING_TARGET_BUCKETS)]
    pub async fn list_buckets(&self) -> Result<Vec<String>> {
        debug!(target: TRACING_TARGET_OPERATIONS, "Listing buckets");

        let start = std::time::Instant::now();
        let result = self
            .client
            .as_inner()
            .list_buckets()
            .send()
            .await
            .map_err(Error::Client);

        let elapsed = start.elapsed();

        match result {
            Ok(response) => {
                let names: Vec<String> = response
                    .buckets
                    .into_iter()
                    .map(|bucket| bucket.name)
                    .collect();

                info!(
                    target: TRACING_TARGET_BUCKETS,
                    count = names.len(),
                    elapsed = ?elapsed,
                    "Buckets listed successfully"
                );

                Ok(names)
            }
            Err(e) => {
                error!(
                    target: TRACING_TARGET_BUCKETS,
                    error = %e,
                    elapsed = ?elapsed,
                    "Failed to list buckets"
                );
                Err(e)
            }
        }
    }
}
