//! [`StorageClient`] implementation backed by [`S3Client`].

use async_trait::async_trait;
use bytes::Bytes;
use s3nav_core::{
    BucketSummary, ListPage, ListRequest, ObjectHead, StorageClass, StorageClient, StorageError,
    StorageErrorKind,
};

use crate::{Error, S3Client};

/// Maps the text of an SDK error onto a [`StorageErrorKind`] using the S3
/// error codes it carries.
///
/// ```rust
/// use s3nav_core::StorageErrorKind;
/// use s3nav_storage::classify_message;
///
/// assert_eq!(classify_message("S3 error: BucketAlreadyExists"), StorageErrorKind::AlreadyExists);
/// assert_eq!(classify_message("something odd"), StorageErrorKind::Unknown);
/// ```
pub fn classify_message(message: &str) -> StorageErrorKind {
    const NOT_FOUND: &[&str] = &["NoSuchKey", "NoSuchBucket", "NotFound"];
    const ALREADY_EXISTS: &[&str] = &["BucketAlreadyExists", "BucketAlreadyOwnedByYou"];
    const ACCESS_DENIED: &[&str] = &[
        "AccessDenied",
        "InvalidAccessKeyId",
        "SignatureDoesNotMatch",
    ];
    const INVALID_REQUEST: &[&str] = &["InvalidBucketName", "InvalidArgument", "InvalidRange"];
    const NETWORK: &[&str] = &["error sending request", "connection", "timed out", "dns error"];

    let contains_any = |needles: &[&str]| needles.iter().any(|n| message.contains(n));
    let lowercase = message.to_ascii_lowercase();

    if contains_any(NOT_FOUND) {
        StorageErrorKind::NotFound
    } else if contains_any(ALREADY_EXISTS) {
        StorageErrorKind::AlreadyExists
    } else if contains_any(ACCESS_DENIED) {
        StorageErrorKind::AccessDenied
    } else if contains_any(INVALID_REQUEST) {
        StorageErrorKind::InvalidRequest
    } else if NETWORK.iter().any(|n| lowercase.contains(n)) {
        StorageErrorKind::Network
    } else {
        StorageErrorKind::Unknown
    }
}

impl From<Error> for StorageError {
    fn from(error: Error) -> Self {
        let kind = match &error {
            Error::Config(_) | Error::InvalidRequest(_) => StorageErrorKind::InvalidRequest,
            Error::Io(_) => StorageErrorKind::Network,
            Error::Client(e) => classify_message(&e.to_string()),
        };

        StorageError::new(kind)
            .with_message(error.to_string())
            .with_source(error)
    }
}

#[async_trait]
impl StorageClient for S3Client {
    async fn list_objects(&self, request: ListRequest) -> Result<ListPage, StorageError> {
        let page = self
            .object_operations()
            .list_page(
                &request.bucket,
                &request.delimiter,
                &request.prefix,
                request.continuation_token,
            )
            .await?;
        Ok(page)
    }

    async fn list_buckets(&self) -> Result<Vec<BucketSummary>, StorageError> {
        let names = self.bucket_operations().list_buckets().await?;
        Ok(names.into_iter().map(BucketSummary::new).collect())
    }

    async fn get_object_range(
        &self,
        bucket: &str,
        key: &str,
        start: u64,
        end: u64,
    ) -> Result<Bytes, StorageError> {
        Ok(self
            .object_operations()
            .get_range(bucket, key, start, end)
            .await?)
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectHead, StorageError> {
        let stat = self.object_operations().stat_object(bucket, key).await?;
        Ok(ObjectHead {
            storage_class: StorageClass::from_header(stat.storage_class.as_deref()),
            size: Some(stat.size),
        })
    }

    async fn create_bucket(&self, name: &str) -> Result<(), StorageError> {
        Ok(self.bucket_operations().create_bucket(name).await?)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        Ok(self.object_operations().delete_object(bucket, key).await?)
    }

    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        dest_key: &str,
    ) -> Result<(), StorageError> {
        Ok(self
            .object_operations()
            .copy_object(bucket, source_key, dest_key)
            .await?)
    }
}
