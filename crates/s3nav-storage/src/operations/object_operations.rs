//! Object operations: delimited listing, ranged reads, metadata, copy and delete.

use bytes::Bytes;
use futures::StreamExt;
use minio::s3::builders::CopySource;
use minio::s3::types::{S3Api, ToStream};
use s3nav_core::{ListPage, ObjectSummary};
use tracing::{debug, error, info, instrument};

use crate::{Error, Result, S3Client, TRACING_TARGET_OBJECTS};

/// Header carrying an object's storage class; absent for the standard tier.
const STORAGE_CLASS_HEADER: &str = "x-amz-storage-class";

/// Object metadata returned by a HEAD request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStat {
    /// Object size in bytes.
    pub size: u64,
    /// Raw `x-amz-storage-class` header value.
    pub storage_class: Option<String>,
}

/// Object-level calls against the service.
#[derive(Debug, Clone)]
pub struct ObjectOperations {
    client: S3Client,
}

impl ObjectOperations {
    /// Creates a new ObjectOperations instance.
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Fetches one page of a delimited `ListObjectsV2` listing.
    ///
    /// Common prefixes and objects are returned separately. The returned
    /// `next_token` is `None` once the listing is exhausted.
    #[instrument(skip(self), target = TRACING_TARGET_OBJECTS, fields(bucket = %bucket))]
    pub async fn list_page(
        &self,
        bucket: &str,
        delimiter: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage> {
        let start = std::time::Instant::now();

        let mut request = self
            .client
            .as_inner()
            .list_objects(bucket)
            .delimiter(Some(delimiter.to_string()))
            .continuation_token(continuation_token);

        if !prefix.is_empty() {
            request = request.prefix(Some(prefix.to_string()));
        }

        // The stream follows continuation tokens on its own; only the first
        // page is consumed so the caller stays in charge of pagination.
        let mut stream = request.to_stream().await;
        let result = stream.next().await;
        let elapsed = start.elapsed();

        match result {
            Some(Ok(response)) => {
                let mut page = ListPage::default();

                for entry in response.contents {
                    if entry.is_prefix {
                        page.common_prefixes.push(entry.name);
                    } else {
                        let size = entry.size.unwrap_or(0);
                        page.objects.push(ObjectSummary::new(entry.name, size));
                    }
                }

                page.next_token = response
                    .next_continuation_token
                    .filter(|token| !token.is_empty());

                debug!(
                    target: TRACING_TARGET_OBJECTS,
                    bucket = %bucket,
                    prefix = %prefix,
                    prefixes = page.common_prefixes.len(),
                    objects = page.objects.len(),
                    truncated = page.next_token.is_some(),
                    elapsed = ?elapsed,
                    "Listed page"
                );

                Ok(page)
            }
            Some(Err(e)) => {
                error!(
                    target: TRACING_TARGET_OBJECTS,
                    bucket = %bucket,
                    prefix = %prefix,
                    error = %e,
                    elapsed = ?elapsed,
                    "Failed to list objects"
                );
                Err(Error::Client(e))
            }
            None => Ok(ListPage::default()),
        }
    }

    /// Downloads the inclusive byte range `start..=end` of an object.
    #[instrument(skip(self), target = TRACING_TARGET_OBJECTS, fields(bucket = %bucket, key = %key))]
    pub async fn get_range(&self, bucket: &str, key: &str, start: u64, end: u64) -> Result<Bytes> {
        if end < start {
            return Err(Error::InvalidRequest(format!(
                "byte range {start}-{end} is empty"
            )));
        }

        let timer = std::time::Instant::now();

        let response = self
            .client
            .as_inner()
            .get_object(bucket, key)
            .offset(Some(start))
            .length(Some(end - start + 1))
            .send()
            .await
            .map_err(|e| {
                error!(
                    target: TRACING_TARGET_OBJECTS,
                    bucket = %bucket,
                    key = %key,
                    error = %e,
                    elapsed = ?timer.elapsed(),
                    "Failed to fetch object range"
                );
                Error::Client(e)
            })?;

        let data = response.content.to_segmented_bytes().await?.to_bytes();

        debug!(
            target: TRACING_TARGET_OBJECTS,
            bucket = %bucket,
            key = %key,
            size = data.len(),
            elapsed = ?timer.elapsed(),
            "Object range downloaded"
        );

        Ok(data)
    }

    /// Fetches object metadata.
    #[instrument(skip(self), target = TRACING_TARGET_OBJECTS, fields(bucket = %bucket, key = %key))]
    pub async fn stat_object(&self, bucket: &str, key: &str) -> Result<ObjectStat> {
        let start = std::time::Instant::now();

        let result = self
            .client
            .as_inner()
            .stat_object(bucket, key)
            .send()
            .await
            .map_err(Error::Client);

        let elapsed = start.elapsed();

        match result {
            Ok(response) => {
                let storage_class = response
                    .headers
                    .get(STORAGE_CLASS_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);

                debug!(
                    target: TRACING_TARGET_OBJECTS,
                    bucket = %bucket,
                    key = %key,
                    size = response.size,
                    storage_class = ?storage_class,
                    elapsed = ?elapsed,
                    "Object metadata retrieved"
                );

                Ok(ObjectStat {
                    size: response.size as u64,
                    storage_class,
                })
            }
            Err(e) => {
                error!(
                    target: TRACING_TARGET_OBJECTS,
                    bucket = %bucket,
                    key = %key,
                    error = %e,
                    elapsed = ?elapsed,
                    "Failed to get object metadata"
                );
                Err(e)
            }
        }
    }

    /// Server-side copy of `source_key` to `dest_key` within `bucket`.
    #[instrument(skip(self), target = TRACING_TARGET_OBJECTS, fields(bucket = %bucket))]
    pub async fn copy_object(&self, bucket: &str, source_key: &str, dest_key: &str) -> Result<()> {
        let start = std::time::Instant::now();

        let source = CopySource::new(bucket, source_key).map_err(Error::Client)?;
        let result = self
            .client
            .as_inner()
            .copy_object(bucket, dest_key)
            .source(source)
            .send()
            .await
            .map_err(Error::Client);

        let elapsed = start.elapsed();

        match result {
            Ok(_) => {
                info!(
                    target: TRACING_TARGET_OBJECTS,
                    bucket = %bucket,
                    from = %source_key,
                    to = %dest_key,
                    elapsed = ?elapsed,
                    "Object copied successfully"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    target: TRACING_TARGET_OBJECTS,
                    bucket = %bucket,
                    from = %source_key,
                    to = %dest_key,
                    error = %e,
                    elapsed = ?elapsed,
                    "Failed to copy object"
                );
                Err(e)
            }
        }
    }

    /// Deletes an object. Deleting a missing key succeeds.
    #[instrument(skip(self), target = TRACING_TARGET_OBJECTS, fields(bucket = %bucket, key = %key))]
    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let start = std::time::Instant::now();

        let result = self
            .client
            .as_inner()
            .delete_object(bucket, key)
            .send()
            .await
            .map_err(Error::Client);

        let elapsed = start.elapsed();

        match result {
            Ok(_) => {
                info!(
                    target: TRACING_TARGET_OBJECTS,
                    bucket = %bucket,
                    key = %key,
                    elapsed = ?elapsed,
                    "Object deleted successfully"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    target: TRACING_TARGET_OBJECTS,
                    bucket = %bucket,
                    key = %key,
                    error = %e,
                    elapsed = ?elapsed,
                    "Failed to delete object"
                );
                Err(e)
            }
        }
    }
}
