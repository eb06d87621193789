//! Storage client contract consumed by the navigator.
//!
//! The navigator never talks to the network directly. Everything it needs
//! from an S3-compatible service is expressed by [`StorageClient`], which is
//! implemented by the SDK-backed client in `s3nav-storage` and by the
//! in-memory store used in tests.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::StorageError;

/// A single page request against the listing API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    /// Bucket to list.
    pub bucket: String,
    /// Separator used to fold keys into common prefixes.
    pub delimiter: String,
    /// Only keys starting with this prefix are returned.
    pub prefix: String,
    /// Token returned by the previous page, `None` for the first page.
    pub continuation_token: Option<String>,
}

impl ListRequest {
    /// Creates a request for the first page.
    pub fn new(
        bucket: impl Into<String>,
        delimiter: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            delimiter: delimiter.into(),
            prefix: prefix.into(),
            continuation_token: None,
        }
    }

    /// Returns the same request positioned at the given continuation token.
    pub fn with_continuation_token(mut self, token: Option<String>) -> Self {
        self.continuation_token = token;
        self
    }
}

/// An object returned by a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    /// Full object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
}

impl ObjectSummary {
    /// Creates a new summary.
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }
}

/// One page of a delimited listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Common prefixes on this page, delimiter-terminated.
    pub common_prefixes: Vec<String>,
    /// Objects on this page.
    pub objects: Vec<ObjectSummary>,
    /// Token for the next page; `None` when the listing is exhausted.
    pub next_token: Option<String>,
}

/// A bucket returned by [`StorageClient::list_buckets`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSummary {
    /// Bucket name.
    pub name: String,
}

impl BucketSummary {
    /// Creates a new bucket summary.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Storage tier of an object as reported by a HEAD request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageClass {
    /// The default, immediately retrievable tier.
    Standard,
    /// Flexible-retrieval archive; needs a restore before reads.
    Glacier,
    /// Deep archive; needs a restore before reads.
    DeepArchive,
    /// Any other tier (intelligent tiering, infrequent access, instant retrieval, ...).
    Other(String),
}

impl StorageClass {
    /// Parses the value of an `x-amz-storage-class` header.
    ///
    /// A missing header means the object lives in the standard tier.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some("STANDARD") => Self::Standard,
            Some("GLACIER") => Self::Glacier,
            Some("DEEP_ARCHIVE") => Self::DeepArchive,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    /// Returns whether objects in this tier must be restored before they can be read.
    pub fn is_archival(&self) -> bool {
        matches!(self, Self::Glacier | Self::DeepArchive)
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("STANDARD"),
            Self::Glacier => f.write_str("GLACIER"),
            Self::DeepArchive => f.write_str("DEEP_ARCHIVE"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Object metadata returned by a HEAD request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHead {
    /// Storage tier of the object.
    pub storage_class: StorageClass,
    /// Object size in bytes, when reported.
    pub size: Option<u64>,
}

/// Operations the navigator requires from an S3-compatible service.
///
/// Implementations must not retry on their own behalf beyond what the SDK
/// does, and must not impose pagination limits: the navigator drives
/// pagination through [`ListRequest::continuation_token`].
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Lists one page of objects and common prefixes.
    async fn list_objects(&self, request: ListRequest) -> Result<ListPage, StorageError>;

    /// Lists every bucket visible to the current identity.
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>, StorageError>;

    /// Fetches the inclusive byte range `start..=end` of an object.
    async fn get_object_range(
        &self,
        bucket: &str,
        key: &str,
        start: u64,
        end: u64,
    ) -> Result<Bytes, StorageError>;

    /// Fetches object metadata without the body.
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectHead, StorageError>;

    /// Creates a bucket.
    async fn create_bucket(&self, name: &str) -> Result<(), StorageError>;

    /// Deletes an object.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// Copies an object within a bucket.
    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        dest_key: &str,
    ) -> Result<(), StorageError>;
}
