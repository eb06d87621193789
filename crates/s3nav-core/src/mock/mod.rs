//! In-memory storage client for testing.
//!
//! [`MemoryStorage`] implements [`StorageClient`] over a map of buckets,
//! emulating delimited, paginated listings the way S3 does: keys are
//! returned in lexical order, keys containing the delimiter past the prefix
//! are folded into common prefixes, and every page holds at most
//! `page_size` items.
//!
//! # Feature Flag
//!
//! Outside this crate's own tests the module is only available with the
//! `test-utils` feature:
//!
//! ```toml
//! [dev-dependencies]
//! s3nav-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use s3nav_core::mock::MemoryStorage;
//!
//! let storage = MemoryStorage::new()
//!     .with_object("media", "a.txt", "hello")
//!     .with_object("media", "photos/b.jpg", vec![0x89, 0x50]);
//! ```

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;

use crate::client::{
    BucketSummary, ListPage, ListRequest, ObjectHead, ObjectSummary, StorageClass, StorageClient,
};
use crate::{StorageError, StorageErrorKind};

/// A storage call observed by [`MemoryStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `list_objects` with the bucket, prefix and continuation token.
    ListObjects {
        bucket: String,
        prefix: String,
        token: Option<String>,
    },
    /// `list_buckets`.
    ListBuckets,
    /// `get_object_range`.
    GetObjectRange {
        bucket: String,
        key: String,
        start: u64,
        end: u64,
    },
    /// `head_object`.
    HeadObject { bucket: String, key: String },
    /// `create_bucket`.
    CreateBucket(String),
    /// `delete_object`.
    DeleteObject { bucket: String, key: String },
    /// `copy_object`.
    CopyObject {
        bucket: String,
        source: String,
        dest: String,
    },
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    storage_class: StorageClass,
}

#[derive(Debug, Default)]
struct Faults {
    /// Zero-based page index at which listings fail.
    list_page: Option<usize>,
    list_buckets: bool,
    head: bool,
    get: bool,
    copy: bool,
    delete: bool,
    /// Names owned by someone else; creating them reports a collision.
    taken_names: HashSet<String>,
    /// Every create call fails.
    create: bool,
}

#[derive(Debug, Default)]
struct Inner {
    buckets: BTreeMap<String, BTreeMap<String, StoredObject>>,
    /// Pages returned verbatim, in order, instead of emulating a listing.
    scripted_pages: VecDeque<ListPage>,
    faults: Faults,
    calls: Vec<Call>,
}

/// In-memory [`StorageClient`] with fault injection and a call log.
#[derive(Debug)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
    page_size: usize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Default number of items (objects plus prefixes) per listing page.
    pub const DEFAULT_PAGE_SIZE: usize = 1000;

    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the number of items per listing page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Adds an empty bucket.
    pub fn with_bucket(self, bucket: &str) -> Self {
        self.lock().buckets.entry(bucket.to_string()).or_default();
        self
    }

    /// Adds an object in the standard tier, creating the bucket if needed.
    pub fn with_object(self, bucket: &str, key: &str, data: impl Into<Bytes>) -> Self {
        self.put(bucket, key, data.into(), StorageClass::Standard);
        self
    }

    /// Adds an object in the given tier.
    pub fn with_archived_object(
        self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
        storage_class: StorageClass,
    ) -> Self {
        self.put(bucket, key, data.into(), storage_class);
        self
    }

    /// Queues pages that `list_objects` returns one per call, ignoring the
    /// request, before falling back to the emulated listing.
    pub fn with_scripted_pages(self, pages: impl IntoIterator<Item = ListPage>) -> Self {
        self.lock().scripted_pages.extend(pages);
        self
    }

    /// Marks a bucket name as owned by another account.
    pub fn with_taken_name(self, name: &str) -> Self {
        self.lock().faults.taken_names.insert(name.to_string());
        self
    }

    /// Makes listings fail when the given zero-based page is requested.
    pub fn fail_listing_at_page(&self, page: usize) {
        self.lock().faults.list_page = Some(page);
    }

    /// Makes `list_buckets` fail.
    pub fn fail_bucket_listing(&self) {
        self.lock().faults.list_buckets = true;
    }

    /// Makes `head_object` fail.
    pub fn fail_head(&self) {
        self.lock().faults.head = true;
    }

    /// Makes `get_object_range` fail.
    pub fn fail_get(&self) {
        self.lock().faults.get = true;
    }

    /// Makes `copy_object` fail.
    pub fn fail_copy(&self) {
        self.lock().faults.copy = true;
    }

    /// Makes `delete_object` fail.
    pub fn fail_delete(&self) {
        self.lock().faults.delete = true;
    }

    /// Makes every `create_bucket` call fail.
    pub fn fail_create(&self) {
        self.lock().faults.create = true;
    }

    /// Stores or overwrites an object.
    pub fn put(&self, bucket: &str, key: &str, data: Bytes, storage_class: StorageClass) {
        self.lock().buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                data,
                storage_class,
            },
        );
    }

    /// Returns whether an object exists.
    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.lock()
            .buckets
            .get(bucket)
            .is_some_and(|objects| objects.contains_key(key))
    }

    /// Returns whether a bucket exists.
    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.lock().buckets.contains_key(bucket)
    }

    /// Returns every bucket name in order.
    pub fn bucket_names(&self) -> Vec<String> {
        self.lock().buckets.keys().cloned().collect()
    }

    /// Returns the calls made so far.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Returns how many calls satisfy `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn missing_bucket(bucket: &str) -> StorageError {
        StorageError::not_found(format!("bucket '{bucket}' does not exist"))
    }
}

/// One item of an emulated listing before pagination.
enum Item {
    Prefix(String),
    Object(ObjectSummary),
}

fn fold_listing(
    objects: &BTreeMap<String, StoredObject>,
    prefix: &str,
    delimiter: &str,
) -> Vec<Item> {
    let mut items = Vec::new();
    let mut last_prefix: Option<String> = None;

    for (key, object) in objects.range(prefix.to_string()..) {
        let Some(rest) = key.strip_prefix(prefix) else {
            break;
        };

        let folded = if delimiter.is_empty() {
            None
        } else {
            rest.find(delimiter)
                .map(|pos| format!("{prefix}{}", &rest[..pos + delimiter.len()]))
        };

        match folded {
            Some(common) => {
                if last_prefix.as_deref() != Some(common.as_str()) {
                    items.push(Item::Prefix(common.clone()));
                    last_prefix = Some(common);
                }
            }
            None => items.push(Item::Object(ObjectSummary::new(
                key.clone(),
                object.data.len() as u64,
            ))),
        }
    }

    items
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn list_objects(&self, request: ListRequest) -> Result<ListPage, StorageError> {
        let mut inner = self.lock();
        inner.calls.push(Call::ListObjects {
            bucket: request.bucket.clone(),
            prefix: request.prefix.clone(),
            token: request.continuation_token.clone(),
        });

        if let Some(page) = inner.scripted_pages.pop_front() {
            return Ok(page);
        }

        let start = match request.continuation_token.as_deref() {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| StorageError::invalid_request("malformed continuation token"))?,
        };

        let page_index = start / self.page_size;
        if inner.faults.list_page == Some(page_index) {
            return Err(StorageError::network(format!(
                "listing interrupted at page {page_index}"
            )));
        }

        let objects = inner
            .buckets
            .get(&request.bucket)
            .ok_or_else(|| Self::missing_bucket(&request.bucket))?;

        let items = fold_listing(objects, &request.prefix, &request.delimiter);
        let total = items.len();
        let end = (start + self.page_size).min(total);

        let mut page = ListPage::default();
        for item in items.into_iter().skip(start).take(end.saturating_sub(start)) {
            match item {
                Item::Prefix(prefix) => page.common_prefixes.push(prefix),
                Item::Object(object) => page.objects.push(object),
            }
        }

        if end < total {
            page.next_token = Some(end.to_string());
        }

        Ok(page)
    }

    async fn list_buckets(&self) -> Result<Vec<BucketSummary>, StorageError> {
        let mut inner = self.lock();
        inner.calls.push(Call::ListBuckets);

        if inner.faults.list_buckets {
            return Err(StorageError::new(StorageErrorKind::AccessDenied)
                .with_message("list buckets denied"));
        }

        Ok(inner.buckets.keys().map(BucketSummary::new).collect())
    }

    async fn get_object_range(
        &self,
        bucket: &str,
        key: &str,
        start: u64,
        end: u64,
    ) -> Result<Bytes, StorageError> {
        let mut inner = self.lock();
        inner.calls.push(Call::GetObjectRange {
            bucket: bucket.to_string(),
            key: key.to_string(),
            start,
            end,
        });

        if inner.faults.get {
            return Err(StorageError::network("connection reset"));
        }

        let object = inner
            .buckets
            .get(bucket)
            .ok_or_else(|| Self::missing_bucket(bucket))?
            .get(key)
            .ok_or_else(|| StorageError::not_found(format!("{bucket}/{key}")))?;

        if object.storage_class.is_archival() {
            return Err(StorageError::invalid_request("object is in an archival tier"));
        }

        let len = object.data.len() as u64;
        if start >= len {
            return Ok(Bytes::new());
        }

        let stop = end.saturating_add(1).min(len);
        Ok(object.data.slice(start as usize..stop as usize))
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectHead, StorageError> {
        let mut inner = self.lock();
        inner.calls.push(Call::HeadObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });

        if inner.faults.head {
            return Err(StorageError::network("connection reset"));
        }

        let object = inner
            .buckets
            .get(bucket)
            .ok_or_else(|| Self::missing_bucket(bucket))?
            .get(key)
            .ok_or_else(|| StorageError::not_found(format!("{bucket}/{key}")))?;

        Ok(ObjectHead {
            storage_class: object.storage_class.clone(),
            size: Some(object.data.len() as u64),
        })
    }

    async fn create_bucket(&self, name: &str) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.calls.push(Call::CreateBucket(name.to_string()));

        if inner.faults.create {
            return Err(StorageError::invalid_request(format!(
                "invalid bucket name '{name}'"
            )));
        }

        if inner.faults.taken_names.contains(name) || inner.buckets.contains_key(name) {
            return Err(StorageError::already_exists(format!(
                "bucket '{name}' already exists"
            )));
        }

        inner.buckets.insert(name.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.calls.push(Call::DeleteObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });

        if inner.faults.delete {
            return Err(StorageError::new(StorageErrorKind::AccessDenied)
                .with_message("delete denied"));
        }

        // Deleting a missing key succeeds, as it does on S3.
        inner
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::missing_bucket(bucket))?
            .remove(key);
        Ok(())
    }

    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        dest_key: &str,
    ) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.calls.push(Call::CopyObject {
            bucket: bucket.to_string(),
            source: source_key.to_string(),
            dest: dest_key.to_string(),
        });

        if inner.faults.copy {
            return Err(StorageError::network("copy interrupted"));
        }

        let objects = inner
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::missing_bucket(bucket))?;
        let object = objects
            .get(source_key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(format!("{bucket}/{source_key}")))?;
        objects.insert(dest_key.to_string(), object);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prefix: &str, token: Option<&str>) -> ListRequest {
        ListRequest::new("media", "/", prefix).with_continuation_token(token.map(String::from))
    }

    #[tokio::test]
    async fn folds_keys_into_common_prefixes() {
        let storage = MemoryStorage::new()
            .with_object("media", "a.txt", "a")
            .with_object("media", "photos/b.jpg", "b")
            .with_object("media", "photos/c.jpg", "c");

        let page = storage.list_objects(request("", None)).await.unwrap();
        assert_eq!(page.common_prefixes, vec!["photos/"]);
        assert_eq!(page.objects, vec![ObjectSummary::new("a.txt", 1)]);
        assert!(page.next_token.is_none());
    }

    #[tokio::test]
    async fn paginates_with_tokens() {
        let storage = MemoryStorage::new()
            .with_page_size(2)
            .with_object("media", "a", "1")
            .with_object("media", "b", "2")
            .with_object("media", "c", "3");

        let first = storage.list_objects(request("", None)).await.unwrap();
        assert_eq!(first.objects.len(), 2);
        let token = first.next_token.clone();
        assert!(token.is_some());

        let second = storage
            .list_objects(request("", token.as_deref()))
            .await
            .unwrap();
        assert_eq!(second.objects, vec![ObjectSummary::new("c", 1)]);
        assert!(second.next_token.is_none());
    }

    #[tokio::test]
    async fn range_is_inclusive_and_clamped() {
        let storage = MemoryStorage::new().with_object("media", "a.txt", "0123456789");

        let bytes = storage.get_object_range("media", "a.txt", 0, 3).await.unwrap();
        assert_eq!(&bytes[..], b"0123");

        let bytes = storage.get_object_range("media", "a.txt", 0, 1000).await.unwrap();
        assert_eq!(bytes.len(), 10);
    }

    #[tokio::test]
    async fn taken_names_collide() {
        let storage = MemoryStorage::new().with_taken_name("test");
        let error = storage.create_bucket("test").await.unwrap_err();
        assert_eq!(error.kind, StorageErrorKind::AlreadyExists);
        assert!(storage.create_bucket("test-1").await.is_ok());
        assert!(storage.has_bucket("test-1"));
    }
}
