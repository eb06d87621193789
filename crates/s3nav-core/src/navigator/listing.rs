//! Directory and bucket listings.

use std::collections::HashSet;

use tracing::{debug, error, instrument};

use super::Navigator;
use crate::client::{ListRequest, StorageClient};
use crate::entry::{Entry, EntryKind, UP_DIR};
use crate::{Error, Result, StorageError, TRACING_TARGET_LISTING};

impl<C> Navigator<C>
where
    C: StorageClient + ?Sized,
{
    /// Lists `prefix` of `bucket` as a navigable directory.
    ///
    /// The result starts with `..` when `prefix` is not the bucket root,
    /// followed by the common prefixes (folders) and then the object keys in
    /// listing order. Directory markers (keys ending in the delimiter) and
    /// empty keys are dropped. Every page is fetched before returning; a
    /// failure on any page discards everything collected so far.
    #[instrument(skip(self), target = TRACING_TARGET_LISTING)]
    pub async fn list_directory(
        &self,
        bucket: &str,
        delimiter: &str,
        prefix: &str,
    ) -> Result<Vec<Entry>> {
        let start = std::time::Instant::now();

        let mut seen_folders = HashSet::new();
        let mut seen_tokens = HashSet::new();
        let mut folders = Vec::new();
        let mut objects = Vec::new();

        let mut request = ListRequest::new(bucket, delimiter, prefix);
        let mut pages = 0usize;

        loop {
            let page = self
                .client
                .list_objects(request.clone())
                .await
                .map_err(|source| {
                    error!(
                        target: TRACING_TARGET_LISTING,
                        bucket = %bucket,
                        prefix = %prefix,
                        page = pages,
                        error = %source,
                        elapsed = ?start.elapsed(),
                        "Failed to list directory"
                    );
                    Error::Listing {
                        bucket: bucket.to_string(),
                        prefix: prefix.to_string(),
                        source,
                    }
                })?;
            pages += 1;

            for common in page.common_prefixes {
                if !seen_folders.insert(common.clone()) {
                    continue;
                }

                match Entry::classify(common, delimiter) {
                    Some(entry) if entry.kind() == EntryKind::Folder => folders.push(entry),
                    other => debug!(
                        target: TRACING_TARGET_LISTING,
                        label = ?other.as_ref().map(Entry::label),
                        "Ignoring common prefix that is not a folder"
                    ),
                }
            }

            for object in page.objects {
                if object.key.is_empty() || object.key.ends_with(delimiter) {
                    continue;
                }

                // A literal `..` key cannot be told apart from the sentinel.
                if object.key == UP_DIR {
                    debug!(
                        target: TRACING_TARGET_LISTING,
                        bucket = %bucket,
                        "Skipping object whose key is the up-directory sentinel"
                    );
                    continue;
                }

                if let Some(entry) = Entry::classify(object.key, delimiter) {
                    objects.push(entry);
                }
            }

            let Some(token) = page.next_token.filter(|token| !token.is_empty()) else {
                break;
            };

            // A token seen before would restart a page already consumed.
            if !seen_tokens.insert(token.clone()) {
                error!(
                    target: TRACING_TARGET_LISTING,
                    bucket = %bucket,
                    prefix = %prefix,
                    page = pages,
                    token = %token,
                    "Listing returned a continuation token twice"
                );
                return Err(Error::Listing {
                    bucket: bucket.to_string(),
                    prefix: prefix.to_string(),
                    source: StorageError::invalid_request(format!(
                        "continuation token '{token}' was returned twice"
                    )),
                });
            }
            request = request.with_continuation_token(Some(token));
        }

        let mut entries = Vec::with_capacity(folders.len() + objects.len() + 1);
        if !prefix.is_empty() {
            entries.push(Entry::up_dir());
        }
        entries.append(&mut folders);
        entries.append(&mut objects);

        debug!(
            target: TRACING_TARGET_LISTING,
            bucket = %bucket,
            prefix = %prefix,
            pages = pages,
            count = entries.len(),
            elapsed = ?start.elapsed(),
            "Directory listed"
        );

        Ok(entries)
    }

    /// Lists every bucket name visible to the client, in service order.
    #[instrument(skip(self), target = TRACING_TARGET_LISTING)]
    pub async fn list_buckets(&self) -> Result<Vec<String>> {
        let start = std::time::Instant::now();

        let buckets = self.client.list_buckets().await.map_err(|source| {
            error!(
                target: TRACING_TARGET_LISTING,
                error = %source,
                elapsed = ?start.elapsed(),
                "Failed to list buckets"
            );
            Error::Listing {
                bucket: String::new(),
                prefix: String::new(),
                source,
            }
        })?;

        debug!(
            target: TRACING_TARGET_LISTING,
            count = buckets.len(),
            elapsed = ?start.elapsed(),
            "Buckets listed"
        );

        Ok(buckets.into_iter().map(|bucket| bucket.name).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::client::{ListPage, ObjectSummary};
    use crate::entry::EntryKind;
    use crate::mock::{Call, MemoryStorage};
    use crate::{Error, Navigator, NavigatorConfig};

    fn labels(entries: &[crate::Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.label()).collect()
    }

    fn media() -> MemoryStorage {
        MemoryStorage::new()
            .with_object("media", "a.txt", "a")
            .with_object("media", "photos/b.jpg", "b")
            .with_object("media", "photos/c.jpg", "c")
    }

    #[tokio::test]
    async fn root_lists_folders_then_objects() {
        let navigator = Navigator::new(Arc::new(media()), NavigatorConfig::default());

        let entries = navigator.list_directory("media", "/", "").await.unwrap();
        assert_eq!(labels(&entries), vec!["photos/", "a.txt"]);
        assert_eq!(entries[0].kind(), EntryKind::Folder);
        assert_eq!(entries[1].kind(), EntryKind::Object);
    }

    #[tokio::test]
    async fn non_root_starts_with_up_dir() {
        let navigator = Navigator::new(Arc::new(media()), NavigatorConfig::default());

        let entries = navigator
            .list_directory("media", "/", "photos/")
            .await
            .unwrap();
        assert_eq!(labels(&entries), vec!["..", "photos/b.jpg", "photos/c.jpg"]);
        assert_eq!(entries[0].kind(), EntryKind::UpDir);
    }

    #[tokio::test]
    async fn empty_folder_still_offers_up_dir() {
        let storage = MemoryStorage::new().with_bucket("media");
        let navigator = Navigator::new(Arc::new(storage), NavigatorConfig::default());

        let entries = navigator
            .list_directory("media", "/", "missing/")
            .await
            .unwrap();
        assert_eq!(labels(&entries), vec![".."]);
    }

    #[tokio::test]
    async fn directory_markers_are_not_objects() {
        let storage = media()
            .with_object("media", "photos/", "")
            .with_object("media", "photos/raw/", "");
        let navigator = Navigator::new(Arc::new(storage), NavigatorConfig::default());

        let entries = navigator
            .list_directory("media", "/", "photos/")
            .await
            .unwrap();
        assert_eq!(
            labels(&entries),
            vec!["..", "photos/raw/", "photos/b.jpg", "photos/c.jpg"]
        );
        assert!(
            entries
                .iter()
                .filter(|e| e.is_object())
                .all(|e| !e.label().ends_with('/') && !e.label().is_empty())
        );
    }

    #[tokio::test]
    async fn exhausts_every_page() {
        let mut storage = MemoryStorage::new().with_page_size(3);
        for i in 0..10 {
            storage = storage.with_object("logs", &format!("day-{i:02}.log"), "x");
        }
        storage = storage.with_object("logs", "archive/old.log", "x");
        let storage = Arc::new(storage);
        let navigator = Navigator::new(storage.clone(), NavigatorConfig::default());

        let entries = navigator.list_directory("logs", "/", "").await.unwrap();
        assert_eq!(entries.len(), 11);
        assert_eq!(entries[0].label(), "archive/");
        assert_eq!(entries[10].label(), "day-09.log");

        let list_calls = storage.count_calls(|call| matches!(call, Call::ListObjects { .. }));
        assert_eq!(list_calls, 4);
    }

    #[tokio::test]
    async fn prefix_repeated_across_pages_is_listed_once() {
        let storage = MemoryStorage::new().with_bucket("media").with_scripted_pages([
            ListPage {
                common_prefixes: vec!["docs/".into(), "photos/".into()],
                objects: vec![ObjectSummary::new("a.txt", 1)],
                next_token: Some("page-1".into()),
            },
            ListPage {
                common_prefixes: vec!["photos/".into(), "videos/".into()],
                objects: vec![ObjectSummary::new("b.txt", 1)],
                next_token: None,
            },
        ]);
        let navigator = Navigator::new(Arc::new(storage), NavigatorConfig::default());

        let entries = navigator.list_directory("media", "/", "").await.unwrap();
        assert_eq!(
            labels(&entries),
            vec!["docs/", "photos/", "videos/", "a.txt", "b.txt"]
        );
    }

    #[tokio::test]
    async fn repeated_continuation_token_is_an_error() {
        let page = ListPage {
            common_prefixes: Vec::new(),
            objects: vec![ObjectSummary::new("a.txt", 1)],
            next_token: Some("again".into()),
        };
        let storage = Arc::new(
            MemoryStorage::new()
                .with_bucket("media")
                .with_scripted_pages([page.clone(), page]),
        );
        let navigator = Navigator::new(storage.clone(), NavigatorConfig::default());

        let error = navigator.list_directory("media", "/", "").await.unwrap_err();
        assert!(matches!(error, Error::Listing { ref bucket, .. } if bucket == "media"));
        assert_eq!(
            storage.count_calls(|call| matches!(call, Call::ListObjects { .. })),
            2
        );
    }

    #[tokio::test]
    async fn page_failure_discards_partial_results() {
        let mut storage = MemoryStorage::new().with_page_size(2);
        for i in 0..5 {
            storage = storage.with_object("logs", &format!("{i}.log"), "x");
        }
        storage.fail_listing_at_page(1);
        let navigator = Navigator::new(Arc::new(storage), NavigatorConfig::default());

        let error = navigator.list_directory("logs", "/", "").await.unwrap_err();
        assert!(matches!(error, Error::Listing { ref bucket, .. } if bucket == "logs"));
    }

    #[tokio::test]
    async fn listing_is_idempotent() {
        let navigator = Navigator::new(Arc::new(media()), NavigatorConfig::default());

        let first = navigator.list_directory("media", "/", "").await.unwrap();
        let second = navigator.list_directory("media", "/", "").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn lists_buckets_in_order() {
        let storage = MemoryStorage::new().with_bucket("zeta").with_bucket("alpha");
        let navigator = Navigator::new(Arc::new(storage), NavigatorConfig::default());

        let buckets = navigator.list_buckets().await.unwrap();
        assert_eq!(buckets, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn bucket_listing_failure_is_a_listing_error() {
        let storage = MemoryStorage::new().with_bucket("alpha");
        storage.fail_bucket_listing();
        let navigator = Navigator::new(Arc::new(storage), NavigatorConfig::default());

        assert!(matches!(
            navigator.list_buckets().await,
            Err(Error::Listing { .. })
        ));
    }
}
