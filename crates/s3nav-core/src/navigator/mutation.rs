//! Delete, rename and bucket creation.

use rand::Rng;
use tracing::{debug, error, info, instrument, warn};

use super::Navigator;
use crate::client::StorageClient;
use crate::entry::is_protected_label;
use crate::error::MutationKind;
use crate::{Error, Result, StorageError, TRACING_TARGET_MUTATION};

/// Characters used for collision suffixes; valid in any bucket name.
const SUFFIX_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Result of the two-step copy-then-delete rename.
///
/// The store has no atomic rename, so the saga can stop after the copy has
/// committed. [`RenameOutcome::DeleteFailed`] is that state: both the old and
/// the new key exist.
#[derive(Debug)]
#[must_use]
pub enum RenameOutcome {
    /// The source is a folder or `..`; nothing was called.
    Refused,
    /// The copy failed; the source is untouched and no delete was issued.
    CopyFailed(Error),
    /// The copy committed but deleting the source failed.
    DeleteFailed(Error),
    /// Copied and deleted.
    Completed,
}

impl RenameOutcome {
    /// Returns whether the new key was written.
    pub fn copied(&self) -> bool {
        matches!(self, Self::DeleteFailed(_) | Self::Completed)
    }

    /// Returns whether the rename fully succeeded.
    pub fn renamed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns the failure, if a step failed.
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::CopyFailed(e) | Self::DeleteFailed(e) => Some(e),
            Self::Refused | Self::Completed => None,
        }
    }

    /// Collapses the saga into `(renamed, error)` form.
    pub fn into_result(self) -> Result<bool> {
        match self {
            Self::Refused => Ok(false),
            Self::Completed => Ok(true),
            Self::CopyFailed(e) | Self::DeleteFailed(e) => Err(e),
        }
    }
}

/// A bucket that now exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedBucket {
    /// Whether the requested name was used as-is.
    pub original: bool,
    /// Name of the bucket that was created.
    pub name: String,
}

/// Generates a random lowercase alphanumeric suffix.
pub fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())]))
        .collect()
}

impl<C> Navigator<C>
where
    C: StorageClient + ?Sized,
{
    /// Deletes the object behind `label`.
    ///
    /// Returns `Ok(false)` without calling the store when `label` is a
    /// folder or `..`. The listing is not refreshed here.
    #[instrument(skip(self), target = TRACING_TARGET_MUTATION)]
    pub async fn delete_entry(&self, bucket: &str, label: &str) -> Result<bool> {
        if is_protected_label(label, self.delimiter()) {
            debug!(
                target: TRACING_TARGET_MUTATION,
                label = %label,
                "Refusing to delete a folder"
            );
            return Ok(false);
        }

        let start = std::time::Instant::now();
        self.client
            .delete_object(bucket, label)
            .await
            .map_err(|source| {
                error!(
                    target: TRACING_TARGET_MUTATION,
                    bucket = %bucket,
                    key = %label,
                    error = %source,
                    elapsed = ?start.elapsed(),
                    "Failed to delete object"
                );
                Error::Mutation {
                    operation: MutationKind::Delete,
                    target: label.to_string(),
                    source,
                }
            })?;

        info!(
            target: TRACING_TARGET_MUTATION,
            bucket = %bucket,
            key = %label,
            elapsed = ?start.elapsed(),
            "Object deleted"
        );

        Ok(true)
    }

    /// Renames an object by copying it to `new_label` and deleting the source.
    #[instrument(skip(self), target = TRACING_TARGET_MUTATION)]
    pub async fn rename_entry(
        &self,
        bucket: &str,
        old_label: &str,
        new_label: &str,
    ) -> RenameOutcome {
        let delimiter = self.delimiter();
        if is_protected_label(old_label, delimiter) {
            debug!(
                target: TRACING_TARGET_MUTATION,
                label = %old_label,
                "Refusing to rename a folder"
            );
            return RenameOutcome::Refused;
        }

        if is_protected_label(new_label, delimiter) {
            return RenameOutcome::CopyFailed(Error::InvalidInput(format!(
                "'{new_label}' is not a valid object key"
            )));
        }

        if old_label == new_label {
            return RenameOutcome::Completed;
        }

        let start = std::time::Instant::now();

        if let Err(source) = self.client.copy_object(bucket, old_label, new_label).await {
            error!(
                target: TRACING_TARGET_MUTATION,
                bucket = %bucket,
                from = %old_label,
                to = %new_label,
                error = %source,
                "Rename copy failed, source left in place"
            );
            return RenameOutcome::CopyFailed(mutation_error(MutationKind::Copy, old_label, source));
        }

        debug!(
            target: TRACING_TARGET_MUTATION,
            from = %old_label,
            to = %new_label,
            "Rename copied"
        );

        if let Err(source) = self.client.delete_object(bucket, old_label).await {
            warn!(
                target: TRACING_TARGET_MUTATION,
                bucket = %bucket,
                from = %old_label,
                to = %new_label,
                error = %source,
                "Rename delete failed, both keys now exist"
            );
            return RenameOutcome::DeleteFailed(mutation_error(
                MutationKind::RenameDelete,
                old_label,
                source,
            ));
        }

        info!(
            target: TRACING_TARGET_MUTATION,
            bucket = %bucket,
            from = %old_label,
            to = %new_label,
            elapsed = ?start.elapsed(),
            "Object renamed"
        );

        RenameOutcome::Completed
    }

    /// Creates a bucket, falling back to suffixed names on failure.
    ///
    /// The first attempt uses `name` verbatim. Every later attempt uses
    /// `name-<suffix>` with a fresh random suffix, shortening `name` so the
    /// result stays within the bucket name limit. At most
    /// `max_create_attempts` create calls are issued.
    #[instrument(skip(self), target = TRACING_TARGET_MUTATION)]
    pub async fn create_bucket(&self, name: &str) -> Result<CreatedBucket> {
        if name.is_empty() {
            return Err(Error::InvalidInput("bucket name cannot be empty".into()));
        }

        let start = std::time::Instant::now();
        let max_attempts = self.config.max_create_attempts.max(1);
        let base: String = name.chars().take(self.config.max_base_name_len()).collect();
        let mut candidate = name.to_string();
        let mut last: Option<StorageError> = None;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                candidate = format!("{base}-{}", random_suffix(self.config.suffix_length));
            }

            match self.client.create_bucket(&candidate).await {
                Ok(()) => {
                    info!(
                        target: TRACING_TARGET_MUTATION,
                        requested = %name,
                        bucket = %candidate,
                        attempt = attempt,
                        elapsed = ?start.elapsed(),
                        "Bucket created"
                    );
                    return Ok(CreatedBucket {
                        original: attempt == 1,
                        name: candidate,
                    });
                }
                Err(e) => {
                    debug!(
                        target: TRACING_TARGET_MUTATION,
                        bucket = %candidate,
                        attempt = attempt,
                        error = %e,
                        "Bucket creation attempt failed"
                    );
                    last = Some(e);
                }
            }
        }

        let last = last.unwrap_or_else(|| StorageError::invalid_request("no attempt was made"));
        error!(
            target: TRACING_TARGET_MUTATION,
            requested = %name,
            attempts = max_attempts,
            error = %last,
            elapsed = ?start.elapsed(),
            "Bucket creation exhausted its attempts"
        );

        Err(Error::ExhaustedRetries {
            name: name.to_string(),
            attempts: max_attempts,
            last,
        })
    }
}

fn mutation_error(operation: MutationKind, target: &str, source: StorageError) -> Error {
    Error::Mutation {
        operation,
        target: target.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::mock::{Call, MemoryStorage};
    use crate::{NavigatorConfig, StorageErrorKind};

    fn navigator(storage: &Arc<MemoryStorage>) -> Navigator<MemoryStorage> {
        Navigator::new(storage.clone(), NavigatorConfig::default())
    }

    fn is_delete(call: &Call) -> bool {
        matches!(call, Call::DeleteObject { .. })
    }

    #[test]
    fn suffix_is_lowercase_alphanumeric() {
        let suffix = random_suffix(8);
        assert_eq!(suffix.len(), 8);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
        assert!(random_suffix(0).is_empty());
    }

    #[tokio::test]
    async fn deletes_objects() {
        let storage = Arc::new(MemoryStorage::new().with_object("media", "a.txt", "a"));

        let deleted = navigator(&storage)
            .delete_entry("media", "a.txt")
            .await
            .unwrap();
        assert!(deleted);
        assert!(!storage.contains("media", "a.txt"));
    }

    #[tokio::test]
    async fn never_deletes_folders_or_up_dir() {
        let storage = Arc::new(MemoryStorage::new().with_object("media", "photos/b.jpg", "b"));
        let navigator = navigator(&storage);

        for label in ["photos/", "..", "a/b/c/", ""] {
            assert!(!navigator.delete_entry("media", label).await.unwrap());
        }
        assert_eq!(storage.count_calls(is_delete), 0);
        assert!(storage.contains("media", "photos/b.jpg"));
    }

    #[tokio::test]
    async fn delete_failure_is_a_mutation_error() {
        let storage = Arc::new(MemoryStorage::new().with_object("media", "a.txt", "a"));
        storage.fail_delete();

        let error = navigator(&storage)
            .delete_entry("media", "a.txt")
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            Error::Mutation {
                operation: MutationKind::Delete,
                ..
            }
        ));
        assert!(storage.contains("media", "a.txt"));
    }

    #[tokio::test]
    async fn rename_moves_the_object() {
        let storage = Arc::new(MemoryStorage::new().with_object("media", "a.txt", "a"));

        let outcome = navigator(&storage)
            .rename_entry("media", "a.txt", "docs/a.txt")
            .await;
        assert!(outcome.renamed());
        assert!(!storage.contains("media", "a.txt"));
        assert!(storage.contains("media", "docs/a.txt"));
    }

    #[tokio::test]
    async fn rename_refuses_folders() {
        let storage = Arc::new(MemoryStorage::new().with_object("media", "photos/b.jpg", "b"));
        let navigator = navigator(&storage);

        assert!(matches!(
            navigator.rename_entry("media", "photos/", "pics/").await,
            RenameOutcome::Refused
        ));
        assert!(matches!(
            navigator.rename_entry("media", "..", "x").await,
            RenameOutcome::Refused
        ));
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn copy_failure_leaves_source_and_skips_delete() {
        let storage = Arc::new(MemoryStorage::new().with_object("media", "a.txt", "a"));
        storage.fail_copy();

        let outcome = navigator(&storage)
            .rename_entry("media", "a.txt", "b.txt")
            .await;
        assert!(matches!(outcome, RenameOutcome::CopyFailed(_)));
        assert!(!outcome.copied());
        assert!(storage.contains("media", "a.txt"));
        assert!(!storage.contains("media", "b.txt"));
        assert_eq!(storage.count_calls(is_delete), 0);
    }

    #[tokio::test]
    async fn delete_failure_leaves_both_keys() {
        let storage = Arc::new(MemoryStorage::new().with_object("media", "a.txt", "a"));
        storage.fail_delete();

        let outcome = navigator(&storage)
            .rename_entry("media", "a.txt", "b.txt")
            .await;
        assert!(outcome.copied());
        assert!(!outcome.renamed());
        assert!(matches!(
            outcome.error(),
            Some(Error::Mutation {
                operation: MutationKind::RenameDelete,
                ..
            })
        ));
        assert!(storage.contains("media", "a.txt"));
        assert!(storage.contains("media", "b.txt"));
        assert!(outcome.into_result().is_err());
    }

    #[tokio::test]
    async fn outcome_collapses_to_renamed_flag() {
        let storage = Arc::new(MemoryStorage::new().with_object("media", "a.txt", "a"));
        let navigator = navigator(&storage);

        let refused = navigator.rename_entry("media", "photos/", "pics/").await;
        assert!(matches!(refused.into_result(), Ok(false)));

        let completed = navigator.rename_entry("media", "a.txt", "b.txt").await;
        assert!(matches!(completed.into_result(), Ok(true)));
    }

    #[tokio::test]
    async fn creates_requested_name_when_free() {
        let storage = Arc::new(MemoryStorage::new());

        let created = navigator(&storage).create_bucket("test").await.unwrap();
        assert_eq!(
            created,
            CreatedBucket {
                original: true,
                name: "test".into()
            }
        );
        assert!(storage.has_bucket("test"));
    }

    #[tokio::test]
    async fn collision_falls_back_to_suffixed_name() {
        let storage = Arc::new(MemoryStorage::new().with_taken_name("test"));

        let created = navigator(&storage).create_bucket("test").await.unwrap();
        assert!(!created.original);

        let suffix = created.name.strip_prefix("test-").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
        assert!(storage.has_bucket(&created.name));
        assert!(!storage.has_bucket("test"));
    }

    #[tokio::test]
    async fn suffixed_name_fits_the_length_limit() {
        let name = "a".repeat(NavigatorConfig::MAX_BUCKET_NAME_LEN);
        let storage = Arc::new(MemoryStorage::new().with_taken_name(&name));

        let created = navigator(&storage).create_bucket(&name).await.unwrap();
        assert_eq!(created.name.len(), NavigatorConfig::MAX_BUCKET_NAME_LEN);
        assert!(created.name.starts_with(&"a".repeat(54)));
    }

    #[tokio::test]
    async fn persistent_failure_is_bounded() {
        let storage = Arc::new(MemoryStorage::new());
        storage.fail_create();

        let error = navigator(&storage).create_bucket("test").await.unwrap_err();
        match error {
            Error::ExhaustedRetries {
                name,
                attempts,
                last,
            } => {
                assert_eq!(name, "test");
                assert_eq!(attempts, 5);
                assert_eq!(last.kind, StorageErrorKind::InvalidRequest);
            }
            other => panic!("unexpected error: {other}"),
        }

        let creates = storage.count_calls(|call| matches!(call, Call::CreateBucket(_)));
        assert_eq!(creates, 5);
    }

    #[tokio::test]
    async fn attempt_ceiling_is_configurable() {
        let storage = Arc::new(MemoryStorage::new());
        storage.fail_create();
        let navigator = Navigator::new(
            storage.clone(),
            NavigatorConfig::default().with_max_create_attempts(2),
        );

        assert!(navigator.create_bucket("test").await.is_err());
        let creates = storage.count_calls(|call| matches!(call, Call::CreateBucket(_)));
        assert_eq!(creates, 2);
    }
}
