//! User intents and the single dispatcher that applies them.
//!
//! The presentation layer owns the [`NavigationState`] and hands it to
//! [`Navigator::handle`] with one [`Intent`] at a time. The state always
//! comes back inside the [`Transition`]: updated on success, unchanged when
//! `outcome` is an error.

use tracing::{debug, warn};

use crate::client::StorageClient;
use crate::navigator::{CreatedBucket, Navigator, Preview, RenameOutcome, Selection};
use crate::path::containing_prefix;
use crate::search::{self, resolve_pick};
use crate::state::NavigationState;
use crate::{Error, Result, TRACING_TARGET_NAVIGATOR};

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Open a bucket from the bucket list.
    SelectBucket(String),
    /// Select a label: a bucket at bucket level, otherwise an entry.
    Select(String),
    /// Delete an object.
    Delete(String),
    /// Rename an object.
    Rename {
        /// Existing key.
        from: String,
        /// New key.
        to: String,
    },
    /// Create a bucket.
    CreateBucket(String),
    /// Filter the focused list.
    Search(String),
    /// End a search and restore the canonical list.
    ClearSearch,
    /// Select a label chosen from a filtered view.
    Pick(String),
    /// Return to the bucket list.
    GoBucketRoot,
    /// Recompute the focused list.
    Refresh,
}

/// What a successful intent produced, beyond the new state.
#[derive(Debug)]
pub enum Outcome {
    /// A bucket was opened.
    BucketOpened,
    /// The prefix changed.
    Navigated,
    /// An object was selected.
    Previewed {
        /// Selected key.
        key: String,
        /// Preview pane content.
        preview: Preview,
    },
    /// An object was deleted and its directory re-listed.
    Deleted {
        /// Deleted key.
        key: String,
        /// Failure of the follow-up listing; the previous view is kept.
        refresh: Option<Error>,
    },
    /// The target was a folder or `..`; nothing changed.
    Refused {
        /// Rejected label.
        label: String,
    },
    /// An object was renamed and its old directory re-listed.
    Renamed {
        /// Old key.
        from: String,
        /// New key.
        to: String,
        /// Failure of the follow-up listing; the previous view is kept.
        refresh: Option<Error>,
    },
    /// The copy committed but the old key could not be removed; both exist.
    RenameIncomplete {
        /// Old key, still present.
        from: String,
        /// New key, now present.
        to: String,
        /// Failure of the delete step.
        error: Error,
        /// Failure of the follow-up listing; the previous view is kept.
        refresh: Option<Error>,
    },
    /// A bucket was created and the bucket list re-read.
    BucketCreated(CreatedBucket),
    /// Filtered view of the focused list.
    Filtered(Vec<String>),
    /// The canonical list, after a search ended.
    Restored(Vec<String>),
    /// Focus moved back to the bucket list.
    AtBucketRoot,
    /// The focused list was recomputed.
    Refreshed,
}

/// Result of handling one intent.
#[derive(Debug)]
#[must_use]
pub struct Transition {
    /// State after the intent.
    pub state: NavigationState,
    /// What happened.
    pub outcome: Result<Outcome>,
}

impl<C> Navigator<C>
where
    C: StorageClient + ?Sized,
{
    /// Applies `intent` to `state`.
    pub async fn handle(&self, mut state: NavigationState, intent: Intent) -> Transition {
        debug!(target: TRACING_TARGET_NAVIGATOR, intent = ?intent, "Handling intent");
        let outcome = self.apply(&mut state, intent).await;
        Transition { state, outcome }
    }

    async fn apply(&self, state: &mut NavigationState, intent: Intent) -> Result<Outcome> {
        match intent {
            Intent::SelectBucket(name) => {
                self.open_bucket(state, &name).await?;
                Ok(Outcome::BucketOpened)
            }
            Intent::Select(label) => self.apply_select(state, &label).await,
            Intent::Delete(label) => self.apply_delete(state, label).await,
            Intent::Rename { from, to } => self.apply_rename(state, from, to).await,
            Intent::CreateBucket(name) => self.apply_create(state, &name).await,
            Intent::Search(query) => {
                let labels = focused_labels(state);
                Ok(Outcome::Filtered(search::filter(&query, labels)))
            }
            Intent::ClearSearch => Ok(Outcome::Restored(focused_labels(state).to_vec())),
            Intent::Pick(label) => {
                let labels = focused_labels(state);
                let index = resolve_pick(labels, &label).ok_or_else(|| {
                    Error::InvalidInput(format!("'{label}' is not in the current list"))
                })?;
                let canonical = labels[index].clone();
                self.apply_select(state, &canonical).await
            }
            Intent::GoBucketRoot => {
                self.go_bucket_root(state);
                Ok(Outcome::AtBucketRoot)
            }
            Intent::Refresh => {
                self.refresh(state).await?;
                Ok(Outcome::Refreshed)
            }
        }
    }

    async fn apply_select(&self, state: &mut NavigationState, label: &str) -> Result<Outcome> {
        if state.at_bucket_level() {
            self.open_bucket(state, label).await?;
            return Ok(Outcome::BucketOpened);
        }

        match self.descend(state, label).await? {
            Selection::Navigated => Ok(Outcome::Navigated),
            Selection::Previewed { key, preview } => Ok(Outcome::Previewed { key, preview }),
        }
    }

    async fn apply_delete(&self, state: &mut NavigationState, label: String) -> Result<Outcome> {
        let bucket = state.bucket.clone().ok_or(Error::NoBucketSelected)?;

        if !self.delete_entry(&bucket, &label).await? {
            return Ok(Outcome::Refused { label });
        }

        let prefix = containing_prefix(&label, self.delimiter());
        let refresh = self.relist_after_mutation(state, prefix).await;
        Ok(Outcome::Deleted {
            key: label,
            refresh,
        })
    }

    async fn apply_rename(
        &self,
        state: &mut NavigationState,
        from: String,
        to: String,
    ) -> Result<Outcome> {
        let bucket = state.bucket.clone().ok_or(Error::NoBucketSelected)?;
        let outcome = self.rename_entry(&bucket, &from, &to).await;
        let prefix = containing_prefix(&from, self.delimiter());

        match outcome {
            RenameOutcome::Refused => Ok(Outcome::Refused { label: from }),
            RenameOutcome::CopyFailed(e) => Err(e),
            RenameOutcome::Completed => {
                let refresh = self.relist_after_mutation(state, prefix).await;
                Ok(Outcome::Renamed { from, to, refresh })
            }
            RenameOutcome::DeleteFailed(error) => {
                let refresh = self.relist_after_mutation(state, prefix).await;
                Ok(Outcome::RenameIncomplete {
                    from,
                    to,
                    error,
                    refresh,
                })
            }
        }
    }

    /// Re-lists `prefix` once a mutation has committed.
    ///
    /// The mutation stands even when the listing fails, so the error is
    /// handed back alongside the outcome and the previous view is kept.
    async fn relist_after_mutation(
        &self,
        state: &mut NavigationState,
        prefix: String,
    ) -> Option<Error> {
        let error = self.list_into(state, prefix).await.err()?;
        warn!(
            target: TRACING_TARGET_NAVIGATOR,
            bucket = ?state.bucket,
            prefix = %state.prefix,
            error = %error,
            "Mutation committed but the listing could not be refreshed"
        );
        Some(error)
    }

    async fn apply_create(&self, state: &mut NavigationState, name: &str) -> Result<Outcome> {
        let created = self.create_bucket(name).await?;

        if let Err(e) = self.reload_buckets(state).await {
            warn!(
                target: TRACING_TARGET_NAVIGATOR,
                bucket = %created.name,
                error = %e,
                "Bucket created but the bucket list could not be reloaded"
            );
            if !state.bucket_names.contains(&created.name) {
                state.bucket_names.push(created.name.clone());
            }
        }

        Ok(Outcome::BucketCreated(created))
    }
}

/// The canonical labels of whichever list has focus.
fn focused_labels(state: &NavigationState) -> &[String] {
    if state.at_bucket_level() {
        &state.bucket_names
    } else {
        &state.file_labels
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::NavigatorConfig;
    use crate::mock::MemoryStorage;

    fn media() -> Arc<MemoryStorage> {
        Arc::new(
            MemoryStorage::new()
                .with_bucket("archive")
                .with_object("media", "a.txt", "hello")
                .with_object("media", "photos/b.jpg", "b")
                .with_object("media", "photos/c.jpg", "c"),
        )
    }

    async fn opened(navigator: &Navigator<MemoryStorage>) -> NavigationState {
        let state = navigator.initial_state().await.unwrap();
        let transition = navigator
            .handle(state, Intent::SelectBucket("media".into()))
            .await;
        assert!(matches!(transition.outcome, Ok(Outcome::BucketOpened)));
        transition.state
    }

    fn labels(state: &NavigationState) -> Vec<&str> {
        state.entries.iter().map(|e| e.label()).collect()
    }

    #[tokio::test]
    async fn select_at_bucket_level_opens_the_bucket() {
        let navigator = Navigator::new(media(), NavigatorConfig::default());
        let state = navigator.initial_state().await.unwrap();

        let transition = navigator.handle(state, Intent::Select("media".into())).await;
        assert!(transition.outcome.is_ok());
        assert_eq!(transition.state.bucket(), Some("media"));
        assert_eq!(labels(&transition.state), vec!["photos/", "a.txt"]);
    }

    #[tokio::test]
    async fn delete_refreshes_containing_directory() {
        let storage = media();
        let navigator = Navigator::new(storage.clone(), NavigatorConfig::default());
        let state = opened(&navigator).await;
        let state = navigator
            .handle(state, Intent::Select("photos/".into()))
            .await
            .state;

        let transition = navigator
            .handle(state, Intent::Delete("photos/b.jpg".into()))
            .await;
        assert!(matches!(
            transition.outcome,
            Ok(Outcome::Deleted { refresh: None, .. })
        ));
        assert_eq!(labels(&transition.state), vec!["..", "photos/c.jpg"]);
        assert!(!storage.contains("media", "photos/b.jpg"));
    }

    #[tokio::test]
    async fn deleting_a_folder_is_refused() {
        let navigator = Navigator::new(media(), NavigatorConfig::default());
        let state = opened(&navigator).await;
        let before = state.clone();

        let transition = navigator.handle(state, Intent::Delete("photos/".into())).await;
        assert!(matches!(transition.outcome, Ok(Outcome::Refused { .. })));
        assert_eq!(transition.state, before);
    }

    #[tokio::test]
    async fn failed_delete_keeps_previous_state() {
        let storage = media();
        let navigator = Navigator::new(storage.clone(), NavigatorConfig::default());
        let state = opened(&navigator).await;
        let before = state.clone();
        storage.fail_delete();

        let transition = navigator.handle(state, Intent::Delete("a.txt".into())).await;
        assert!(transition.outcome.is_err());
        assert_eq!(transition.state, before);
    }

    #[tokio::test]
    async fn rename_relists_old_directory() {
        let navigator = Navigator::new(media(), NavigatorConfig::default());
        let state = opened(&navigator).await;

        let transition = navigator
            .handle(
                state,
                Intent::Rename {
                    from: "a.txt".into(),
                    to: "photos/a.txt".into(),
                },
            )
            .await;
        assert!(matches!(transition.outcome, Ok(Outcome::Renamed { .. })));
        assert_eq!(transition.state.prefix, "");
        assert_eq!(labels(&transition.state), vec!["photos/"]);
    }

    #[tokio::test]
    async fn incomplete_rename_shows_both_keys() {
        let storage = media();
        let navigator = Navigator::new(storage.clone(), NavigatorConfig::default());
        let state = opened(&navigator).await;
        storage.fail_delete();

        let transition = navigator
            .handle(
                state,
                Intent::Rename {
                    from: "a.txt".into(),
                    to: "b.txt".into(),
                },
            )
            .await;
        assert!(matches!(
            transition.outcome,
            Ok(Outcome::RenameIncomplete { .. })
        ));
        assert_eq!(labels(&transition.state), vec!["photos/", "a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn delete_survives_a_failed_refresh() {
        let storage = media();
        let navigator = Navigator::new(storage.clone(), NavigatorConfig::default());
        let state = opened(&navigator).await;
        let before = state.clone();
        storage.fail_listing_at_page(0);

        let transition = navigator.handle(state, Intent::Delete("a.txt".into())).await;
        match transition.outcome {
            Ok(Outcome::Deleted { key, refresh }) => {
                assert_eq!(key, "a.txt");
                assert!(matches!(refresh, Some(Error::Listing { .. })));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!storage.contains("media", "a.txt"));
        assert_eq!(transition.state, before);
    }

    #[tokio::test]
    async fn incomplete_rename_is_reported_when_refresh_fails() {
        let storage = media();
        let navigator = Navigator::new(storage.clone(), NavigatorConfig::default());
        let state = opened(&navigator).await;
        storage.fail_delete();
        storage.fail_listing_at_page(0);

        let transition = navigator
            .handle(
                state,
                Intent::Rename {
                    from: "a.txt".into(),
                    to: "b.txt".into(),
                },
            )
            .await;
        match transition.outcome {
            Ok(Outcome::RenameIncomplete { error, refresh, .. }) => {
                assert!(matches!(error, Error::Mutation { .. }));
                assert!(matches!(refresh, Some(Error::Listing { .. })));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(storage.contains("media", "a.txt"));
        assert!(storage.contains("media", "b.txt"));
    }

    #[tokio::test]
    async fn completed_rename_is_reported_when_refresh_fails() {
        let storage = media();
        let navigator = Navigator::new(storage.clone(), NavigatorConfig::default());
        let state = opened(&navigator).await;
        storage.fail_listing_at_page(0);

        let transition = navigator
            .handle(
                state,
                Intent::Rename {
                    from: "a.txt".into(),
                    to: "b.txt".into(),
                },
            )
            .await;
        assert!(matches!(
            transition.outcome,
            Ok(Outcome::Renamed {
                refresh: Some(Error::Listing { .. }),
                ..
            })
        ));
        assert!(storage.contains("media", "b.txt"));
    }

    #[tokio::test]
    async fn create_bucket_reloads_bucket_names() {
        let navigator = Navigator::new(media(), NavigatorConfig::default());
        let state = navigator.initial_state().await.unwrap();

        let transition = navigator
            .handle(state, Intent::CreateBucket("logs".into()))
            .await;
        assert!(matches!(transition.outcome, Ok(Outcome::BucketCreated(_))));
        assert_eq!(transition.state.bucket_names, vec!["archive", "logs", "media"]);
    }

    #[tokio::test]
    async fn search_targets_the_focused_list() {
        let navigator = Navigator::new(media(), NavigatorConfig::default());
        let state = navigator.initial_state().await.unwrap();

        let transition = navigator.handle(state, Intent::Search("med".into())).await;
        match transition.outcome {
            Ok(Outcome::Filtered(view)) => assert_eq!(view, vec!["media"]),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let state = navigator
            .handle(transition.state, Intent::SelectBucket("media".into()))
            .await
            .state;
        let transition = navigator.handle(state, Intent::Search("txt".into())).await;
        match transition.outcome {
            Ok(Outcome::Filtered(view)) => assert_eq!(view, vec!["a.txt"]),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let transition = navigator.handle(transition.state, Intent::ClearSearch).await;
        match transition.outcome {
            Ok(Outcome::Restored(view)) => assert_eq!(view, vec!["photos/", "a.txt"]),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn pick_selects_the_canonical_entry() {
        let navigator = Navigator::new(media(), NavigatorConfig::default());
        let state = opened(&navigator).await;

        let transition = navigator.handle(state, Intent::Pick("photos/".into())).await;
        assert!(matches!(transition.outcome, Ok(Outcome::Navigated)));
        assert_eq!(transition.state.prefix, "photos/");

        let transition = navigator
            .handle(transition.state, Intent::Pick("nope".into()))
            .await;
        assert!(matches!(transition.outcome, Err(Error::InvalidInput(_))));
        assert_eq!(transition.state.prefix, "photos/");
    }

    #[tokio::test]
    async fn go_bucket_root_then_refresh() {
        let navigator = Navigator::new(media(), NavigatorConfig::default());
        let state = opened(&navigator).await;

        let transition = navigator.handle(state, Intent::GoBucketRoot).await;
        assert!(matches!(transition.outcome, Ok(Outcome::AtBucketRoot)));
        assert!(transition.state.at_bucket_level());

        let transition = navigator.handle(transition.state, Intent::Refresh).await;
        assert!(matches!(transition.outcome, Ok(Outcome::Refreshed)));
        assert_eq!(transition.state.bucket_names, vec!["archive", "media"]);
    }

    #[tokio::test]
    async fn mutations_need_a_bucket() {
        let navigator = Navigator::new(media(), NavigatorConfig::default());
        let state = navigator.initial_state().await.unwrap();

        let transition = navigator.handle(state, Intent::Delete("a.txt".into())).await;
        assert!(matches!(transition.outcome, Err(Error::NoBucketSelected)));
    }
}
