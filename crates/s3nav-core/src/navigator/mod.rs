//! The prefix navigator.
//!
//! [`Navigator`] turns a flat, paginated key listing into a directory tree a
//! user can walk, and keeps the [`NavigationState`] consistent across
//! mutations. Every operation that takes `&mut NavigationState` either
//! succeeds and replaces the affected fields wholesale, or fails and leaves
//! the state exactly as it was.

mod listing;
mod mutation;
mod preview;

use std::sync::Arc;

use tracing::{debug, instrument};

pub use self::mutation::{CreatedBucket, RenameOutcome, random_suffix};
pub use self::preview::{ARCHIVED_PLACEHOLDER, BINARY_PLACEHOLDER, Preview, classify_and_render};
use crate::client::StorageClient;
use crate::entry::{EntryKind, label_kind};
use crate::path::parent_prefix;
use crate::state::NavigationState;
use crate::{Error, NavigatorConfig, Result, TRACING_TARGET_NAVIGATOR};

/// What selecting a label did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The prefix changed and the listing was recomputed.
    Navigated,
    /// The label is an object; the prefix is unchanged.
    Previewed {
        /// Key of the previewed object.
        key: String,
        /// What the preview pane should show.
        preview: Preview,
    },
}

/// Navigates an S3-compatible store through a [`StorageClient`].
pub struct Navigator<C: ?Sized> {
    client: Arc<C>,
    config: NavigatorConfig,
}

impl<C: ?Sized> Clone for Navigator<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            config: self.config.clone(),
        }
    }
}

impl<C> Navigator<C>
where
    C: StorageClient + ?Sized,
{
    /// Creates a navigator over `client`.
    pub fn new(client: Arc<C>, config: NavigatorConfig) -> Self {
        Self { client, config }
    }

    /// Returns the storage client.
    #[inline]
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Returns the navigator configuration.
    #[inline]
    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Returns the key delimiter.
    #[inline]
    pub fn delimiter(&self) -> &str {
        &self.config.delimiter
    }

    /// Builds the start-up state from a full bucket listing.
    pub async fn initial_state(&self) -> Result<NavigationState> {
        let buckets = self.list_buckets().await?;
        debug!(
            target: TRACING_TARGET_NAVIGATOR,
            count = buckets.len(),
            "Navigator initialized"
        );
        Ok(NavigationState::with_buckets(buckets))
    }

    /// Re-lists buckets into `state.bucket_names`.
    pub async fn reload_buckets(&self, state: &mut NavigationState) -> Result<()> {
        state.bucket_names = self.list_buckets().await?;
        Ok(())
    }

    /// Selects `bucket` and lists its root.
    #[instrument(skip(self, state), target = TRACING_TARGET_NAVIGATOR)]
    pub async fn open_bucket(&self, state: &mut NavigationState, bucket: &str) -> Result<()> {
        if bucket.is_empty() {
            return Err(Error::InvalidInput("bucket name cannot be empty".into()));
        }

        let entries = self.list_directory(bucket, self.delimiter(), "").await?;
        state.bucket = Some(bucket.to_string());
        state.replace_listing(String::new(), entries);
        Ok(())
    }

    /// Acts on a label from the current listing.
    ///
    /// `..` moves to the parent of the current prefix and a folder label
    /// becomes the new prefix verbatim; both recompute the listing. Any
    /// other label is an object and is previewed without moving.
    #[instrument(skip(self, state), target = TRACING_TARGET_NAVIGATOR, fields(prefix = %state.prefix))]
    pub async fn descend(&self, state: &mut NavigationState, label: &str) -> Result<Selection> {
        let bucket = state.bucket.clone().ok_or(Error::NoBucketSelected)?;
        let delimiter = self.delimiter();

        let prefix = match label_kind(label, delimiter) {
            None => return Err(Error::InvalidInput("label cannot be empty".into())),
            Some(EntryKind::UpDir) => parent_prefix(&state.prefix, delimiter),
            Some(EntryKind::Folder) => label.to_string(),
            Some(EntryKind::Object) => {
                let preview = self.preview(&bucket, label).await;
                return Ok(Selection::Previewed {
                    key: label.to_string(),
                    preview,
                });
            }
        };

        let entries = self.list_directory(&bucket, delimiter, &prefix).await?;
        debug!(
            target: TRACING_TARGET_NAVIGATOR,
            from = %state.prefix,
            to = %prefix,
            "Prefix changed"
        );
        state.replace_listing(prefix, entries);
        Ok(Selection::Navigated)
    }

    /// Re-lists `prefix` of the selected bucket into `state`.
    pub async fn list_into(&self, state: &mut NavigationState, prefix: String) -> Result<()> {
        let bucket = state.bucket.clone().ok_or(Error::NoBucketSelected)?;
        let entries = self.list_directory(&bucket, self.delimiter(), &prefix).await?;
        state.replace_listing(prefix, entries);
        Ok(())
    }

    /// Recomputes whatever the state currently shows.
    pub async fn refresh(&self, state: &mut NavigationState) -> Result<()> {
        if state.at_bucket_level() {
            self.reload_buckets(state).await
        } else {
            let prefix = state.prefix.clone();
            self.list_into(state, prefix).await
        }
    }

    /// Returns focus to the bucket list.
    pub fn go_bucket_root(&self, state: &mut NavigationState) {
        debug!(
            target: TRACING_TARGET_NAVIGATOR,
            bucket = ?state.bucket,
            "Leaving bucket"
        );
        state.leave_bucket();
    }
}
