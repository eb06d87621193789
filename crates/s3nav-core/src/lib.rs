#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for prefix changes and intent dispatch.
pub const TRACING_TARGET_NAVIGATOR: &str = "s3nav_core::navigator";

/// Tracing target for directory and bucket listings.
pub const TRACING_TARGET_LISTING: &str = "s3nav_core::listing";

/// Tracing target for delete, rename and bucket creation.
pub const TRACING_TARGET_MUTATION: &str = "s3nav_core::mutation";

/// Tracing target for object previews.
pub const TRACING_TARGET_PREVIEW: &str = "s3nav_core::preview";

mod config;
mod error;
mod intent;
mod navigator;
mod state;

pub mod busy;
pub mod client;
pub mod entry;
pub mod path;
pub mod search;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

// Re-export key types for convenience
pub use crate::client::{
    BucketSummary, ListPage, ListRequest, ObjectHead, ObjectSummary, StorageClass, StorageClient,
};
pub use crate::config::NavigatorConfig;
pub use crate::entry::{Entry, EntryKind};
pub use crate::error::{BoxedError, Error, MutationKind, Result, StorageError, StorageErrorKind};
pub use crate::intent::{Intent, Outcome, Transition};
pub use crate::navigator::{
    ARCHIVED_PLACEHOLDER, BINARY_PLACEHOLDER, CreatedBucket, Navigator, Preview, RenameOutcome,
    Selection, classify_and_render, random_suffix,
};
pub use crate::state::NavigationState;
