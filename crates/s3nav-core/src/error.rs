//! Error types for the prefix navigator.

use strum::{AsRefStr, Display, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Specialized [`Result`] type for navigator operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of failures reported by a storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum StorageErrorKind {
    /// Bucket or object does not exist.
    NotFound,
    /// Bucket name is already taken (by us or globally).
    AlreadyExists,
    /// Credentials were rejected or lack permission.
    AccessDenied,
    /// The request was malformed (invalid bucket name, bad range, ...).
    InvalidRequest,
    /// Connection, DNS or timeout failure.
    Network,
    /// Anything the backend could not classify.
    Unknown,
}

/// A structured error produced by a [`StorageClient`](crate::StorageClient).
#[derive(Debug, Error)]
#[must_use = "errors should be handled appropriately"]
#[error("{kind}{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct StorageError {
    /// The kind of failure.
    pub kind: StorageErrorKind,
    /// Optional human readable message.
    pub message: Option<String>,
    /// Optional underlying SDK error.
    #[source]
    pub source: Option<BoxedError>,
}

impl StorageError {
    /// Creates a new error with the given kind.
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_message(message)
    }

    /// Creates an already-exists error.
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::AlreadyExists).with_message(message)
    }

    /// Creates an invalid-request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::InvalidRequest).with_message(message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Network).with_message(message)
    }

    /// Returns whether the backend reported a missing resource.
    pub fn is_not_found(&self) -> bool {
        self.kind == StorageErrorKind::NotFound
    }
}

/// The mutating operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum MutationKind {
    /// Object deletion.
    Delete,
    /// Copy step of a rename.
    Copy,
    /// Delete step of a rename, after the copy committed.
    RenameDelete,
    /// Bucket creation.
    CreateBucket,
}

/// Errors surfaced by the navigator to the presentation layer.
#[derive(Debug, Error)]
#[must_use = "errors should be handled appropriately"]
pub enum Error {
    /// A listing call failed; no partial listing is returned.
    #[error("failed to list '{bucket}/{prefix}': {source}")]
    Listing {
        /// Bucket being listed, empty for the bucket list itself.
        bucket: String,
        /// Prefix being listed.
        prefix: String,
        /// Backend failure.
        #[source]
        source: StorageError,
    },

    /// A delete, copy or create call failed.
    #[error("{operation} of '{target}' failed: {source}")]
    Mutation {
        /// Which step failed.
        operation: MutationKind,
        /// Key or bucket name the operation targeted.
        target: String,
        /// Backend failure.
        #[source]
        source: StorageError,
    },

    /// Fetching object metadata or bytes for a preview failed.
    #[error("cannot preview '{key}': {source}")]
    Preview {
        /// Key being previewed.
        key: String,
        /// Backend failure.
        #[source]
        source: StorageError,
    },

    /// Bucket creation ran out of attempts.
    #[error("could not create bucket '{name}' after {attempts} attempts: {last}")]
    ExhaustedRetries {
        /// Requested bucket name.
        name: String,
        /// Number of create calls issued.
        attempts: usize,
        /// The error returned by the final attempt.
        #[source]
        last: StorageError,
    },

    /// The intent requires a selected bucket.
    #[error("no bucket selected")]
    NoBucketSelected,

    /// The intent carried an unusable argument.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Returns the storage error behind this failure, if any.
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            Error::Listing { source, .. }
            | Error::Mutation { source, .. }
            | Error::Preview { source, .. } => Some(source),
            Error::ExhaustedRetries { last, .. } => Some(last),
            Error::NoBucketSelected | Error::InvalidInput(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_display_includes_kind_and_message() {
        let error = StorageError::not_found("media/a.txt");
        assert_eq!(error.to_string(), "not_found: media/a.txt");

        let bare = StorageError::new(StorageErrorKind::Network);
        assert_eq!(bare.to_string(), "network");
    }

    #[test]
    fn mutation_error_names_the_step() {
        let error = Error::Mutation {
            operation: MutationKind::RenameDelete,
            target: "a.txt".into(),
            source: StorageError::new(StorageErrorKind::AccessDenied),
        };
        assert!(error.to_string().starts_with("rename_delete of 'a.txt'"));
        assert_eq!(
            error.storage_error().map(|e| e.kind),
            Some(StorageErrorKind::AccessDenied)
        );
    }

    #[test]
    fn state_errors_have_no_storage_source() {
        assert!(Error::NoBucketSelected.storage_error().is_none());
        assert!(Error::InvalidInput("x".into()).storage_error().is_none());
    }
}
