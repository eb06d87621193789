//! Navigation state owned by the presentation layer.

use crate::entry::Entry;

/// The navigator's only mutable state.
///
/// Created once at start-up and threaded through every navigator call.
/// `entries` is always replaced wholesale, never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    /// Selected bucket, `None` while focus is on the bucket list.
    pub bucket: Option<String>,
    /// Current prefix within the bucket; empty means bucket root.
    pub prefix: String,
    /// Listing of `(bucket, prefix)`.
    pub entries: Vec<Entry>,
    /// Every bucket name, kept for search restoration.
    pub bucket_names: Vec<String>,
    /// Labels of `entries`, kept for search restoration.
    pub file_labels: Vec<String>,
}

impl NavigationState {
    /// Creates a state focused on the bucket list.
    pub fn with_buckets(bucket_names: Vec<String>) -> Self {
        Self {
            bucket_names,
            ..Self::default()
        }
    }

    /// Returns the selected bucket.
    #[inline]
    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    /// Returns whether focus is on the bucket list.
    #[inline]
    pub fn at_bucket_level(&self) -> bool {
        self.bucket.is_none()
    }

    /// Finds an entry by label.
    pub fn entry(&self, label: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.label() == label)
    }

    /// Replaces the listing and its label mirror.
    pub(crate) fn replace_listing(&mut self, prefix: String, entries: Vec<Entry>) {
        self.file_labels = entries.iter().map(|e| e.label().to_string()).collect();
        self.prefix = prefix;
        self.entries = entries;
    }

    /// Drops the bucket selection and its listing.
    pub(crate) fn leave_bucket(&mut self) {
        self.bucket = None;
        self.prefix.clear();
        self.entries.clear();
        self.file_labels.clear();
    }
}
