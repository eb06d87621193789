//! Rows of the navigable listing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel label of the entry that moves one level up.
pub const UP_DIR: &str = "..";

/// Separator used to derive folders from flat keys.
pub const DEFAULT_DELIMITER: &str = "/";

/// What an [`Entry`] stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// The `..` sentinel.
    UpDir,
    /// A common prefix ending in the delimiter.
    Folder,
    /// An object key.
    Object,
}

/// One row of a directory listing.
///
/// The kind is always derived from the label, so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    label: String,
    kind: EntryKind,
}

impl Entry {
    /// The `..` entry.
    pub fn up_dir() -> Self {
        Self {
            label: UP_DIR.to_string(),
            kind: EntryKind::UpDir,
        }
    }

    /// Classifies a label using `delimiter`.
    ///
    /// Returns `None` for the empty label, which never appears in a listing.
    pub fn classify(label: impl Into<String>, delimiter: &str) -> Option<Self> {
        let label = label.into();
        let kind = match label_kind(&label, delimiter)? {
            EntryKind::UpDir => return Some(Self::up_dir()),
            kind => kind,
        };
        Some(Self { label, kind })
    }

    /// Returns the display label.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the entry kind.
    #[inline]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Returns whether this entry is an object key.
    #[inline]
    pub fn is_object(&self) -> bool {
        self.kind == EntryKind::Object
    }

    /// Returns whether this entry is a folder or the `..` sentinel.
    #[inline]
    pub fn is_protected(&self) -> bool {
        !self.is_object()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Classifies a raw label without allocating an [`Entry`].
pub fn label_kind(label: &str, delimiter: &str) -> Option<EntryKind> {
    if label.is_empty() {
        None
    } else if label == UP_DIR {
        Some(EntryKind::UpDir)
    } else if !delimiter.is_empty() && label.ends_with(delimiter) {
        Some(EntryKind::Folder)
    } else {
        Some(EntryKind::Object)
    }
}

/// Returns whether a label may not be deleted or renamed.
///
/// Folders are synthetic and the `..` sentinel is not an object, so both are
/// rejected before any storage call is made. The empty label is treated the
/// same way since it can never name an object.
pub fn is_protected_label(label: &str, delimiter: &str) -> bool {
    !matches!(label_kind(label, delimiter), Some(EntryKind::Object))
}
