//! Object preview.

use std::fmt;

use bytes::Bytes;
use tracing::{debug, error, instrument};

use super::Navigator;
use crate::client::StorageClient;
use crate::{Error, Result, TRACING_TARGET_PREVIEW};

/// Shown instead of bytes that are not valid UTF-8.
pub const BINARY_PLACEHOLDER: &str = "Cannot preview binary file";

/// Shown for objects in an archival storage tier.
pub const ARCHIVED_PLACEHOLDER: &str =
    "Cannot view a file stored in Glacier. Please restore the file if you wish to view.";

/// Content of the preview pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// Leading bytes of a text object, verbatim.
    Text(String),
    /// The object is not text.
    Binary,
    /// The object must be restored before it can be read.
    Archived,
    /// Metadata or content could not be fetched.
    Unavailable(String),
}

impl Preview {
    /// Classifies the complete content of an object.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::Text(text.to_string()),
            Err(_) => Self::Binary,
        }
    }

    /// Classifies the leading bytes of an object.
    ///
    /// When `truncated`, a multi-byte character cut off by the fetch cap at
    /// the very end is dropped rather than turning the whole preview into a
    /// binary placeholder. Otherwise this is [`Preview::from_bytes`].
    pub fn from_prefix(bytes: &[u8], truncated: bool) -> Self {
        if !truncated {
            return Self::from_bytes(bytes);
        }

        match std::str::from_utf8(bytes) {
            Ok(text) => Self::Text(text.to_string()),
            Err(e) if e.error_len().is_none() => Self::from_bytes(&bytes[..e.valid_up_to()]),
            Err(_) => Self::Binary,
        }
    }
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Binary => f.write_str(BINARY_PLACEHOLDER),
            Self::Archived => f.write_str(ARCHIVED_PLACEHOLDER),
            Self::Unavailable(message) => write!(f, "Preview unavailable: {message}"),
        }
    }
}

/// Renders fetched bytes for display.
///
/// Valid UTF-8 is returned verbatim, anything else becomes
/// [`BINARY_PLACEHOLDER`].
pub fn classify_and_render(bytes: &[u8]) -> String {
    Preview::from_bytes(bytes).to_string()
}

impl<C> Navigator<C>
where
    C: StorageClient + ?Sized,
{
    /// Returns whether the object lives in an archival tier.
    #[instrument(skip(self), target = TRACING_TARGET_PREVIEW)]
    pub async fn is_glacier_stored(&self, bucket: &str, key: &str) -> Result<bool> {
        let head = self
            .client
            .head_object(bucket, key)
            .await
            .map_err(|source| preview_error(key, source))?;

        debug!(
            target: TRACING_TARGET_PREVIEW,
            key = %key,
            storage_class = %head.storage_class,
            "Object metadata fetched"
        );

        Ok(head.storage_class.is_archival())
    }

    /// Fetches the leading `preview_bytes` bytes of an object.
    #[instrument(skip(self), target = TRACING_TARGET_PREVIEW)]
    pub async fn preview_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let start = std::time::Instant::now();
        let end = self.config.preview_bytes.saturating_sub(1);

        let bytes = self
            .client
            .get_object_range(bucket, key, 0, end)
            .await
            .map_err(|source| preview_error(key, source))?;

        debug!(
            target: TRACING_TARGET_PREVIEW,
            key = %key,
            len = bytes.len(),
            elapsed = ?start.elapsed(),
            "Preview fetched"
        );

        Ok(bytes)
    }

    /// Builds what the preview pane shows for an object.
    ///
    /// Never fails: storage errors become [`Preview::Unavailable`] so a
    /// broken preview cannot block navigation.
    pub async fn preview(&self, bucket: &str, key: &str) -> Preview {
        match self.try_preview(bucket, key).await {
            Ok(preview) => preview,
            Err(e) => {
                error!(
                    target: TRACING_TARGET_PREVIEW,
                    bucket = %bucket,
                    key = %key,
                    error = %e,
                    "Preview failed"
                );
                Preview::Unavailable(e.to_string())
            }
        }
    }

    async fn try_preview(&self, bucket: &str, key: &str) -> Result<Preview> {
        let head = self
            .client
            .head_object(bucket, key)
            .await
            .map_err(|source| preview_error(key, source))?;

        if head.storage_class.is_archival() {
            return Ok(Preview::Archived);
        }

        // Ranged reads of an empty object are rejected by S3.
        if head.size == Some(0) {
            return Ok(Preview::Text(String::new()));
        }

        let bytes = self.preview_object(bucket, key).await?;
        let fetched = bytes.len() as u64;
        let truncated = fetched == self.config.preview_bytes
            && head.size.is_none_or(|size| size > fetched);
        Ok(Preview::from_prefix(&bytes, truncated))
    }
}

fn preview_error(key: &str, source: crate::StorageError) -> Error {
    Error::Preview {
        key: key.to_string(),
        source,
    }
}
