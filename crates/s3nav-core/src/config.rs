//! Navigator configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::entry::DEFAULT_DELIMITER;
use crate::{Error, Result};

/// Tunables of the prefix navigator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct NavigatorConfig {
    /// Separator used to group keys into folders.
    #[cfg_attr(
        feature = "config",
        arg(long = "delimiter", env = "S3NAV_DELIMITER", default_value = "/")
    )]
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Length of the random suffix appended to a colliding bucket name.
    #[cfg_attr(
        feature = "config",
        arg(long = "bucket-suffix-length", env = "S3NAV_BUCKET_SUFFIX_LENGTH", default_value_t = 8)
    )]
    #[serde(default = "default_suffix_length")]
    pub suffix_length: usize,

    /// Maximum number of create calls issued for one bucket request.
    #[cfg_attr(
        feature = "config",
        arg(long = "max-create-attempts", env = "S3NAV_MAX_CREATE_ATTEMPTS", default_value_t = 5)
    )]
    #[serde(default = "default_max_create_attempts")]
    pub max_create_attempts: usize,

    /// Number of leading bytes fetched for a preview.
    #[cfg_attr(
        feature = "config",
        arg(long = "preview-bytes", env = "S3NAV_PREVIEW_BYTES", default_value_t = 1001)
    )]
    #[serde(default = "default_preview_bytes")]
    pub preview_bytes: u64,
}

impl NavigatorConfig {
    /// Longest bucket name accepted by S3.
    pub const MAX_BUCKET_NAME_LEN: usize = 63;

    /// Sets the random suffix length.
    pub fn with_suffix_length(mut self, suffix_length: usize) -> Self {
        self.suffix_length = suffix_length;
        self
    }

    /// Sets the maximum number of create attempts.
    pub fn with_max_create_attempts(mut self, attempts: usize) -> Self {
        self.max_create_attempts = attempts;
        self
    }

    /// Sets the preview size in bytes.
    pub fn with_preview_bytes(mut self, bytes: u64) -> Self {
        self.preview_bytes = bytes;
        self
    }

    /// Longest user-supplied bucket name that still fits once suffixed.
    pub fn max_base_name_len(&self) -> usize {
        Self::MAX_BUCKET_NAME_LEN.saturating_sub(self.suffix_length + 1)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.delimiter.is_empty() {
            return Err(Error::InvalidInput("delimiter cannot be empty".into()));
        }

        if self.suffix_length == 0 {
            return Err(Error::InvalidInput(
                "bucket suffix length must be greater than zero".into(),
            ));
        }

        if self.suffix_length + 2 > Self::MAX_BUCKET_NAME_LEN {
            return Err(Error::InvalidInput(format!(
                "bucket suffix length {} leaves no room for a name",
                self.suffix_length
            )));
        }

        if self.max_create_attempts == 0 {
            return Err(Error::InvalidInput(
                "max create attempts must be greater than zero".into(),
            ));
        }

        if self.preview_bytes == 0 {
            return Err(Error::InvalidInput(
                "preview bytes must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            suffix_length: default_suffix_length(),
            max_create_attempts: default_max_create_attempts(),
            preview_bytes: default_preview_bytes(),
        }
    }
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

const fn default_suffix_length() -> usize {
    8
}

const fn default_max_create_attempts() -> usize {
    5
}

const fn default_preview_bytes() -> u64 {
    1001
}
