//! S3 client configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use super::s3_credentials::S3Credentials;
use crate::{Error, Result};

/// Everything needed to build an [`S3Client`](crate::S3Client).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// Service endpoint, e.g. `https://s3.amazonaws.com`.
    pub endpoint: Url,

    /// Authentication credentials.
    pub credentials: S3Credentials,

    /// Signing region. `None` lets the SDK discover it per bucket.
    pub region: Option<String>,

    /// Forces path-style requests (`endpoint/bucket/key`). When unset the SDK
    /// picks the addressing style from the endpoint host.
    pub path_style: bool,
}

impl S3Config {
    /// Creates a configuration for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the endpoint is not `https` or has no host.
    ///
    /// ```rust
    /// use s3nav_storage::{S3Config, S3Credentials};
    /// use url::Url;
    ///
    /// let endpoint = Url::parse("https://s3.amazonaws.com").unwrap();
    /// let credentials = S3Credentials::new("access_key", "secret_key");
    /// let config = S3Config::new(endpoint, credentials).unwrap();
    /// assert!(!config.path_style);
    /// ```
    pub fn new(endpoint: Url, credentials: S3Credentials) -> Result<Self> {
        if endpoint.scheme() != "https" {
            return Err(Error::Config(format!(
                "Invalid endpoint scheme '{}', only 'https' is allowed",
                endpoint.scheme()
            )));
        }

        if endpoint.host().is_none() {
            return Err(Error::Config(
                "Endpoint must include a valid hostname".to_string(),
            ));
        }

        Ok(Self {
            endpoint,
            credentials,
            region: None,
            path_style: false,
        })
    }

    /// Sets the signing region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        let region = region.into();
        self.region = (!region.is_empty()).then_some(region);
        self
    }

    /// Sets whether to use path-style requests.
    pub fn with_path_style(mut self, path_style: bool) -> Self {
        self.path_style = path_style;
        self
    }

    /// Returns the endpoint URL.
    #[inline]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the credentials.
    #[inline]
    pub fn credentials(&self) -> &S3Credentials {
        &self.credentials
    }

    /// Returns the signing region.
    #[inline]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Returns the endpoint with any embedded user info removed, for logging.
    pub fn endpoint_masked(&self) -> String {
        let mut url = self.endpoint.clone();
        let _ = url.set_username("");
        let _ = url.set_password(None);
        url.to_string()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the access key or secret key is empty.
    pub fn validate(&self) -> Result<()> {
        if self.credentials.access_key.is_empty() {
            return Err(Error::Config("Access key cannot be empty".to_string()));
        }

        if self.credentials.secret_key.is_empty() {
            return Err(Error::Config("Secret key cannot be empty".to_string()));
        }

        if self.region.as_deref().is_some_and(|r| r.trim().is_empty()) {
            return Err(Error::Config("Region cannot be blank".to_string()));
        }

        Ok(())
    }
}
