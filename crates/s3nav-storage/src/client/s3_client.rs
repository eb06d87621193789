//! SDK client wrapper.

use std::sync::Arc;

use minio::s3::Client;
use minio::s3::creds::StaticProvider;
use minio::s3::http::BaseUrl;
use tracing::{debug, error, info, instrument};

use crate::operations::{BucketOperations, ObjectOperations};
use crate::{Error, Result, S3Config, TRACING_TARGET_CLIENT};

/// S3 client shared by bucket and object operations.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct S3Client {
    inner: Client,
    config: Arc<S3Config>,
}

impl S3Client {
    /// Builds a client from `config` without contacting the service.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if validation fails or the SDK rejects the
    /// endpoint.
    ///
    /// ```rust
    /// use s3nav_storage::{S3Client, S3Config, S3Credentials};
    /// use url::Url;
    ///
    /// let endpoint = Url::parse("https://s3.amazonaws.com").unwrap();
    /// let credentials = S3Credentials::new("access_key", "secret_key");
    /// let config = S3Config::new(endpoint, credentials).unwrap();
    /// let client = S3Client::new(config).unwrap();
    /// ```
    #[instrument(skip(config), target = TRACING_TARGET_CLIENT, fields(endpoint = %config.endpoint_masked()))]
    pub fn new(config: S3Config) -> Result<Self> {
        debug!(target: TRACING_TARGET_CLIENT, "Initializing S3 client");

        config.validate().map_err(|e| {
            error!(target: TRACING_TARGET_CLIENT, error = %e, "Configuration validation failed");
            e
        })?;

        let provider = StaticProvider::from(config.credentials().clone());

        let mut base_url: BaseUrl = config.endpoint().as_str().parse().map_err(|e| {
            error!(target: TRACING_TARGET_CLIENT, error = %e, "Invalid endpoint URL");
            Error::Config(format!("Invalid endpoint URL: {e}"))
        })?;

        if let Some(region) = config.region() {
            base_url.region = region.to_string();
        }
        if config.path_style {
            base_url.virtual_style = false;
        }

        let inner = Client::new(base_url, Some(Box::new(provider)), None, None).map_err(|e| {
            error!(target: TRACING_TARGET_CLIENT, error = %e, "Failed to create S3 client");
            Error::Config(format!("Failed to build S3 client: {e}"))
        })?;

        info!(
            target: TRACING_TARGET_CLIENT,
            endpoint = %config.endpoint_masked(),
            region = ?config.region(),
            path_style = config.path_style,
            "S3 client initialized"
        );

        Ok(Self {
            inner,
            config: Arc::new(config),
        })
    }

    /// Returns the client configuration.
    #[inline]
    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Creates a new BucketOperations instance.
    pub fn bucket_operations(&self) -> BucketOperations {
        BucketOperations::new(self.clone())
    }

    /// Creates a new ObjectOperations instance.
    pub fn object_operations(&self) -> ObjectOperations {
        ObjectOperations::new(self.clone())
    }

    /// Returns a reference to the inner client.
    #[inline]
    pub(crate) fn as_inner(&self) -> &Client {
        &self.inner
    }
}

impl std::fmt::Debug for S3Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Client")
            .field("endpoint", &self.config.endpoint_masked())
            .field("region", &self.config.region())
            .field("path_style", &self.config.path_style)
            .field("access_key", &self.config.credentials().access_key_masked())
            .finish()
    }
}
