//! Storage endpoint configuration.

use anyhow::{Context, Result as AnyhowResult, anyhow};
use clap::Args;
use s3nav_storage::{S3Config, S3Credentials};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::TRACING_TARGET_CONFIG;

/// Where the S3-compatible service lives and how to address it.
///
/// # Environment Variables
///
/// - `S3NAV_ENDPOINT` - Service endpoint (default: https://s3.amazonaws.com)
/// - `AWS_REGION` - Signing region (default: ap-southeast-2)
/// - `S3NAV_PATH_STYLE` - Force path-style requests (default: false)
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct StorageConfig {
    /// Service endpoint URL. Only `https` endpoints are accepted.
    #[arg(long, env = "S3NAV_ENDPOINT", default_value = "https://s3.amazonaws.com")]
    pub endpoint: Url,

    /// Region used to sign requests.
    #[arg(long, env = "AWS_REGION", default_value = "ap-southeast-2")]
    pub region: String,

    /// Use path-style requests (`endpoint/bucket/key`).
    ///
    /// Needed by most self-hosted services such as MinIO.
    #[arg(long, env = "S3NAV_PATH_STYLE")]
    #[serde(default)]
    pub path_style: bool,
}

impl StorageConfig {
    /// Validates the endpoint and region.
    pub fn validate(&self) -> AnyhowResult<()> {
        if self.endpoint.scheme() != "https" {
            return Err(anyhow!("Endpoint {} must use https", self.endpoint));
        }

        if self.region.trim().is_empty() {
            return Err(anyhow!("Region cannot be blank"));
        }

        Ok(())
    }

    /// Builds the client configuration for the resolved credentials.
    pub fn to_s3_config(&self, credentials: S3Credentials) -> AnyhowResult<S3Config> {
        let config = S3Config::new(self.endpoint.clone(), credentials)
            .context("invalid storage endpoint")?
            .with_region(self.region.clone())
            .with_path_style(self.path_style);
        Ok(config)
    }

    /// Logs the configuration.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            endpoint = %self.endpoint.host_str().unwrap_or_default(),
            region = %self.region,
            path_style = self.path_style,
            "Storage configuration"
        );
    }
}
