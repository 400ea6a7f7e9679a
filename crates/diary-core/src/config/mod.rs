//! Client configuration.
//!
//! Resolves the diary backend and asset host endpoints from explicit values
//! or environment variables. Only public endpoints and the unsigned upload
//! preset live here; the session token is never part of the configuration.

use std::env;
use std::time::Duration;

use crate::util::{normalize_http_url, normalize_text_option};
use crate::{Error, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://diary-entry-backend.vercel.app";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_BASE_URL: &str = "DIARY_API_BASE_URL";
pub const ENV_ASSET_UPLOAD_URL: &str = "DIARY_ASSET_UPLOAD_URL";
pub const ENV_UPLOAD_PRESET: &str = "DIARY_UPLOAD_PRESET";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "DIARY_HTTP_TIMEOUT_SECS";

/// Asset host endpoint and the fixed upload preset sent with every upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHostConfig {
    pub upload_url: String,
    pub upload_preset: String,
}

impl AssetHostConfig {
    pub fn new(upload_url: &str, upload_preset: &str) -> Result<Self> {
        let upload_url = normalize_http_url(upload_url, "asset_upload_url")?;
        let upload_preset = normalize_text_option(Some(upload_preset.to_string()))
            .ok_or_else(|| Error::Config("upload_preset must not be empty".to_string()))?;
        Ok(Self {
            upload_url,
            upload_preset,
        })
    }

    /// Endpoint that accepts delete tokens issued by unsigned uploads.
    ///
    /// Derived by replacing the trailing `/<resource>/upload` segment pair with
    /// `/delete_by_token`.
    pub fn delete_by_token_url(&self) -> Option<String> {
        let without_upload = self.upload_url.strip_suffix("/upload")?;
        let (prefix, _resource) = without_upload.rsplit_once('/')?;
        Some(format!("{prefix}/delete_by_token"))
    }
}

/// Endpoints and limits used by the HTTP clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub asset_host: Option<AssetHostConfig>,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            asset_host: None,
            request_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn new(api_base_url: &str) -> Result<Self> {
        Ok(Self {
            api_base_url: normalize_http_url(api_base_url, "api_base_url")?,
            ..Self::default()
        })
    }

    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// The asset host is optional, but its URL and preset must be given
    /// together.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_base_url = normalize_text_option(lookup(ENV_API_BASE_URL))
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let mut config = Self::new(&api_base_url)?;

        config.asset_host = resolve_optional_asset_host(
            lookup(ENV_ASSET_UPLOAD_URL),
            lookup(ENV_UPLOAD_PRESET),
        )?;

        if let Some(raw) = normalize_text_option(lookup(ENV_HTTP_TIMEOUT_SECS)) {
            let seconds = raw.parse::<u64>().map_err(|_| {
                Error::Config(format!(
                    "{ENV_HTTP_TIMEOUT_SECS} must be a whole number of seconds"
                ))
            })?;
            if seconds == 0 {
                return Err(Error::Config(format!(
                    "{ENV_HTTP_TIMEOUT_SECS} must be greater than zero"
                )));
            }
            config.request_timeout = Duration::from_secs(seconds);
        }

        Ok(config)
    }
}

/// Combine an optional upload URL and preset into an asset host config.
///
/// Returns `Ok(None)` when both are absent and an error when only one is set.
pub fn resolve_optional_asset_host(
    upload_url: Option<String>,
    upload_preset: Option<String>,
) -> Result<Option<AssetHostConfig>> {
    match (
        normalize_text_option(upload_url),
        normalize_text_option(upload_preset),
    ) {
        (None, None) => Ok(None),
        (Some(url), Some(preset)) => AssetHostConfig::new(&url, &preset).map(Some),
        (Some(_), None) => Err(Error::Config(format!(
            "{ENV_ASSET_UPLOAD_URL} is set but {ENV_UPLOAD_PRESET} is missing"
        ))),
        (None, Some(_)) => Err(Error::Config(format!(
            "{ENV_UPLOAD_PRESET} is set but {ENV_ASSET_UPLOAD_URL} is missing"
        ))),
    }
}
