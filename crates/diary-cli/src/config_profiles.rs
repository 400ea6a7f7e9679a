//! Named CLI profiles stored as JSON under the user config directory.

use std::collections::BTreeMap;
use std::env;
use std::io;
use std::path::{Path, PathBuf};

use diary_core::config::{
    ClientConfig, ENV_API_BASE_URL, ENV_ASSET_UPLOAD_URL, ENV_UPLOAD_PRESET,
};
use diary_core::util::normalize_text_option;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_FILE_NAME: &str = "cli-config.json";
pub const ENV_PROFILE: &str = "DIARY_PROFILE";
const FALLBACK_PROFILE: &str = "default";

#[derive(Debug, Error)]
pub enum ProfileFileError {
    #[error("could not resolve the user config directory")]
    NoConfigDir,
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Every profile known to the CLI plus the one used by default.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfilesConfig {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, CliProfile>,
}

/// Endpoints for one diary deployment. Unset values fall back to the
/// environment and then to the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_upload_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_preset: Option<String>,
}

const fn current_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, ProfileFileError> {
    let base = dirs::config_dir().ok_or(ProfileFileError::NoConfigDir)?;
    Ok(base.join("diary").join(CONFIG_FILE_NAME))
}

pub fn normalize_profile_name(value: Option<&str>) -> Option<String> {
    normalize_text_option(value.map(str::to_string))
}

impl CliProfilesConfig {
    pub fn load() -> Result<Self, ProfileFileError> {
        Self::load_from_path(&default_config_path()?)
    }

    /// Read the profile file; a missing file is an empty configuration.
    pub fn load_from_path(path: &Path) -> Result<Self, ProfileFileError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ProfileFileError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let mut config: Self =
            serde_json::from_str(&raw).map_err(|source| ProfileFileError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, ProfileFileError> {
        let path = default_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ProfileFileError> {
        let io_error = |source: io::Error| ProfileFileError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(io_error)?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let json = serde_json::to_string_pretty(&normalized).map_err(|source| {
            ProfileFileError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        std::fs::write(path, json).map_err(io_error)
    }

    /// Explicit name, then `DIARY_PROFILE`, then the active profile.
    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        normalize_profile_name(explicit)
            .or_else(|| normalize_profile_name(env::var(ENV_PROFILE).ok().as_deref()))
            .or_else(|| normalize_profile_name(self.active_profile.as_deref()))
            .unwrap_or_else(|| FALLBACK_PROFILE.to_string())
    }

    pub fn profile(&self, name: &str) -> Option<&CliProfile> {
        self.profiles.get(name)
    }

    pub fn profile_mut_or_default(&mut self, name: &str) -> &mut CliProfile {
        self.profiles.entry(name.to_string()).or_default()
    }

    fn normalize(&mut self) {
        self.active_profile = normalize_profile_name(self.active_profile.as_deref());
        self.profiles.values_mut().for_each(CliProfile::normalize);
    }
}

impl CliProfile {
    /// Value stored for one of the client configuration variables.
    pub fn value_for(&self, key: &str) -> Option<String> {
        let value = match key {
            ENV_API_BASE_URL => self.api_base_url.clone(),
            ENV_ASSET_UPLOAD_URL => self.asset_upload_url.clone(),
            ENV_UPLOAD_PRESET => self.upload_preset.clone(),
            _ => None,
        };
        normalize_text_option(value)
    }

    /// Build the client configuration, letting environment variables win.
    pub fn client_config(&self) -> diary_core::Result<ClientConfig> {
        self.client_config_with(|key| env::var(key).ok())
    }

    pub fn client_config_with(
        &self,
        env_lookup: impl Fn(&str) -> Option<String>,
    ) -> diary_core::Result<ClientConfig> {
        ClientConfig::from_lookup(|key| {
            normalize_text_option(env_lookup(key)).or_else(|| self.value_for(key))
        })
    }

    fn normalize(&mut self) {
        self.api_base_url = normalize_text_option(self.api_base_url.clone());
        self.asset_upload_url = normalize_text_option(self.asset_upload_url.clone());
        self.upload_preset = normalize_text_option(self.upload_preset.clone());
    }
}
