use std::env;

use diary_core::config::{
    AssetHostConfig, ClientConfig, ENV_API_BASE_URL, ENV_ASSET_UPLOAD_URL, ENV_UPLOAD_PRESET,
};
use diary_core::util::normalize_text_option;

use crate::cli::ConfigCommands;
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            api_base_url,
            asset_upload_url,
            upload_preset,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            ProfileValues {
                api_base_url,
                asset_upload_url,
                upload_preset,
            },
            no_activate,
        ),
    }
}

/// Values passed on the command line for `config init`.
#[derive(Debug, Default)]
pub struct ProfileValues {
    pub api_base_url: Option<String>,
    pub asset_upload_url: Option<String>,
    pub upload_preset: Option<String>,
}

pub fn run_config_init(
    profile_name: Option<&str>,
    values: ProfileValues,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load()?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing = config.profile(&profile_name).cloned().unwrap_or_default();

    let merged = merge_profile(values, &existing, |key| env::var(key).ok());
    validate_profile(&merged)?;

    *config.profile_mut_or_default(&profile_name) = merged.clone();
    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save()?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    if merged.asset_upload_url.is_none() {
        println!(
            "Profile '{profile_name}' has no asset host; entries can be added without images only."
        );
    }
    println!(
        "Run `diary auth login --profile {profile_name} --email <email> --password <password>` to sign in."
    );

    Ok(())
}

/// Explicit values, then environment variables, then what the profile already held.
pub fn merge_profile(
    values: ProfileValues,
    existing: &CliProfile,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> CliProfile {
    let pick = |explicit: Option<String>, key: &str| {
        normalize_text_option(explicit)
            .or_else(|| normalize_text_option(env_lookup(key)))
            .or_else(|| existing.value_for(key))
    };

    CliProfile {
        api_base_url: pick(values.api_base_url, ENV_API_BASE_URL),
        asset_upload_url: pick(values.asset_upload_url, ENV_ASSET_UPLOAD_URL),
        upload_preset: pick(values.upload_preset, ENV_UPLOAD_PRESET),
    }
}

/// Reject URLs without a scheme and half-configured asset hosts.
pub fn validate_profile(profile: &CliProfile) -> Result<(), CliError> {
    if let Some(url) = profile.api_base_url.as_deref() {
        ClientConfig::new(url).map_err(|error| CliError::Config(config_message(error)))?;
    }

    match (
        profile.asset_upload_url.as_deref(),
        profile.upload_preset.as_deref(),
    ) {
        (Some(url), Some(preset)) => AssetHostConfig::new(url, preset)
            .map(|_| ())
            .map_err(|error| CliError::Config(config_message(error))),
        (None, None) => Ok(()),
        (Some(_), None) => Err(CliError::Config(
            "upload_preset is required when asset_upload_url is set".to_string(),
        )),
        (None, Some(_)) => Err(CliError::Config(
            "asset_upload_url is required when upload_preset is set".to_string(),
        )),
    }
}

fn config_message(error: diary_core::Error) -> String {
    match error {
        diary_core::Error::Config(message) => message,
        other => other.to_string(),
    }
}
