//! CLI configuration, a thin wrapper around `sitedeck_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--api-url, --token, --account-slug, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use sitedeck_core::ConsoleConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use sitedeck_config::{
    Config, Profile, config_path, load_config_or_default, profile_to_console_config, save_config,
    store_token,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Look up the active profile. An explicitly requested profile must
/// exist; the default one may be absent.
pub fn active_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);
    match config.profiles.get(&name) {
        Some(profile) => Ok((name, profile.clone())),
        None if global.profile.is_some() => Err(profile_not_found(name, config)),
        None => Ok((name, Profile::default())),
    }
}

/// `ProfileNotFound` listing the configured profile names.
pub fn profile_not_found(name: String, config: &Config) -> CliError {
    let mut available: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
    available.sort_unstable();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

/// Build a `ConsoleConfig` from the active profile plus flag overrides.
///
/// Flags (and their environment variables) take priority over profile
/// values. A missing token is reported here, before any request.
pub fn resolve(global: &GlobalOpts, config: &Config) -> Result<ConsoleConfig, CliError> {
    let (name, mut profile) = active_profile(global, config)?;

    if let Some(ref url) = global.api_url {
        profile.api_url = Some(url.clone());
    }
    if let Some(ref slug) = global.account_slug {
        profile.account_slug = Some(slug.clone());
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let mut console_config = profile_to_console_config(&profile, &name, &config.defaults)?;

    if let Some(token) = global.token.as_deref().filter(|t| !t.is_empty()) {
        console_config.token = Some(SecretString::from(token.to_owned()));
    }
    if console_config.token.is_none() {
        return Err(CliError::NoCredentials { profile: name });
    }
    if console_config.timeout.is_zero() {
        console_config.timeout = Duration::from_secs(config.defaults.timeout);
    }
    Ok(console_config)
}
