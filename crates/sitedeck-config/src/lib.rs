//! Shared configuration for sitedeck.
//!
//! TOML profiles, token resolution (env + keyring + plaintext), and
//! translation to `sitedeck_core::ConsoleConfig`. The CLI adds
//! flag-aware wrappers on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sitedeck_core::{ConsoleConfig, DEFAULT_API_URL, SiteTemplate, TlsMode};

/// Keyring service name tokens are stored under.
pub const KEYRING_SERVICE: &str = "sitedeck";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named platform profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    ///
    /// A missing default profile yields an empty one so a token passed by
    /// flag or environment is enough to run.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, Profile), ConfigError> {
        match name {
            Some(name) => self
                .profiles
                .get(name)
                .cloned()
                .map(|p| (name.to_owned(), p))
                .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() }),
            None => {
                let name = self
                    .default_profile
                    .clone()
                    .unwrap_or_else(|| "default".into());
                let profile = self.profiles.get(&name).cloned().unwrap_or_default();
                Ok((name, profile))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named platform profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Platform API base URL. Defaults to the public API.
    pub api_url: Option<String>,

    /// Account slug used for environment variables.
    pub account_slug: Option<String>,

    /// Token (plaintext; prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    /// Path to an extra CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Site-creation template overrides.
    #[serde(default)]
    pub template: TemplateConfig,
}

/// Optional overrides for the site-creation template.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TemplateConfig {
    pub build_image: Option<String>,
    pub branch: Option<String>,
    pub cmd: Option<String>,
    pub dir: Option<String>,
    pub private: Option<bool>,
    pub provider: Option<String>,
    pub repo: Option<String>,
    pub repo_id: Option<u64>,
    pub installation_id: Option<u64>,
    pub stop_builds: Option<bool>,
    pub skip_prs: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_env: Vec<String>,
}

impl TemplateConfig {
    /// Apply the overrides on top of the built-in template.
    pub fn to_template(&self) -> SiteTemplate {
        let base = SiteTemplate::default();
        SiteTemplate {
            build_image: self.build_image.clone().unwrap_or(base.build_image),
            branch: self.branch.clone().unwrap_or(base.branch),
            cmd: self.cmd.clone().unwrap_or(base.cmd),
            dir: self.dir.clone().unwrap_or(base.dir),
            private: self.private.unwrap_or(base.private),
            provider: self.provider.clone().unwrap_or(base.provider),
            repo: self.repo.clone().unwrap_or(base.repo),
            repo_id: self.repo_id.or(base.repo_id),
            installation_id: self.installation_id.or(base.installation_id),
            stop_builds: self.stop_builds.unwrap_or(base.stop_builds),
            skip_prs: self.skip_prs.unwrap_or(base.skip_prs),
            required_env: self.required_env.clone(),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "sitedeck", "sitedeck").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("sitedeck");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + `SITEDECK_` environment overrides.
///
/// Nested keys use a double underscore, e.g.
/// `SITEDECK_PROFILES__DEFAULT__ACCOUNT_SLUG`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SITEDECK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution (without CLI flags) ────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/token"),
    )?)
}

/// Resolve the token from the credential chain (no CLI flag step).
///
/// Returns `None` when nothing is configured; the console then fails
/// with a configuration error on first use.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            if !val.is_empty() {
                return Some(SecretString::from(val));
            }
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile
        .token
        .as_ref()
        .filter(|t| !t.is_empty())
        .map(|t| SecretString::from(t.clone()))
}

/// Store a token in the system keyring for `profile_name`.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token)?;
    Ok(())
}

/// Build a `ConsoleConfig` from a profile, no CLI flag overrides.
pub fn profile_to_console_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ConsoleConfig, ConfigError> {
    let raw_url = profile.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
    let api_url: url::Url = raw_url.parse().map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw_url}"),
    })?;

    let mut config = ConsoleConfig::new(api_url, resolve_token(profile, profile_name));
    config.account_slug = profile.account_slug.clone().filter(|s| !s.is_empty());
    config.tls = profile
        .ca_cert
        .clone()
        .map_or(TlsMode::System, TlsMode::CustomCa);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.template = profile.template.to_template();
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
default_profile = "agency"

[defaults]
output = "json"
timeout = 12

[profiles.agency]
account_slug = "acme"
token = "plain-token"

[profiles.agency.template]
repo = "acme/site-starter"
cmd = "npm run build"
required_env = ["SITE_TITLE"]

[profiles.staging]
api_url = "http://localhost:8080/api/v1"
timeout = 5
"#;

    #[test]
    fn loads_profiles_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("agency"));
        assert_eq!(config.defaults.output, "json");
        assert_eq!(config.defaults.color, "auto");
        assert_eq!(config.profiles.len(), 2);

        let (name, profile) = config.profile(None).unwrap();
        assert_eq!(name, "agency");
        assert_eq!(profile.account_slug.as_deref(), Some("acme"));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        let (name, profile) = config.profile(None).unwrap();
        assert_eq!(name, "default");
        assert_eq!(profile, Profile::default());
    }

    #[test]
    fn unknown_named_profile_is_an_error() {
        let err = Config::default().profile(Some("nope")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile { .. }));
    }

    #[test]
    fn save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.profiles.insert(
            "default".into(),
            Profile {
                account_slug: Some("acme".into()),
                token_env: Some("ACME_TOKEN".into()),
                ..Profile::default()
            },
        );
        save_config_to(&config, &path).unwrap();

        assert_eq!(load_config_from(&path).unwrap(), config);
    }

    #[test]
    fn template_overrides_merge_over_builtin() {
        let overrides = TemplateConfig {
            repo: Some("acme/site-starter".into()),
            repo_id: None,
            required_env: vec!["SITE_TITLE".into()],
            ..TemplateConfig::default()
        };
        let template = overrides.to_template();
        assert_eq!(template.repo, "acme/site-starter");
        assert_eq!(template.build_image, "noble");
        assert_eq!(template.repo_id, SiteTemplate::default().repo_id);
        assert_eq!(template.required_env, ["SITE_TITLE"]);
    }

    #[test]
    fn profile_to_console_config_applies_fields() {
        let profile = Profile {
            api_url: Some("http://localhost:8080/api/v1".into()),
            account_slug: Some(String::new()),
            timeout: Some(5),
            ca_cert: Some(PathBuf::from("/etc/ssl/proxy.pem")),
            ..Profile::default()
        };
        let config = profile_to_console_config(&profile, "staging", &Defaults::default()).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8080/api/v1");
        assert_eq!(config.account_slug, None);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(matches!(config.tls, TlsMode::CustomCa(_)));
    }

    #[test]
    fn invalid_url_is_validation_error() {
        let profile = Profile {
            api_url: Some("not a url".into()),
            ..Profile::default()
        };
        let err = profile_to_console_config(&profile, "x", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }
}
