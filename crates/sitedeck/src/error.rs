//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use sitedeck_config::ConfigError;
use sitedeck_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const RATE_LIMITED: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(sitedeck::connection_failed),
        help("Check your connection and that {url} is reachable.")
    )]
    ConnectionFailed { url: String, message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("No API token configured for profile '{profile}'")]
    #[diagnostic(
        code(sitedeck::no_credentials),
        help(
            "Set NETLIFY_TOKEN, pass --token, or run: sitedeck config set-token --profile {profile}"
        )
    )]
    NoCredentials { profile: String },

    #[error("The platform rejected the API token (HTTP {status}): {message}")]
    #[diagnostic(
        code(sitedeck::auth_failed),
        help("Check that the token for profile '{profile}' is valid and not expired.")
    )]
    AuthFailed {
        status: u16,
        message: String,
        profile: String,
    },

    // ── Platform ─────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(sitedeck::rate_limited), help("{hint}"))]
    RateLimited { message: String, hint: String },

    #[error("{message}")]
    #[diagnostic(code(sitedeck::not_cancelable), help("Run: sitedeck deploys list {site_id}"))]
    NotCancelable { site_id: String, message: String },

    #[error("{resource} '{identifier}' not found")]
    #[diagnostic(code(sitedeck::not_found), help("Run: sitedeck {list_command}"))]
    NotFound {
        resource: String,
        identifier: String,
        list_command: String,
    },

    #[error("Platform API error (HTTP {status}): {message}")]
    #[diagnostic(code(sitedeck::api_error), help("{hint}"))]
    Api {
        status: u16,
        message: String,
        hint: String,
    },

    #[error("{message}")]
    #[diagnostic(
        code(sitedeck::env_not_applied),
        help("Do not create the site again. Run: sitedeck env set {site_id} --env KEY=VALUE")
    )]
    EnvNotApplied { site_id: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sitedeck::validation))]
    Validation { field: String, reason: String },

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(sitedeck::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(sitedeck::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("{message}")]
    #[diagnostic(code(sitedeck::config))]
    Config { message: String },

    #[error("{message}")]
    #[diagnostic(code(sitedeck::internal))]
    Internal { message: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NoCredentials { .. } | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::NotCancelable { .. } | Self::EnvNotApplied { .. } => exit_code::CONFLICT,
            Self::RateLimited { .. } => exit_code::RATE_LIMITED,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the site a cancel was aimed at, for the help text.
    pub fn with_site(self, site: &str) -> Self {
        match self {
            Self::NotCancelable { message, .. } => Self::NotCancelable {
                site_id: site.to_owned(),
                message,
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let hint = err.retry_hint().to_owned();
        let display = err.to_string();
        match err {
            CoreError::Configuration { message } => Self::Config { message },
            CoreError::Upstream { status, message } if status == 401 || status == 403 => {
                Self::AuthFailed {
                    status,
                    message,
                    profile: "current".into(),
                }
            }
            CoreError::Upstream { status, message } => Self::Api {
                status,
                message,
                hint,
            },
            CoreError::Network { message } => Self::ConnectionFailed {
                url: "the platform API".into(),
                message,
            },
            CoreError::RateLimited { message } => Self::RateLimited { message, hint },
            CoreError::DeployNotCancelable { .. } => Self::NotCancelable {
                site_id: "<site>".into(),
                message: display,
            },
            CoreError::EnvNotApplied { site_id, .. } => Self::EnvNotApplied {
                site_id,
                message: display,
            },
            CoreError::Validation { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
