// ── Core error types ──
//
// User-facing errors from sitedeck-core. Consumers never match on raw
// transport failures; the `From<sitedeck_api::Error>` impl folds them into
// the kinds an operator can act on.

use thiserror::Error;

/// Message shown when the platform refuses to cancel a deploy.
pub const NOT_CANCELABLE_MESSAGE: &str = "Deploy not found or cannot be cancelled. The deploy may \
     have already completed or is in a state that cannot be cancelled.";

/// Message shown when the sites list hits the platform's rate limit.
pub const RATE_LIMITED_MESSAGE: &str =
    "API rate limit reached. Please wait a moment before refreshing.";

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // ── Upstream errors ──────────────────────────────────────────────
    #[error("Platform API error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("{message}")]
    Network { message: String },

    #[error("{message}")]
    RateLimited { message: String },

    #[error("{}", NOT_CANCELABLE_MESSAGE)]
    DeployNotCancelable { deploy_id: String },

    // ── Operation errors ─────────────────────────────────────────────
    /// The site exists but its environment variables were not applied.
    #[error("Site {name} ({site_id}) was created, but setting its environment variables failed: {message}")]
    EnvNotApplied {
        site_id: String,
        name: String,
        message: String,
    },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// A short suggestion for what the operator can do next.
    pub fn retry_hint(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => {
                "Set the platform API token and account slug, then try again."
            }
            Self::Upstream { status, .. } if *status >= 500 => {
                "The platform reported a server error. Try again shortly."
            }
            Self::Upstream { .. } => "Check the request parameters and try again.",
            Self::Network { .. } => "Check your connection and try again.",
            Self::RateLimited { .. } => "Wait about a minute before refreshing.",
            Self::DeployNotCancelable { .. } => "Refresh the deploy list to see its current state.",
            Self::EnvNotApplied { .. } => {
                "Do not create the site again; set the variables on the existing site."
            }
            Self::Validation { .. } => "Correct the input and try again.",
            Self::Internal(_) => "Try again; if the problem persists, report it.",
        }
    }

    /// `true` when repeating the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::RateLimited { .. } => true,
            Self::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<sitedeck_api::Error> for CoreError {
    fn from(err: sitedeck_api::Error) -> Self {
        match err {
            sitedeck_api::Error::Configuration { message } => Self::Configuration { message },
            sitedeck_api::Error::Http { status: 429, .. } => Self::RateLimited {
                message: RATE_LIMITED_MESSAGE.into(),
            },
            sitedeck_api::Error::Http { status, message } => Self::Upstream { status, message },
            sitedeck_api::Error::Network { message, .. } => Self::Network { message },
            sitedeck_api::Error::InvalidUrl(e) => Self::Configuration {
                message: format!("invalid platform URL: {e}"),
            },
            sitedeck_api::Error::Tls(message) => Self::Configuration { message },
            sitedeck_api::Error::Deserialization { message, .. } => {
                Self::Internal(format!("unreadable platform response: {message}"))
            }
            sitedeck_api::Error::Unexpected { message } => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_maps_from_429() {
        let err = CoreError::from(sitedeck_api::Error::Http {
            status: 429,
            message: "Too Many Requests".into(),
        });
        assert!(matches!(err, CoreError::RateLimited { .. }));
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), RATE_LIMITED_MESSAGE);
    }

    #[test]
    fn upstream_keeps_status_and_message() {
        let err = CoreError::from(sitedeck_api::Error::Http {
            status: 422,
            message: "name already taken".into(),
        });
        match &err {
            CoreError::Upstream { status, message } => {
                assert_eq!(*status, 422);
                assert_eq!(message, "name already taken");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
        assert!(!err.is_retryable());
    }

    #[test]
    fn not_cancelable_differs_from_generic_failure() {
        let specific = CoreError::DeployNotCancelable {
            deploy_id: "d1".into(),
        };
        let generic = CoreError::Upstream {
            status: 404,
            message: "Not Found".into(),
        };
        assert_ne!(specific.to_string(), generic.to_string());
        assert!(specific.to_string().contains("cannot be cancelled"));
    }
}
