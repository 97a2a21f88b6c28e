use thiserror::Error;

/// Top-level error type for the `sitedeck-api` crate.
///
/// Every call into the platform ends in exactly one of these. The client
/// never retries; callers decide what to do with a failure.
/// `sitedeck-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// Missing or malformed credential. Raised before any network I/O.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // ── Upstream ────────────────────────────────────────────────────
    /// The platform answered with a non-2xx status.
    #[error("Platform API error (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// DNS failure, refused connection, timeout, or a broken transfer.
    #[error("{message}")]
    Network {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup error (unreadable or invalid CA bundle).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Anything else, wrapped with context.
    #[error("Unexpected error when calling the platform API: {message}")]
    Unexpected { message: String },
}

impl Error {
    /// HTTP status carried by an upstream rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if this is a "not found" rejection.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if the platform signalled rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_drives_classification() {
        let not_found = Error::Http {
            status: 404,
            message: "Not Found".into(),
        };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_rate_limited());

        let limited = Error::Http {
            status: 429,
            message: "slow down".into(),
        };
        assert!(limited.is_rate_limited());
        assert!(!limited.is_not_found());
    }

    #[test]
    fn configuration_has_no_status() {
        let err = Error::Configuration {
            message: "no token".into(),
        };
        assert!(!err.is_not_found());
        assert_eq!(err.status(), None);
    }
}
