// ── Runtime console configuration ──
//
// These types describe *how* the console talks to the platform and what
// a freshly created site looks like. They carry credential data and
// timing, but never touch disk. The CLI builds a `ConsoleConfig` from its
// profile and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use sitedeck_api::{BuildSettings, CreateSiteRequest, RepoSettings, TlsMode};
use url::Url;

/// Configuration for one console session.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Platform API base URL.
    pub api_url: Url,
    /// Bearer token. `None` is allowed here; the first call fails with a
    /// configuration error instead.
    pub token: Option<SecretString>,
    /// Account slug, required for environment-variable endpoints.
    pub account_slug: Option<String>,
    pub tls: TlsMode,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Blueprint used by site creation.
    pub template: SiteTemplate,
    pub timings: Timings,
}

impl ConsoleConfig {
    /// Config pointing at `api_url` with everything else defaulted.
    pub fn new(api_url: Url, token: Option<SecretString>) -> Self {
        Self {
            api_url,
            token,
            account_slug: None,
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
            template: SiteTemplate::default(),
            timings: Timings::default(),
        }
    }
}

/// Throttle, cache and polling intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Minimum spacing between sites-list fetches.
    pub sites_interval: Duration,
    /// Forced pause after the platform answers 429.
    pub rate_limit_cooldown: Duration,
    /// Minimum spacing between active-build fetches.
    pub builds_interval: Duration,
    /// Lifetime of the cached active-build list.
    pub builds_ttl: Duration,
    /// Period of the background build poller.
    pub poll_interval: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            sites_interval: Duration::from_secs(5),
            rate_limit_cooldown: Duration::from_secs(60),
            builds_interval: Duration::from_secs(2),
            builds_ttl: Duration::from_secs(30),
            poll_interval: Duration::from_secs(10),
        }
    }
}

/// Build and repository settings applied to every new site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteTemplate {
    pub build_image: String,
    pub branch: String,
    pub cmd: String,
    pub dir: String,
    pub private: bool,
    pub provider: String,
    pub repo: String,
    pub repo_id: Option<u64>,
    pub installation_id: Option<u64>,
    pub stop_builds: bool,
    pub skip_prs: bool,
    /// Variable keys every site must define.
    pub required_env: Vec<String>,
}

impl Default for SiteTemplate {
    fn default() -> Self {
        Self {
            build_image: "noble".into(),
            branch: "main".into(),
            cmd: "gatsby build".into(),
            dir: "/".into(),
            private: false,
            provider: "github".into(),
            repo: "eab-agency/iwc-default-proof".into(),
            repo_id: Some(310_384_845),
            installation_id: Some(12_392_279),
            stop_builds: true,
            skip_prs: true,
            required_env: Vec::new(),
        }
    }
}

impl SiteTemplate {
    /// The `POST /sites` body for a site called `name`.
    pub fn to_request(&self, name: &str) -> CreateSiteRequest {
        CreateSiteRequest {
            name: name.to_owned(),
            build_image: self.build_image.clone(),
            build_settings: BuildSettings {
                branch: self.branch.clone(),
                allowed_branches: Vec::new(),
                skip_prs: self.skip_prs,
                installation_id: self.installation_id,
                stop_builds: self.stop_builds,
            },
            repo: RepoSettings {
                branch: self.branch.clone(),
                cmd: self.cmd.clone(),
                dir: self.dir.clone(),
                private: self.private,
                provider: self.provider.clone(),
                repo: self.repo.clone(),
                repo_id: self.repo_id,
                installation_id: self.installation_id,
                stop_builds: self.stop_builds,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_template_request_shape() {
        let body = serde_json::to_value(SiteTemplate::default().to_request("proof-42")).unwrap();
        assert_eq!(body["name"], json!("proof-42"));
        assert_eq!(body["build_image"], json!("noble"));
        assert_eq!(body["build_settings"]["allowed_branches"], json!([]));
        assert_eq!(body["repo"]["cmd"], json!("gatsby build"));
        assert_eq!(body["repo"]["repo_id"], json!(310_384_845));
    }

    #[test]
    fn template_without_ids_omits_them() {
        let template = SiteTemplate {
            repo_id: None,
            installation_id: None,
            ..SiteTemplate::default()
        };
        let body = serde_json::to_value(template.to_request("x")).unwrap();
        assert!(body["repo"].get("repo_id").is_none());
        assert!(body["build_settings"].get("installation_id").is_none());
    }
}
