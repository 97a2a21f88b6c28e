// Platform API wire types
//
// Records are deliberately lenient: every field except the identifier is
// optional or defaulted, and unknown fields are kept in `extra` so they
// pass through to JSON output untouched.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Sites ────────────────────────────────────────────────────────────

/// A hosted site as returned by `GET /sites` and `GET /sites/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ssl_url: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub screenshot_url: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub account_slug: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Sort key accepted by `GET /sites`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Name,
    CreatedAt,
    #[default]
    UpdatedAt,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

/// Sort direction accepted by `GET /sites`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Pagination, sorting and name filtering for `GET /sites`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteQuery {
    pub page: u32,
    /// Upper bound enforced by the platform is 100.
    pub per_page: u32,
    pub sort_by: SortField,
    pub order_by: SortOrder,
    /// Case-insensitive substring match on the site name.
    pub name: Option<String>,
}

impl Default for SiteQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 100,
            sort_by: SortField::default(),
            order_by: SortOrder::default(),
            name: None,
        }
    }
}

impl SiteQuery {
    /// Query parameters in the order the platform documents them.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("filter", "all".to_owned()),
            ("sort_by", self.sort_by.as_str().to_owned()),
            ("order_by", self.order_by.as_str().to_owned()),
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            params.push(("name", name.to_owned()));
        }
        params
    }
}

/// Build settings block of a site-creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSettings {
    pub branch: String,
    #[serde(default)]
    pub allowed_branches: Vec<String>,
    pub skip_prs: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation_id: Option<u64>,
    pub stop_builds: bool,
}

/// Repository block of a site-creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSettings {
    pub branch: String,
    pub cmd: String,
    pub dir: String,
    pub private: bool,
    pub provider: String,
    pub repo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation_id: Option<u64>,
    pub stop_builds: bool,
}

/// Body of `POST /sites`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSiteRequest {
    pub name: String,
    pub build_image: String,
    pub build_settings: BuildSettings,
    pub repo: RepoSettings,
}

// ── Deploys ──────────────────────────────────────────────────────────

/// Lifecycle state of a deploy.
///
/// Unrecognized states are kept verbatim in [`DeployState::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeployState {
    New,
    Enqueued,
    Building,
    Processing,
    Uploading,
    Initializing,
    Ready,
    Error,
    Canceled,
    Other(String),
}

impl DeployState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "new",
            Self::Enqueued => "enqueued",
            Self::Building => "building",
            Self::Processing => "processing",
            Self::Uploading => "uploading",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Error => "error",
            Self::Canceled => "canceled",
            Self::Other(s) => s,
        }
    }

    /// Any not-yet-finished state, `new` included.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            Self::New
                | Self::Enqueued
                | Self::Building
                | Self::Processing
                | Self::Uploading
                | Self::Initializing
        )
    }

    /// States shown on the active-builds board (`new` is excluded).
    pub fn is_active_build(&self) -> bool {
        self.is_in_progress() && *self != Self::New
    }

    /// States the console offers a cancel action for.
    pub fn is_cancelable(&self) -> bool {
        matches!(self, Self::New | Self::Enqueued | Self::Building)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Error | Self::Canceled)
    }
}

impl From<String> for DeployState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "new" => Self::New,
            "enqueued" => Self::Enqueued,
            "building" => Self::Building,
            "processing" => Self::Processing,
            "uploading" => Self::Uploading,
            "initializing" => Self::Initializing,
            "ready" => Self::Ready,
            "error" => Self::Error,
            "canceled" => Self::Canceled,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for DeployState {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

impl From<DeployState> for String {
    fn from(state: DeployState) -> Self {
        match state {
            DeployState::Other(s) => s,
            other => other.as_str().to_owned(),
        }
    }
}

impl fmt::Display for DeployState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One build/publish attempt for a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deploy {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub site_id: String,
    pub state: DeployState,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Build duration in seconds.
    #[serde(default)]
    pub deploy_time: Option<u64>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub commit_ref: Option<String>,
    #[serde(default)]
    pub commit_message: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Pagination and filters for `GET /sites/{id}/deploys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployQuery {
    pub page: u32,
    pub per_page: u32,
    pub production: Option<bool>,
    pub state: Option<String>,
    pub branch: Option<String>,
}

impl Default for DeployQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 5,
            production: None,
            state: None,
            branch: None,
        }
    }
}

impl DeployQuery {
    /// The single most recent deploy.
    pub fn latest() -> Self {
        Self {
            per_page: 1,
            ..Self::default()
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(production) = self.production {
            params.push(("production", production.to_string()));
        }
        if let Some(state) = self.state.as_deref().filter(|s| !s.is_empty()) {
            params.push(("state", state.to_owned()));
        }
        if let Some(branch) = self.branch.as_deref().filter(|b| !b.is_empty()) {
            params.push(("branch", branch.to_owned()));
        }
        params
    }
}

// ── Environment variables ────────────────────────────────────────────

/// Scopes every console-managed variable is published to.
pub const ENV_SCOPES: [&str; 3] = ["builds", "runtime", "post-processing"];

/// One context-scoped value of an environment variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvVarValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub value: String,
    #[serde(default = "default_context")]
    pub context: String,
}

fn default_context() -> String {
    "all".into()
}

/// An account-level environment variable bound to a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub values: Vec<EnvVarValue>,
}

impl EnvVar {
    /// A variable with a single value for every deploy context and all scopes.
    pub fn for_all_contexts(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            scopes: ENV_SCOPES.iter().map(|s| (*s).to_owned()).collect(),
            values: vec![EnvVarValue {
                id: None,
                value: value.into(),
                context: default_context(),
            }],
        }
    }

    /// The first listed value, the one the console surfaces.
    pub fn first_value(&self) -> Option<&str> {
        self.values.first().map(|v| v.value.as_str())
    }
}

// ── Pages ────────────────────────────────────────────────────────────

/// A list response plus the pagination hint from the `Link` header.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub link: Option<String>,
    pub has_more: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deploy_state_round_trips_unknown_labels() {
        let state: DeployState = serde_json::from_value(json!("retrying")).unwrap();
        assert_eq!(state, DeployState::Other("retrying".into()));
        assert_eq!(serde_json::to_value(&state).unwrap(), json!("retrying"));
        assert_eq!(state.to_string(), "retrying");
    }

    #[test]
    fn deploy_state_groups() {
        assert!(DeployState::New.is_in_progress());
        assert!(!DeployState::New.is_active_build());
        assert!(DeployState::Uploading.is_active_build());
        assert!(DeployState::Enqueued.is_cancelable());
        assert!(!DeployState::Processing.is_cancelable());
        assert!(DeployState::Canceled.is_terminal());
        assert!(!DeployState::Other("x".into()).is_in_progress());
    }

    #[test]
    fn site_keeps_unknown_fields() {
        let site: Site = serde_json::from_value(json!({
            "id": "a",
            "name": "alpha",
            "custom_domain": "alpha.example.com"
        }))
        .unwrap();
        assert_eq!(site.extra["custom_domain"], json!("alpha.example.com"));
        let back = serde_json::to_value(&site).unwrap();
        assert_eq!(back["custom_domain"], json!("alpha.example.com"));
    }

    #[test]
    fn site_query_omits_empty_name() {
        let query = SiteQuery {
            name: Some(String::new()),
            ..SiteQuery::default()
        };
        assert!(query.params().iter().all(|(k, _)| *k != "name"));
        assert!(query.params().contains(&("filter", "all".to_owned())));
    }

    #[test]
    fn deploy_query_includes_only_set_filters() {
        let query = DeployQuery {
            production: Some(true),
            branch: Some("main".into()),
            ..DeployQuery::default()
        };
        let params = query.params();
        assert!(params.contains(&("production", "true".to_owned())));
        assert!(params.contains(&("branch", "main".to_owned())));
        assert!(params.iter().all(|(k, _)| *k != "state"));
    }

    #[test]
    fn env_var_for_all_contexts_shape() {
        let var = EnvVar::for_all_contexts("API_KEY", "xyz");
        assert_eq!(
            serde_json::to_value(&var).unwrap(),
            json!({
                "key": "API_KEY",
                "scopes": ["builds", "runtime", "post-processing"],
                "values": [{"value": "xyz", "context": "all"}]
            })
        );
    }
}
