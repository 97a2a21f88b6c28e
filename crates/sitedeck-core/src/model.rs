// ── Console view models ──
//
// Transient records built on every fetch by the aggregators. They wrap
// the platform's wire types rather than copying them so unknown upstream
// fields still reach JSON output.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use sitedeck_api::{Deploy, DeployState, Site};

/// A site enriched with its most recent deploy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteView {
    #[serde(flatten)]
    pub site: Site,
    /// `None` when the site never deployed or the lookup failed.
    #[serde(rename = "lastDeploy")]
    pub last_deploy: Option<Deploy>,
    pub last_deploy_time: Option<DateTime<Utc>>,
}

impl SiteView {
    /// Attach `last_deploy` to `site`, deriving `last_deploy_time` from
    /// the deploy's creation time.
    pub fn new(site: Site, last_deploy: Option<Deploy>) -> Self {
        let last_deploy_time = last_deploy.as_ref().and_then(|d| d.created_at);
        Self {
            site,
            last_deploy,
            last_deploy_time,
        }
    }

    pub fn id(&self) -> &str {
        &self.site.id
    }

    pub fn name(&self) -> &str {
        &self.site.name
    }
}

/// One page of the sites list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitePage {
    pub sites: Vec<SiteView>,
    /// `true` when the platform advertised a `rel="next"` page.
    pub has_more: bool,
    /// Raw `Link` header, passed through for callers that page by URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// An in-flight deploy on the active-builds board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Build {
    #[serde(flatten)]
    pub deploy: Deploy,
    pub site_name: String,
    /// Rough completion estimate, 0-100.
    pub progress: u8,
}

impl Build {
    /// Wrap `deploy` if it is in an active state, tagging it with its site.
    ///
    /// Returns `None` for states that do not belong on the board.
    pub fn from_deploy(mut deploy: Deploy, site: &Site) -> Option<Self> {
        let progress = estimate_progress(&deploy.state)?;
        if deploy.site_id.is_empty() {
            deploy.site_id.clone_from(&site.id);
        }
        Some(Self {
            deploy,
            site_name: site.name.clone(),
            progress,
        })
    }

    pub fn can_cancel(&self) -> bool {
        can_cancel(&self.deploy.state)
    }
}

/// Progress estimate for an active build state.
///
/// `building` has no upstream signal, so it gets a random value in
/// `30..100` that only serves as a visual cue. Returns `None` for states
/// that are not shown on the board.
pub fn estimate_progress(state: &DeployState) -> Option<u8> {
    match state {
        DeployState::Enqueued => Some(0),
        DeployState::Initializing => Some(10),
        DeployState::Processing => Some(50),
        DeployState::Uploading => Some(80),
        DeployState::Building => Some(rand::rng().random_range(30..100)),
        _ => None,
    }
}

/// Whether the console offers a cancel action for a deploy in `state`.
pub fn can_cancel(state: &DeployState) -> bool {
    state.is_cancelable()
}

/// Operator-facing label for a deploy state.
pub fn status_label(state: &DeployState) -> &str {
    match state {
        DeployState::Ready => "Success",
        DeployState::Error => "Failed",
        DeployState::Building => "Building",
        DeployState::Enqueued => "Enqueued",
        DeployState::Canceled => "Canceled",
        other => other.as_str(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn site(id: &str, name: &str) -> Site {
        serde_json::from_value(json!({ "id": id, "name": name })).unwrap()
    }

    fn deploy(state: &str) -> Deploy {
        serde_json::from_value(json!({
            "id": "d1",
            "state": state,
            "created_at": "2024-06-15T10:30:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn site_view_serializes_flat_with_camel_last_deploy() {
        let view = SiteView::new(site("a", "alpha"), Some(deploy("ready")));
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["id"], json!("a"));
        assert_eq!(value["lastDeploy"]["state"], json!("ready"));
        assert_eq!(value["last_deploy_time"], json!("2024-06-15T10:30:00Z"));
    }

    #[test]
    fn site_view_without_deploy_has_null_fields() {
        let value = serde_json::to_value(SiteView::new(site("b", "beta"), None)).unwrap();
        assert!(value["lastDeploy"].is_null());
        assert!(value["last_deploy_time"].is_null());
    }

    #[test]
    fn progress_per_state() {
        assert_eq!(estimate_progress(&DeployState::Enqueued), Some(0));
        assert_eq!(estimate_progress(&DeployState::Initializing), Some(10));
        assert_eq!(estimate_progress(&DeployState::Processing), Some(50));
        assert_eq!(estimate_progress(&DeployState::Uploading), Some(80));
        for _ in 0..200 {
            let p = estimate_progress(&DeployState::Building).unwrap();
            assert!((30..100).contains(&p), "building progress out of range: {p}");
        }
        assert_eq!(estimate_progress(&DeployState::New), None);
        assert_eq!(estimate_progress(&DeployState::Ready), None);
        assert_eq!(estimate_progress(&DeployState::Other("retrying".into())), None);
    }

    #[test]
    fn build_takes_site_identity() {
        let build = Build::from_deploy(deploy("uploading"), &site("s9", "nine")).unwrap();
        assert_eq!(build.deploy.site_id, "s9");
        assert_eq!(build.site_name, "nine");
        assert_eq!(build.progress, 80);
        assert!(!build.can_cancel());
        assert!(Build::from_deploy(deploy("error"), &site("s9", "nine")).is_none());
    }

    #[test]
    fn labels() {
        assert_eq!(status_label(&DeployState::Ready), "Success");
        assert_eq!(status_label(&DeployState::Error), "Failed");
        assert_eq!(status_label(&DeployState::Processing), "processing");
        assert_eq!(status_label(&DeployState::Other("weird".into())), "weird");
    }
}
