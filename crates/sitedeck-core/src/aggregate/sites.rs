// ── Site aggregation ──
//
// One sites-list call, then one latest-deploy lookup per site, all in
// flight at once. A failed lookup degrades that site to "no deploy".

use sitedeck_api::{Deploy, DeployQuery, Page, PlatformClient, Site, SiteQuery};
use tracing::{debug, warn};

use crate::model::{SitePage, SiteView};

/// Fetch one page of sites and attach each site's most recent deploy.
///
/// Fails only if the sites list itself fails. Output order follows the
/// platform's order.
pub async fn sites_with_last_deploy(
    client: &PlatformClient,
    query: &SiteQuery,
) -> Result<SitePage, sitedeck_api::Error> {
    let page = client.list_sites(query).await?;
    debug!(count = page.items.len(), has_more = page.has_more, "fetched sites");

    let latest = DeployQuery::latest();
    let futs = page.items.into_iter().map(|site| {
        let latest = &latest;
        async move {
            let lookup = client.list_deploys(&site.id, latest).await;
            attach_last_deploy(site, lookup)
        }
    });
    let sites = futures_util::future::join_all(futs).await;

    Ok(SitePage {
        sites,
        has_more: page.has_more,
        link: page.link,
    })
}

/// Fold a latest-deploy lookup into a [`SiteView`].
pub(crate) fn attach_last_deploy(
    site: Site,
    lookup: Result<Page<Deploy>, sitedeck_api::Error>,
) -> SiteView {
    match lookup {
        Ok(deploys) => SiteView::new(site, deploys.items.into_iter().next()),
        Err(e) => {
            warn!(site_id = %site.id, error = %e, "last deploy lookup failed");
            SiteView::new(site, None)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn site(id: &str) -> Site {
        serde_json::from_value(json!({ "id": id })).unwrap()
    }

    #[test]
    fn failed_lookup_yields_empty_deploy() {
        let err = sitedeck_api::Error::Http {
            status: 500,
            message: "boom".into(),
        };
        let view = attach_last_deploy(site("b"), Err(err));
        assert_eq!(view.id(), "b");
        assert!(view.last_deploy.is_none());
        assert!(view.last_deploy_time.is_none());
    }

    #[test]
    fn empty_history_yields_empty_deploy() {
        let page = Page {
            items: Vec::new(),
            link: None,
            has_more: false,
        };
        let view = attach_last_deploy(site("a"), Ok(page));
        assert!(view.last_deploy.is_none());
    }
}
