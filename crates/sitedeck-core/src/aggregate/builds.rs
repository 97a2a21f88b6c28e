// ── Active-build aggregation ──
//
// Walks every site, pulls its deploy history and keeps the deploys that
// are still moving through the pipeline.

use sitedeck_api::{Deploy, Page, PlatformClient, Site, SiteQuery};
use tracing::{debug, warn};

use crate::model::Build;

/// Upper bound on sites-list pages walked per aggregation.
const MAX_SITE_PAGES: u32 = 20;

/// Every site visible to the token, following `rel="next"` pages.
async fn all_sites(client: &PlatformClient) -> Result<Vec<Site>, sitedeck_api::Error> {
    let mut query = SiteQuery::default();
    let mut sites = Vec::new();
    loop {
        let page: Page<Site> = client.list_sites(&query).await?;
        sites.extend(page.items);
        if !page.has_more || query.page >= MAX_SITE_PAGES {
            break;
        }
        query.page += 1;
    }
    Ok(sites)
}

/// Collect in-flight builds across all sites, flattened in site order.
///
/// Fails only if the sites list fails. A site whose deploy listing fails
/// contributes nothing.
pub async fn active_builds(client: &PlatformClient) -> Result<Vec<Build>, sitedeck_api::Error> {
    let sites = all_sites(client).await?;
    debug!(site_count = sites.len(), "scanning sites for active builds");

    let futs = sites.iter().map(|site| async move {
        let lookup = client.list_all_deploys(&site.id).await;
        builds_for_site(site, lookup)
    });
    let builds: Vec<Build> = futures_util::future::join_all(futs)
        .await
        .into_iter()
        .flatten()
        .collect();

    debug!(count = builds.len(), "active builds");
    Ok(builds)
}

/// Active builds out of one site's deploy listing.
pub(crate) fn builds_for_site(
    site: &Site,
    lookup: Result<Vec<Deploy>, sitedeck_api::Error>,
) -> Vec<Build> {
    match lookup {
        Ok(deploys) => deploys
            .into_iter()
            .filter_map(|deploy| Build::from_deploy(deploy, site))
            .collect(),
        Err(e) => {
            warn!(site_id = %site.id, error = %e, "deploy listing failed");
            Vec::new()
        }
    }
}
