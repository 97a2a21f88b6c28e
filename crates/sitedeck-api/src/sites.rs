// Site endpoints
//
// `/sites` is account-wide; every other endpoint is keyed by site id.

use tracing::debug;

use crate::client::{PlatformClient, Request};
use crate::error::Error;
use crate::models::{CreateSiteRequest, Page, Site, SiteQuery};

impl PlatformClient {
    /// List sites visible to the token.
    ///
    /// `GET /sites?filter=all&sort_by=..&order_by=..&page=..&per_page=..[&name=..]`
    pub async fn list_sites(&self, query: &SiteQuery) -> Result<Page<Site>, Error> {
        let mut request = Request::get(["sites"]);
        for (key, value) in query.params() {
            request = request.query(key, value);
        }
        debug!(page = query.page, per_page = query.per_page, "listing sites");
        self.send(request).await?.into_response()?.decode_list()
    }

    /// Fetch one site.
    ///
    /// `GET /sites/{id}`
    pub async fn get_site(&self, site_id: &str) -> Result<Site, Error> {
        self.get_json(Request::get(["sites", site_id])).await
    }

    /// Create a site.
    ///
    /// `POST /sites`
    pub async fn create_site(&self, body: &CreateSiteRequest) -> Result<Site, Error> {
        debug!(name = %body.name, "creating site");
        let payload = serde_json::to_value(body).map_err(|e| Error::Unexpected {
            message: format!("failed to encode site request: {e}"),
        })?;
        let site: Site = self
            .send(Request::post(["sites"]).json(payload))
            .await?
            .decode()?;
        if site.id.is_empty() {
            return Err(Error::Unexpected {
                message: "Failed to create site or site ID is missing in the response".into(),
            });
        }
        Ok(site)
    }

    /// Delete a site.
    ///
    /// `DELETE /sites/{id}`: succeeds on 204, on a `code: 0` body, or on
    /// any other 2xx body.
    pub async fn delete_site(&self, site_id: &str) -> Result<(), Error> {
        debug!(site_id, "deleting site");
        self.send(Request::delete(["sites", site_id])).await?;
        Ok(())
    }
}
