// Deploy endpoints

use tracing::debug;

use crate::client::{PlatformClient, Request};
use crate::error::Error;
use crate::models::{Deploy, DeployQuery, Page};

impl PlatformClient {
    /// List a site's deploys, newest first.
    ///
    /// `GET /sites/{id}/deploys?page=..&per_page=..[&production=..][&state=..][&branch=..]`
    pub async fn list_deploys(
        &self,
        site_id: &str,
        query: &DeployQuery,
    ) -> Result<Page<Deploy>, Error> {
        let mut request = Request::get(["sites", site_id, "deploys"]);
        for (key, value) in query.params() {
            request = request.query(key, value);
        }
        self.send(request).await?.into_response()?.decode_list()
    }

    /// List every deploy the platform returns for a site, without paging
    /// parameters (the platform applies its own default window).
    ///
    /// `GET /sites/{id}/deploys`
    pub async fn list_all_deploys(&self, site_id: &str) -> Result<Vec<Deploy>, Error> {
        let page: Page<Deploy> = self
            .send(Request::get(["sites", site_id, "deploys"]))
            .await?
            .into_response()?
            .decode_list()?;
        Ok(page.items)
    }

    /// Fetch one deploy.
    ///
    /// `GET /deploys/{id}`
    pub async fn get_deploy(&self, deploy_id: &str) -> Result<Deploy, Error> {
        self.get_json(Request::get(["deploys", deploy_id])).await
    }

    /// Trigger a new build (redeploy) of a site.
    ///
    /// `POST /sites/{id}/builds`
    pub async fn create_build(&self, site_id: &str) -> Result<Deploy, Error> {
        debug!(site_id, "triggering build");
        self.send(Request::post(["sites", site_id, "builds"]))
            .await?
            .decode()
    }

    /// Cancel an in-progress deploy.
    ///
    /// `POST /deploys/{id}/cancel`. The platform answers 404 when the
    /// deploy already finished or cannot be canceled.
    pub async fn cancel_deploy(&self, deploy_id: &str) -> Result<(), Error> {
        debug!(deploy_id, "canceling deploy");
        self.send(Request::post(["deploys", deploy_id, "cancel"]))
            .await?;
        Ok(())
    }
}
