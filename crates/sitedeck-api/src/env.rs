// Environment variable endpoints
//
// Variables are account-scoped and filtered to one site with `site_id`.

use tracing::debug;

use crate::client::{PlatformClient, Request};
use crate::error::Error;
use crate::models::{EnvVar, Page};

impl PlatformClient {
    /// List the variables bound to a site.
    ///
    /// `GET /accounts/{slug}/env?site_id={id}`
    pub async fn list_env_vars(
        &self,
        account_slug: &str,
        site_id: &str,
    ) -> Result<Vec<EnvVar>, Error> {
        let request =
            Request::get(["accounts", account_slug, "env"]).query("site_id", site_id);
        let page: Page<EnvVar> = match self.send(request).await? {
            crate::Outcome::Body(resp) => resp.decode_list()?,
            _ => return Ok(Vec::new()),
        };
        Ok(page.items)
    }

    /// Publish a full set of variables for a site.
    ///
    /// `POST /accounts/{slug}/env?site_id={id}` with a JSON array of
    /// [`EnvVar`] entries.
    pub async fn replace_env_vars(
        &self,
        account_slug: &str,
        site_id: &str,
        vars: &[EnvVar],
    ) -> Result<(), Error> {
        debug!(site_id, count = vars.len(), "publishing environment variables");
        let payload = serde_json::to_value(vars).map_err(|e| Error::Unexpected {
            message: format!("failed to encode environment variables: {e}"),
        })?;
        let request = Request::post(["accounts", account_slug, "env"])
            .query("site_id", site_id)
            .json(payload);
        self.send(request).await?;
        Ok(())
    }
}
