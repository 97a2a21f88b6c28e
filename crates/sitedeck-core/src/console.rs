// ── Console facade ──
//
// Single entry point for views. Owns the platform client plus the cache,
// throttle and build board shared by every operation, and translates
// transport errors into `CoreError`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sitedeck_api::{
    Deploy, DeployQuery, EnvVar, PlatformClient, Site, SiteQuery, TransportConfig,
};
use tracing::{debug, info, warn};

use crate::aggregate;
use crate::board::{BoardSubscription, BuildBoard};
use crate::cache::TtlCache;
use crate::config::{ConsoleConfig, SiteTemplate, Timings};
use crate::error::{CoreError, RATE_LIMITED_MESSAGE};
use crate::model::{Build, SitePage};
use crate::throttle::{CallThrottle, FETCH_BUILDS, FETCH_SITES};

/// Cache key of the active-build list.
pub const ACTIVE_BUILDS_KEY: &str = "active-builds";

/// Cached values held by the console.
#[derive(Debug, Clone)]
pub enum Cached {
    Builds(Arc<Vec<Build>>),
    Sites(Arc<SitePage>),
}

/// What a call to [`Console::refresh_builds`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Another refresh was running or the throttle refused the call.
    Skipped,
    /// Served from the build cache.
    Cached,
    /// Fetched from the platform.
    Fetched,
}

/// Site-fleet operations over one platform account.
///
/// Cheap to clone; clones share the client, cache, throttle and board.
#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

struct ConsoleInner {
    client: PlatformClient,
    account_slug: Option<String>,
    template: SiteTemplate,
    timings: Timings,
    cache: Arc<TtlCache<Cached>>,
    throttle: Arc<CallThrottle>,
    board: BuildBoard,
    /// Set while a build refresh is running.
    refreshing: AtomicBool,
}

/// Clears the in-flight flag when a refresh ends or is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Console {
    /// Build a console and its HTTP client from configuration.
    pub fn new(config: &ConsoleConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: config.tls.clone(),
            ..TransportConfig::default()
        }
        .with_timeout(config.timeout);
        let client = PlatformClient::new(config.api_url.as_str(), config.token.clone(), &transport)?;
        Ok(Self::with_parts(
            client,
            config,
            Arc::new(TtlCache::new()),
            Arc::new(CallThrottle::new()),
        ))
    }

    /// Assemble a console from an existing client and shared cache/throttle.
    pub fn with_parts(
        client: PlatformClient,
        config: &ConsoleConfig,
        cache: Arc<TtlCache<Cached>>,
        throttle: Arc<CallThrottle>,
    ) -> Self {
        Self {
            inner: Arc::new(ConsoleInner {
                client,
                account_slug: config.account_slug.clone().filter(|s| !s.is_empty()),
                template: config.template.clone(),
                timings: config.timings,
                cache,
                throttle,
                board: BuildBoard::new(),
                refreshing: AtomicBool::new(false),
            }),
        }
    }

    pub fn timings(&self) -> Timings {
        self.inner.timings
    }

    pub fn throttle(&self) -> &Arc<CallThrottle> {
        &self.inner.throttle
    }

    pub fn board(&self) -> &BuildBoard {
        &self.inner.board
    }

    /// Subscribe to active-build board updates.
    pub fn subscribe_builds(&self) -> BoardSubscription {
        self.inner.board.subscribe()
    }

    fn account_slug(&self) -> Result<&str, CoreError> {
        self.inner
            .account_slug
            .as_deref()
            .ok_or_else(|| CoreError::Configuration {
                message: "account slug is not configured (needed for environment variables)"
                    .into(),
            })
    }

    // ── Sites ────────────────────────────────────────────────────────

    /// One page of sites, each with its most recent deploy.
    ///
    /// Calls closer together than the sites interval reuse the previous
    /// result for the same query, or fail with `RateLimited` when there is
    /// none. A 429 from the platform blocks further calls for the
    /// rate-limit cooldown.
    pub async fn list_sites(&self, query: &SiteQuery) -> Result<SitePage, CoreError> {
        let inner = &self.inner;
        let key = sites_cache_key(query);

        if inner
            .throttle
            .is_limited(FETCH_SITES, inner.timings.sites_interval)
        {
            if let Some(Cached::Sites(page)) = inner.cache.get(&key) {
                debug!("sites list throttled, serving previous result");
                return Ok((*page).clone());
            }
            if inner.throttle.is_cooling(FETCH_SITES) {
                return Err(CoreError::RateLimited {
                    message: RATE_LIMITED_MESSAGE.into(),
                });
            }
            let wait = inner
                .throttle
                .remaining(FETCH_SITES, inner.timings.sites_interval);
            return Err(CoreError::RateLimited {
                message: format!(
                    "Sites were refreshed moments ago. Try again in {}s.",
                    wait.as_secs().max(1)
                ),
            });
        }

        match aggregate::sites_with_last_deploy(&inner.client, query).await {
            Ok(page) => {
                inner
                    .cache
                    .set_default(key, Cached::Sites(Arc::new(page.clone())));
                Ok(page)
            }
            Err(e) if e.is_rate_limited() => {
                warn!(
                    cooldown_secs = inner.timings.rate_limit_cooldown.as_secs(),
                    "platform rate limit hit"
                );
                inner
                    .throttle
                    .cool_down(FETCH_SITES, inner.timings.rate_limit_cooldown);
                Err(CoreError::RateLimited {
                    message: RATE_LIMITED_MESSAGE.into(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_site(&self, site_id: &str) -> Result<Site, CoreError> {
        Ok(self.inner.client.get_site(site_id).await?)
    }

    /// Create a site from the configured template, then publish its
    /// environment variables.
    ///
    /// Not transactional: if the variables fail, the site still exists and
    /// the error is [`CoreError::EnvNotApplied`].
    pub async fn create_site(
        &self,
        name: &str,
        env_vars: &BTreeMap<String, String>,
    ) -> Result<Site, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation {
                message: "Site name is required".into(),
            });
        }
        let vars = self.prepare_env(env_vars)?;
        let slug = if vars.is_empty() {
            None
        } else {
            Some(self.account_slug()?)
        };

        let request = self.inner.template.to_request(name);
        let site = self.inner.client.create_site(&request).await?;
        info!(site_id = %site.id, name, "site created");

        if let Some(slug) = slug {
            let applied = self.inner.client.replace_env_vars(slug, &site.id, &vars).await;
            if let Err(e) = applied {
                warn!(site_id = %site.id, error = %e, "environment variables not applied");
                return Err(CoreError::EnvNotApplied {
                    site_id: site.id,
                    name: name.to_owned(),
                    message: e.to_string(),
                });
            }
        }
        Ok(site)
    }

    pub async fn delete_site(&self, site_id: &str) -> Result<(), CoreError> {
        self.inner.client.delete_site(site_id).await?;
        info!(site_id, "site deleted");
        Ok(())
    }

    // ── Deploys ──────────────────────────────────────────────────────

    pub async fn get_site_deploys(
        &self,
        site_id: &str,
        query: &DeployQuery,
    ) -> Result<Vec<Deploy>, CoreError> {
        Ok(self.inner.client.list_deploys(site_id, query).await?.items)
    }

    pub async fn get_deploy(&self, deploy_id: &str) -> Result<Deploy, CoreError> {
        Ok(self.inner.client.get_deploy(deploy_id).await?)
    }

    /// Trigger a new build of `site_id`.
    pub async fn redeploy(&self, site_id: &str) -> Result<Deploy, CoreError> {
        let deploy = self.inner.client.create_build(site_id).await?;
        info!(site_id, deploy_id = %deploy.id, "build triggered");
        self.inner.cache.remove(ACTIVE_BUILDS_KEY);
        Ok(deploy)
    }

    /// Cancel a deploy. A 404 from the platform becomes
    /// [`CoreError::DeployNotCancelable`].
    pub async fn cancel_deploy(&self, site_id: &str, deploy_id: &str) -> Result<(), CoreError> {
        match self.inner.client.cancel_deploy(deploy_id).await {
            Ok(()) => {
                info!(site_id, deploy_id, "deploy canceled");
                self.inner.cache.remove(ACTIVE_BUILDS_KEY);
                Ok(())
            }
            Err(e) if e.is_not_found() => Err(CoreError::DeployNotCancelable {
                deploy_id: deploy_id.to_owned(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    // ── Active builds ────────────────────────────────────────────────

    /// In-flight builds across all sites, served from the build cache when
    /// fresh.
    pub async fn list_active_builds(&self) -> Result<Vec<Build>, CoreError> {
        if let Some(builds) = self.cached_builds() {
            return Ok(builds.as_ref().clone());
        }
        let builds = self.fetch_builds().await?;
        Ok(builds.as_ref().clone())
    }

    /// Fetch the active builds and publish them to the board.
    ///
    /// Skips when a refresh is already running or the builds throttle
    /// refuses the call. Failures are published to the board as well as
    /// returned.
    pub async fn refresh_builds(&self) -> Result<Refresh, CoreError> {
        let inner = &self.inner;
        if inner
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("build refresh already running");
            return Ok(Refresh::Skipped);
        }
        let _guard = InFlight(&inner.refreshing);

        if inner
            .throttle
            .is_limited(FETCH_BUILDS, inner.timings.builds_interval)
        {
            debug!("build refresh throttled");
            return Ok(Refresh::Skipped);
        }

        if let Some(builds) = self.cached_builds() {
            inner.board.publish(builds);
            return Ok(Refresh::Cached);
        }

        match self.fetch_builds().await {
            Ok(_) => Ok(Refresh::Fetched),
            Err(e) => {
                inner.board.publish_error(e.to_string());
                Err(e)
            }
        }
    }

    fn cached_builds(&self) -> Option<Arc<Vec<Build>>> {
        match self.inner.cache.get(ACTIVE_BUILDS_KEY) {
            Some(Cached::Builds(builds)) => Some(builds),
            _ => None,
        }
    }

    async fn fetch_builds(&self) -> Result<Arc<Vec<Build>>, CoreError> {
        let builds = Arc::new(aggregate::active_builds(&self.inner.client).await?);
        self.inner.cache.set(
            ACTIVE_BUILDS_KEY,
            Cached::Builds(Arc::clone(&builds)),
            self.inner.timings.builds_ttl,
        );
        self.inner.board.publish(Arc::clone(&builds));
        Ok(builds)
    }

    // ── Environment variables ────────────────────────────────────────

    /// The site's variables as `key -> first value`. Variables without any
    /// value are left out.
    pub async fn get_env_vars(&self, site_id: &str) -> Result<BTreeMap<String, String>, CoreError> {
        let slug = self.account_slug()?;
        let vars = self.inner.client.list_env_vars(slug, site_id).await?;
        Ok(vars
            .into_iter()
            .filter_map(|var| {
                let value = var.first_value()?.to_owned();
                Some((var.key, value))
            })
            .collect())
    }

    /// Publish `vars` for a site, each for every deploy context and scope.
    /// Entries with an empty value are dropped first.
    pub async fn set_env_vars(
        &self,
        site_id: &str,
        vars: &BTreeMap<String, String>,
    ) -> Result<(), CoreError> {
        let vars = self.prepare_env(vars)?;
        let slug = self.account_slug()?;
        self.inner
            .client
            .replace_env_vars(slug, site_id, &vars)
            .await?;
        info!(site_id, count = vars.len(), "environment variables updated");
        Ok(())
    }

    /// Overlay `changes` on the site's current variables and publish the
    /// result. An empty value removes that key.
    pub async fn merge_env_vars(
        &self,
        site_id: &str,
        changes: &BTreeMap<String, String>,
    ) -> Result<(), CoreError> {
        let mut merged = self.get_env_vars(site_id).await?;
        for (key, value) in changes {
            merged.insert(key.trim().to_owned(), value.clone());
        }
        debug!(
            site_id,
            changed = changes.len(),
            total = merged.len(),
            "merged environment variables"
        );
        self.set_env_vars(site_id, &merged).await
    }

    /// Drop empty values and check the template's required keys.
    fn prepare_env(&self, vars: &BTreeMap<String, String>) -> Result<Vec<EnvVar>, CoreError> {
        let kept: Vec<EnvVar> = vars
            .iter()
            .filter(|(key, value)| !key.trim().is_empty() && !value.is_empty())
            .map(|(key, value)| EnvVar::for_all_contexts(key.trim(), value.as_str()))
            .collect();

        let missing: Vec<&str> = self
            .inner
            .template
            .required_env
            .iter()
            .map(String::as_str)
            .filter(|req| !kept.iter().any(|v| v.key == *req))
            .collect();
        if !missing.is_empty() {
            return Err(CoreError::Validation {
                message: format!("missing required environment variables: {}", missing.join(", ")),
            });
        }
        Ok(kept)
    }
}

fn sites_cache_key(query: &SiteQuery) -> String {
    let params: Vec<String> = query
        .params()
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    format!("sites?{}", params.join("&"))
}
