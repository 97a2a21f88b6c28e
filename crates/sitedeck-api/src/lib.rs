//! Async client for the hosted-site deploy platform REST API.
//!
//! [`PlatformClient`] issues single-attempt, bearer-authenticated calls
//! and normalizes every response into an [`Outcome`] (no-content marker,
//! delete acknowledgement, or JSON body plus headers) or an [`Error`].
//! Endpoint helpers for sites, deploys and environment variables live in
//! their own modules as inherent methods on the client.

pub mod client;
pub mod deploys;
pub mod env;
pub mod error;
pub mod models;
pub mod sites;
pub mod transport;

pub use client::{ApiResponse, Outcome, PlatformClient, Request};
pub use error::Error;
pub use models::{
    BuildSettings, CreateSiteRequest, Deploy, DeployQuery, DeployState, EnvVar, EnvVarValue,
    ENV_SCOPES, Page, RepoSettings, Site, SiteQuery, SortField, SortOrder,
};
pub use transport::{TlsMode, TransportConfig};

/// Default base URL of the upstream platform API.
pub const DEFAULT_API_URL: &str = "https://api.netlify.com/api/v1";
