// sitedeck-core: aggregation, caching and throttling between sitedeck-api
// and the console front end.

pub mod aggregate;
pub mod board;
pub mod cache;
pub mod config;
pub mod console;
pub mod error;
pub mod model;
pub mod poller;
pub mod throttle;

// ── Primary re-exports ──────────────────────────────────────────────
pub use board::{BoardSnapshot, BoardSubscription, BuildBoard};
pub use cache::TtlCache;
pub use config::{ConsoleConfig, SiteTemplate, Timings};
pub use console::{Cached, Console, Refresh};
pub use error::CoreError;
pub use model::{Build, SitePage, SiteView, can_cancel, estimate_progress, status_label};
pub use poller::BuildPoller;
pub use throttle::CallThrottle;

// Wire types callers need alongside the console.
pub use sitedeck_api::{
    DEFAULT_API_URL, Deploy, DeployQuery, DeployState, Site, SiteQuery, SortField, SortOrder,
    TlsMode,
};
