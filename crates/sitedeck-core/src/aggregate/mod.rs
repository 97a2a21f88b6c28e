// ── Fan-out aggregators ──
//
// Turn per-site platform endpoints into consolidated lists. Per-site
// calls run concurrently; results keep the sites-list order.

mod builds;
mod sites;

pub use builds::active_builds;
pub use sites::sites_with_last_deploy;
