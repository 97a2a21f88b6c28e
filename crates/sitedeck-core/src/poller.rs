// ── Background build poller ──
//
// Periodically asks the console to refresh the active-build board. The
// console's throttle and in-flight guard still apply, so a slow fetch is
// never stacked with another.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::console::{Console, Refresh};

/// Handle to a running poll task. Dropping it stops the task.
pub struct BuildPoller {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl BuildPoller {
    /// Start polling at the console's configured interval. The first
    /// refresh runs immediately.
    pub fn start(console: Console) -> Self {
        let period = console.timings().poll_interval;
        Self::start_with_period(console, period)
    }

    pub fn start_with_period(console: Console, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_task(console, period, cancel.child_token()));
        info!(period_secs = period.as_secs(), "build poller started");
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop polling and wait for the task to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("build poller stopped");
    }
}

impl Drop for BuildPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_task(console: Console, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match console.refresh_builds().await {
                    Ok(Refresh::Skipped) => debug!("build poll skipped"),
                    Ok(outcome) => debug!(?outcome, "build poll"),
                    Err(e) => debug!(error = %e, "build poll failed"),
                }
            }
        }
    }
}
