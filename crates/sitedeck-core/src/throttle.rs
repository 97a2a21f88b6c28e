// ── Call throttle ──
//
// Per-key minimum spacing between permitted calls, plus a forced
// cooldown used when the platform signals rate limiting.

use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;

/// Key used for the sites-list fetch.
pub const FETCH_SITES: &str = "fetch-sites";
/// Key used for the active-builds fetch.
pub const FETCH_BUILDS: &str = "fetch-builds";

#[derive(Debug, Clone, Copy)]
enum Slot {
    /// A call was permitted at this instant.
    Called(Instant),
    /// No call is permitted before this instant.
    CoolingUntil(Instant),
}

/// Tracks when each operation key may run again.
///
/// The first check for a key is never limited. Checks and updates for one
/// key are atomic with respect to each other.
#[derive(Default)]
pub struct CallThrottle {
    slots: DashMap<String, Slot>,
}

impl CallThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` (and changes nothing) if the last permitted call for
    /// `key` happened less than `min_interval` ago or a cooldown is still
    /// running. Otherwise records now as the last call and returns `false`.
    pub fn is_limited(&self, key: &str, min_interval: Duration) -> bool {
        let now = Instant::now();
        match self.slots.entry(key.to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(Slot::Called(now));
                false
            }
            Entry::Occupied(mut slot) => {
                let limited = match *slot.get() {
                    Slot::Called(at) => now.saturating_duration_since(at) < min_interval,
                    Slot::CoolingUntil(deadline) => now < deadline,
                };
                if !limited {
                    slot.insert(Slot::Called(now));
                }
                limited
            }
        }
    }

    /// Refuse every call for `key` until `duration` from now.
    pub fn cool_down(&self, key: &str, duration: Duration) {
        self.slots
            .insert(key.to_owned(), Slot::CoolingUntil(Instant::now() + duration));
    }

    /// Time left before `key` may run, given `min_interval`.
    pub fn remaining(&self, key: &str, min_interval: Duration) -> Duration {
        let now = Instant::now();
        self.slots.get(key).map_or(Duration::ZERO, |slot| match *slot {
            Slot::Called(at) => (at + min_interval).saturating_duration_since(now),
            Slot::CoolingUntil(deadline) => deadline.saturating_duration_since(now),
        })
    }

    /// `true` while `key` is held by a [`cool_down`](Self::cool_down)
    /// rather than by its call spacing.
    pub fn is_cooling(&self, key: &str) -> bool {
        self.slots.get(key).is_some_and(
            |slot| matches!(*slot, Slot::CoolingUntil(deadline) if Instant::now() < deadline),
        )
    }
}
