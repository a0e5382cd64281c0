//! Per-key single-flight coordination.
//!
//! The flight table guarantees that at most one render computation runs per
//! cache key. Callers acquire a permit for their key before computing; while
//! a permit is held, every other acquire for the same key waits, and acquires
//! for different keys proceed in parallel.
//!
//! Two locking layers with distinct jobs:
//!
//! - The **map lock** (`std::sync::Mutex`) guards only slot lookup and
//!   insertion. It is held for map access and never across an await.
//! - Each **slot** (`tokio::sync::Mutex`) serializes computations for one
//!   key. Permits hold the slot's owned guard, so a permit can move into a
//!   spawned task and outlive the caller that acquired it: a disconnecting
//!   client does not release the slot under a still-running computation.
//!
//! The table itself decides nothing about caching: waiters re-check the
//! store once they hold the permit, so a leader's success turns them into
//! cache hits and a leader's failure makes the first waiter the next leader.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::warn;

type Slot = Arc<AsyncMutex<()>>;

/// Map of in-flight render slots, one per cache key.
#[derive(Debug, Default)]
pub struct FlightTable {
    slots: StdMutex<HashMap<String, Slot>>,
}

impl FlightTable {
    /// Create an empty flight table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the single-flight permit for `key`, waiting while another
    /// permit for the same key is live.
    pub async fn acquire(self: &Arc<Self>, key: &str) -> FlightPermit {
        let slot = {
            let mut slots = self.lock_slots();
            slots.entry(key.to_string()).or_default().clone()
        };

        let guard = slot.lock_owned().await;

        FlightPermit {
            table: Arc::clone(self),
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently tracked (live or not yet pruned).
    pub fn active(&self) -> usize {
        self.lock_slots().len()
    }

    fn lock_slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(|poisoned| {
            // A panic while holding the map lock cannot corrupt the map
            // itself; recover rather than propagate the poison.
            warn!("flight table lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

/// Exclusive right to compute one key, released on drop.
#[derive(Debug)]
pub struct FlightPermit {
    table: Arc<FlightTable>,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        // Release the slot before inspecting the map, so the count below
        // reflects only the map's reference and any queued waiters.
        self.guard.take();

        let mut slots = self.table.lock_slots();
        if let Some(slot) = slots.get(self.key.as_str()) {
            // Queued waiters each hold a clone of the slot while they wait;
            // when the map holds the only reference the slot is idle.
            if Arc::strong_count(slot) == 1 {
                slots.remove(self.key.as_str());
            }
        }
    }
}
