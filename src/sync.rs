//! Synchronized-delivery scheduling.
//!
//! A synced send stamps the originator's virtual time onto the frame; every
//! recipient computes `wait = max(0, stamped_time - local_virtual_time)` and
//! invokes its subscribers after that wait, so delivery appears simultaneous
//! across nodes despite clock and latency skew.
//!
//! Each pending delivery is its own spawned task sleeping cooperatively, so
//! many can be in flight at once and none stalls frame dispatch. There is no
//! cancellation: once scheduled, a delivery always fires.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Ceiling on a single delivery wait, in virtual seconds.
///
/// A stamp comes off the wire and can be arbitrarily far ahead of the local
/// clock; an uncapped wait would park the delivery task past any useful
/// horizon (or overflow the sleep timer outright). One day is already far
/// beyond any plausible clock skew.
pub const MAX_WAIT_SECS: f64 = 86_400.0;

/// Compute the local wait for a synced delivery.
///
/// Negative and non-finite waits clamp to zero: a delivery never fires "late"
/// by waiting negative time, and never fires before dispatch.
pub fn delivery_wait(stamped_time: f64, local_time: f64) -> f64 {
    let wait = stamped_time - local_time;
    if wait.is_finite() && wait > 0.0 {
        wait
    } else {
        0.0
    }
}

/// Schedules delayed subscriber invocations.
///
/// Cheap to clone; clones share the pending count.
#[derive(Clone, Default)]
pub struct SyncScheduler {
    pending: Arc<AtomicUsize>,
}

impl SyncScheduler {
    /// Create a scheduler with no pending deliveries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `deliver` after `wait_secs` of virtual-seconds wait.
    ///
    /// A zero wait still yields to the runtime once; it does not run inline,
    /// so scheduling never re-enters dispatch. Waits above [`MAX_WAIT_SECS`]
    /// are capped, so a bogus stamp cannot lose the delivery. Must be called
    /// within a tokio runtime.
    pub fn schedule(&self, wait_secs: f64, deliver: impl FnOnce() + Send + 'static) {
        let wait = if wait_secs.is_finite() && wait_secs > 0.0 {
            wait_secs.min(MAX_WAIT_SECS)
        } else {
            0.0
        };
        let pending = Arc::clone(&self.pending);
        pending.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            if wait > 0.0 {
                tokio::time::sleep(Duration::from_secs_f64(wait)).await;
            }
            // The pending count must drop even if the delivery panics.
            if catch_unwind(AssertUnwindSafe(deliver)).is_err() {
                tracing::warn!("scheduled delivery panicked");
            }
            pending.fetch_sub(1, Ordering::SeqCst);
        });
    }

    /// Number of deliveries scheduled but not yet fired.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for SyncScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn wait_clamps_to_zero() {
        assert_eq!(delivery_wait(10.0, 10.2), 0.0);
        assert_eq!(delivery_wait(10.0, 10.5), 0.0);
        assert_eq!(delivery_wait(f64::NAN, 1.0), 0.0);
        assert!((delivery_wait(10.5, 10.0) - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn zero_wait_fires_promptly() {
        let scheduler = SyncScheduler::new();
        let fired = Arc::new(AtomicBool::new(false));

        let fired_clone = Arc::clone(&fired);
        scheduler.schedule(0.0, move || {
            fired_clone.store(true, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(fired.load(Ordering::SeqCst));
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn absurd_stamp_is_capped_not_lost() {
        let scheduler = SyncScheduler::new();
        let fired = Arc::new(AtomicBool::new(false));

        let fired_clone = Arc::clone(&fired);
        scheduler.schedule(1e30, move || {
            fired_clone.store(true, Ordering::SeqCst);
        });

        // Let the delivery task register its sleep before advancing the clock.
        tokio::task::yield_now().await;
        assert_eq!(scheduler.pending(), 1);

        tokio::time::advance(Duration::from_secs_f64(MAX_WAIT_SECS + 1.0)).await;
        tokio::task::yield_now().await;

        assert!(fired.load(Ordering::SeqCst), "capped delivery must still fire");
        assert_eq!(scheduler.pending(), 0, "pending count must drop after firing");
    }

    #[tokio::test]
    async fn panicking_delivery_does_not_leak_pending() {
        let scheduler = SyncScheduler::new();
        scheduler.schedule(0.0, || panic!("subscriber blew up"));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn pending_waits_run_concurrently() {
        let scheduler = SyncScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let fired = Arc::clone(&fired);
            scheduler.schedule(0.05, move || {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(scheduler.pending(), 3);

        // All three share the same 50ms window rather than running serially.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.pending(), 0);
    }
}
