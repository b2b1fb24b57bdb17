//! mbo-clock
//!
//! Abstract monotonic time source for the session engine (spec §4.1).
//!
//! Two implementations:
//! - [`SystemClock`] — wall time, real `tokio::time::sleep`.
//! - [`SimClock`] — advances explicitly; `wait_until(t)` returns immediately
//!   after setting `now <- max(now, t)`. Used by backtest, where the
//!   BarSource drives the clock forward as it yields bars.
//!
//! Leaf dependency: no other crate types appear here.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::Notify;

/// Monotonic UTC-millisecond time source, shared across a session.
#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    /// Current time in UTC milliseconds. Never goes backwards.
    fn now(&self) -> i64;

    /// Suspend until `now() >= t`. Instant for [`SimClock`]; sleeps the
    /// real delta for [`SystemClock`]. Cancellable via [`Clock::cancel`].
    async fn wait_until(&self, t: i64);

    /// Convenience wrapper over `wait_until(now() + ms)`.
    async fn sleep(&self, ms: i64) {
        let target = self.now().saturating_add(ms);
        self.wait_until(target).await;
    }

    /// Unblocks any in-flight `wait_until` immediately. Idempotent.
    fn cancel(&self);
}

fn unix_now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Wall-clock implementation used in live mode.
#[derive(Clone)]
pub struct SystemClock {
    cancel: Arc<Notify>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            cancel: Arc::new(Notify::new()),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Clock for SystemClock {
    fn now(&self) -> i64 {
        unix_now_ms()
    }

    async fn wait_until(&self, t: i64) {
        let delta_ms = t.saturating_sub(self.now()).max(0) as u64;
        if delta_ms == 0 {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(std::time::Duration::from_millis(delta_ms)) => {}
            _ = self.cancel.notified() => {}
        }
    }

    fn cancel(&self) {
        self.cancel.notify_waiters();
    }
}

/// Simulated clock used in backtest. `now` only ever advances and only ever
/// moves when explicitly told to (by `wait_until`, or by the BarSource as it
/// yields bars).
#[derive(Clone)]
pub struct SimClock {
    now: Arc<AtomicI64>,
}

impl SimClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    /// Force `now` forward to `max(now, t)`. Used by BarSource in backtest
    /// mode (spec §4.2): the bar's timestamp becomes the new `now` before
    /// the consumer sees the bar.
    pub fn advance_to(&self, t: i64) {
        self.now.fetch_max(t, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Clock for SimClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    async fn wait_until(&self, t: i64) {
        // Simulated clock: no suspension. Setting `now` forward is itself
        // the wait.
        self.advance_to(t);
    }

    fn cancel(&self) {
        // No in-flight suspension to unblock; present for interface parity.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_clock_never_goes_backwards() {
        let c = SimClock::new(1_000);
        c.advance_to(2_000);
        assert_eq!(c.now(), 2_000);
        c.advance_to(1_500);
        assert_eq!(c.now(), 2_000, "advance_to must not move now backwards");
    }

    #[tokio::test]
    async fn sim_clock_wait_until_is_instant_and_sets_now() {
        let c = SimClock::new(0);
        c.wait_until(5_000).await;
        assert_eq!(c.now(), 5_000);
    }

    #[tokio::test]
    async fn system_clock_wait_until_returns_after_target() {
        let c = SystemClock::new();
        let start = c.now();
        c.wait_until(start + 20).await;
        assert!(c.now() >= start + 20);
    }

    #[tokio::test]
    async fn system_clock_cancel_unblocks_wait() {
        let c = Arc::new(SystemClock::new());
        let c2 = c.clone();
        let start = c.now();
        let handle = tokio::spawn(async move {
            c2.wait_until(start + 60_000).await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        c.cancel();
        tokio::time::timeout(std::time::Duration::from_millis(200), handle)
            .await
            .expect("cancel should unblock wait_until promptly")
            .unwrap();
    }
}
