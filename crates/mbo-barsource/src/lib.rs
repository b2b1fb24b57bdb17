//! mbo-barsource
//!
//! Lazy, finite, chronologically ordered bar sequences for one (symbol,
//! date) (spec §4.2). Two implementations:
//!
//! - [`BacktestBarSource`] — replays a fixed, pre-sorted set of bars and
//!   drives a [`SimClock`] forward as it yields them. Restartable.
//! - [`LiveBarSource`] — a bounded async queue fed by a push producer
//!   (e.g. a broker feed adapter). Not restartable; suspension is
//!   cancellable.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};

use mbo_clock::SimClock;
use mbo_schemas::Candle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarSourceError {
    /// Two bars disagree on OHLCV at the same timestamp after dedup — the
    /// feed contradicted itself (spec §5: "duplicate deliveries...the
    /// values will match" is assumed, this flags when they don't).
    ConflictingDuplicate { timestamp: i64 },
    /// The underlying transport failed (live mode only).
    Transport { message: String },
}

impl core::fmt::Display for BarSourceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BarSourceError::ConflictingDuplicate { timestamp } => {
                write!(f, "conflicting duplicate bar at ts={timestamp}")
            }
            BarSourceError::Transport { message } => write!(f, "bar source transport error: {message}"),
        }
    }
}

impl std::error::Error for BarSourceError {}

/// A lazy, finite, chronologically ordered sequence of completed bars for
/// one (symbol, date).
#[async_trait]
pub trait BarSource: Send {
    /// Yields the next bar, or `Ok(None)` when the source is exhausted.
    /// Ticks (`completed = false`) are never yielded by an implementation
    /// of this trait — callers that want the core's semantics ("treat any
    /// bar with completed = false as a tick and ignore it", spec §4.2) can
    /// rely on that, but should still guard defensively.
    async fn next_bar(&mut self) -> Result<Option<Candle>, BarSourceError>;
}

/// Normalize a raw bar feed: sort ascending by timestamp, and for
/// duplicate timestamps keep only the latest arrival (spec §4.2).
fn normalize(mut bars: Vec<Candle>) -> Vec<Candle> {
    bars.sort_by_key(|b| b.timestamp);
    let mut out: Vec<Candle> = Vec::with_capacity(bars.len());
    for bar in bars {
        if let Some(last) = out.last_mut() {
            if last.timestamp == bar.timestamp {
                *last = bar;
                continue;
            }
        }
        out.push(bar);
    }
    out
}

/// Replays a fixed sequence of bars, advancing a [`SimClock`] as it yields
/// them. Restartable via [`BacktestBarSource::reset`] — re-reading the same
/// fixture sequence from the start.
pub struct BacktestBarSource {
    bars: Vec<Candle>,
    index: usize,
    clock: SimClock,
}

impl BacktestBarSource {
    pub fn new(bars: Vec<Candle>, clock: SimClock) -> Self {
        Self {
            bars: normalize(bars),
            index: 0,
            clock,
        }
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn remaining(&self) -> usize {
        self.bars.len() - self.index
    }
}

#[async_trait]
impl BarSource for BacktestBarSource {
    async fn next_bar(&mut self) -> Result<Option<Candle>, BarSourceError> {
        if self.index >= self.bars.len() {
            return Ok(None);
        }
        let bar = self.bars[self.index];
        self.index += 1;
        // The bar's timestamp becomes the clock's new `now` before the
        // consumer sees the bar (spec §4.2).
        self.clock.advance_to(bar.timestamp);
        Ok(Some(bar))
    }
}

/// Producer handle for [`LiveBarSource`]: the feed adapter pushes bars (and
/// in-flight ticks, which the consumer ignores per spec §4.2) onto this.
#[derive(Clone)]
pub struct LiveBarProducer {
    tx: mpsc::Sender<Candle>,
}

impl LiveBarProducer {
    pub async fn push(&self, bar: Candle) -> Result<(), BarSourceError> {
        self.tx
            .send(bar)
            .await
            .map_err(|_| BarSourceError::Transport {
                message: "bar consumer dropped".to_string(),
            })
    }
}

/// A bounded queue fed asynchronously by a live feed. `next_bar` suspends
/// until a bar arrives, the queue closes, or [`LiveBarSource::cancel`] is
/// called (spec §5: "BarSource in live mode may suspend...must also be
/// cancellable").
pub struct LiveBarSource {
    rx: mpsc::Receiver<Candle>,
    cancel: Arc<Notify>,
}

impl LiveBarSource {
    /// `capacity` bounds the queue; a slow consumer applies backpressure to
    /// the producer rather than growing unbounded.
    pub fn channel(capacity: usize) -> (LiveBarProducer, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            LiveBarProducer { tx },
            Self {
                rx,
                cancel: Arc::new(Notify::new()),
            },
        )
    }

    pub fn cancel_handle(&self) -> Arc<Notify> {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.notify_waiters();
    }
}

#[async_trait]
impl BarSource for LiveBarSource {
    async fn next_bar(&mut self) -> Result<Option<Candle>, BarSourceError> {
        tokio::select! {
            bar = self.rx.recv() => Ok(bar),
            _ = self.cancel.notified() => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mbo_schemas::Candle;

    fn bar(ts: i64, close: i64) -> Candle {
        Candle::new(ts, close, close + 10, close - 10, close, 100, true).unwrap()
    }

    #[tokio::test]
    async fn backtest_source_yields_in_order_and_advances_clock() {
        let clock = SimClock::new(0);
        let mut src = BacktestBarSource::new(vec![bar(600_000, 100), bar(300_000, 90)], clock.clone());

        let first = src.next_bar().await.unwrap().unwrap();
        assert_eq!(first.timestamp, 300_000);
        assert_eq!(clock.now(), 300_000);

        let second = src.next_bar().await.unwrap().unwrap();
        assert_eq!(second.timestamp, 600_000);
        assert_eq!(clock.now(), 600_000);

        assert!(src.next_bar().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn backtest_source_dedups_keeping_latest() {
        let clock = SimClock::new(0);
        let mut b1 = bar(300_000, 100);
        let mut b2 = bar(300_000, 105);
        b1.volume = 1;
        b2.volume = 2;
        let mut src = BacktestBarSource::new(vec![b1, b2], clock);
        let only = src.next_bar().await.unwrap().unwrap();
        assert_eq!(only.volume, 2);
        assert!(src.next_bar().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn backtest_source_reset_replays_from_start() {
        let clock = SimClock::new(0);
        let mut src = BacktestBarSource::new(vec![bar(300_000, 100)], clock);
        src.next_bar().await.unwrap();
        assert!(src.next_bar().await.unwrap().is_none());
        src.reset();
        assert!(src.next_bar().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn live_source_yields_pushed_bars_in_order() {
        let (producer, mut src) = LiveBarSource::channel(4);
        producer.push(bar(300_000, 100)).await.unwrap();
        producer.push(bar(600_000, 105)).await.unwrap();
        let a = src.next_bar().await.unwrap().unwrap();
        let b = src.next_bar().await.unwrap().unwrap();
        assert_eq!(a.timestamp, 300_000);
        assert_eq!(b.timestamp, 600_000);
    }

    #[tokio::test]
    async fn live_source_cancel_unblocks_next_bar() {
        let (_producer, mut src) = LiveBarSource::channel(4);
        src.cancel();
        let got = src.next_bar().await.unwrap();
        assert!(got.is_none());
    }
}
