use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use mbo_barsource::{LiveBarProducer, LiveBarSource};
use mbo_schemas::Candle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    NotConnected,
    NoHistoricalData { symbol: String },
    Transport { message: String },
}

impl core::fmt::Display for MarketDataError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MarketDataError::NotConnected => write!(f, "market data provider is not connected"),
            MarketDataError::NoHistoricalData { symbol } => {
                write!(f, "no historical bars available for {symbol}")
            }
            MarketDataError::Transport { message } => write!(f, "market data transport error: {message}"),
        }
    }
}

impl std::error::Error for MarketDataError {}

/// External collaborator (spec §6.1): the core requires only these
/// capabilities from a broker/data-vendor integration. Wire protocol,
/// reconnect policy, and contract-lookup caching are explicitly a
/// non-goal of the core and live entirely behind this trait.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn connect(&self) -> Result<(), MarketDataError>;
    async fn disconnect(&self) -> Result<(), MarketDataError>;
    fn is_connected(&self) -> bool;

    /// Bootstrap bars for a backtest (spec §6.1).
    async fn get_historical_bars(
        &self,
        symbol: &str,
        start_utc: i64,
        end_utc: i64,
    ) -> Result<Vec<Candle>, MarketDataError>;

    /// A push subscription producing a [`LiveBarSource`] the runner can pull
    /// from (spec §4.2 "live: bars arrive asynchronously... a bounded
    /// queue").
    async fn subscribe_bars(&self, symbol: &str) -> Result<LiveBarSource, MarketDataError>;
}

/// Deterministic in-memory provider: historical bars come from a fixture
/// table keyed by symbol; live subscriptions hand back a channel the test
/// or backtest driver pushes bars onto directly. Sufficient to drive
/// `mbo-runtime` in tests and as a non-production "paper" data source —
/// it never talks to a real broker (spec §1 non-goals).
pub struct MockMarketDataProvider {
    connected: AtomicBool,
    historical: Mutex<BTreeMap<String, Vec<Candle>>>,
}

impl MockMarketDataProvider {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            historical: Mutex::new(BTreeMap::new()),
        }
    }

    /// Seed the fixture table used by [`MarketDataProvider::get_historical_bars`].
    pub fn seed_historical(&self, symbol: impl Into<String>, bars: Vec<Candle>) {
        self.historical
            .lock()
            .expect("historical fixture lock poisoned")
            .insert(symbol.into(), bars);
    }

    /// Open a live subscription and return the producer handle alongside it,
    /// so a test/driver can push bars directly without going through a real
    /// feed.
    pub fn open_live_channel(&self, capacity: usize) -> (LiveBarProducer, LiveBarSource) {
        LiveBarSource::channel(capacity)
    }
}

impl Default for MockMarketDataProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketDataProvider {
    async fn connect(&self) -> Result<(), MarketDataError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), MarketDataError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn get_historical_bars(
        &self,
        symbol: &str,
        start_utc: i64,
        end_utc: i64,
    ) -> Result<Vec<Candle>, MarketDataError> {
        if !self.is_connected() {
            return Err(MarketDataError::NotConnected);
        }
        let table = self.historical.lock().expect("historical fixture lock poisoned");
        let bars = table
            .get(symbol)
            .ok_or_else(|| MarketDataError::NoHistoricalData {
                symbol: symbol.to_string(),
            })?;
        Ok(bars
            .iter()
            .copied()
            .filter(|b| b.timestamp >= start_utc && b.timestamp < end_utc)
            .collect())
    }

    async fn subscribe_bars(&self, _symbol: &str) -> Result<LiveBarSource, MarketDataError> {
        if !self.is_connected() {
            return Err(MarketDataError::NotConnected);
        }
        let (_producer, source) = self.open_live_channel(64);
        Ok(source)
    }
}
