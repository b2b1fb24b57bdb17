use serde::{Deserialize, Serialize};

/// Fixed bar size for this engine (spec §3). Not tunable at runtime; kept as
/// a named constant so call sites read as intent rather than a magic number.
pub const BAR_SIZE_MINUTES: u32 = 5;

/// A single completed (or in-flight) 5-minute OHLCV bar.
///
/// Prices are integer cents, never floats. `timestamp` is the bar's close,
/// in UTC milliseconds, aligned to the 5-minute grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: i64,
    pub high: i64,
    pub low: i64,
    pub close: i64,
    pub volume: u64,
    pub completed: bool,
    pub bar_size_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarError {
    /// `low` exceeds the open/close range, or `high` is below it, or
    /// `low > high`.
    InvalidOhlc { candle: Candle },
    /// `bar_size_minutes` is not the fixed value this engine supports.
    UnsupportedBarSize { got: u32 },
    /// `timestamp` is not aligned to the 5-minute grid.
    Unaligned { timestamp: i64 },
}

impl core::fmt::Display for BarError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BarError::InvalidOhlc { candle } => write!(
                f,
                "invalid OHLC: open={} high={} low={} close={}",
                candle.open, candle.high, candle.low, candle.close
            ),
            BarError::UnsupportedBarSize { got } => {
                write!(f, "unsupported bar size: {got} minutes (expected {BAR_SIZE_MINUTES})")
            }
            BarError::Unaligned { timestamp } => {
                write!(f, "timestamp {timestamp} is not aligned to a 5-minute grid")
            }
        }
    }
}

impl std::error::Error for BarError {}

impl Candle {
    /// Bar-grid width in UTC milliseconds.
    pub const GRID_MS: i64 = BAR_SIZE_MINUTES as i64 * 60_000;

    /// Construct and validate a bar per spec §3's invariant:
    /// `low <= min(open, close)`, `high >= max(open, close)`, `low <= high`.
    pub fn new(
        timestamp: i64,
        open: i64,
        high: i64,
        low: i64,
        close: i64,
        volume: u64,
        completed: bool,
    ) -> Result<Self, BarError> {
        let candle = Candle {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            completed,
            bar_size_minutes: BAR_SIZE_MINUTES,
        };

        if low > open.min(close) || high < open.max(close) || low > high {
            return Err(BarError::InvalidOhlc { candle });
        }
        if timestamp.rem_euclid(Self::GRID_MS) != 0 {
            return Err(BarError::Unaligned { timestamp });
        }

        Ok(candle)
    }

    pub fn is_valid(&self) -> bool {
        self.low <= self.open.min(self.close)
            && self.high >= self.open.max(self.close)
            && self.low <= self.high
            && self.bar_size_minutes == BAR_SIZE_MINUTES
    }
}
