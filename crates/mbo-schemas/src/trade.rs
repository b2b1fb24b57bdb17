use serde::{Deserialize, Serialize};

use crate::signal::{Direction, Signal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    Open,
    StoppedOut,
    TargetHit,
    SessionExpired,
}

/// A single position opened by the strategy machine.
///
/// Invariant (spec §3): for LONG, `initial_stop < entry_price < target_1r <
/// target_2r < target_3r`; mirrored for SHORT. `current_stop` never moves
/// against the position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: i64,
    pub initial_stop: i64,
    pub current_stop: i64,
    pub r_value: i64,
    pub target_1r: i64,
    pub target_2r: i64,
    pub target_3r: i64,
    pub entry_timestamp: i64,
    pub status: TradeStatus,
    pub entry_signal: Signal,
}

impl Trade {
    /// `target_multiples` are the configured k-R multiples (spec §6.4
    /// `targets.target_kR_multiple`), applied in order [1R, 2R, 3R].
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        date: &str,
        symbol: &str,
        direction: Direction,
        attempt: u32,
        entry_price: i64,
        initial_stop: i64,
        entry_timestamp: i64,
        entry_signal: Signal,
        target_multiples: [f64; 3],
    ) -> Self {
        let r_value = (entry_price - initial_stop).abs();
        let sign: i64 = match direction {
            Direction::Long => 1,
            Direction::Short => -1,
        };
        let target_at = |k: f64| -> i64 {
            entry_price + sign * (r_value as f64 * k).round() as i64
        };

        let id = format!(
            "{date}_{symbol}_{dir}_{attempt}",
            dir = match direction {
                Direction::Long => "LONG",
                Direction::Short => "SHORT",
            }
        );

        Self {
            id,
            symbol: symbol.to_string(),
            direction,
            entry_price,
            initial_stop,
            current_stop: initial_stop,
            r_value,
            target_1r: target_at(target_multiples[0]),
            target_2r: target_at(target_multiples[1]),
            target_3r: target_at(target_multiples[2]),
            entry_timestamp,
            status: TradeStatus::Open,
            entry_signal,
        }
    }

    /// Current floating R, given a reference close price. Positive is in
    /// the trade's favor.
    pub fn floating_r(&self, price: i64) -> f64 {
        if self.r_value == 0 {
            return 0.0;
        }
        let raw = match self.direction {
            Direction::Long => price - self.entry_price,
            Direction::Short => self.entry_price - price,
        };
        raw as f64 / self.r_value as f64
    }
}
