use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeResult {
    Loss,
    BreakevenStop,
    Win2R,
    Win3R,
    SessionTimeout,
}

/// The closing record for a [`crate::Trade`] (spec §3). Exactly one per
/// non-Open trade (spec §8 invariant 4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub trade_id: String,
    pub result: OutcomeResult,
    pub max_favorable_r: f64,
    pub max_adverse_r: f64,
    pub exit_price: i64,
    pub exit_timestamp: i64,
    pub realized_r: f64,
    pub first_threshold_reached: u8,
    pub timestamp_1r: i64,
    pub timestamp_2r: i64,
    pub timestamp_3r: i64,
    pub timestamp_stop: i64,
    pub bars_held: u32,
}

/// `realized_r` must equal `round((exit - entry) / r_value, 2)` for LONG
/// (negated for SHORT) — spec §8 invariant 6.
pub fn round_r(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
