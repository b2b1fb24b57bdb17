use serde::{Deserialize, Serialize};

use crate::bar::Candle;

/// Lifecycle of the 09:30–10:00 ET decision zone (spec §3, §4.3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneStatus {
    Pending,
    Defined,
    NoTradeChoppy,
    NoTradeDegenerate,
    Expired,
}

/// The price band between the 09:30 ET bar's high (resistance) and low
/// (support).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionZone {
    pub resistance: i64,
    pub support: i64,
    pub status: ZoneStatus,
    pub defined_at: i64,
    /// Every bar collected during BUILDING_ZONE, for postmortem. The zone's
    /// resistance/support are derived from the first bar only (spec §4.3.1);
    /// this vector is informational context, not an input to that formula.
    pub source_bars: Vec<Candle>,
}

impl DecisionZone {
    pub fn pending() -> Self {
        Self {
            resistance: 0,
            support: 0,
            status: ZoneStatus::Pending,
            defined_at: 0,
            source_bars: Vec::new(),
        }
    }

    pub fn spread(&self) -> i64 {
        self.resistance - self.support
    }

    pub fn midpoint(&self) -> i64 {
        (self.resistance + self.support) / 2
    }
}
