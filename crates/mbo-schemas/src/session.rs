use serde::{Deserialize, Serialize};

use crate::bar::Candle;
use crate::outcome::TradeOutcome;
use crate::signal::Signal;
use crate::trade::Trade;
use crate::zone::DecisionZone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Waiting,
    BuildingZone,
    Monitoring,
    NoTrade,
    Complete,
    Interrupted,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    Live,
    Mock,
}

/// The immutable, self-contained output record of one session (spec §3).
///
/// Exclusively owns its signals/trades/outcomes/bars — no cyclic references,
/// no shared mutable state with the machine that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub date: String,
    pub symbol: String,
    pub zone: Option<DecisionZone>,
    pub signals: Vec<Signal>,
    pub trades: Vec<Trade>,
    pub outcomes: Vec<TradeOutcome>,
    pub all_bars: Vec<Candle>,
    pub status: SessionStatus,
    pub is_backtest: bool,
    pub execution_mode: ExecutionMode,
    pub started_at: i64,
    pub completed_at: Option<i64>,
    pub error: Option<String>,
}

impl SessionContext {
    pub fn has_open_trade(&self) -> bool {
        self.trades
            .iter()
            .any(|t| t.status == crate::trade::TradeStatus::Open)
    }
}
