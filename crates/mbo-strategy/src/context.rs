use mbo_config::StrategyConfig;
use mbo_schemas::{Candle, DecisionZone, Direction, Signal, Trade, TradeOutcome, TradeStatus};

use crate::state::{MachineState, TrackState};

/// The machine's internal state, owned exclusively by its `StrategyMachine`
/// for the life of the session (spec §3 "Ownership"). On termination the
/// machine yields this into the `SessionContext`.
#[derive(Debug, Clone)]
pub struct MachineContext {
    pub date: String,
    pub symbol: String,
    pub config: StrategyConfig,
    pub state: MachineState,
    pub zone: DecisionZone,
    /// Bars collected while in BUILDING_ZONE only; becomes
    /// `zone.source_bars` once the zone is defined.
    pub zone_bars: Vec<Candle>,
    pub all_bars: Vec<Candle>,
    pub signals: Vec<Signal>,
    pub trades: Vec<Trade>,
    pub outcomes: Vec<TradeOutcome>,
    pub active_direction: Option<Direction>,
    pub long: TrackState,
    pub short: TrackState,
    pub error: Option<String>,
}

impl MachineContext {
    pub fn new(date: String, symbol: String, config: StrategyConfig) -> Self {
        Self {
            date,
            symbol,
            config,
            state: MachineState::Idle,
            zone: DecisionZone::pending(),
            zone_bars: Vec::new(),
            all_bars: Vec::new(),
            signals: Vec::new(),
            trades: Vec::new(),
            outcomes: Vec::new(),
            active_direction: None,
            long: TrackState::new(),
            short: TrackState::new(),
            error: None,
        }
    }

    pub fn has_open_trade(&self) -> bool {
        self.trades.iter().any(|t| t.status == TradeStatus::Open)
    }
}
