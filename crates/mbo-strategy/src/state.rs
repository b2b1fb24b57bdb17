/// Top-level progression (spec §4.3): IDLE -> BUILDING_ZONE -> EVALUATING_ZONE
/// -> MONITORING -> {NO_TRADE | COMPLETE | ERROR}. EVALUATING_ZONE is
/// transient in this implementation: it is entered and resolved within the
/// same `NewBar` event that completes the zone, so it never appears as a
/// value callers observe between events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Idle,
    BuildingZone,
    Monitoring,
    NoTrade,
    Complete,
    Error,
}

impl MachineState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            MachineState::NoTrade | MachineState::Complete | MachineState::Error
        )
    }
}

/// Per-track phase (spec §4.3.3/§4.3.4). Identical shape for LONG and
/// SHORT; the guard comparisons that drive transitions between these
/// phases differ by direction (spec §4.3.2's two-tier filter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackPhase {
    Watching,
    BreakDetected,
    RetestDetected,
    PositionOpen,
    Resolved,
    Superseded,
    MaxAttemptsExhausted,
}

impl TrackPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TrackPhase::Resolved | TrackPhase::Superseded | TrackPhase::MaxAttemptsExhausted
        )
    }
}

/// R-milestone flags for the currently open trade on a track (spec §4.3.5,
/// §4.3.6). Reset whenever a new trade opens on the track.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RMilestones {
    pub reached_1r: bool,
    pub reached_2r: bool,
    pub reached_3r: bool,
    pub timestamp_1r: i64,
    pub timestamp_2r: i64,
    pub timestamp_3r: i64,
}

impl RMilestones {
    /// Highest milestone reached so far, for `TradeOutcome::first_threshold_reached`.
    pub fn highest_reached(&self) -> u8 {
        if self.reached_3r {
            3
        } else if self.reached_2r {
            2
        } else if self.reached_1r {
            1
        } else {
            0
        }
    }
}

/// Mutable per-direction state the machine advances one bar at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackState {
    pub phase: TrackPhase,
    pub break_attempts: u32,
    /// Index into `MachineContext::trades` for the trade this track
    /// opened, if any. A track opens at most one trade per session (it
    /// becomes terminal immediately after that trade resolves).
    pub open_trade_idx: Option<usize>,
    pub milestones: RMilestones,
    /// Running max favorable / adverse R, using bar extremes (spec §4.3.7).
    /// Seeded at 0.0 (the entry price itself) when a trade opens.
    pub max_favorable_r: f64,
    pub max_adverse_r: f64,
    /// Bars processed by this track while PositionOpen, for `bars_held`.
    pub bars_in_position: u32,
}

impl TrackState {
    pub fn new() -> Self {
        Self {
            phase: TrackPhase::Watching,
            break_attempts: 0,
            open_trade_idx: None,
            milestones: RMilestones::default(),
            max_favorable_r: 0.0,
            max_adverse_r: 0.0,
            bars_in_position: 0,
        }
    }

    pub fn reset_for_new_trade(&mut self, trade_idx: usize) {
        self.open_trade_idx = Some(trade_idx);
        self.milestones = RMilestones::default();
        self.max_favorable_r = 0.0;
        self.max_adverse_r = 0.0;
        self.bars_in_position = 0;
    }
}

impl Default for TrackState {
    fn default() -> Self {
        Self::new()
    }
}
