use mbo_config::StrategyConfig;
use mbo_schemas::{round_r, Candle, Direction, OutcomeResult, TradeOutcome, TradeStatus};

use crate::context::MachineContext;
use crate::events::Event;
use crate::state::{MachineState, TrackPhase};
use crate::track::step_track;
use crate::zone;

/// The two-track breakout state machine (spec §4.3) — the heart of the
/// system. A pure function of (context, event): no I/O, no suspension
/// points, no internal threads (spec §5).
pub struct StrategyMachine {
    ctx: MachineContext,
    zone_end_utc: i64,
}

impl StrategyMachine {
    /// `zone_end_utc` is the already-computed ET-to-UTC boundary for the
    /// zone-build window (spec §4.4 step 2 happens in the runner, before
    /// the machine is instantiated).
    pub fn new(
        date: impl Into<String>,
        symbol: impl Into<String>,
        config: StrategyConfig,
        zone_end_utc: i64,
    ) -> Self {
        Self {
            ctx: MachineContext::new(date.into(), symbol.into(), config),
            zone_end_utc,
        }
    }

    pub fn state(&self) -> MachineState {
        self.ctx.state
    }

    pub fn is_terminal(&self) -> bool {
        self.ctx.state.is_terminal()
    }

    pub fn context(&self) -> &MachineContext {
        &self.ctx
    }

    /// Consumes the machine, yielding its internal context (spec §3:
    /// "on termination it yields that state into the SessionContext").
    pub fn into_context(self) -> MachineContext {
        self.ctx
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::SessionStart { .. } => self.on_session_start(),
            Event::NewBar { bar } => self.on_new_bar(bar),
            Event::SessionEnd => self.on_session_end(),
            Event::Error { message } => self.on_error(message),
        }
    }

    fn on_session_start(&mut self) {
        if self.ctx.state == MachineState::Idle {
            self.ctx.state = MachineState::BuildingZone;
        } else {
            self.on_error(format!(
                "SessionStart received while machine was in {:?}",
                self.ctx.state
            ));
        }
    }

    fn on_new_bar(&mut self, bar: Candle) {
        // The core treats any bar with completed = false as a tick and
        // ignores it (spec §4.2).
        if !bar.completed {
            return;
        }

        match self.ctx.state {
            MachineState::Idle => {
                self.on_error("NewBar received before SessionStart".to_string());
            }
            MachineState::BuildingZone => {
                zone::on_building_zone_bar(&mut self.ctx, bar, self.zone_end_utc);
            }
            MachineState::Monitoring => {
                self.ctx.all_bars.push(bar);
                step_track(&mut self.ctx, Direction::Long, &bar);
                step_track(&mut self.ctx, Direction::Short, &bar);
            }
            MachineState::NoTrade | MachineState::Complete | MachineState::Error => {
                // Terminal: the runner is expected to have stopped
                // forwarding bars (spec §4.4 step 4), but a stray bar here
                // is simply dropped rather than treated as an invariant
                // violation.
            }
        }
    }

    fn on_session_end(&mut self) {
        match self.ctx.state {
            MachineState::Monitoring => {
                if self.ctx.has_open_trade() {
                    self.record_timeout();
                }
                self.ctx.state = MachineState::Complete;
            }
            MachineState::Idle | MachineState::BuildingZone => {
                // The execution window closed before the zone ever
                // finished building; no trade was possible this session.
                self.ctx.state = MachineState::Complete;
            }
            MachineState::NoTrade | MachineState::Complete | MachineState::Error => {}
        }
    }

    /// Records a SessionTimeout outcome for any track with an open trade
    /// (spec §4.3.8), using the last bar observed.
    fn record_timeout(&mut self) {
        let Some(last) = self.ctx.all_bars.last().copied() else {
            return;
        };
        for dir in [Direction::Long, Direction::Short] {
            self.record_timeout_for_track(dir, last);
        }
    }

    fn record_timeout_for_track(&mut self, dir: Direction, last: Candle) {
        let (open_idx, milestones, bars_held, max_favorable_r, max_adverse_r) = match dir {
            Direction::Long => (
                self.ctx.long.open_trade_idx,
                self.ctx.long.milestones,
                self.ctx.long.bars_in_position,
                self.ctx.long.max_favorable_r,
                self.ctx.long.max_adverse_r,
            ),
            Direction::Short => (
                self.ctx.short.open_trade_idx,
                self.ctx.short.milestones,
                self.ctx.short.bars_in_position,
                self.ctx.short.max_favorable_r,
                self.ctx.short.max_adverse_r,
            ),
        };
        let idx = match open_idx {
            Some(i) => i,
            None => return,
        };
        if self.ctx.trades[idx].status != TradeStatus::Open {
            return;
        }

        let realized_r = round_r(self.ctx.trades[idx].floating_r(last.close));
        self.ctx.trades[idx].status = TradeStatus::SessionExpired;
        let trade_id = self.ctx.trades[idx].id.clone();

        self.ctx.outcomes.push(TradeOutcome {
            trade_id,
            result: OutcomeResult::SessionTimeout,
            max_favorable_r,
            max_adverse_r,
            exit_price: last.close,
            exit_timestamp: last.timestamp,
            realized_r,
            first_threshold_reached: milestones.highest_reached(),
            timestamp_1r: milestones.timestamp_1r,
            timestamp_2r: milestones.timestamp_2r,
            timestamp_3r: milestones.timestamp_3r,
            timestamp_stop: 0,
            bars_held,
        });

        match dir {
            Direction::Long => self.ctx.long.phase = TrackPhase::Resolved,
            Direction::Short => self.ctx.short.phase = TrackPhase::Resolved,
        }
    }

    fn on_error(&mut self, message: String) {
        self.ctx.error = Some(message);
        self.ctx.state = MachineState::Error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mbo_config::StrategyConfig;

    fn candle(ts: i64, o: i64, h: i64, l: i64, c: i64) -> Candle {
        Candle::new(ts, o, h, l, c, 100, true).unwrap()
    }

    const ZONE_END: i64 = 1_800_000; // 09:30 + 30min in this fixture's relative clock

    fn started(zone_end: i64) -> StrategyMachine {
        let mut m = StrategyMachine::new("2024-06-17", "SPY", StrategyConfig::default(), zone_end);
        m.handle_event(Event::SessionStart {
            date: "2024-06-17".into(),
            symbol: "SPY".into(),
        });
        m
    }

    #[test]
    fn idle_routes_non_session_start_to_error() {
        let mut m = StrategyMachine::new("2024-06-17", "SPY", StrategyConfig::default(), ZONE_END);
        m.handle_event(Event::NewBar {
            bar: candle(0, 100, 110, 90, 105),
        });
        assert_eq!(m.state(), MachineState::Error);
        assert!(m.context().error.is_some());
    }

    #[test]
    fn full_scenario_a_reaches_win_3r() {
        let mut m = started(ZONE_END);
        m.handle_event(Event::NewBar {
            bar: candle(0, 50_000, 50_200, 49_900, 50_100),
        });
        m.handle_event(Event::NewBar {
            bar: candle(ZONE_END, 50_100, 50_210, 50_050, 50_200),
        });
        assert_eq!(m.state(), MachineState::Monitoring);

        m.handle_event(Event::NewBar {
            bar: candle(ZONE_END + 300_000, 50_200, 50_300, 50_150, 50_250),
        });
        m.handle_event(Event::NewBar {
            bar: candle(ZONE_END + 600_000, 50_250, 50_360, 50_180, 50_350),
        });
        assert_eq!(m.context().trades.len(), 1);
        assert_eq!(m.context().trades[0].entry_price, 50_350);
        assert_eq!(m.context().trades[0].initial_stop, 49_900);

        m.handle_event(Event::NewBar {
            bar: candle(ZONE_END + 900_000, 50_350, 50_850, 50_300, 50_800),
        });
        m.handle_event(Event::NewBar {
            bar: candle(ZONE_END + 1_200_000, 50_800, 51_300, 50_750, 51_250),
        });
        m.handle_event(Event::NewBar {
            bar: candle(ZONE_END + 1_500_000, 51_250, 51_750, 51_200, 51_700),
        });

        assert_eq!(m.context().outcomes.len(), 1);
        assert_eq!(m.context().outcomes[0].result, OutcomeResult::Win3R);
        assert_eq!(m.context().outcomes[0].realized_r, 3.0);
    }

    #[test]
    fn choppy_zone_yields_no_trade_with_no_trades() {
        let mut m = started(0);
        m.handle_event(Event::NewBar {
            bar: candle(0, 50_000, 50_200, 49_900, 50_100),
        });
        assert_eq!(m.state(), MachineState::NoTrade);
        assert!(m.context().trades.is_empty());
    }

    #[test]
    fn session_end_with_open_trade_records_timeout() {
        let mut m = started(0);
        // Close sits exactly on resistance, not strictly inside the zone,
        // so the boundary bar is not choppy (spec §4.3.1).
        m.handle_event(Event::NewBar {
            bar: candle(0, 50_000, 50_200, 49_900, 50_200),
        });
        assert_eq!(m.state(), MachineState::Monitoring);
        m.handle_event(Event::NewBar {
            bar: candle(300_000, 50_050, 50_300, 50_020, 50_250),
        });
        m.handle_event(Event::NewBar {
            bar: candle(600_000, 50_250, 50_360, 50_180, 50_350),
        });
        assert_eq!(m.context().trades.len(), 1);
        m.handle_event(Event::SessionEnd);
        assert_eq!(m.state(), MachineState::Complete);
        assert_eq!(m.context().outcomes.len(), 1);
        assert_eq!(m.context().outcomes[0].result, OutcomeResult::SessionTimeout);
        assert_eq!(m.context().trades[0].status, TradeStatus::SessionExpired);
    }
}
