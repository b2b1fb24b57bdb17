use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{info, warn};

use mbo_barsource::BarSource;
use mbo_calendar::session_windows;
use mbo_clock::Clock;
use mbo_config::StrategyConfig;
use mbo_schemas::{DecisionZone, ExecutionMode, SessionContext, SessionStatus, ZoneStatus};
use mbo_strategy::{Event, MachineState, StrategyMachine};

use crate::error::RunnerError;

/// Orchestrates a single session (spec §4.4): computes the session windows,
/// drives the [`StrategyMachine`] from a [`BarSource`], and harvests a
/// [`SessionContext`]. Contains no trading logic of its own — the machine
/// decides everything; the runner only supplies bars, time, and the
/// terminal event.
///
/// Re-entrant only across distinct instances: a single `SessionRunner`
/// instance runs at most one session at a time (spec §4.4 "Contract with
/// orchestrators").
pub struct SessionRunner<C: Clock> {
    clock: Arc<C>,
    execution_mode: ExecutionMode,
    is_backtest: bool,
    stopped: Arc<AtomicBool>,
    stop_notify: Arc<Notify>,
}

impl<C: Clock> SessionRunner<C> {
    pub fn new(clock: Arc<C>, execution_mode: ExecutionMode, is_backtest: bool) -> Self {
        Self {
            clock,
            execution_mode,
            is_backtest,
            stopped: Arc::new(AtomicBool::new(false)),
            stop_notify: Arc::new(Notify::new()),
        }
    }

    /// Requests cancellation (spec §5 "Cancellation semantics"). Idempotent;
    /// unblocks any in-flight bar wait or `wait_until`. Safe to call from
    /// another task/thread while `run_session` is in flight.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.stop_notify.notify_waiters();
    }

    fn stop_requested(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Runs one session end to end and returns its [`SessionContext`].
    ///
    /// Returns `Err` only for a configuration error detected before the
    /// session starts (spec §7): no machine is instantiated and nothing is
    /// returned to persist. Every failure after that point — a bad bar feed,
    /// an internal invariant violation, a mid-session interrupt — is folded
    /// into the returned context's `status`/`error` fields instead (spec
    /// §7 "Propagation policy").
    pub async fn run_session<B: BarSource>(
        &self,
        date: &str,
        symbol: &str,
        config: StrategyConfig,
        mut bar_source: B,
    ) -> Result<SessionContext, RunnerError> {
        config.validate()?;
        let windows = session_windows(
            date,
            &config.session_windows.zone_start_time,
            &config.session_windows.zone_end_time,
            &config.session_windows.execution_end_time,
        )?;

        let started_at = self.clock.now();
        info!(date, symbol, started_at, "session starting");

        let mut machine = StrategyMachine::new(date, symbol, config, windows.zone_end_utc);
        machine.handle_event(Event::SessionStart {
            date: date.to_string(),
            symbol: symbol.to_string(),
        });

        'bars: loop {
            if self.stop_requested() {
                break 'bars;
            }
            if machine.is_terminal() {
                break 'bars;
            }

            let next = tokio::select! {
                biased;
                next = bar_source.next_bar() => next,
                _ = self.stop_notify.notified() => break 'bars,
            };

            match next {
                Ok(Some(bar)) => {
                    if !bar.completed {
                        continue;
                    }
                    if bar.timestamp < windows.zone_start_utc
                        || bar.timestamp >= windows.execution_end_utc
                    {
                        continue;
                    }
                    if machine.is_terminal() {
                        break 'bars;
                    }
                    machine.handle_event(Event::NewBar { bar });
                }
                Ok(None) => break 'bars,
                Err(e) => {
                    warn!(date, symbol, error = %e, "bar source error");
                    machine.handle_event(Event::Error {
                        message: e.to_string(),
                    });
                    break 'bars;
                }
            }
        }

        // Hard timeout (spec §4.4 step 5): wait for execution_end_utc unless
        // the machine already terminated or a stop was requested while
        // draining bars above.
        if !self.stop_requested() && !machine.is_terminal() {
            tokio::select! {
                biased;
                _ = self.stop_notify.notified() => {}
                _ = self.clock.wait_until(windows.execution_end_utc) => {}
            }
        }

        let interrupted = self.stop_requested();
        if !interrupted && !machine.is_terminal() {
            machine.handle_event(Event::SessionEnd);
        }

        let completed_at = self.clock.now();
        let status = session_status(machine.state(), interrupted);
        info!(date, symbol, ?status, completed_at, "session finished");

        let ctx = machine.into_context();
        Ok(SessionContext {
            date: ctx.date,
            symbol: ctx.symbol,
            zone: zone_for_output(ctx.zone),
            signals: ctx.signals,
            trades: ctx.trades,
            outcomes: ctx.outcomes,
            all_bars: ctx.all_bars,
            status,
            is_backtest: self.is_backtest,
            execution_mode: self.execution_mode,
            started_at,
            completed_at: Some(completed_at),
            error: ctx.error,
        })
    }
}

fn session_status(state: MachineState, interrupted: bool) -> SessionStatus {
    if interrupted {
        return SessionStatus::Interrupted;
    }
    match state {
        MachineState::Idle => SessionStatus::Waiting,
        MachineState::BuildingZone => SessionStatus::BuildingZone,
        MachineState::Monitoring => SessionStatus::Monitoring,
        MachineState::NoTrade => SessionStatus::NoTrade,
        MachineState::Complete => SessionStatus::Complete,
        MachineState::Error => SessionStatus::Error,
    }
}

/// `zone` is optional in `SessionContext` (spec §3): a session interrupted
/// or ended before the zone ever finished building has no zone to report.
fn zone_for_output(zone: DecisionZone) -> Option<DecisionZone> {
    if zone.status == ZoneStatus::Pending {
        None
    } else {
        Some(zone)
    }
}
