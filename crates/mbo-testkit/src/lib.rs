//! mbo-testkit
//!
//! Reusable fixtures for the six end-to-end scenarios pinned in spec §8
//! (Scenario A–F), plus a harness that drives them through the real
//! `SessionRunner` the way a backtest driver would. Kept as its own crate,
//! not `#[cfg(test)]` code in `mbo-runtime`, so `mbo-cli` and any future
//! orchestrator crate can reuse the same fixtures for their own
//! regression tests.

mod fixtures;

pub use fixtures::{
    scenario_a_bars, scenario_b_bars, scenario_c_bars, scenario_d_bars, scenario_e_bars,
    scenario_f_bars, ZONE_DATE, ZONE_SYMBOL,
};

use std::sync::Arc;

use mbo_barsource::BacktestBarSource;
use mbo_clock::SimClock;
use mbo_config::StrategyConfig;
use mbo_schemas::{Candle, ExecutionMode, SessionContext};
use mbo_runtime::{RunnerError, SessionRunner};

/// Replays `bars` for `(date, symbol)` through a fresh `SessionRunner` in
/// backtest mode, exactly as `mbo-cli backtest run` does. The clock starts
/// at the session's zone-start instant so `started_at`/`completed_at` are
/// themselves deterministic — running the same fixture twice yields a
/// byte-identical `SessionContext` (spec §8 invariant 8).
pub async fn run_fixture(
    date: &str,
    symbol: &str,
    config: StrategyConfig,
    bars: Vec<Candle>,
) -> Result<SessionContext, RunnerError> {
    let zone_start = mbo_calendar::et_to_utc_ms(date, &config.session_windows.zone_start_time)
        .expect("fixture dates/times must be well-formed");
    let clock = Arc::new(SimClock::new(zone_start));
    let source = BacktestBarSource::new(bars, (*clock).clone());
    let runner = SessionRunner::new(clock, ExecutionMode::Mock, true);
    runner.run_session(date, symbol, config, source).await
}
