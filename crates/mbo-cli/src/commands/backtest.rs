use std::sync::Arc;

use anyhow::Result;

use mbo_barsource::BacktestBarSource;
use mbo_clock::SimClock;
use mbo_config::StrategyConfig;
use mbo_schemas::ExecutionMode;
use mbo_runtime::SessionRunner;

use super::load_bars_csv;

/// Execute `mbo backtest run`: replay a fixed bar fixture through the
/// engine for one (date, symbol) and print the resulting session summary.
/// Optionally persists the session via `mbo-db` when `db_url` is given.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    date: String,
    symbol: String,
    config_paths: Vec<String>,
    bars_csv: String,
    db_url: Option<String>,
    force: bool,
) -> Result<()> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = mbo_config::load_layered_yaml(&path_refs)?;
    let config: StrategyConfig = serde_json::from_value(loaded.config_json.clone())?;

    let windows = mbo_calendar::session_windows(
        &date,
        &config.session_windows.zone_start_time,
        &config.session_windows.zone_end_time,
        &config.session_windows.execution_end_time,
    )?;

    let bars = load_bars_csv(&bars_csv)?;
    let clock = SimClock::new(windows.zone_start_utc);
    let source = BacktestBarSource::new(bars, clock.clone());
    let runner = SessionRunner::new(Arc::new(clock), ExecutionMode::Mock, true);

    let ctx = runner.run_session(&date, &symbol, config, source).await?;

    println!("date={date} symbol={symbol}");
    println!("status={:?}", ctx.status);
    println!("trades={} outcomes={} signals={}", ctx.trades.len(), ctx.outcomes.len(), ctx.signals.len());
    if let Some(zone) = &ctx.zone {
        println!("zone_status={:?} resistance={} support={}", zone.status, zone.resistance, zone.support);
    }
    for outcome in &ctx.outcomes {
        println!(
            "trade={} result={:?} realized_r={}",
            outcome.trade_id, outcome.result, outcome.realized_r
        );
    }
    println!("config_hash={}", loaded.config_hash);

    if let Some(url) = db_url {
        let pool = mbo_db::connect(&url).await?;
        mbo_db::migrate(&pool).await?;
        let wrote = mbo_db::save_session(&pool, &ctx, Some(&loaded.config_hash), force).await?;
        println!("db_write={wrote}");
    }

    Ok(())
}
