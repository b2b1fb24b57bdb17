use mbo_schemas::{
    Candle, DecisionZone, Direction, ExecutionMode, OutcomeResult, Signal, SessionContext,
    SessionStatus, SignalType, Trade, TradeOutcome, ZoneStatus,
};

fn stub_context(date: &str, symbol: &str, status: SessionStatus) -> SessionContext {
    let signal = Signal {
        direction: Direction::Short,
        r#type: SignalType::Confirmation,
        timestamp: 1_000,
        price: 49_800,
        trigger_bar: Candle::new(0, 50_000, 50_050, 49_800, 49_800, 500, true).unwrap(),
        attempt_number: 1,
    };
    let trade = Trade::open(
        date,
        symbol,
        Direction::Short,
        1,
        49_800,
        50_100,
        1_000,
        signal.clone(),
        [1.0, 2.0, 3.0],
    );
    let outcome = TradeOutcome {
        trade_id: trade.id.clone(),
        result: OutcomeResult::Loss,
        max_favorable_r: 0.5,
        max_adverse_r: -1.0,
        exit_price: 50_100,
        exit_timestamp: 4_000,
        realized_r: -1.0,
        first_threshold_reached: 0,
        timestamp_1r: 0,
        timestamp_2r: 0,
        timestamp_3r: 0,
        timestamp_stop: 4_000,
        bars_held: 3,
    };
    SessionContext {
        date: date.to_string(),
        symbol: symbol.to_string(),
        zone: Some(DecisionZone {
            resistance: 50_050,
            support: 49_800,
            status: ZoneStatus::Defined,
            defined_at: 0,
            source_bars: vec![],
        }),
        signals: vec![signal],
        trades: vec![trade],
        outcomes: vec![outcome],
        all_bars: vec![Candle::new(0, 50_000, 50_050, 49_800, 49_800, 500, true).unwrap()],
        status,
        is_backtest: true,
        execution_mode: ExecutionMode::Mock,
        started_at: 0,
        completed_at: Some(4_000),
        error: None,
    }
}

/// A failed session is still saved, so the failure is auditable (spec §7).
/// A subsequent run for the same (date, symbol) is a no-op with
/// `force=false`, and overwrites with `force=true`.
#[tokio::test]
async fn duplicate_key_respects_force_flag() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}/session.db", dir.path().display());
    let pool = mbo_db::testkit_db_pool(&url).await?;

    let failed = stub_context("2024-07-01", "AAPL", SessionStatus::Error);
    assert!(mbo_db::save_session(&pool, &failed, None, false).await?);
    assert!(mbo_db::has_completed_session(&pool, "2024-07-01", "AAPL").await?);

    let retry = stub_context("2024-07-01", "AAPL", SessionStatus::Complete);
    let wrote = mbo_db::save_session(&pool, &retry, None, false).await?;
    assert!(!wrote, "retry without force must be a no-op");

    let still_failed = mbo_db::load_session(&pool, "2024-07-01", "AAPL").await?.unwrap();
    assert_eq!(still_failed.status, SessionStatus::Error);

    let wrote = mbo_db::save_session(&pool, &retry, None, true).await?;
    assert!(wrote, "retry with force must overwrite");

    let overwritten = mbo_db::load_session(&pool, "2024-07-01", "AAPL").await?.unwrap();
    assert_eq!(overwritten.status, SessionStatus::Complete);
    assert_eq!(overwritten.trades.len(), 1);
    assert_eq!(overwritten.outcomes.len(), 1);

    Ok(())
}

/// Sessions for distinct symbols on the same date never collide.
#[tokio::test]
async fn distinct_symbols_coexist() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}/session.db", dir.path().display());
    let pool = mbo_db::testkit_db_pool(&url).await?;

    mbo_db::save_session(&pool, &stub_context("2024-07-01", "AAPL", SessionStatus::Complete), None, false).await?;
    mbo_db::save_session(&pool, &stub_context("2024-07-01", "MSFT", SessionStatus::NoTrade), None, false).await?;

    let aapl = mbo_db::load_session(&pool, "2024-07-01", "AAPL").await?.unwrap();
    let msft = mbo_db::load_session(&pool, "2024-07-01", "MSFT").await?.unwrap();
    assert_eq!(aapl.status, SessionStatus::Complete);
    assert_eq!(msft.status, SessionStatus::NoTrade);
    assert_eq!(msft.trades.len(), 1);

    Ok(())
}
