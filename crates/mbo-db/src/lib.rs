//! mbo-db
//!
//! The Storage external collaborator (spec §6.3): a single-file,
//! single-writer session log, not a relational schema/query-catalog surface
//! (spec §1 non-goal). One row per session plus its flattened
//! signals/trades/outcomes/bars, written once at session end.

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use mbo_schemas::{
    Candle, DecisionZone, Direction, ExecutionMode, OutcomeResult, Signal, SignalType,
    SessionContext, SessionStatus, Trade, TradeOutcome, TradeStatus, ZoneStatus,
};

pub const ENV_DB_URL: &str = "MBO_DATABASE_URL";

/// Connect using `MBO_DATABASE_URL`, creating the database file if absent.
///
/// A single connection: the Storage collaborator is single-writer by design
/// (spec §6.3), so there is no pool contention to size for.
pub async fn connect_from_env() -> Result<SqlitePool> {
    let url = std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;
    connect(&url).await
}

pub async fn connect(url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid sqlite url: {url}"))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .context("failed to connect to sqlite")?;

    Ok(pool)
}

/// Test helper: connect and ensure migrations are applied.
pub async fn testkit_db_pool(url: &str) -> Result<SqlitePool> {
    let pool = connect(url).await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_sessions_table: bool,
}

/// Connectivity + schema presence check.
pub async fn status(pool: &SqlitePool) -> Result<DbStatus> {
    let (one,): (i64,) = sqlx::query_as("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    let exists: Option<String> =
        sqlx::query_scalar("select name from sqlite_master where type='table' and name='sessions'")
            .fetch_optional(pool)
            .await
            .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok: one == 1,
        has_sessions_table: exists.is_some(),
    })
}

/// Spec §6.3's duplicate-session check: has any session already been
/// recorded for `(date, symbol)`? A failed session is saved too (so the
/// failure is auditable), so this returns true regardless of status.
pub async fn has_completed_session(pool: &SqlitePool, date: &str, symbol: &str) -> Result<bool> {
    let row: Option<(String,)> =
        sqlx::query_as("select date from sessions where date = ?1 and symbol = ?2")
            .bind(date)
            .bind(symbol)
            .fetch_optional(pool)
            .await
            .context("has_completed_session query failed")?;
    Ok(row.is_some())
}

/// Persist a finished session (spec §6.3, §7): writes one session row, N
/// trades, <= N outcomes, M signals, M bars.
///
/// If a session already exists for `(ctx.date, ctx.symbol)`: with
/// `force=false` this is a no-op returning `Ok(false)`; with `force=true`
/// the prior record (and its children, via `on delete cascade`) is replaced
/// and this returns `Ok(true)`.
pub async fn save_session(
    pool: &SqlitePool,
    ctx: &SessionContext,
    config_hash: Option<&str>,
    force: bool,
) -> Result<bool> {
    let exists = has_completed_session(pool, &ctx.date, &ctx.symbol).await?;
    if exists && !force {
        return Ok(false);
    }

    let mut tx = pool.begin().await.context("save_session begin failed")?;

    if exists {
        sqlx::query("delete from sessions where date = ?1 and symbol = ?2")
            .bind(&ctx.date)
            .bind(&ctx.symbol)
            .execute(&mut *tx)
            .await
            .context("save_session delete-prior failed")?;
    }

    let (zone_resistance, zone_support, zone_status, zone_defined_at) = match &ctx.zone {
        Some(z) => (
            Some(z.resistance),
            Some(z.support),
            Some(zone_status_str(z.status)),
            Some(z.defined_at),
        ),
        None => (None, None, None, None),
    };

    sqlx::query(
        r#"
        insert into sessions (
            date, symbol, status, is_backtest, execution_mode, started_at,
            completed_at, error, zone_resistance, zone_support, zone_status,
            zone_defined_at, config_hash
        ) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&ctx.date)
    .bind(&ctx.symbol)
    .bind(session_status_str(ctx.status))
    .bind(ctx.is_backtest)
    .bind(execution_mode_str(ctx.execution_mode))
    .bind(ctx.started_at)
    .bind(ctx.completed_at)
    .bind(&ctx.error)
    .bind(zone_resistance)
    .bind(zone_support)
    .bind(zone_status)
    .bind(zone_defined_at)
    .bind(config_hash)
    .execute(&mut *tx)
    .await
    .context("save_session insert session failed")?;

    for (seq, signal) in ctx.signals.iter().enumerate() {
        let trigger_bar = serde_json::to_string(&signal.trigger_bar)
            .context("save_session serialize trigger_bar failed")?;
        sqlx::query(
            r#"
            insert into signals (
                date, symbol, seq, direction, signal_type, timestamp, price,
                attempt_number, trigger_bar
            ) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&ctx.date)
        .bind(&ctx.symbol)
        .bind(seq as i64)
        .bind(direction_str(signal.direction))
        .bind(signal_type_str(signal.r#type))
        .bind(signal.timestamp)
        .bind(signal.price)
        .bind(signal.attempt_number as i64)
        .bind(trigger_bar)
        .execute(&mut *tx)
        .await
        .context("save_session insert signal failed")?;
    }

    for trade in &ctx.trades {
        let entry_signal = serde_json::to_string(&trade.entry_signal)
            .context("save_session serialize entry_signal failed")?;
        sqlx::query(
            r#"
            insert into trades (
                id, date, symbol, direction, entry_price, initial_stop,
                current_stop, r_value, target_1r, target_2r, target_3r,
                entry_timestamp, status, entry_signal
            ) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&trade.id)
        .bind(&ctx.date)
        .bind(&ctx.symbol)
        .bind(direction_str(trade.direction))
        .bind(trade.entry_price)
        .bind(trade.initial_stop)
        .bind(trade.current_stop)
        .bind(trade.r_value)
        .bind(trade.target_1r)
        .bind(trade.target_2r)
        .bind(trade.target_3r)
        .bind(trade.entry_timestamp)
        .bind(trade_status_str(trade.status))
        .bind(entry_signal)
        .execute(&mut *tx)
        .await
        .context("save_session insert trade failed")?;
    }

    for outcome in &ctx.outcomes {
        sqlx::query(
            r#"
            insert into outcomes (
                trade_id, result, max_favorable_r, max_adverse_r, exit_price,
                exit_timestamp, realized_r, first_threshold_reached,
                timestamp_1r, timestamp_2r, timestamp_3r, timestamp_stop, bars_held
            ) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&outcome.trade_id)
        .bind(outcome_result_str(outcome.result))
        .bind(outcome.max_favorable_r)
        .bind(outcome.max_adverse_r)
        .bind(outcome.exit_price)
        .bind(outcome.exit_timestamp)
        .bind(outcome.realized_r)
        .bind(outcome.first_threshold_reached as i64)
        .bind(outcome.timestamp_1r)
        .bind(outcome.timestamp_2r)
        .bind(outcome.timestamp_3r)
        .bind(outcome.timestamp_stop)
        .bind(outcome.bars_held as i64)
        .execute(&mut *tx)
        .await
        .context("save_session insert outcome failed")?;
    }

    for bar in &ctx.all_bars {
        sqlx::query(
            r#"
            insert into bars (
                date, symbol, timestamp, open, high, low, close, volume,
                completed, bar_size_minutes
            ) values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&ctx.date)
        .bind(&ctx.symbol)
        .bind(bar.timestamp)
        .bind(bar.open)
        .bind(bar.high)
        .bind(bar.low)
        .bind(bar.close)
        .bind(bar.volume as i64)
        .bind(bar.completed)
        .bind(bar.bar_size_minutes as i64)
        .execute(&mut *tx)
        .await
        .context("save_session insert bar failed")?;
    }

    tx.commit().await.context("save_session commit failed")?;
    Ok(true)
}

/// Re-hydrate a session previously written by [`save_session`]. Used by
/// tests and CLI inspection; the runner itself never reads sessions back.
pub async fn load_session(pool: &SqlitePool, date: &str, symbol: &str) -> Result<Option<SessionContext>> {
    let Some(row) = sqlx::query(
        r#"
        select status, is_backtest, execution_mode, started_at, completed_at,
               error, zone_resistance, zone_support, zone_status, zone_defined_at
        from sessions where date = ?1 and symbol = ?2
        "#,
    )
    .bind(date)
    .bind(symbol)
    .fetch_optional(pool)
    .await
    .context("load_session select session failed")?
    else {
        return Ok(None);
    };

    let status = parse_session_status(&row.try_get::<String, _>("status")?)?;
    let is_backtest: bool = row.try_get("is_backtest")?;
    let execution_mode = parse_execution_mode(&row.try_get::<String, _>("execution_mode")?)?;
    let started_at: i64 = row.try_get("started_at")?;
    let completed_at: Option<i64> = row.try_get("completed_at")?;
    let error: Option<String> = row.try_get("error")?;

    let zone_resistance: Option<i64> = row.try_get("zone_resistance")?;
    let zone_support: Option<i64> = row.try_get("zone_support")?;
    let zone_status: Option<String> = row.try_get("zone_status")?;
    let zone_defined_at: Option<i64> = row.try_get("zone_defined_at")?;

    let signal_rows = sqlx::query(
        "select direction, signal_type, timestamp, price, attempt_number, trigger_bar \
         from signals where date = ?1 and symbol = ?2 order by seq asc",
    )
    .bind(date)
    .bind(symbol)
    .fetch_all(pool)
    .await
    .context("load_session select signals failed")?;

    let mut signals = Vec::with_capacity(signal_rows.len());
    for r in signal_rows {
        let trigger_bar: String = r.try_get("trigger_bar")?;
        signals.push(Signal {
            direction: parse_direction(&r.try_get::<String, _>("direction")?)?,
            r#type: parse_signal_type(&r.try_get::<String, _>("signal_type")?)?,
            timestamp: r.try_get("timestamp")?,
            price: r.try_get("price")?,
            trigger_bar: serde_json::from_str(&trigger_bar)
                .context("load_session deserialize trigger_bar failed")?,
            attempt_number: r.try_get::<i64, _>("attempt_number")? as u32,
        });
    }

    let trade_rows = sqlx::query(
        "select id, direction, entry_price, initial_stop, current_stop, r_value, \
                target_1r, target_2r, target_3r, entry_timestamp, status, entry_signal \
         from trades where date = ?1 and symbol = ?2 order by entry_timestamp asc",
    )
    .bind(date)
    .bind(symbol)
    .fetch_all(pool)
    .await
    .context("load_session select trades failed")?;

    let mut trades = Vec::with_capacity(trade_rows.len());
    for r in trade_rows {
        let entry_signal: String = r.try_get("entry_signal")?;
        trades.push(Trade {
            id: r.try_get("id")?,
            symbol: symbol.to_string(),
            direction: parse_direction(&r.try_get::<String, _>("direction")?)?,
            entry_price: r.try_get("entry_price")?,
            initial_stop: r.try_get("initial_stop")?,
            current_stop: r.try_get("current_stop")?,
            r_value: r.try_get("r_value")?,
            target_1r: r.try_get("target_1r")?,
            target_2r: r.try_get("target_2r")?,
            target_3r: r.try_get("target_3r")?,
            entry_timestamp: r.try_get("entry_timestamp")?,
            status: parse_trade_status(&r.try_get::<String, _>("status")?)?,
            entry_signal: serde_json::from_str(&entry_signal)
                .context("load_session deserialize entry_signal failed")?,
        });
    }

    let outcome_rows = sqlx::query(
        "select o.trade_id, o.result, o.max_favorable_r, o.max_adverse_r, o.exit_price, \
                o.exit_timestamp, o.realized_r, o.first_threshold_reached, o.timestamp_1r, \
                o.timestamp_2r, o.timestamp_3r, o.timestamp_stop, o.bars_held \
         from outcomes o join trades t on t.id = o.trade_id \
         where t.date = ?1 and t.symbol = ?2",
    )
    .bind(date)
    .bind(symbol)
    .fetch_all(pool)
    .await
    .context("load_session select outcomes failed")?;

    let mut outcomes = Vec::with_capacity(outcome_rows.len());
    for r in outcome_rows {
        outcomes.push(TradeOutcome {
            trade_id: r.try_get("trade_id")?,
            result: parse_outcome_result(&r.try_get::<String, _>("result")?)?,
            max_favorable_r: r.try_get("max_favorable_r")?,
            max_adverse_r: r.try_get("max_adverse_r")?,
            exit_price: r.try_get("exit_price")?,
            exit_timestamp: r.try_get("exit_timestamp")?,
            realized_r: r.try_get("realized_r")?,
            first_threshold_reached: r.try_get::<i64, _>("first_threshold_reached")? as u8,
            timestamp_1r: r.try_get("timestamp_1r")?,
            timestamp_2r: r.try_get("timestamp_2r")?,
            timestamp_3r: r.try_get("timestamp_3r")?,
            timestamp_stop: r.try_get("timestamp_stop")?,
            bars_held: r.try_get::<i64, _>("bars_held")? as u32,
        });
    }

    let bar_rows = sqlx::query(
        "select timestamp, open, high, low, close, volume, completed, bar_size_minutes \
         from bars where date = ?1 and symbol = ?2 order by timestamp asc",
    )
    .bind(date)
    .bind(symbol)
    .fetch_all(pool)
    .await
    .context("load_session select bars failed")?;

    let mut all_bars = Vec::with_capacity(bar_rows.len());
    for r in bar_rows {
        all_bars.push(Candle {
            timestamp: r.try_get("timestamp")?,
            open: r.try_get("open")?,
            high: r.try_get("high")?,
            low: r.try_get("low")?,
            close: r.try_get("close")?,
            volume: r.try_get::<i64, _>("volume")? as u64,
            completed: r.try_get("completed")?,
            bar_size_minutes: r.try_get::<i64, _>("bar_size_minutes")? as u32,
        });
    }

    let zone = match (zone_resistance, zone_support, zone_status, zone_defined_at) {
        (Some(resistance), Some(support), Some(status), Some(defined_at)) => Some(DecisionZone {
            resistance,
            support,
            status: parse_zone_status(&status)?,
            defined_at,
            source_bars: Vec::new(),
        }),
        _ => None,
    };

    Ok(Some(SessionContext {
        date: date.to_string(),
        symbol: symbol.to_string(),
        zone,
        signals,
        trades,
        outcomes,
        all_bars,
        status,
        is_backtest,
        execution_mode,
        started_at,
        completed_at,
        error,
    }))
}

fn session_status_str(s: SessionStatus) -> &'static str {
    match s {
        SessionStatus::Waiting => "WAITING",
        SessionStatus::BuildingZone => "BUILDING_ZONE",
        SessionStatus::Monitoring => "MONITORING",
        SessionStatus::NoTrade => "NO_TRADE",
        SessionStatus::Complete => "COMPLETE",
        SessionStatus::Interrupted => "INTERRUPTED",
        SessionStatus::Error => "ERROR",
    }
}

fn parse_session_status(s: &str) -> Result<SessionStatus> {
    Ok(match s {
        "WAITING" => SessionStatus::Waiting,
        "BUILDING_ZONE" => SessionStatus::BuildingZone,
        "MONITORING" => SessionStatus::Monitoring,
        "NO_TRADE" => SessionStatus::NoTrade,
        "COMPLETE" => SessionStatus::Complete,
        "INTERRUPTED" => SessionStatus::Interrupted,
        "ERROR" => SessionStatus::Error,
        other => anyhow::bail!("invalid session status in db: {other}"),
    })
}

fn execution_mode_str(m: ExecutionMode) -> &'static str {
    match m {
        ExecutionMode::Live => "LIVE",
        ExecutionMode::Mock => "MOCK",
    }
}

fn parse_execution_mode(s: &str) -> Result<ExecutionMode> {
    Ok(match s {
        "LIVE" => ExecutionMode::Live,
        "MOCK" => ExecutionMode::Mock,
        other => anyhow::bail!("invalid execution mode in db: {other}"),
    })
}

fn zone_status_str(s: ZoneStatus) -> &'static str {
    match s {
        ZoneStatus::Pending => "PENDING",
        ZoneStatus::Defined => "DEFINED",
        ZoneStatus::NoTradeChoppy => "NO_TRADE_CHOPPY",
        ZoneStatus::NoTradeDegenerate => "NO_TRADE_DEGENERATE",
        ZoneStatus::Expired => "EXPIRED",
    }
}

fn parse_zone_status(s: &str) -> Result<ZoneStatus> {
    Ok(match s {
        "PENDING" => ZoneStatus::Pending,
        "DEFINED" => ZoneStatus::Defined,
        "NO_TRADE_CHOPPY" => ZoneStatus::NoTradeChoppy,
        "NO_TRADE_DEGENERATE" => ZoneStatus::NoTradeDegenerate,
        "EXPIRED" => ZoneStatus::Expired,
        other => anyhow::bail!("invalid zone status in db: {other}"),
    })
}

fn direction_str(d: Direction) -> &'static str {
    match d {
        Direction::Long => "LONG",
        Direction::Short => "SHORT",
    }
}

fn parse_direction(s: &str) -> Result<Direction> {
    Ok(match s {
        "LONG" => Direction::Long,
        "SHORT" => Direction::Short,
        other => anyhow::bail!("invalid direction in db: {other}"),
    })
}

fn signal_type_str(t: SignalType) -> &'static str {
    match t {
        SignalType::Break => "BREAK",
        SignalType::Retest => "RETEST",
        SignalType::Confirmation => "CONFIRMATION",
        SignalType::BreakFailure => "BREAK_FAILURE",
    }
}

fn parse_signal_type(s: &str) -> Result<SignalType> {
    Ok(match s {
        "BREAK" => SignalType::Break,
        "RETEST" => SignalType::Retest,
        "CONFIRMATION" => SignalType::Confirmation,
        "BREAK_FAILURE" => SignalType::BreakFailure,
        other => anyhow::bail!("invalid signal type in db: {other}"),
    })
}

fn trade_status_str(s: TradeStatus) -> &'static str {
    match s {
        TradeStatus::Open => "OPEN",
        TradeStatus::StoppedOut => "STOPPED_OUT",
        TradeStatus::TargetHit => "TARGET_HIT",
        TradeStatus::SessionExpired => "SESSION_EXPIRED",
    }
}

fn parse_trade_status(s: &str) -> Result<TradeStatus> {
    Ok(match s {
        "OPEN" => TradeStatus::Open,
        "STOPPED_OUT" => TradeStatus::StoppedOut,
        "TARGET_HIT" => TradeStatus::TargetHit,
        "SESSION_EXPIRED" => TradeStatus::SessionExpired,
        other => anyhow::bail!("invalid trade status in db: {other}"),
    })
}

fn outcome_result_str(r: OutcomeResult) -> &'static str {
    match r {
        OutcomeResult::Loss => "LOSS",
        OutcomeResult::BreakevenStop => "BREAKEVEN_STOP",
        OutcomeResult::Win2R => "WIN_2R",
        OutcomeResult::Win3R => "WIN_3R",
        OutcomeResult::SessionTimeout => "SESSION_TIMEOUT",
    }
}

fn parse_outcome_result(s: &str) -> Result<OutcomeResult> {
    Ok(match s {
        "LOSS" => OutcomeResult::Loss,
        "BREAKEVEN_STOP" => OutcomeResult::BreakevenStop,
        "WIN_2R" => OutcomeResult::Win2R,
        "WIN_3R" => OutcomeResult::Win3R,
        "SESSION_TIMEOUT" => OutcomeResult::SessionTimeout,
        other => anyhow::bail!("invalid outcome result in db: {other}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mbo_schemas::Candle;

    async fn fresh_pool() -> SqlitePool {
        let pool = connect("sqlite::memory:").await.unwrap();
        migrate(&pool).await.unwrap();
        pool
    }

    fn stub_signal() -> Signal {
        Signal {
            direction: Direction::Long,
            r#type: SignalType::Confirmation,
            timestamp: 1_000,
            price: 50_350,
            trigger_bar: Candle::new(0, 50_200, 50_350, 50_180, 50_350, 100, true).unwrap(),
            attempt_number: 1,
        }
    }

    fn stub_context(status: SessionStatus) -> SessionContext {
        let trade = Trade::open(
            "2024-06-17",
            "SPY",
            Direction::Long,
            1,
            50_350,
            49_900,
            1_000,
            stub_signal(),
            [1.0, 2.0, 3.0],
        );
        let outcome = TradeOutcome {
            trade_id: trade.id.clone(),
            result: OutcomeResult::Win3R,
            max_favorable_r: 3.0,
            max_adverse_r: 0.0,
            exit_price: 51_700,
            exit_timestamp: 5_000,
            realized_r: 3.0,
            first_threshold_reached: 3,
            timestamp_1r: 2_000,
            timestamp_2r: 3_000,
            timestamp_3r: 5_000,
            timestamp_stop: 0,
            bars_held: 4,
        };
        SessionContext {
            date: "2024-06-17".to_string(),
            symbol: "SPY".to_string(),
            zone: Some(DecisionZone {
                resistance: 50_200,
                support: 49_900,
                status: ZoneStatus::Defined,
                defined_at: 0,
                source_bars: vec![],
            }),
            signals: vec![stub_signal()],
            trades: vec![trade],
            outcomes: vec![outcome],
            all_bars: vec![Candle::new(0, 50_200, 50_350, 50_180, 50_350, 100, true).unwrap()],
            status,
            is_backtest: true,
            execution_mode: ExecutionMode::Mock,
            started_at: 0,
            completed_at: Some(5_000),
            error: None,
        }
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let pool = fresh_pool().await;
        migrate(&pool).await.unwrap();
        let st = status(&pool).await.unwrap();
        assert!(st.ok);
        assert!(st.has_sessions_table);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let pool = fresh_pool().await;
        let ctx = stub_context(SessionStatus::Complete);
        let wrote = save_session(&pool, &ctx, Some("abc123"), false).await.unwrap();
        assert!(wrote);

        let loaded = load_session(&pool, "2024-06-17", "SPY").await.unwrap().unwrap();
        assert_eq!(loaded.status, SessionStatus::Complete);
        assert_eq!(loaded.trades.len(), 1);
        assert_eq!(loaded.outcomes.len(), 1);
        assert_eq!(loaded.signals.len(), 1);
        assert_eq!(loaded.all_bars.len(), 1);
        assert_eq!(loaded.zone.unwrap().resistance, 50_200);
    }

    #[tokio::test]
    async fn duplicate_session_without_force_is_a_no_op() {
        let pool = fresh_pool().await;
        let ctx = stub_context(SessionStatus::Error);
        save_session(&pool, &ctx, None, false).await.unwrap();

        let retried = stub_context(SessionStatus::Complete);
        let wrote = save_session(&pool, &retried, None, false).await.unwrap();
        assert!(!wrote);

        let loaded = load_session(&pool, "2024-06-17", "SPY").await.unwrap().unwrap();
        assert_eq!(loaded.status, SessionStatus::Error);
    }

    #[tokio::test]
    async fn force_overwrites_prior_session() {
        let pool = fresh_pool().await;
        let ctx = stub_context(SessionStatus::Error);
        save_session(&pool, &ctx, None, false).await.unwrap();

        let retried = stub_context(SessionStatus::Complete);
        let wrote = save_session(&pool, &retried, None, true).await.unwrap();
        assert!(wrote);

        let loaded = load_session(&pool, "2024-06-17", "SPY").await.unwrap().unwrap();
        assert_eq!(loaded.status, SessionStatus::Complete);
    }

    #[tokio::test]
    async fn has_completed_session_reports_any_prior_status() {
        let pool = fresh_pool().await;
        assert!(!has_completed_session(&pool, "2024-06-17", "SPY").await.unwrap());
        let ctx = stub_context(SessionStatus::Error);
        save_session(&pool, &ctx, None, false).await.unwrap();
        assert!(has_completed_session(&pool, "2024-06-17", "SPY").await.unwrap());
    }
}
