use std::io::Write;

use predicates::prelude::*;

/// `mbo backtest run` replays a CSV bar fixture and, when `--db` is given,
/// persists the resulting session so a second run without `--force` is a
/// reported no-op.
#[test]
fn backtest_run_persists_and_respects_force() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;

    let mut config = tempfile::NamedTempFile::new_in(dir.path())?;
    writeln!(config, "max_break_attempts: 5")?;
    let config_path = config.path().to_path_buf();

    // zone_start = 2024-06-17 09:30 ET (EDT, UTC-4) = 13:30 UTC.
    let zone_start: i64 = 1_718_631_000_000;
    let mut bars = tempfile::NamedTempFile::new_in(dir.path())?;
    writeln!(bars, "timestamp,open,high,low,close,volume")?;
    writeln!(bars, "{},50000,50200,49900,50100,100", zone_start)?;
    writeln!(bars, "{},50100,50150,50050,50000,100", zone_start + 1_800_000)?;
    let bars_path = bars.path().to_path_buf();

    let db_path = dir.path().join("session.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let mut cmd = assert_cmd::Command::cargo_bin("mbo")?;
    cmd.args([
        "backtest",
        "run",
        "--date",
        "2024-06-17",
        "--symbol",
        "SPY",
        "--config",
        config_path.to_str().unwrap(),
        "--bars",
        bars_path.to_str().unwrap(),
        "--db",
        &db_url,
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("status=NoTrade"))
        .stdout(predicate::str::contains("db_write=true"));

    // Re-running without --force reports the session already exists.
    let mut cmd = assert_cmd::Command::cargo_bin("mbo")?;
    cmd.args([
        "backtest",
        "run",
        "--date",
        "2024-06-17",
        "--symbol",
        "SPY",
        "--config",
        config_path.to_str().unwrap(),
        "--bars",
        bars_path.to_str().unwrap(),
        "--db",
        &db_url,
    ]);
    cmd.assert().success().stdout(predicate::str::contains("db_write=false"));

    Ok(())
}
