use mbo_config::StrategyConfig;
use mbo_schemas::{SessionStatus, ZoneStatus};
use mbo_testkit::{run_fixture, scenario_d_bars, ZONE_DATE, ZONE_SYMBOL};

#[tokio::test]
async fn scenario_d_degenerate_zone_no_trade() {
    // The zone-defining bar's own window closes immediately: the same bar
    // is both the 09:30 zone bar and the 10:00 observation bar (spec §8
    // scenario D gives only one bar).
    let mut config = StrategyConfig::default();
    config.session_windows.zone_end_time = config.session_windows.zone_start_time.clone();

    let ctx = run_fixture(ZONE_DATE, ZONE_SYMBOL, config, scenario_d_bars())
        .await
        .unwrap();

    assert_eq!(ctx.status, SessionStatus::NoTrade);
    assert!(ctx.trades.is_empty());
    assert_eq!(ctx.zone.unwrap().status, ZoneStatus::NoTradeDegenerate);
}
