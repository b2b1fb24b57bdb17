use mbo_schemas::{Candle, DecisionZone, ZoneStatus};

use crate::context::MachineContext;
use crate::state::MachineState;

/// Appends a BUILDING_ZONE bar and, once the zone window closes, defines
/// and evaluates the zone in the same step (spec §4.3.1). EVALUATING_ZONE
/// never appears as an observable state: it is entered and resolved within
/// this call.
pub fn on_building_zone_bar(ctx: &mut MachineContext, bar: Candle, zone_end_utc: i64) {
    ctx.zone_bars.push(bar);
    ctx.all_bars.push(bar);

    if bar.timestamp >= zone_end_utc {
        define_zone(ctx, bar);
        evaluate_zone(ctx);
    }
}

fn define_zone(ctx: &mut MachineContext, triggering_bar: Candle) {
    let first = ctx.zone_bars[0];
    ctx.zone = DecisionZone {
        resistance: first.high,
        support: first.low,
        status: ZoneStatus::Defined,
        defined_at: triggering_bar.timestamp,
        source_bars: ctx.zone_bars.clone(),
    };
}

/// Choppy precedence over degenerate is load-bearing (spec §8 invariant 7):
/// check choppy first, unconditionally, before any degenerate check.
fn evaluate_zone(ctx: &mut MachineContext) {
    let observation_bar = *ctx
        .all_bars
        .last()
        .expect("a bar was just pushed onto all_bars");

    let resistance = ctx.zone.resistance;
    let support = ctx.zone.support;

    if support < observation_bar.close && observation_bar.close < resistance {
        ctx.zone.status = ZoneStatus::NoTradeChoppy;
        ctx.state = MachineState::NoTrade;
        return;
    }

    let spread = ctx.zone.spread();
    let midpoint = ctx.zone.midpoint();
    let degenerate = spread < ctx.config.min_zone_spread_cents
        || midpoint == 0
        || (spread as f64 / midpoint as f64) > ctx.config.max_zone_spread_percent / 100.0;

    if degenerate {
        ctx.zone.status = ZoneStatus::NoTradeDegenerate;
        ctx.state = MachineState::NoTrade;
        return;
    }

    ctx.state = MachineState::Monitoring;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mbo_config::StrategyConfig;

    fn candle(ts: i64, o: i64, h: i64, l: i64, c: i64) -> Candle {
        Candle::new(ts, o, h, l, c, 100, true).unwrap()
    }

    fn ctx() -> MachineContext {
        let mut c = MachineContext::new("2024-06-17".into(), "SPY".into(), StrategyConfig::default());
        c.state = MachineState::BuildingZone;
        c
    }

    #[test]
    fn zone_derives_from_first_bar_only() {
        let mut ctx = ctx();
        on_building_zone_bar(&mut ctx, candle(0, 50_000, 50_200, 49_900, 50_100), 1_800_000);
        on_building_zone_bar(&mut ctx, candle(300_000, 50_100, 50_900, 50_050, 50_800), 1_800_000);
        on_building_zone_bar(&mut ctx, candle(1_800_000, 50_800, 50_850, 50_750, 50_210), 1_800_000);
        assert_eq!(ctx.zone.resistance, 50_200);
        assert_eq!(ctx.zone.support, 49_900);
        assert_eq!(ctx.zone.defined_at, 1_800_000);
        assert_eq!(ctx.state, MachineState::Monitoring);
    }

    #[test]
    fn choppy_boundary_close_routes_to_no_trade_choppy() {
        // A single bar acting as both the first (zone-defining) bar and
        // the triggering/observation bar: zone_end_utc equals its own
        // timestamp.
        let mut ctx = ctx();
        on_building_zone_bar(&mut ctx, candle(0, 50_000, 50_200, 49_900, 50_100), 0);
        assert_eq!(ctx.zone.status, ZoneStatus::NoTradeChoppy);
        assert_eq!(ctx.state, MachineState::NoTrade);
    }

    #[test]
    fn narrow_spread_routes_to_no_trade_degenerate() {
        let mut ctx = ctx();
        on_building_zone_bar(&mut ctx, candle(0, 50_000, 50_005, 50_000, 50_002), 0);
        assert_eq!(ctx.zone.status, ZoneStatus::NoTradeDegenerate);
        assert_eq!(ctx.state, MachineState::NoTrade);
    }

    #[test]
    fn choppy_takes_precedence_over_degenerate() {
        // Narrow enough to also be degenerate, but the boundary bar closes
        // strictly inside the zone: choppy must win (invariant 7).
        let mut ctx = ctx();
        on_building_zone_bar(&mut ctx, candle(0, 50_000, 50_005, 50_000, 50_002), 0);
        assert_eq!(ctx.zone.status, ZoneStatus::NoTradeChoppy);
    }
}
