use mbo_schemas::{round_r, Candle, Direction, OutcomeResult, Trade, TradeOutcome, TradeStatus};

use crate::context::MachineContext;
use crate::state::TrackPhase;

/// Position management for an open trade (spec §4.3.6/§4.3.7). Guards are
/// evaluated in strict priority order — 3R, then 2R, then 1R, then
/// stop-hit — as an if/elif chain, because a single bar's close can
/// satisfy more than one threshold and only the highest unmet one may be
/// recorded (spec: "if a bar's close exceeds both 1R and 2R, we record
/// only the 2R outcome").
pub fn manage_position(ctx: &mut MachineContext, dir: Direction, bar: &Candle) {
    let idx = match dir {
        Direction::Long => ctx.long.open_trade_idx,
        Direction::Short => ctx.short.open_trade_idx,
    }
    .expect("PositionOpen implies an open trade index");

    update_running_extremes(ctx, dir, idx, bar);

    let trade: Trade = ctx.trades[idx].clone();
    let milestones = match dir {
        Direction::Long => ctx.long.milestones,
        Direction::Short => ctx.short.milestones,
    };
    let hit = |target: i64| match dir {
        Direction::Long => bar.close >= target,
        Direction::Short => bar.close <= target,
    };

    if hit(trade.target_3r) && !milestones.reached_3r {
        let realized_r = round_r(trade.floating_r(trade.target_3r));
        resolve_trade(
            ctx,
            dir,
            idx,
            OutcomeResult::Win3R,
            trade.target_3r,
            bar.timestamp,
            realized_r,
            true,
            bar.timestamp,
            0,
        );
        return;
    }

    if hit(trade.target_2r) && !milestones.reached_2r {
        set_milestone(ctx, dir, 2, bar.timestamp);
        return;
    }

    if hit(trade.target_1r) && !milestones.reached_1r {
        set_milestone(ctx, dir, 1, bar.timestamp);
        if ctx.config.trailing_stop_at_1r {
            ctx.trades[idx].current_stop = trade.entry_price;
        }
        return;
    }

    let stop_hit = match dir {
        Direction::Long => bar.close <= trade.current_stop,
        Direction::Short => bar.close >= trade.current_stop,
    };
    if stop_hit {
        let result = if trade.current_stop == trade.entry_price {
            OutcomeResult::BreakevenStop
        } else {
            OutcomeResult::Loss
        };
        let realized_r = round_r(trade.floating_r(bar.close));
        resolve_trade(
            ctx,
            dir,
            idx,
            result,
            bar.close,
            bar.timestamp,
            realized_r,
            false,
            0,
            bar.timestamp,
        );
    }
}

fn set_milestone(ctx: &mut MachineContext, dir: Direction, k: u8, ts: i64) {
    let m = match dir {
        Direction::Long => &mut ctx.long.milestones,
        Direction::Short => &mut ctx.short.milestones,
    };
    match k {
        1 => {
            m.reached_1r = true;
            m.timestamp_1r = ts;
        }
        2 => {
            m.reached_2r = true;
            m.timestamp_2r = ts;
        }
        _ => unreachable!("set_milestone only handles 1R/2R; 3R resolves the trade"),
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_trade(
    ctx: &mut MachineContext,
    dir: Direction,
    idx: usize,
    result: OutcomeResult,
    exit_price: i64,
    exit_timestamp: i64,
    realized_r: f64,
    mark_3r_now: bool,
    timestamp_3r_override: i64,
    timestamp_stop: i64,
) {
    let track = match dir {
        Direction::Long => &mut ctx.long,
        Direction::Short => &mut ctx.short,
    };
    if mark_3r_now {
        track.milestones.reached_3r = true;
        track.milestones.timestamp_3r = timestamp_3r_override;
    }
    let milestones = track.milestones;
    let bars_held = track.bars_in_position;
    let max_favorable_r = track.max_favorable_r;
    let max_adverse_r = track.max_adverse_r;
    track.phase = TrackPhase::Resolved;

    let trade_status = match result {
        OutcomeResult::Win3R => TradeStatus::TargetHit,
        OutcomeResult::Loss | OutcomeResult::BreakevenStop => TradeStatus::StoppedOut,
        OutcomeResult::SessionTimeout | OutcomeResult::Win2R => {
            unreachable!("position management never produces this result directly")
        }
    };

    let trade_id = ctx.trades[idx].id.clone();
    ctx.trades[idx].status = trade_status;

    ctx.outcomes.push(TradeOutcome {
        trade_id,
        result,
        max_favorable_r,
        max_adverse_r,
        exit_price,
        exit_timestamp,
        realized_r,
        first_threshold_reached: milestones.highest_reached(),
        timestamp_1r: milestones.timestamp_1r,
        timestamp_2r: milestones.timestamp_2r,
        timestamp_3r: milestones.timestamp_3r,
        timestamp_stop,
        bars_held,
    });
}

/// Running max-favorable / max-adverse R, using bar extremes rather than
/// closes (spec §4.3.7). Seeded at 0.0 when the trade opens.
fn update_running_extremes(ctx: &mut MachineContext, dir: Direction, idx: usize, bar: &Candle) {
    let trade = &ctx.trades[idx];
    let r_value = trade.r_value as f64;
    let entry = trade.entry_price;

    let (favorable_extreme, adverse_extreme) = match dir {
        Direction::Long => (bar.high, bar.low),
        Direction::Short => (bar.low, bar.high),
    };
    let favorable_r = match dir {
        Direction::Long => (favorable_extreme - entry) as f64 / r_value,
        Direction::Short => (entry - favorable_extreme) as f64 / r_value,
    };
    let adverse_r = match dir {
        Direction::Long => (adverse_extreme - entry) as f64 / r_value,
        Direction::Short => (entry - adverse_extreme) as f64 / r_value,
    };

    let track = match dir {
        Direction::Long => &mut ctx.long,
        Direction::Short => &mut ctx.short,
    };
    track.bars_in_position += 1;
    if favorable_r > track.max_favorable_r {
        track.max_favorable_r = favorable_r;
    }
    if adverse_r < track.max_adverse_r {
        track.max_adverse_r = adverse_r;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mbo_config::StrategyConfig;
    use mbo_schemas::{Direction as Dir, DecisionZone, Signal, SignalType, ZoneStatus};
    use crate::state::TrackState;

    fn bar(ts: i64, o: i64, h: i64, l: i64, c: i64) -> Candle {
        Candle::new(ts, o, h, l, c, 100, true).unwrap()
    }

    fn stub_signal() -> Signal {
        Signal {
            direction: Dir::Long,
            r#type: SignalType::Confirmation,
            timestamp: 0,
            price: 50_350,
            trigger_bar: bar(0, 50_200, 50_350, 50_180, 50_350),
            attempt_number: 1,
        }
    }

    fn ctx_with_open_long_trade() -> MachineContext {
        let mut ctx = MachineContext::new("2024-06-17".into(), "SPY".into(), StrategyConfig::default());
        ctx.zone = DecisionZone {
            resistance: 50_200,
            support: 49_900,
            status: ZoneStatus::Defined,
            defined_at: 0,
            source_bars: vec![],
        };
        let trade = Trade::open(
            "2024-06-17",
            "SPY",
            Dir::Long,
            1,
            50_350,
            49_900,
            0,
            stub_signal(),
            [1.0, 2.0, 3.0],
        );
        ctx.trades.push(trade);
        ctx.long = TrackState::new();
        ctx.long.phase = TrackPhase::PositionOpen;
        ctx.long.open_trade_idx = Some(0);
        ctx
    }

    #[test]
    fn three_r_resolves_with_exact_realized_r() {
        let mut ctx = ctx_with_open_long_trade();
        manage_position(&mut ctx, Dir::Long, &bar(300_000, 51_000, 51_750, 50_900, 51_700));
        assert_eq!(ctx.long.phase, TrackPhase::Resolved);
        assert_eq!(ctx.trades[0].status, TradeStatus::TargetHit);
        let outcome = &ctx.outcomes[0];
        assert_eq!(outcome.result, OutcomeResult::Win3R);
        assert_eq!(outcome.realized_r, 3.0);
        assert_eq!(outcome.first_threshold_reached, 3);
    }

    #[test]
    fn bar_crossing_1r_and_2r_records_only_2r_and_stays_open() {
        // A single bar whose close clears both 1R and 2R: only the higher
        // unmet milestone (2R) is recorded this bar (spec §4.3.6). 1R would
        // only be marked on a later bar if the price retreated below 2R and
        // the machine re-evaluated from scratch, which cannot happen once
        // 2R is recorded — 1R here is expected to stay unset.
        let mut ctx = ctx_with_open_long_trade();
        manage_position(&mut ctx, Dir::Long, &bar(300_000, 51_000, 51_300, 50_900, 51_260));
        assert_eq!(ctx.long.phase, TrackPhase::PositionOpen);
        assert!(!ctx.long.milestones.reached_1r);
        assert!(ctx.long.milestones.reached_2r);
        assert!(!ctx.long.milestones.reached_3r);
        assert!(ctx.outcomes.is_empty());
    }

    #[test]
    fn one_r_trails_stop_to_breakeven() {
        let mut ctx = ctx_with_open_long_trade();
        manage_position(&mut ctx, Dir::Long, &bar(300_000, 50_400, 50_900, 50_300, 50_800));
        assert!(ctx.long.milestones.reached_1r);
        assert_eq!(ctx.trades[0].current_stop, 50_350);
    }

    #[test]
    fn stop_hit_before_any_trail_is_loss() {
        let mut ctx = ctx_with_open_long_trade();
        manage_position(&mut ctx, Dir::Long, &bar(300_000, 50_300, 50_320, 49_800, 49_850));
        assert_eq!(ctx.trades[0].status, TradeStatus::StoppedOut);
        let outcome = &ctx.outcomes[0];
        assert_eq!(outcome.result, OutcomeResult::Loss);
        assert!((outcome.realized_r - (-1.11)).abs() < 1e-9);
    }

    #[test]
    fn stop_hit_after_trail_is_breakeven() {
        let mut ctx = ctx_with_open_long_trade();
        manage_position(&mut ctx, Dir::Long, &bar(300_000, 50_400, 50_900, 50_300, 50_800));
        manage_position(&mut ctx, Dir::Long, &bar(600_000, 50_500, 50_600, 50_340, 50_350));
        assert_eq!(ctx.trades[0].status, TradeStatus::StoppedOut);
        assert_eq!(ctx.outcomes[0].result, OutcomeResult::BreakevenStop);
    }

    #[test]
    fn max_favorable_and_adverse_use_bar_extremes() {
        let mut ctx = ctx_with_open_long_trade();
        manage_position(&mut ctx, Dir::Long, &bar(300_000, 50_400, 50_800, 50_000, 50_500));
        // favorable: (50800-50350)/450 = 1.0; adverse: (50000-50350)/450 = -0.777...
        assert!((ctx.long.max_favorable_r - 1.0).abs() < 1e-9);
        assert!(ctx.long.max_adverse_r < 0.0);
    }
}
