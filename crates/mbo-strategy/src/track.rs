use mbo_schemas::{Candle, Direction, Signal, SignalType, Trade};

use crate::context::MachineContext;
use crate::guards::{break_price, holds_beyond_edge, is_break, is_retest, opposite_edge, retest_price};
use crate::position::manage_position;
use crate::state::{TrackPhase, TrackState};

/// Advances one track (LONG or SHORT) by one bar (spec §4.3.3/§4.3.4). The
/// two tracks are independent state but share the same guard logic,
/// mirrored by `dir`: the comparisons in `guards` flip the edge and the
/// inequality direction, nothing else differs.
///
/// Supersession is checked before any other guard on every non-terminal
/// entry (spec §4.3.3: "checked before any NewBar guard on each entry").
pub fn step_track(ctx: &mut MachineContext, dir: Direction, bar: &Candle) {
    let phase = track(ctx, dir).phase;
    if phase.is_terminal() {
        return;
    }

    if ctx.active_direction == Some(dir.opposite()) {
        track_mut(ctx, dir).phase = TrackPhase::Superseded;
        return;
    }

    match phase {
        TrackPhase::Watching => step_watching(ctx, dir, bar),
        TrackPhase::BreakDetected => step_break_detected(ctx, dir, bar),
        TrackPhase::RetestDetected => step_retest_detected(ctx, dir, bar),
        TrackPhase::PositionOpen => manage_position(ctx, dir, bar),
        TrackPhase::Resolved | TrackPhase::Superseded | TrackPhase::MaxAttemptsExhausted => {}
    }
}

fn track(ctx: &MachineContext, dir: Direction) -> &TrackState {
    match dir {
        Direction::Long => &ctx.long,
        Direction::Short => &ctx.short,
    }
}

fn track_mut(ctx: &mut MachineContext, dir: Direction) -> &mut TrackState {
    match dir {
        Direction::Long => &mut ctx.long,
        Direction::Short => &mut ctx.short,
    }
}

fn emit(ctx: &mut MachineContext, dir: Direction, kind: SignalType, bar: &Candle, price: i64, attempt: u32) {
    ctx.signals.push(Signal {
        direction: dir,
        r#type: kind,
        timestamp: bar.timestamp,
        price,
        trigger_bar: *bar,
        attempt_number: attempt,
    });
}

fn step_watching(ctx: &mut MachineContext, dir: Direction, bar: &Candle) {
    if !is_break(dir, &ctx.zone, bar) {
        return;
    }
    let t = track_mut(ctx, dir);
    t.break_attempts += 1;
    let attempt = t.break_attempts;
    t.phase = TrackPhase::BreakDetected;
    emit(ctx, dir, SignalType::Break, bar, break_price(dir, bar), attempt);
}

fn step_break_detected(ctx: &mut MachineContext, dir: Direction, bar: &Candle) {
    let attempt = track(ctx, dir).break_attempts;
    let max_attempts = ctx.config.max_break_attempts;
    let retested = is_retest(dir, &ctx.zone, bar);
    let holds = holds_beyond_edge(dir, &ctx.zone, bar);

    if retested && holds {
        emit(ctx, dir, SignalType::Retest, bar, retest_price(dir, bar), attempt);
        emit(ctx, dir, SignalType::Confirmation, bar, bar.close, attempt);
        open_trade(ctx, dir, bar, attempt);
        return;
    }

    if !holds {
        emit(ctx, dir, SignalType::BreakFailure, bar, bar.close, attempt);
        track_mut(ctx, dir).phase = if attempt >= max_attempts {
            TrackPhase::MaxAttemptsExhausted
        } else {
            TrackPhase::Watching
        };
        return;
    }

    if retested {
        emit(ctx, dir, SignalType::Retest, bar, retest_price(dir, bar), attempt);
        track_mut(ctx, dir).phase = TrackPhase::RetestDetected;
    }

    // Neither retested nor failed (price ran away without returning to the
    // edge): no guard matches, stay in BreakDetected.
}

fn step_retest_detected(ctx: &mut MachineContext, dir: Direction, bar: &Candle) {
    let attempt = track(ctx, dir).break_attempts;
    if holds_beyond_edge(dir, &ctx.zone, bar) {
        emit(ctx, dir, SignalType::Confirmation, bar, bar.close, attempt);
        open_trade(ctx, dir, bar, attempt);
    } else {
        // Attempts counter is not decremented: the earlier break counted
        // (spec §4.3.3).
        emit(ctx, dir, SignalType::BreakFailure, bar, bar.close, attempt);
        track_mut(ctx, dir).phase = TrackPhase::Watching;
    }
}

/// Trade entry (spec §4.3.5): set `active_direction` (which immediately
/// supersedes the other track at its next guard check), construct the
/// Trade, and reset the track's R-milestone bookkeeping.
fn open_trade(ctx: &mut MachineContext, dir: Direction, bar: &Candle, attempt: u32) {
    ctx.active_direction = Some(dir);

    // initial_stop is the opposite-side zone edge (spec §3), not the edge
    // this track broke through: for LONG that's support, for SHORT
    // resistance — the zone's far wall becomes the stop once the near wall
    // is confirmed broken.
    let initial_stop = opposite_edge(dir, &ctx.zone);
    let entry_signal = ctx
        .signals
        .last()
        .cloned()
        .expect("a Confirmation signal was just emitted");
    let targets = ctx.config.targets.as_array();

    let trade = Trade::open(
        &ctx.date,
        &ctx.symbol,
        dir,
        attempt,
        bar.close,
        initial_stop,
        bar.timestamp,
        entry_signal,
        targets,
    );
    let idx = ctx.trades.len();
    ctx.trades.push(trade);

    let t = track_mut(ctx, dir);
    t.reset_for_new_trade(idx);
    t.phase = TrackPhase::PositionOpen;
}
