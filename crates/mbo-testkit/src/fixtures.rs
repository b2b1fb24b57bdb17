//! Bar fixtures for spec §8's six seeded scenarios.
//!
//! All scenarios share the same session date/symbol and the same
//! zone-defining first bar (resistance 50200, support 49900) unless noted.
//! Timestamps are expressed as UTC-ms offsets from 09:30 ET on that date,
//! one 5-minute grid step (300_000 ms) apart, computed through
//! `mbo-calendar` rather than hardcoded so DST handling stays exercised.

use mbo_calendar::et_to_utc_ms;
use mbo_schemas::Candle;

pub const ZONE_DATE: &str = "2024-06-17";
pub const ZONE_SYMBOL: &str = "SPY";

const STEP_MS: i64 = 300_000;

fn zone_start() -> i64 {
    et_to_utc_ms(ZONE_DATE, "09:30").expect("fixture date/time is well-formed")
}

fn bar(ts: i64, o: i64, h: i64, l: i64, c: i64) -> Candle {
    Candle::new(ts, o, h, l, c, 1_000, true).expect("fixture bar must be a valid OHLC candle")
}

/// The zone-defining 09:30 ET bar shared by Scenarios A, B, C, E, F:
/// resistance 50200, support 49900.
fn opening_bar(start: i64) -> Candle {
    bar(start, 50_000, 50_200, 49_900, 50_100)
}

/// Five bars (09:35–09:55) that stay inside the zone, so nothing but the
/// 10:00 boundary bar can move the state out of BUILDING_ZONE.
fn inside_bars(start: i64) -> Vec<Candle> {
    vec![
        bar(start + STEP_MS, 50_100, 50_150, 50_050, 50_120),
        bar(start + 2 * STEP_MS, 50_120, 50_180, 50_060, 50_090),
        bar(start + 3 * STEP_MS, 50_090, 50_170, 50_040, 50_110),
        bar(start + 4 * STEP_MS, 50_110, 50_190, 50_070, 50_130),
        bar(start + 5 * STEP_MS, 50_130, 50_195, 50_080, 50_150),
    ]
}

/// The 10:00 ET boundary/observation bar, closing exactly on resistance
/// (not strictly inside the zone, so it is not choppy).
fn non_choppy_boundary_bar(start: i64) -> Candle {
    bar(start + 6 * STEP_MS, 50_150, 50_210, 50_050, 50_200)
}

/// Scenario A (spec §8): long entry on the retest-and-confirm shortcut,
/// trailed through 1R and 2R to a 3R win.
pub fn scenario_a_bars() -> Vec<Candle> {
    let start = zone_start();
    let mut bars = vec![opening_bar(start)];
    bars.extend(inside_bars(start));
    bars.push(non_choppy_boundary_bar(start));
    bars.push(bar(start + 7 * STEP_MS, 50_200, 50_300, 50_150, 50_250)); // 10:05 break
    bars.push(bar(start + 8 * STEP_MS, 50_250, 50_360, 50_180, 50_350)); // 10:10 retest+confirm, entry 50350
    bars.push(bar(start + 9 * STEP_MS, 50_350, 50_850, 50_300, 50_800)); // 10:15 -> 1R, trail stop
    bars.push(bar(start + 10 * STEP_MS, 50_800, 51_300, 50_750, 51_250)); // 10:20 -> 2R
    bars.push(bar(start + 11 * STEP_MS, 51_250, 51_750, 51_200, 51_700)); // 10:25 -> 3R
    bars
}

/// Scenario B (spec §8): same entry as A, stopped out for a loss before
/// ever trailing.
pub fn scenario_b_bars() -> Vec<Candle> {
    let start = zone_start();
    let mut bars = vec![opening_bar(start)];
    bars.extend(inside_bars(start));
    bars.push(non_choppy_boundary_bar(start));
    bars.push(bar(start + 7 * STEP_MS, 50_200, 50_300, 50_150, 50_250)); // 10:05 break
    bars.push(bar(start + 8 * STEP_MS, 50_250, 50_360, 50_180, 50_350)); // 10:10 retest+confirm, entry 50350
    bars.push(bar(start + 9 * STEP_MS, 50_300, 50_320, 49_800, 49_850)); // 10:15 close <= 49900 -> Loss
    bars
}

/// Scenario C (spec §8): the 10:00 boundary bar closes strictly inside the
/// zone, so the zone is NoTradeChoppy and no trades are ever opened.
pub fn scenario_c_bars() -> Vec<Candle> {
    let start = zone_start();
    vec![
        opening_bar(start),
        bar(start + 6 * STEP_MS, 50_050, 50_150, 49_950, 50_000), // strictly between 49900/50200
    ]
}

/// Scenario D (spec §8): the zone-defining bar's own spread (5 cents) is
/// below `min_zone_spread_cents` (10), so the zone is NoTradeDegenerate.
/// As in the unit-level regression for §4.3.1, the same bar acts as both
/// the zone-defining bar and the boundary/observation bar by configuring
/// `zone_end_time` equal to `zone_start_time` — the window closes
/// immediately.
pub fn scenario_d_bars() -> Vec<Candle> {
    let start = zone_start();
    // Close sits exactly on resistance (not strictly inside the zone), so
    // choppy precedence (spec §8 invariant 7) does not preempt degenerate.
    vec![bar(start, 50_000, 50_005, 50_000, 50_005)]
}

/// Scenario E (spec §8): a first break fails and retries; the second
/// break attempt confirms and runs to a 3R win. Signals carries two Break
/// signals with `attempt_number` 1 and 2.
pub fn scenario_e_bars() -> Vec<Candle> {
    let start = zone_start();
    let mut bars = vec![opening_bar(start)];
    bars.extend(inside_bars(start));
    bars.push(non_choppy_boundary_bar(start));
    bars.push(bar(start + 7 * STEP_MS, 50_200, 50_300, 50_150, 50_220)); // 10:05 break #1
    bars.push(bar(start + 8 * STEP_MS, 50_220, 50_230, 50_100, 50_150)); // 10:10 close <= resistance -> BreakFailure, back to Watching
    bars.push(bar(start + 9 * STEP_MS, 50_150, 50_310, 50_120, 50_180)); // 10:15 break #2
    bars.push(bar(start + 10 * STEP_MS, 50_180, 50_360, 50_170, 50_350)); // 10:20 retest+confirm, entry 50350
    bars.push(bar(start + 11 * STEP_MS, 50_350, 50_850, 50_300, 50_800)); // 10:25 -> 1R
    bars.push(bar(start + 12 * STEP_MS, 50_800, 51_300, 50_750, 51_250)); // 10:30 -> 2R
    bars.push(bar(start + 13 * STEP_MS, 51_250, 51_750, 51_200, 51_700)); // 10:35 -> 3R
    bars
}

/// Scenario F (spec §8): price drifts sideways (between the current stop
/// and 1R) after entry, the bar feed simply runs dry, and the hard
/// execution-end timeout resolves the open trade as SessionTimeout.
pub fn scenario_f_bars() -> Vec<Candle> {
    let start = zone_start();
    let mut bars = vec![opening_bar(start)];
    bars.extend(inside_bars(start));
    bars.push(non_choppy_boundary_bar(start));
    bars.push(bar(start + 7 * STEP_MS, 50_200, 50_300, 50_150, 50_250)); // 10:05 break
    bars.push(bar(start + 8 * STEP_MS, 50_250, 50_360, 50_180, 50_350)); // 10:10 retest+confirm, entry 50350
    bars.push(bar(start + 9 * STEP_MS, 50_350, 50_420, 50_320, 50_400)); // 10:15 drifting, stop < close < 1R
    bars.push(bar(start + 10 * STEP_MS, 50_400, 50_430, 50_330, 50_390)); // 10:20 drifting
    bars.push(bar(start + 11 * STEP_MS, 50_390, 50_440, 50_340, 50_410)); // 10:25 drifting, last bar the feed has
    bars
}
