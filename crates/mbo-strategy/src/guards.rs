use mbo_schemas::{Candle, DecisionZone, Direction};

/// The two-tier price filter (spec §4.3.2): breaks use bar extremes, every
/// other condition uses the close. These helpers are the only place that
/// asymmetry is expressed; callers never compare against `resistance` /
/// `support` directly.

pub fn edge(dir: Direction, zone: &DecisionZone) -> i64 {
    match dir {
        Direction::Long => zone.resistance,
        Direction::Short => zone.support,
    }
}

/// The far side of the zone from the edge a track breaks through — where
/// `initial_stop` is placed (spec §3: "opposite-side zone edge").
pub fn opposite_edge(dir: Direction, zone: &DecisionZone) -> i64 {
    edge(dir.opposite(), zone)
}

pub fn is_break(dir: Direction, zone: &DecisionZone, bar: &Candle) -> bool {
    match dir {
        Direction::Long => bar.high > zone.resistance,
        Direction::Short => bar.low < zone.support,
    }
}

pub fn is_retest(dir: Direction, zone: &DecisionZone, bar: &Candle) -> bool {
    match dir {
        Direction::Long => bar.low <= zone.resistance,
        Direction::Short => bar.high >= zone.support,
    }
}

/// Whether the close holds beyond the edge (a confirmation). Its negation
/// is a break failure.
pub fn holds_beyond_edge(dir: Direction, zone: &DecisionZone, bar: &Candle) -> bool {
    match dir {
        Direction::Long => bar.close > zone.resistance,
        Direction::Short => bar.close < zone.support,
    }
}

/// The extreme that pierced the edge, for a Break signal's `price`.
pub fn break_price(dir: Direction, bar: &Candle) -> i64 {
    match dir {
        Direction::Long => bar.high,
        Direction::Short => bar.low,
    }
}

/// The extreme that returned to the edge, for a Retest signal's `price`.
pub fn retest_price(dir: Direction, bar: &Candle) -> i64 {
    match dir {
        Direction::Long => bar.low,
        Direction::Short => bar.high,
    }
}
