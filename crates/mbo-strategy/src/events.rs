use mbo_schemas::Candle;

/// The machine's single event alphabet (spec §4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SessionStart { date: String, symbol: String },
    NewBar { bar: Candle },
    SessionEnd,
    Error { message: String },
}
