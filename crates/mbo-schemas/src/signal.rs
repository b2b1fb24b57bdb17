use serde::{Deserialize, Serialize};

use crate::bar::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalType {
    Break,
    Retest,
    Confirmation,
    BreakFailure,
}

/// Append-only; never mutated after emission (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub direction: Direction,
    pub r#type: SignalType,
    pub timestamp: i64,
    pub price: i64,
    pub trigger_bar: Candle,
    pub attempt_number: u32,
}
