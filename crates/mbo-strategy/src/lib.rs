//! mbo-strategy
//!
//! The two-track breakout state machine: the hard engineering of this
//! system. A hierarchical state machine (IDLE -> BUILDING_ZONE ->
//! MONITORING -> {NO_TRADE | COMPLETE | ERROR}) with two independent
//! parallel regions in MONITORING (long track, short track) plus a
//! bar-accumulator region. Pure function of (context, event); no I/O, no
//! async dependency at all.

mod context;
mod events;
mod guards;
mod machine;
mod position;
mod state;
mod track;
mod zone;

pub use context::MachineContext;
pub use events::Event;
pub use machine::StrategyMachine;
pub use state::{MachineState, RMilestones, TrackPhase, TrackState};
