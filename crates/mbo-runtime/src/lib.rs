//! mbo-runtime
//!
//! The SessionRunner (spec §4.4) and SessionContext assembly (spec §4.5):
//! the only place in the core that does I/O-adjacent work (reading time,
//! pulling from a [`mbo_barsource::BarSource`]) and the only place with a
//! suspension point (the wait-for-session-end loop, spec §5). The
//! [`mbo_strategy::StrategyMachine`] itself stays pure.

mod error;
mod runner;

pub use error::RunnerError;
pub use runner::SessionRunner;
