//! mbo-config
//!
//! Strategy options (spec §6.4) plus layered-YAML config loading with a
//! stable canonical hash, so a session's config provenance can be stamped
//! onto its stored record.

mod layered;
mod strategy;

pub use layered::{load_layered_yaml, LoadedConfig};
pub use strategy::{ConfigError, SessionWindowsConfig, StrategyConfig, TargetsConfig};
