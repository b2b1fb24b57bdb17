use mbo_calendar::CalendarError;
use mbo_config::ConfigError;

/// Errors that prevent a session from starting at all (spec §7
/// "Configuration error: detected before the session starts; the runner
/// refuses to run"). Once a session has started, every subsequent failure
/// is folded into the returned [`mbo_schemas::SessionContext`] instead of
/// propagating out of `run_session`.
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerError {
    Config(ConfigError),
    Calendar(CalendarError),
}

impl core::fmt::Display for RunnerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RunnerError::Config(e) => write!(f, "configuration error: {e}"),
            RunnerError::Calendar(e) => write!(f, "session window error: {e}"),
        }
    }
}

impl std::error::Error for RunnerError {}

impl From<ConfigError> for RunnerError {
    fn from(e: ConfigError) -> Self {
        RunnerError::Config(e)
    }
}

impl From<CalendarError> for RunnerError {
    fn from(e: CalendarError) -> Self {
        RunnerError::Calendar(e)
    }
}
