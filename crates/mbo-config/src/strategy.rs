use serde::{Deserialize, Serialize};

/// Strategy options recognized by the engine (spec §6.4), all with defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub max_break_attempts: u32,
    pub min_zone_spread_cents: i64,
    pub max_zone_spread_percent: f64,
    pub bar_size_minutes: u32,
    pub session_windows: SessionWindowsConfig,
    pub targets: TargetsConfig,
    pub trailing_stop_at_1r: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            max_break_attempts: 5,
            min_zone_spread_cents: 10,
            max_zone_spread_percent: 3.0,
            bar_size_minutes: 5,
            session_windows: SessionWindowsConfig::default(),
            targets: TargetsConfig::default(),
            trailing_stop_at_1r: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionWindowsConfig {
    pub zone_start_time: String,
    pub zone_end_time: String,
    pub execution_end_time: String,
}

impl Default for SessionWindowsConfig {
    fn default() -> Self {
        Self {
            zone_start_time: "09:30".to_string(),
            zone_end_time: "10:00".to_string(),
            execution_end_time: "12:00".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetsConfig {
    pub target_1r_multiple: f64,
    pub target_2r_multiple: f64,
    pub target_3r_multiple: f64,
}

impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            target_1r_multiple: 1.0,
            target_2r_multiple: 2.0,
            target_3r_multiple: 3.0,
        }
    }
}

impl TargetsConfig {
    pub fn as_array(&self) -> [f64; 3] {
        [
            self.target_1r_multiple,
            self.target_2r_multiple,
            self.target_3r_multiple,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_break_attempts` must be >= 1.
    BreakAttemptsBelowOne,
    /// `min_zone_spread_cents` must be >= 0.
    NegativeMinZoneSpread,
    /// `max_zone_spread_percent` must be > 0.
    NonPositiveMaxZoneSpreadPercent,
    /// `bar_size_minutes` must be exactly 5 — not tunable (spec §6.4).
    UnsupportedBarSize { got: u32 },
    /// Target multiples must each be > 0 and strictly increasing (1R < 2R < 3R).
    TargetsNotStrictlyIncreasing,
    /// An `HH:MM` session window time failed to parse as such.
    InvalidSessionTime { field: &'static str, value: String },
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::BreakAttemptsBelowOne => {
                write!(f, "max_break_attempts must be >= 1")
            }
            ConfigError::NegativeMinZoneSpread => {
                write!(f, "min_zone_spread_cents must be >= 0")
            }
            ConfigError::NonPositiveMaxZoneSpreadPercent => {
                write!(f, "max_zone_spread_percent must be > 0")
            }
            ConfigError::UnsupportedBarSize { got } => {
                write!(f, "bar_size_minutes must be 5, got {got}")
            }
            ConfigError::TargetsNotStrictlyIncreasing => write!(
                f,
                "targets.target_kR_multiple must each be > 0 and strictly increasing"
            ),
            ConfigError::InvalidSessionTime { field, value } => {
                write!(f, "session_windows.{field} is not a valid HH:MM time: {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn parse_hh_mm(field: &'static str, s: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidSessionTime {
        field,
        value: s.to_string(),
    };
    let (h, m) = s.split_once(':').ok_or_else(invalid)?;
    let h: u32 = h.parse().map_err(|_| invalid())?;
    let m: u32 = m.parse().map_err(|_| invalid())?;
    if h > 23 || m > 59 {
        return Err(invalid());
    }
    Ok(())
}

impl StrategyConfig {
    /// Detected before the session starts; the runner refuses to run on
    /// error (spec §7 "Configuration error").
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_break_attempts < 1 {
            return Err(ConfigError::BreakAttemptsBelowOne);
        }
        if self.min_zone_spread_cents < 0 {
            return Err(ConfigError::NegativeMinZoneSpread);
        }
        if self.max_zone_spread_percent <= 0.0 {
            return Err(ConfigError::NonPositiveMaxZoneSpreadPercent);
        }
        if self.bar_size_minutes != 5 {
            return Err(ConfigError::UnsupportedBarSize {
                got: self.bar_size_minutes,
            });
        }
        let [k1, k2, k3] = self.targets.as_array();
        if !(k1 > 0.0 && k1 < k2 && k2 < k3) {
            return Err(ConfigError::TargetsNotStrictlyIncreasing);
        }
        parse_hh_mm("zone_start_time", &self.session_windows.zone_start_time)?;
        parse_hh_mm("zone_end_time", &self.session_windows.zone_end_time)?;
        parse_hh_mm("execution_end_time", &self.session_windows.execution_end_time)?;
        Ok(())
    }
}
