//! mbo-calendar
//!
//! ET session-window conversion (spec §4.4 step 2) and the `is_trading_day`
//! oracle (spec §6.5). DST-correct: ET local times are resolved through the
//! IANA `America/New_York` zone rather than a fixed UTC offset, because the
//! zone-build/execution-end windows must fall on the same wall-clock time
//! year-round.

use chrono::{NaiveDate, NaiveTime, TimeZone};
use chrono_tz::America::New_York;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    InvalidDate { date: String },
    InvalidTime { time: String },
    /// The local wall-clock time does not exist or is ambiguous for this
    /// date (DST transition). Should not occur for the fixed session times
    /// this engine uses (09:30/10:00/12:00 ET), but is surfaced rather than
    /// silently picking an interpretation.
    AmbiguousOrMissingLocalTime { date: String, time: String },
}

impl core::fmt::Display for CalendarError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CalendarError::InvalidDate { date } => write!(f, "invalid date: {date}"),
            CalendarError::InvalidTime { time } => write!(f, "invalid time: {time}"),
            CalendarError::AmbiguousOrMissingLocalTime { date, time } => {
                write!(f, "ambiguous or missing local time {time} on {date} ET")
            }
        }
    }
}

impl std::error::Error for CalendarError {}

/// Convert a `YYYY-MM-DD` date and `HH:MM` time, both interpreted in
/// America/New_York local time, to UTC milliseconds. DST is honored via the
/// IANA tz database.
pub fn et_to_utc_ms(date: &str, time: &str) -> Result<i64, CalendarError> {
    let naive_date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| CalendarError::InvalidDate { date: date.to_string() })?;
    let naive_time = NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| CalendarError::InvalidTime { time: time.to_string() })?;
    let naive_dt = naive_date.and_time(naive_time);

    let local = New_York
        .from_local_datetime(&naive_dt)
        .single()
        .ok_or_else(|| CalendarError::AmbiguousOrMissingLocalTime {
            date: date.to_string(),
            time: time.to_string(),
        })?;

    Ok(local.timestamp_millis())
}

/// The three session windows the SessionRunner needs (spec §4.4 step 2),
/// all in UTC milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindows {
    pub zone_start_utc: i64,
    pub zone_end_utc: i64,
    pub execution_end_utc: i64,
}

pub fn session_windows(
    date: &str,
    zone_start_time: &str,
    zone_end_time: &str,
    execution_end_time: &str,
) -> Result<SessionWindows, CalendarError> {
    Ok(SessionWindows {
        zone_start_utc: et_to_utc_ms(date, zone_start_time)?,
        zone_end_utc: et_to_utc_ms(date, zone_end_time)?,
        execution_end_utc: et_to_utc_ms(date, execution_end_time)?,
    })
}

/// Trading-day oracle, supplied externally per spec §6.5. The core never
/// loads holiday data itself; this trait is the seam.
pub trait TradingCalendar: Send + Sync {
    fn is_trading_day(&self, date: &str) -> bool;
}

/// A minimal NYSE equities calendar: weekdays, minus a hardcoded set of US
/// market holidays. Adequate for tests and for operators who don't plug in
/// a richer calendar feed.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticNyseCalendar;

impl TradingCalendar for StaticNyseCalendar {
    fn is_trading_day(&self, date: &str) -> bool {
        let Ok(d) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
            return false;
        };
        use chrono::Datelike;
        let weekday = d.weekday();
        if matches!(weekday, chrono::Weekday::Sat | chrono::Weekday::Sun) {
            return false;
        }
        !is_nyse_holiday(d.year(), d.month(), d.day())
    }
}

/// Hardcoded observed NYSE holiday dates, 2023–2026 (extend as needed).
fn is_nyse_holiday(year: i32, month: u32, day: u32) -> bool {
    const HOLIDAYS: &[(i32, u32, u32)] = &[
        (2023, 1, 2),
        (2023, 1, 16),
        (2023, 2, 20),
        (2023, 4, 7),
        (2023, 5, 29),
        (2023, 6, 19),
        (2023, 7, 4),
        (2023, 9, 4),
        (2023, 11, 23),
        (2023, 12, 25),
        (2024, 1, 1),
        (2024, 1, 15),
        (2024, 2, 19),
        (2024, 3, 29),
        (2024, 5, 27),
        (2024, 6, 19),
        (2024, 7, 4),
        (2024, 9, 2),
        (2024, 11, 28),
        (2024, 12, 25),
        (2025, 1, 1),
        (2025, 1, 20),
        (2025, 2, 17),
        (2025, 4, 18),
        (2025, 5, 26),
        (2025, 6, 19),
        (2025, 7, 4),
        (2025, 9, 1),
        (2025, 11, 27),
        (2025, 12, 25),
        (2026, 1, 1),
        (2026, 1, 19),
        (2026, 2, 16),
        (2026, 4, 3),
        (2026, 5, 25),
        (2026, 6, 19),
        (2026, 7, 3),
        (2026, 9, 7),
        (2026, 11, 26),
        (2026, 12, 25),
    ];
    HOLIDAYS.contains(&(year, month, day))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn et_to_utc_honors_dst_summer() {
        // 2024-06-17 09:30 ET is EDT (UTC-4): 13:30 UTC.
        let ms = et_to_utc_ms("2024-06-17", "09:30").unwrap();
        assert_eq!(ms, chrono::Utc.with_ymd_and_hms(2024, 6, 17, 13, 30, 0).unwrap().timestamp_millis());
    }

    #[test]
    fn et_to_utc_honors_dst_winter() {
        // 2024-01-10 09:30 ET is EST (UTC-5): 14:30 UTC.
        let ms = et_to_utc_ms("2024-01-10", "09:30").unwrap();
        assert_eq!(ms, chrono::Utc.with_ymd_and_hms(2024, 1, 10, 14, 30, 0).unwrap().timestamp_millis());
    }

    #[test]
    fn session_windows_are_ordered() {
        let w = session_windows("2024-06-17", "09:30", "10:00", "12:00").unwrap();
        assert!(w.zone_start_utc < w.zone_end_utc);
        assert!(w.zone_end_utc < w.execution_end_utc);
    }

    #[test]
    fn weekend_is_not_a_trading_day() {
        let cal = StaticNyseCalendar;
        assert!(!cal.is_trading_day("2024-01-06")); // Saturday
        assert!(!cal.is_trading_day("2024-01-07")); // Sunday
    }

    #[test]
    fn holiday_is_not_a_trading_day() {
        let cal = StaticNyseCalendar;
        assert!(!cal.is_trading_day("2024-01-01"));
    }

    #[test]
    fn ordinary_weekday_is_a_trading_day() {
        let cal = StaticNyseCalendar;
        assert!(cal.is_trading_day("2024-06-17"));
    }
}
