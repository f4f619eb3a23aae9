//! Weekly time windows and the overlap test used for conflict detection.
//!
//! Windows are half-open `[start, end)` in minutes since midnight, so a course ending at
//! 12:00 does not collide with one starting at 12:00.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Length assumed for a course that only publishes its start time.
pub const DEFAULT_DURATION_MINUTES: u32 = 120;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("invalid clock time '{0}', expected HH:MM")]
    InvalidClockTime(String),
    #[error("invalid weekday '{0}'")]
    InvalidDay(String),
    #[error("schedule window {start}-{end} is empty")]
    EmptyWindow { start: ClockTime, end: ClockTime },
}

/// Minutes since midnight. Resolved end times may run past 24:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u32);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    pub fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    pub fn hm(hours: u32, minutes: u32) -> Self {
        Self(hours * 60 + minutes)
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    pub fn plus_minutes(self, minutes: u32) -> Self {
        Self(self.0 + minutes)
    }

    /// Parse an optional "HH:MM" value; missing or blank input means midnight.
    pub fn parse(raw: Option<&str>) -> Result<Self, ScheduleError> {
        to_minutes(raw).map(Self)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// Convert "HH:MM" into minutes since midnight.
///
/// `None` and blank strings yield `0`; anything else that is not a valid 24h clock time
/// is an error rather than a silent zero.
pub fn to_minutes(raw: Option<&str>) -> Result<u32, ScheduleError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(0),
        Some(value) => value,
    };

    let invalid = || ScheduleError::InvalidClockTime(raw.to_string());
    let (hours, minutes) = raw.split_once(':').ok_or_else(invalid)?;
    let field = |part: &str| -> Result<u32, ScheduleError> {
        let part = part.trim();
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        part.parse().map_err(|_| invalid())
    };
    let hours = field(hours)?;
    let minutes = field(minutes)?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    Ok(hours * 60 + minutes)
}

pub fn parse_day(raw: &str) -> Result<Weekday, ScheduleError> {
    Weekday::from_str(raw.trim()).map_err(|_| ScheduleError::InvalidDay(raw.to_string()))
}

pub const fn day_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// A course's weekly slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleWire", into = "ScheduleWire")]
pub struct CourseSchedule {
    day: Weekday,
    start: ClockTime,
    end: Option<ClockTime>,
}

impl CourseSchedule {
    pub fn new(
        day: Weekday,
        start: ClockTime,
        end: Option<ClockTime>,
    ) -> Result<Self, ScheduleError> {
        let schedule = Self { day, start, end };
        let resolved = schedule.resolve_end();
        if schedule.start >= resolved {
            return Err(ScheduleError::EmptyWindow {
                start: schedule.start,
                end: resolved,
            });
        }
        Ok(schedule)
    }

    /// Build from loosely-typed upstream fields.
    pub fn parse(
        day: &str,
        start_time: Option<&str>,
        end_time: Option<&str>,
    ) -> Result<Self, ScheduleError> {
        let day = parse_day(day)?;
        let start = ClockTime::parse(start_time)?;
        let end = match end_time.map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(ClockTime::parse(Some(value))?),
        };
        Self::new(day, start, end)
    }

    pub fn day(&self) -> Weekday {
        self.day
    }

    pub fn start(&self) -> ClockTime {
        self.start
    }

    /// Explicit end when published, otherwise start plus the default duration.
    pub fn resolve_end(&self) -> ClockTime {
        self.end
            .unwrap_or_else(|| self.start.plus_minutes(DEFAULT_DURATION_MINUTES))
    }

    pub fn overlaps(&self, other: &CourseSchedule) -> bool {
        overlaps(self, other)
    }
}

impl fmt::Display for CourseSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            day_label(self.day),
            self.start,
            self.resolve_end()
        )
    }
}

/// True when both slots fall on the same day and their half-open windows intersect.
pub fn overlaps(a: &CourseSchedule, b: &CourseSchedule) -> bool {
    if a.day != b.day {
        return false;
    }

    let (start_a, end_a) = (a.start, a.resolve_end());
    let (start_b, end_b) = (b.start, b.resolve_end());

    !(end_a <= start_b || end_b <= start_a)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScheduleWire {
    day: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_time: Option<String>,
    /// Older registries publish the start as `time`.
    #[serde(default, skip_serializing)]
    time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_time: Option<String>,
}

impl TryFrom<ScheduleWire> for CourseSchedule {
    type Error = ScheduleError;

    fn try_from(wire: ScheduleWire) -> Result<Self, Self::Error> {
        let start_time = wire
            .start_time
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .or(wire.time.as_deref());
        CourseSchedule::parse(&wire.day, start_time, wire.end_time.as_deref())
    }
}

impl From<CourseSchedule> for ScheduleWire {
    fn from(schedule: CourseSchedule) -> Self {
        ScheduleWire {
            day: day_label(schedule.day).to_string(),
            start_time: Some(schedule.start.to_string()),
            time: None,
            end_time: schedule.end.map(|end| end.to_string()),
        }
    }
}
