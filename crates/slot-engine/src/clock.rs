//! Wall-clock times and ranges.
//!
//! Availability is stored as `"HH:MM"` strings with no date and no timezone.
//! They are interpreted in the institute's timezone only at the point where a
//! concrete calendar date is known (see [`crate::planner`]).

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ScheduleError;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// A wall-clock time of day with minute precision.
///
/// Parsed strictly from `"HH:MM"`: two digits, a colon, two digits, with the
/// hour in `0..=23` and the minute in `0..=59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    /// Build a time from hour and minute.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Format`] if the hour or minute is out of range.
    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        if hour > 23 || minute > 59 {
            return Err(ScheduleError::Format(format!(
                "time {hour:02}:{minute:02} is out of range"
            )));
        }
        Ok(Self((hour * 60 + minute) as u16))
    }

    /// Build a time from minutes since midnight, if it falls within the day.
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        if minutes < u32::from(MINUTES_PER_DAY) {
            Some(Self(minutes as u16))
        } else {
            None
        }
    }

    pub fn hour(self) -> u32 {
        u32::from(self.0 / 60)
    }

    pub fn minute(self) -> u32 {
        u32::from(self.0 % 60)
    }

    /// Minutes elapsed since midnight.
    pub fn minutes(self) -> u32 {
        u32::from(self.0)
    }

    /// Add minutes, returning `None` if the result would pass 23:59.
    pub fn checked_add_minutes(self, minutes: u32) -> Option<Self> {
        Self::from_minutes(self.minutes().checked_add(minutes)?)
    }

    pub fn to_naive(self) -> NaiveTime {
        // hour and minute are range-checked at construction
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for ClockTime {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 5
            && bytes[2] == b':'
            && bytes[..2].iter().all(u8::is_ascii_digit)
            && bytes[3..].iter().all(u8::is_ascii_digit);
        if !well_formed {
            return Err(ScheduleError::Format(format!(
                "'{s}' is not a time in HH:MM form"
            )));
        }

        let hour = u32::from(bytes[0] - b'0') * 10 + u32::from(bytes[1] - b'0');
        let minute = u32::from(bytes[3] - b'0') * 10 + u32::from(bytes[4] - b'0');
        Self::from_hm(hour, minute).map_err(|_| {
            ScheduleError::Format(format!("'{s}' has an hour or minute out of range"))
        })
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// A half-open wall-clock interval `[start, end)` within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange")]
pub struct TimeRange {
    start: ClockTime,
    end: ClockTime,
}

#[derive(Deserialize)]
struct RawTimeRange {
    start: ClockTime,
    end: ClockTime,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = ScheduleError;

    fn try_from(raw: RawTimeRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl TimeRange {
    /// # Errors
    ///
    /// Returns [`ScheduleError::Format`] unless `start < end`.
    pub fn new(start: ClockTime, end: ClockTime) -> Result<Self, ScheduleError> {
        if start >= end {
            return Err(ScheduleError::Format(format!(
                "range {start}-{end} must start before it ends"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a range from two `"HH:MM"` strings.
    ///
    /// ```
    /// use slot_engine::clock::TimeRange;
    ///
    /// let range = TimeRange::parse("09:00", "13:00").unwrap();
    /// assert_eq!(range.duration_minutes(), 240);
    /// assert!(TimeRange::parse("13:00", "09:00").is_err());
    /// ```
    pub fn parse(start: &str, end: &str) -> Result<Self, ScheduleError> {
        Self::new(start.parse()?, end.parse()?)
    }

    /// Whole-hour range for built-in policy constants. Callers keep
    /// `from < to < 24`.
    pub(crate) const fn whole_hours(from: u16, to: u16) -> Self {
        Self {
            start: ClockTime(from * 60),
            end: ClockTime(to * 60),
        }
    }

    pub fn start(&self) -> ClockTime {
        self.start
    }

    pub fn end(&self) -> ClockTime {
        self.end
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end.minutes() - self.start.minutes()
    }

    /// Whether `time` lies in `[start, end)`.
    pub fn contains(&self, time: ClockTime) -> bool {
        self.start <= time && time < self.end
    }

    /// Half-open overlap: ranges that only touch do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
