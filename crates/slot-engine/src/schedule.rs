//! Weekly availability and day-of-week resolution.
//!
//! Only business days are modelled. Saturday and Sunday have no
//! [`WeekDay`] and are always closed.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::clock::TimeRange;
use crate::error::ScheduleError;

/// A business day, Monday through Friday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl WeekDay {
    pub const ALL: [WeekDay; 5] = [
        WeekDay::Monday,
        WeekDay::Tuesday,
        WeekDay::Wednesday,
        WeekDay::Thursday,
        WeekDay::Friday,
    ];

    /// Map a chrono weekday; weekends have no business day.
    pub fn from_weekday(weekday: Weekday) -> Option<Self> {
        match weekday {
            Weekday::Mon => Some(WeekDay::Monday),
            Weekday::Tue => Some(WeekDay::Tuesday),
            Weekday::Wed => Some(WeekDay::Wednesday),
            Weekday::Thu => Some(WeekDay::Thursday),
            Weekday::Fri => Some(WeekDay::Friday),
            Weekday::Sat | Weekday::Sun => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeekDay::Monday => "monday",
            WeekDay::Tuesday => "tuesday",
            WeekDay::Wednesday => "wednesday",
            WeekDay::Thursday => "thursday",
            WeekDay::Friday => "friday",
        }
    }
}

impl fmt::Display for WeekDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a calendar date to its business day.
///
/// Weeks start on Monday. Saturday and Sunday resolve to `None`, which is a
/// normal closed state rather than an error. The date carries no timezone, so
/// the result never depends on the host's local time; use [`local_date`] first
/// when starting from an instant.
///
/// ```
/// use chrono::NaiveDate;
/// use slot_engine::schedule::{resolve_week_day, WeekDay};
///
/// let monday = NaiveDate::from_ymd_opt(2026, 3, 16).unwrap();
/// assert_eq!(resolve_week_day(monday), Some(WeekDay::Monday));
/// let saturday = NaiveDate::from_ymd_opt(2026, 3, 21).unwrap();
/// assert_eq!(resolve_week_day(saturday), None);
/// ```
pub fn resolve_week_day(date: NaiveDate) -> Option<WeekDay> {
    WeekDay::from_weekday(date.weekday())
}

/// The calendar date an instant falls on in the given timezone.
pub fn local_date<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Availability ranges per business day.
///
/// Each day's ranges are kept sorted by start time. An absent day and a day
/// with no ranges both mean the day is fully unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<WeekDay, Vec<TimeRange>>",
    into = "BTreeMap<WeekDay, Vec<TimeRange>>"
)]
pub struct WeeklySchedule {
    days: BTreeMap<WeekDay, Vec<TimeRange>>,
}

impl From<BTreeMap<WeekDay, Vec<TimeRange>>> for WeeklySchedule {
    fn from(days: BTreeMap<WeekDay, Vec<TimeRange>>) -> Self {
        let mut schedule = Self::new();
        for (day, ranges) in days {
            schedule.set_day(day, ranges);
        }
        schedule
    }
}

impl From<WeeklySchedule> for BTreeMap<WeekDay, Vec<TimeRange>> {
    fn from(schedule: WeeklySchedule) -> Self {
        schedule.days
    }
}

impl WeeklySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// The institute's fallback operating window: Monday to Friday,
    /// 09:00-13:00 and 14:00-18:00, except Friday afternoon which closes at
    /// 17:00.
    pub fn default_window() -> Self {
        let morning = TimeRange::whole_hours(9, 13);
        let afternoon = TimeRange::whole_hours(14, 18);
        let friday_afternoon = TimeRange::whole_hours(14, 17);

        let mut schedule = Self::new();
        for day in WeekDay::ALL {
            let closing = if day == WeekDay::Friday {
                friday_afternoon
            } else {
                afternoon
            };
            schedule.set_day(day, vec![morning, closing]);
        }
        schedule
    }

    /// Use `schedule` when present, otherwise the default operating window.
    pub fn or_default(schedule: Option<&WeeklySchedule>) -> Cow<'_, WeeklySchedule> {
        match schedule {
            Some(schedule) => Cow::Borrowed(schedule),
            None => Cow::Owned(Self::default_window()),
        }
    }

    /// Replace a day's ranges. Ranges are sorted by start; an empty list
    /// removes the day.
    pub fn set_day(&mut self, day: WeekDay, mut ranges: Vec<TimeRange>) {
        if ranges.is_empty() {
            self.days.remove(&day);
            return;
        }
        ranges.sort_by_key(|r| (r.start(), r.end()));
        self.days.insert(day, ranges);
    }

    /// Builder-style [`set_day`](Self::set_day).
    pub fn with_day(mut self, day: WeekDay, ranges: Vec<TimeRange>) -> Self {
        self.set_day(day, ranges);
        self
    }

    /// The day's ranges, ascending by start; empty when the day is closed.
    pub fn ranges(&self, day: WeekDay) -> &[TimeRange] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Business days that have at least one range.
    pub fn open_days(&self) -> impl Iterator<Item = WeekDay> + '_ {
        self.days.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Report the first pair of overlapping ranges within a day.
    ///
    /// Planning tolerates overlaps, so this is only for callers that want to
    /// reject such data before storing it.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        for (day, ranges) in &self.days {
            for pair in ranges.windows(2) {
                if pair[0].overlaps(&pair[1]) {
                    return Err(ScheduleError::Format(format!(
                        "{day} has overlapping ranges {} and {}",
                        pair[0], pair[1]
                    )));
                }
            }
        }
        Ok(())
    }

    /// Parse the persisted form, e.g. `{"monday":[{"start":"09:00","end":"13:00"}]}`.
    pub fn from_json(json: &str) -> Result<Self, ScheduleError> {
        serde_json::from_str(json)
            .map_err(|e| ScheduleError::Format(format!("schedule: {e}")))
    }

    pub fn to_json(&self) -> Result<String, ScheduleError> {
        serde_json::to_string(self)
            .map_err(|e| ScheduleError::Format(format!("schedule: {e}")))
    }
}

/// What a calendar date offers before any slot is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// Saturday or Sunday.
    Weekend,
    /// A business day with no configured ranges.
    NoHours,
    /// A business day with at least one range.
    Open(WeekDay),
}

/// Distinguish a weekend from a business day without configured hours.
///
/// [`crate::planner::plan_day`] returns an empty list in both cases; the
/// booking UI uses this to pick the right message.
pub fn day_status(date: NaiveDate, schedule: &WeeklySchedule) -> DayStatus {
    match resolve_week_day(date) {
        None => DayStatus::Weekend,
        Some(day) if schedule.ranges(day).is_empty() => DayStatus::NoHours,
        Some(day) => DayStatus::Open(day),
    }
}

/// Dates in `from..=through` that are open under `schedule`.
pub fn open_dates(
    from: NaiveDate,
    through: NaiveDate,
    schedule: &WeeklySchedule,
) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|date| *date <= through)
        .filter(|date| matches!(day_status(*date, schedule), DayStatus::Open(_)))
        .collect()
}
