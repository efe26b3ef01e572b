//! Bookable slot planning for a single calendar date.
//!
//! Given a date, a social worker's [`WeeklySchedule`], and that worker's
//! existing appointments, [`plan_day`] tiles each of the day's ranges into
//! fixed-length slots and flags each one available or not. All inputs are
//! explicit, including the "now" anchor, so a call is a pure function of its
//! arguments: the same inputs always yield the same slots.
//!
//! The availability flag is a point-in-time read. Two callers can still race
//! to book the same slot; the appointment store must re-check conflicts when
//! it writes.

use chrono::{DateTime, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{ClockTime, TimeRange};
use crate::error::ScheduleError;
use crate::schedule::{resolve_week_day, WeeklySchedule};

/// Slot length used by the booking UI.
pub const DEFAULT_SLOT_MINUTES: i64 = 30;

// ── Appointments ────────────────────────────────────────────────────────────

/// Lifecycle state of a booked appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    NoShow,
    Cancelled,
}

impl AppointmentStatus {
    /// Whether an appointment in this state still occupies its time.
    pub fn holds_time(self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

/// An existing booking, as supplied by the appointment store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: AppointmentStatus,
}

impl Appointment {
    /// Whether this appointment blocks `[start, end)`.
    ///
    /// Cancelled appointments block nothing. Intervals that only share an
    /// endpoint do not conflict, so back-to-back bookings are allowed.
    pub fn conflicts_with(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.status.holds_time() && start < self.end && end > self.start
    }
}

// ── Slots ───────────────────────────────────────────────────────────────────

/// A bookable window derived from availability. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_available: bool,
}

/// Slots sharing a local start hour, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourGroup {
    pub hour: u32,
    pub slots: Vec<Slot>,
}

/// Options for [`plan_day_with_options`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOptions {
    /// Length of each slot in minutes.
    pub slot_minutes: i64,
    /// Timezone the schedule's wall-clock times are read in.
    pub timezone: Tz,
    /// Drop exact duplicate slots produced by overlapping ranges and sort
    /// the result by start.
    pub dedupe: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            slot_minutes: DEFAULT_SLOT_MINUTES,
            timezone: Tz::UTC,
            dedupe: false,
        }
    }
}

impl PlanOptions {
    /// # Errors
    ///
    /// Returns [`ScheduleError::Config`] for an unusable slot length or an
    /// unknown IANA timezone name.
    pub fn new(slot_minutes: i64, timezone: &str) -> Result<Self, ScheduleError> {
        slot_step(slot_minutes)?;
        Ok(Self {
            slot_minutes,
            timezone: parse_timezone(timezone)?,
            dedupe: false,
        })
    }
}

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz, ScheduleError> {
    name.parse::<Tz>()
        .map_err(|_| ScheduleError::Config(format!("unknown timezone '{name}'")))
}

// ── plan_day ────────────────────────────────────────────────────────────────

/// Plan the bookable slots for one date.
///
/// A missing `schedule` falls back to [`WeeklySchedule::default_window`].
/// See [`plan_day_with_options`] for the algorithm.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use slot_engine::clock::TimeRange;
/// use slot_engine::planner::plan_day;
/// use slot_engine::schedule::{WeekDay, WeeklySchedule};
///
/// let schedule = WeeklySchedule::new()
///     .with_day(WeekDay::Monday, vec![TimeRange::parse("09:00", "10:00").unwrap()]);
/// let monday = NaiveDate::from_ymd_opt(2026, 3, 16).unwrap();
/// let now = Utc.with_ymd_and_hms(2026, 3, 16, 7, 0, 0).unwrap();
///
/// let slots = plan_day(monday, Some(&schedule), &[], 30, now, "UTC").unwrap();
/// assert_eq!(slots.len(), 2);
/// assert!(slots.iter().all(|s| s.is_available));
/// ```
pub fn plan_day(
    date: NaiveDate,
    schedule: Option<&WeeklySchedule>,
    appointments: &[Appointment],
    slot_minutes: i64,
    now: DateTime<Utc>,
    timezone: &str,
) -> Result<Vec<Slot>, ScheduleError> {
    let options = PlanOptions::new(slot_minutes, timezone)?;
    plan_day_with_options(date, schedule, appointments, now, &options)
}

/// Plan the bookable slots for one date with explicit options.
///
/// 1. Resolve `date` to a business day; weekends yield no slots.
/// 2. A day without ranges yields no slots.
/// 3. Each range is tiled independently from its start into
///    `slot_minutes` slots. A trailing remainder shorter than a slot is
///    dropped.
/// 4. A slot is unavailable if it starts at or before `now`, or if it
///    overlaps any appointment that is not cancelled.
///
/// Slots come out in range order, which is chronological because a day's
/// ranges are kept sorted. Overlapping ranges are tolerated and produce
/// overlapping slots unless [`PlanOptions::dedupe`] is set.
///
/// Wall-clock times are read in [`PlanOptions::timezone`]. A time repeated by
/// a DST fall-back resolves to its earlier instant. A time skipped by a
/// spring-forward gap has no slot.
///
/// # Errors
///
/// Returns [`ScheduleError::Config`] if `slot_minutes` is not in `1..=1440`.
/// Nothing is returned alongside an error.
pub fn plan_day_with_options(
    date: NaiveDate,
    schedule: Option<&WeeklySchedule>,
    appointments: &[Appointment],
    now: DateTime<Utc>,
    options: &PlanOptions,
) -> Result<Vec<Slot>, ScheduleError> {
    let step = slot_step(options.slot_minutes)?;

    let Some(day) = resolve_week_day(date) else {
        debug!(%date, "weekend date has no slots");
        return Ok(Vec::new());
    };

    let schedule = WeeklySchedule::or_default(schedule);
    let ranges = schedule.ranges(day);
    if ranges.windows(2).any(|pair| pair[0].overlaps(&pair[1])) {
        warn!(%date, %day, "overlapping availability ranges produce overlapping slots");
    }

    let mut slots = Vec::new();
    for range in ranges {
        tile_range(date, range, step, &options.timezone, &mut slots);
    }

    for slot in &mut slots {
        slot.is_available = now < slot.start
            && !appointments
                .iter()
                .any(|appointment| appointment.conflicts_with(slot.start, slot.end));
    }

    if options.dedupe {
        slots.sort_by_key(|slot| (slot.start, slot.end));
        slots.dedup_by_key(|slot| (slot.start, slot.end));
    }

    debug!(
        %date,
        %day,
        slots = slots.len(),
        available = slots.iter().filter(|s| s.is_available).count(),
        "planned day"
    );
    Ok(slots)
}

fn slot_step(slot_minutes: i64) -> Result<u32, ScheduleError> {
    if slot_minutes <= 0 || slot_minutes > 24 * 60 {
        return Err(ScheduleError::Config(format!(
            "slot length must be between 1 and 1440 minutes, got {slot_minutes}"
        )));
    }
    Ok(slot_minutes as u32)
}

/// Append the whole slots of `range`, initially unflagged.
fn tile_range(date: NaiveDate, range: &TimeRange, step: u32, tz: &Tz, out: &mut Vec<Slot>) {
    let length = chrono::Duration::minutes(i64::from(step));
    let mut cursor = range.start().minutes();

    while cursor + step <= range.end().minutes() {
        let Some(wall) = ClockTime::from_minutes(cursor) else {
            break;
        };
        match local_instant(date, wall, tz) {
            Some(start) => out.push(Slot {
                start,
                end: start + length,
                is_available: false,
            }),
            None => warn!(%date, time = %wall, "wall-clock time skipped by DST transition"),
        }
        cursor += step;
    }
}

/// The instant a local wall-clock time names, taking the earlier one when a
/// DST fall-back repeats it.
fn local_instant(date: NaiveDate, time: ClockTime, tz: &Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time.to_naive()))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// Group consecutive slots by the local hour they start in.
pub fn group_by_hour(slots: &[Slot], tz: &Tz) -> Vec<HourGroup> {
    let mut groups: Vec<HourGroup> = Vec::new();
    for slot in slots {
        let hour = slot.start.with_timezone(tz).hour();
        match groups.last_mut() {
            Some(group) if group.hour == hour => group.slots.push(slot.clone()),
            _ => groups.push(HourGroup {
                hour,
                slots: vec![slot.clone()],
            }),
        }
    }
    groups
}

// ── Tests ───────────────────────────────────────────────────────────────────
