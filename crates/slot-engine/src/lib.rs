//! # slot-engine
//!
//! Appointment slot computation for a student-welfare office.
//!
//! Students book time with social workers; social workers describe their
//! weekly availability. This crate turns that availability into bookable
//! slots for a given date, checks the slots against existing appointments so
//! nothing is double-booked, and converts between the persisted range form
//! and the availability editor's block grid.
//!
//! Every function is pure and synchronous. The caller supplies all inputs,
//! including the current instant, so results are deterministic and safe to
//! compute from any number of threads at once.
//!
//! ## Modules
//!
//! - [`clock`] — `"HH:MM"` wall-clock times and ranges
//! - [`schedule`] — Business days, weekly schedules, day-of-week resolution
//! - [`codec`] — Ranges ↔ editor blocks within the fixed shifts
//! - [`planner`] — Slots for one date, flagged against appointments and "now"
//! - [`config`] — Timezone, slot/block sizes and shifts
//! - [`error`] — Error types

pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod planner;
pub mod schedule;

pub use clock::{ClockTime, TimeRange};
pub use codec::{
    compress_to_ranges, compress_to_ranges_with, expand_to_blocks, expand_to_blocks_with,
    BlockSelection, Shifts, DEFAULT_BLOCK_MINUTES,
};
pub use config::EngineConfig;
pub use error::ScheduleError;
pub use planner::{
    group_by_hour, plan_day, plan_day_with_options, Appointment, AppointmentStatus, HourGroup,
    PlanOptions, Slot, DEFAULT_SLOT_MINUTES,
};
pub use schedule::{
    day_status, local_date, open_dates, resolve_week_day, DayStatus, WeekDay, WeeklySchedule,
};
