use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use slot_engine::{
    compress_to_ranges, expand_to_blocks, plan_day, Appointment, AppointmentStatus,
    BlockSelection, ClockTime, Shifts, TimeRange, WeekDay, WeeklySchedule,
};

fn any_day() -> impl Strategy<Value = WeekDay> {
    prop::sample::select(WeekDay::ALL.to_vec())
}

/// An arbitrary selection drawn from the default grid.
fn grid_selection() -> impl Strategy<Value = BlockSelection> {
    let grid = Shifts::default().candidate_blocks(30).unwrap();
    prop::collection::vec((any_day(), prop::sample::select(grid)), 0..60).prop_map(|picks| {
        let mut selection = BlockSelection::new();
        for (day, block) in picks {
            selection.select(day, block);
        }
        selection
    })
}

/// Any valid range anywhere in the day, aligned or not.
fn any_range() -> impl Strategy<Value = TimeRange> {
    (0u32..1439, 1u32..600).prop_map(|(start, len)| {
        let end = (start + len).min(1439);
        TimeRange::new(
            ClockTime::from_minutes(start).unwrap(),
            ClockTime::from_minutes(end).unwrap(),
        )
        .unwrap()
    })
}

fn any_schedule() -> impl Strategy<Value = WeeklySchedule> {
    prop::collection::vec((any_day(), prop::collection::vec(any_range(), 0..4)), 0..6).prop_map(
        |days| {
            let mut schedule = WeeklySchedule::new();
            for (day, ranges) in days {
                schedule.set_day(day, ranges);
            }
            schedule
        },
    )
}

fn status() -> impl Strategy<Value = AppointmentStatus> {
    prop::sample::select(vec![
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::NoShow,
        AppointmentStatus::Cancelled,
    ])
}

/// Appointments on 2026-03-16, between 08:00 and 19:00 UTC.
fn appointments() -> impl Strategy<Value = Vec<Appointment>> {
    let base = Utc.with_ymd_and_hms(2026, 3, 16, 8, 0, 0).unwrap();
    prop::collection::vec((0i64..660, 5i64..120, status()), 0..8).prop_map(move |raw| {
        raw.into_iter()
            .map(|(offset, len, status)| Appointment {
                start: base + Duration::minutes(offset),
                end: base + Duration::minutes(offset + len),
                status,
            })
            .collect()
    })
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

proptest! {
    #[test]
    fn prop_compress_expand_round_trip(selection in grid_selection()) {
        let schedule = compress_to_ranges(&selection, 30).unwrap();
        prop_assert_eq!(expand_to_blocks(&schedule, 30).unwrap(), selection);
        let again = compress_to_ranges(&expand_to_blocks(&schedule, 30).unwrap(), 30).unwrap();
        prop_assert_eq!(again, schedule);
    }

    #[test]
    fn prop_compressed_ranges_are_maximal(selection in grid_selection()) {
        let schedule = compress_to_ranges(&selection, 30).unwrap();
        for day in WeekDay::ALL {
            for pair in schedule.ranges(day).windows(2) {
                prop_assert!(pair[0].end() < pair[1].start());
            }
        }
    }

    #[test]
    fn prop_expansion_stays_within_shifts(schedule in any_schedule()) {
        let shifts = Shifts::default();
        let blocks = expand_to_blocks(&schedule, 30).unwrap();
        for day in WeekDay::ALL {
            for block in blocks.blocks(day) {
                prop_assert!(shifts.ranges().iter().any(|s| s.contains(block)));
                prop_assert_eq!(block.minutes() % 30, 0);
            }
        }
    }

    #[test]
    fn prop_available_slots_never_double_book(
        schedule in any_schedule(),
        booked in appointments(),
        slot_minutes in 5i64..90,
        now_offset in 0i64..1440,
    ) {
        let midnight = Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap();
        let now = midnight + Duration::minutes(now_offset);
        let slots = plan_day(monday(), Some(&schedule), &booked, slot_minutes, now, "UTC").unwrap();
        for slot in slots.iter().filter(|s| s.is_available) {
            prop_assert!(slot.start > now);
            for appt in booked.iter().filter(|a| a.status != AppointmentStatus::Cancelled) {
                prop_assert!(!(slot.start < appt.end && slot.end > appt.start));
            }
        }
    }

    #[test]
    fn prop_slots_fit_inside_their_day(schedule in any_schedule(), slot_minutes in 5i64..90) {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let slots = plan_day(monday(), Some(&schedule), &[], slot_minutes, now, "UTC").unwrap();
        let day_start = Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap();
        for slot in &slots {
            prop_assert_eq!(slot.end - slot.start, Duration::minutes(slot_minutes));
            prop_assert!(slot.start >= day_start);
            prop_assert!(slot.end < day_start + Duration::days(1));
        }
    }

    #[test]
    fn prop_weekend_is_always_empty(schedule in any_schedule(), weekend_offset in 5u64..7) {
        let date = monday() + chrono::Days::new(weekend_offset);
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        prop_assert!(plan_day(date, Some(&schedule), &[], 30, now, "UTC").unwrap().is_empty());
        prop_assert!(plan_day(date, None, &[], 30, now, "UTC").unwrap().is_empty());
    }

    #[test]
    fn prop_planning_is_deterministic(
        schedule in any_schedule(),
        booked in appointments(),
        slot_minutes in 5i64..90,
    ) {
        let now = Utc.with_ymd_and_hms(2026, 3, 16, 11, 0, 0).unwrap();
        let plan =
            || plan_day(monday(), Some(&schedule), &booked, slot_minutes, now, "Europe/Rome");
        let first = plan().unwrap();
        let second = plan().unwrap();
        prop_assert_eq!(first, second);
    }
}
