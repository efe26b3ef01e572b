use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use slot_engine::{
    compress_to_ranges, expand_to_blocks, plan_day, Appointment, AppointmentStatus,
    WeeklySchedule,
};
use std::hint::black_box;

fn bench_plan_day(c: &mut Criterion) {
    let schedule = WeeklySchedule::default_window();
    let monday = NaiveDate::from_ymd_opt(2026, 3, 16).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 3, 16, 7, 0, 0).unwrap();
    let base = Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap();
    let booked: Vec<Appointment> = (0..12)
        .map(|i| Appointment {
            start: base + Duration::minutes(i * 45),
            end: base + Duration::minutes(i * 45 + 30),
            status: AppointmentStatus::Confirmed,
        })
        .collect();

    c.bench_function("plan_day_5min_slots", |b| {
        b.iter(|| {
            plan_day(
                black_box(monday),
                Some(black_box(&schedule)),
                black_box(&booked),
                5,
                now,
                "Europe/Rome",
            )
        })
    });
}

fn bench_codec_round_trip(c: &mut Criterion) {
    let schedule = WeeklySchedule::default_window();
    c.bench_function("expand_compress_week", |b| {
        b.iter(|| {
            let blocks = expand_to_blocks(black_box(&schedule), 30).unwrap();
            compress_to_ranges(&blocks, 30).unwrap()
        })
    });
}

criterion_group!(benches, bench_plan_day, bench_codec_round_trip);
criterion_main!(benches);
