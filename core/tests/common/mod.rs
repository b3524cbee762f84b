// Felles hjelpere for integrasjonstestene.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use powercurve_core::{Activity, ActivityId, ActivityType, InMemoryStore, MetricKind, Sample};

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 8, 0, 0).unwrap()
}

/// Flat serie @1 Hz fra offset 0.
pub fn flat(value: f64, secs: u32) -> Vec<Sample> {
    (0..secs).map(|t| Sample::new(t, value)).collect()
}

pub fn add_ride(store: &InMemoryStore, id: &str, start: DateTime<Utc>, watts: Vec<Sample>) {
    store
        .insert_activity(Activity::new(id, start, ActivityType::Ride))
        .unwrap();
    store
        .insert_stream(&ActivityId::new(id), MetricKind::Power, watts)
        .unwrap();
}
