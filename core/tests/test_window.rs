// core/tests/test_window.rs
use powercurve_core::{
    best_average, best_average_for_samples, ActivityId, CoreError, MetricKind, Rounding, Sample,
    TimeSeries,
};

fn series(samples: &[Sample]) -> TimeSeries {
    TimeSeries::from_samples(ActivityId::new("w1"), MetricKind::Power, samples).unwrap()
}

#[test]
fn window_never_crosses_a_recording_gap() {
    // 0–99 @ 200 W, pause, 150–199 @ 300 W
    let mut samples: Vec<Sample> = (0..100).map(|t| Sample::new(t, 200.0)).collect();
    samples.extend((150..200).map(|t| Sample::new(t, 300.0)));
    let ts = series(&samples);

    // spennet (199 s) er langt nok, men ingen løp er 120 s langt
    assert_eq!(best_average(&ts, 120, Rounding::Floor), None);
    assert_eq!(best_average(&ts, 50, Rounding::Floor), Some(300));
    assert_eq!(best_average(&ts, 100, Rounding::Floor), Some(200));
    assert_eq!(best_average(&ts, 51, Rounding::Floor), Some(200));
}

#[test]
fn span_shorter_than_duration_is_not_computable() {
    let ts = series(&[Sample::new(10, 100.0), Sample::new(11, 100.0), Sample::new(12, 100.0)]);
    assert_eq!(best_average(&ts, 3, Rounding::Floor), Some(100));
    assert_eq!(best_average(&ts, 4, Rounding::Floor), None);
}

#[test]
fn best_average_is_bounded_by_the_global_maximum() {
    let values: Vec<Sample> = (0..600u32)
        .map(|t| Sample::new(t, ((t * 7919) % 541) as f64))
        .collect();
    let ts = series(&values);
    let max = ts.max_value().unwrap();

    for d in [1u32, 5, 10, 30, 60, 120, 300, 600] {
        let v = best_average(&ts, d, Rounding::Floor).unwrap();
        assert!(v as f64 <= max, "d={d}: {v} > {max}");
    }
    assert_eq!(best_average(&ts, 1, Rounding::Floor), Some(max as u32));
}

#[test]
fn malformed_series_signals_data_integrity() {
    let samples = vec![Sample::new(0, 100.0), Sample::new(2, 100.0), Sample::new(1, 100.0)];
    let err = best_average_for_samples(&ActivityId::new("bad"), MetricKind::Power, &samples, 1, Rounding::Floor)
        .unwrap_err();
    match err {
        CoreError::DataIntegrity { activity_id, reason } => {
            assert_eq!(activity_id, "bad");
            assert!(reason.contains("does not increase"), "{reason}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn heart_rate_from_csv_fixture() {
    let data = "t,heartrate\n0,120\n1,130\n2,150\n3,160\n4,155\n10,190\n";
    let mut rdr = csv::Reader::from_reader(data.as_bytes());
    let samples: Vec<Sample> = rdr
        .deserialize::<(u32, f64)>()
        .map(|r| r.map(Sample::from))
        .collect::<Result<_, _>>()
        .unwrap();

    let ts = TimeSeries::from_samples(ActivityId::new("hr"), MetricKind::HeartRate, &samples).unwrap();
    assert_eq!(ts.runs().len(), 2);
    assert_eq!(best_average(&ts, 1, Rounding::Floor), Some(190));
    // (150 + 160) / 2 = 155, (160 + 155) / 2 = 157.5
    assert_eq!(best_average(&ts, 2, Rounding::Floor), Some(157));
    assert_eq!(best_average(&ts, 2, Rounding::Nearest), Some(158));
    assert_eq!(best_average(&ts, 6, Rounding::Floor), None);
}
