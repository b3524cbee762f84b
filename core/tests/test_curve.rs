// core/tests/test_curve.rs
mod common;

use common::{add_ride, at, flat};
use powercurve_core::cli::render_curve_report;
use powercurve_core::{
    chart_rows, standard_scopes, Activity, ActivityId, ActivityScope, ActivityType, CurveAggregator,
    CurveEngine, DateRange, EngineConfig, InMemoryStore, MetricKind, NamedScope,
};

fn engine_config(durations: &[u32]) -> EngineConfig {
    EngineConfig {
        durations: durations.to_vec(),
        ..EngineConfig::default()
    }
}

#[test]
fn end_to_end_best_curve_over_three_rides() {
    let store = InMemoryStore::new();
    add_ride(&store, "1", at(2024, 1, 1), flat(200.0, 3600));
    add_ride(&store, "2", at(2024, 2, 1), flat(300.0, 600));
    add_ride(&store, "3", at(2024, 3, 1), flat(100.0, 7200));

    let engine = CurveEngine::new(&store, &store, engine_config(&[60, 600, 3600])).unwrap();
    let report = engine.recompute(false).unwrap();
    assert_eq!(report.processed, 3);

    let curve = engine.best_curve(&ActivityScope::all(), MetricKind::Power).unwrap();
    assert_eq!(curve.len(), 3);
    assert_eq!((curve[&60].value, curve[&60].activity_id.as_str()), (300, "2"));
    assert_eq!((curve[&600].value, curve[&600].activity_id.as_str()), (300, "2"));
    assert_eq!((curve[&3600].value, curve[&3600].activity_id.as_str()), (200, "1"));
    assert_eq!(curve[&3600].start_time, at(2024, 1, 1));
}

#[test]
fn ties_go_to_the_earliest_activity_regardless_of_order() {
    let store = InMemoryStore::new();
    add_ride(&store, "late", at(2024, 5, 1), flat(250.0, 300));
    add_ride(&store, "early", at(2024, 4, 1), flat(250.0, 300));
    let engine = CurveEngine::new(&store, &store, engine_config(&[300])).unwrap();
    engine.recompute(false).unwrap();

    let late = Activity::new("late", at(2024, 5, 1), ActivityType::Ride);
    let early = Activity::new("early", at(2024, 4, 1), ActivityType::Ride);
    let aggregator = CurveAggregator::new(&store);

    for order in [vec![late.clone(), early.clone()], vec![early.clone(), late.clone()]] {
        for _ in 0..3 {
            let curve = aggregator.best_curve(&order, MetricKind::Power).unwrap();
            assert_eq!(curve[&300].activity_id, ActivityId::new("early"));
            assert_eq!(curve[&300].value, 250);
        }
    }
}

#[test]
fn activities_without_sets_are_skipped() {
    let store = InMemoryStore::new();
    add_ride(&store, "done", at(2024, 1, 1), flat(180.0, 120));
    store
        .insert_activity(Activity::new("pending", at(2024, 1, 2), ActivityType::Ride))
        .unwrap();
    let engine = CurveEngine::new(&store, &store, engine_config(&[60, 3600])).unwrap();
    engine.recompute(false).unwrap();

    let curve = engine.best_curve(&ActivityScope::all(), MetricKind::Power).unwrap();
    assert_eq!(curve.len(), 1);
    assert_eq!(curve[&60].value, 180);

    // ingen data for puls i det hele tatt: tom kurve, ingen feil
    let hr = engine.best_curve(&ActivityScope::all(), MetricKind::HeartRate).unwrap();
    assert!(hr.is_empty());
}

#[test]
fn single_lookup_reports_not_found() {
    let store = InMemoryStore::new();
    add_ride(&store, "a", at(2024, 1, 1), flat(100.0, 10));
    let aggregator = CurveAggregator::new(&store);
    let err = aggregator
        .best_averages_for(&ActivityId::new("a"), MetricKind::Power)
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
    let err = aggregator
        .best_averages_for(&ActivityId::new("missing"), MetricKind::Power)
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[test]
fn scopes_filter_by_date_and_type() {
    let store = InMemoryStore::new();
    add_ride(&store, "old", at(2023, 6, 1), flat(400.0, 60));
    add_ride(&store, "new", at(2025, 3, 1), flat(250.0, 60));
    store
        .insert_activity(Activity::new("zwift", at(2025, 3, 2), ActivityType::VirtualRide))
        .unwrap();
    store
        .insert_stream(&ActivityId::new("zwift"), MetricKind::Power, flat(330.0, 60))
        .unwrap();

    let engine = CurveEngine::new(&store, &store, engine_config(&[60])).unwrap();
    engine.recompute(false).unwrap();
    let now = at(2025, 3, 10);

    let recent = ActivityScope::in_range(DateRange::last_x_days(now, 45));
    assert_eq!(engine.best_curve(&recent, MetricKind::Power).unwrap()[&60].value, 330);

    let outdoor = recent.clone().with_activity_types(&[ActivityType::Ride]);
    assert_eq!(engine.best_curve(&outdoor, MetricKind::Power).unwrap()[&60].value, 250);

    let all = engine.best_curve(&ActivityScope::all(), MetricKind::Power).unwrap();
    assert_eq!(all[&60].activity_id, ActivityId::new("old"));
}

#[test]
fn standard_scopes_cover_recent_windows_and_each_year() {
    let now = at(2025, 3, 10);
    let labels = |scopes: Vec<NamedScope>| scopes.into_iter().map(|s| s.label).collect::<Vec<_>>();

    let scopes = standard_scopes(now, Some(at(2023, 6, 1)), &[ActivityType::Ride], None);
    assert_eq!(
        labels(scopes),
        vec!["All time", "Last 45 days", "Last 90 days", "2025", "2024", "2023"]
    );

    let scopes = standard_scopes(now, Some(at(2023, 6, 1)), &[ActivityType::Ride], Some(2024));
    assert_eq!(labels(scopes).len(), 5);

    let scopes = standard_scopes(now, None, &[ActivityType::Ride], None);
    assert_eq!(labels(scopes), vec!["All time", "Last 45 days", "Last 90 days"]);
}

#[test]
fn last_x_days_spans_whole_days() {
    let now = at(2025, 3, 10);
    let range = DateRange::last_x_days(now, 45);
    assert!(range.contains(at(2025, 1, 24) - chrono::Duration::hours(8)));
    assert!(!range.contains(at(2025, 1, 23)));
    assert!(range.contains(now + chrono::Duration::hours(10)));
}

#[test]
fn series_builder_and_chart_rows() {
    let store = InMemoryStore::new();
    add_ride(&store, "a", at(2024, 7, 1), flat(280.0, 1200));
    add_ride(&store, "b", at(2025, 2, 20), flat(310.0, 60));

    let engine = CurveEngine::new(&store, &store, engine_config(&[60, 1200])).unwrap();
    engine.recompute(false).unwrap();
    let series = engine
        .standard_curve_series(at(2025, 3, 10), MetricKind::Power)
        .unwrap();

    let labels: Vec<&str> = series.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["All time", "Last 45 days", "Last 90 days", "2025", "2024"]);

    let rows = chart_rows(&series);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].duration_secs, 60);
    assert_eq!(rows[0].values, vec![Some(310), Some(310), Some(310), Some(310), Some(280)]);
    assert_eq!(rows[1].values, vec![Some(280), None, None, None, Some(280)]);

    let text = render_curve_report(&series, MetricKind::Power);
    assert!(text.contains("All time"));
    assert!(text.contains("20m"));
    assert!(text.contains("310 W"));
}

#[test]
fn report_lists_the_short_duration_table() {
    let store = InMemoryStore::new();
    add_ride(&store, "long", at(2024, 8, 1), flat(250.0, 1800));

    let engine = CurveEngine::new(&store, &store, EngineConfig::default()).unwrap();
    engine.recompute(false).unwrap();
    let series = engine
        .best_curve_series(&[NamedScope::new("All time", ActivityScope::all())], MetricKind::Power)
        .unwrap();
    // kurven har hele katalogen, tabellen bare utvalget
    assert!(series[0].curve.contains_key(&15));

    let text = render_curve_report(&series, MetricKind::Power);
    let rows: Vec<&str> = text.lines().skip(2).collect();
    assert_eq!(rows.len(), powercurve_core::TIME_INTERVALS_IN_SECONDS_REDACTED.len());
    assert!(rows[0].trim_start().starts_with("1s"));
    assert!(rows[9].contains("20m") && rows[9].contains("250 W"));
    assert!(rows[10].contains("30m") && rows[10].contains("250 W"));
    assert!(rows[11].contains("1h") && rows[11].trim_end().ends_with('-'));
    assert!(!text.contains("15s"));
    assert!(!text.contains("1m 30s"));
}
