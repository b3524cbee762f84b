// core/tests/test_json_api.rs
use powercurve_core::json_api::{best_average_from_json, curve_series_from_json};
use serde_json::{json, Value};

fn flat_stream(value: f64, secs: u32) -> Value {
    Value::from((0..secs).map(|t| json!([t, value])).collect::<Vec<_>>())
}

#[test]
fn best_averages_for_one_series() {
    let payload = json!({
        "samples": flat_stream(220.0, 120),
        "config": { "durations": [1, 60, 600] }
    });
    let out = best_average_from_json(&payload.to_string()).unwrap();
    let v: Value = serde_json::from_str(&out).unwrap();

    assert_eq!(v["metric"], "watts");
    assert_eq!(v["values"]["1"], 220);
    assert_eq!(v["values"]["60"], 220);
    assert!(v["values"].get("600").is_none());
}

#[test]
fn malformed_series_is_an_error() {
    let payload = json!({ "samples": [[0, 100.0], [0, 110.0]] });
    let err = best_average_from_json(&payload.to_string()).unwrap_err();
    assert!(err.contains("data integrity"), "{err}");
}

#[test]
fn parse_error_names_the_field() {
    let err = best_average_from_json(r#"{"samples": [[0, "x"]]}"#).unwrap_err();
    assert!(err.contains("samples"), "{err}");
}

#[test]
fn curve_series_for_a_small_corpus() {
    let payload = json!({
        "now": "2025-03-10T12:00:00Z",
        "config": { "durations": [60, 600] },
        "activities": [
            { "id": "1", "start_time": "2024-05-01T08:00:00Z", "activity_type": "Ride",
              "streams": { "watts": flat_stream(260.0, 600) } },
            { "id": "2", "start_time": "2025-03-01T08:00:00Z", "activity_type": "VirtualRide",
              "streams": { "watts": flat_stream(300.0, 120) } },
            { "id": "3", "start_time": "2025-03-02T08:00:00Z", "activity_type": "Run",
              "streams": { "watts": flat_stream(500.0, 120) } }
        ]
    });
    let out = curve_series_from_json(&payload.to_string()).unwrap();
    let v: Value = serde_json::from_str(&out).unwrap();

    assert_eq!(v["report"]["processed"], 3);
    let series = v["series"].as_array().unwrap();
    let labels: Vec<&str> = series.iter().map(|s| s["label"].as_str().unwrap()).collect();
    assert_eq!(labels, vec!["All time", "Last 45 days", "Last 90 days", "2025", "2024"]);

    // løpeturen er ikke med i sykkel-utvalgene
    assert_eq!(series[0]["curve"]["60"]["value"], 300);
    assert_eq!(series[0]["curve"]["60"]["activity_id"], "2");
    assert_eq!(series[0]["curve"]["600"]["activity_id"], "1");
    assert!(series[1]["curve"].get("600").is_none());

    let rows = v["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn custom_scopes_and_heart_rate() {
    let payload = json!({
        "now": "2025-03-10T12:00:00Z",
        "metric": "heartrate",
        "scopes": [ { "label": "Everything", "scope": {} } ],
        "activities": [
            { "id": "hr1", "start_time": "2025-01-01T08:00:00Z", "activity_type": "Run",
              "streams": { "heartrate": [[0, 150], [1, 170], [2, 160]] } }
        ],
        "config": { "durations": [1, 2] }
    });
    let out = curve_series_from_json(&payload.to_string()).unwrap();
    let v: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(v["series"][0]["label"], "Everything");
    assert_eq!(v["series"][0]["curve"]["1"]["value"], 170);
    assert_eq!(v["series"][0]["curve"]["2"]["value"], 165);
}
