// core/src/json_api.rs
//! JSON inn/ut-lag som brukes av Python-bindingen (og kan kalles direkte).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{self as json};
use serde_path_to_error as spte;
use std::collections::BTreeMap;

use crate::best_averages::BestAverageSet;
use crate::config::EngineConfig;
use crate::curve_series::{chart_rows, ChartRow, CurveSeries, NamedScope};
use crate::engine::CurveEngine;
use crate::recompute::RecomputeReport;
use crate::series::{Sample, TimeSeries};
use crate::storage::InMemoryStore;
use crate::types::{Activity, ActivityId, ActivityType, MetricKind};

fn default_metric() -> MetricKind {
    MetricKind::Power
}

fn default_activity_id() -> ActivityId {
    ActivityId::new("inline")
}

// ──────────────────────────────────────────────────────────────────────────────
// ÉN SERIE
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BestAverageIn {
    #[serde(default = "default_activity_id")]
    activity_id: ActivityId,
    #[serde(default = "default_metric")]
    metric: MetricKind,
    samples: Vec<Sample>,
    #[serde(default)]
    config: EngineConfig,
}

/// `{ samples: [[t, v], ..], metric?, config? }` → `BestAverageSet` som JSON.
pub fn best_average_from_json(json_in: &str) -> Result<String, String> {
    let mut de = json::Deserializer::from_str(json_in);
    let parsed: BestAverageIn = spte::deserialize(&mut de)
        .map_err(|e| format!("parse error (BestAverageIn) at {}: {}", e.path(), e))?;
    let config = parsed.config.validated().map_err(|e| e.to_string())?;

    let series = TimeSeries::with_gap_fill(
        parsed.activity_id,
        parsed.metric,
        &parsed.samples,
        config.gap_fill_secs,
    )
    .map_err(|e| e.to_string())?;

    let set = BestAverageSet::compute(&series, &config.durations, config.rounding);
    json::to_string(&set).map_err(|e| e.to_string())
}

// ──────────────────────────────────────────────────────────────────────────────
// KORPUS → KURVESERIER
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ActivityIn {
    id: ActivityId,
    start_time: DateTime<Utc>,
    #[serde(default = "default_activity_type")]
    activity_type: ActivityType,
    #[serde(default)]
    streams: BTreeMap<MetricKind, Vec<Sample>>,
}

fn default_activity_type() -> ActivityType {
    ActivityType::Ride
}

#[derive(Debug, Deserialize)]
struct CurveSeriesIn {
    now: DateTime<Utc>,
    #[serde(default = "default_metric")]
    metric: MetricKind,
    activities: Vec<ActivityIn>,
    #[serde(default)]
    config: EngineConfig,
    /// Egne utvalg; mangler de brukes standard-utvalgene.
    #[serde(default)]
    scopes: Option<Vec<NamedScope>>,
}

#[derive(Debug, Serialize)]
struct CurveSeriesOut {
    report: RecomputeReport,
    series: Vec<CurveSeries>,
    rows: Vec<ChartRow>,
}

/// Laster aktivitetene i et minne-lager, regner ut sett og returnerer kurveseriene.
pub fn curve_series_from_json(json_in: &str) -> Result<String, String> {
    let mut de = json::Deserializer::from_str(json_in);
    let parsed: CurveSeriesIn = spte::deserialize(&mut de)
        .map_err(|e| format!("parse error (CurveSeriesIn) at {}: {}", e.path(), e))?;

    let store = InMemoryStore::new();
    for a in parsed.activities {
        let id = a.id.clone();
        store
            .insert_activity(Activity {
                id: a.id,
                start_time: a.start_time,
                activity_type: a.activity_type,
            })
            .map_err(|e| e.to_string())?;
        for (metric, samples) in a.streams {
            store
                .insert_stream(&id, metric, samples)
                .map_err(|e| e.to_string())?;
        }
    }

    let mut config = parsed.config;
    if !config.metrics.contains(&parsed.metric) {
        config.metrics.push(parsed.metric);
    }
    let engine = CurveEngine::new(&store, &store, config).map_err(|e| e.to_string())?;
    let report = engine.recompute(false).map_err(|e| e.to_string())?;

    let series = match parsed.scopes {
        Some(scopes) => engine.best_curve_series(&scopes, parsed.metric),
        None => engine.standard_curve_series(parsed.now, parsed.metric),
    }
    .map_err(|e| e.to_string())?;

    let out = CurveSeriesOut {
        report,
        rows: chart_rows(&series),
        series,
    };
    json::to_string(&out).map_err(|e| e.to_string())
}
