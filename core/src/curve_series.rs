// core/src/curve_series.rs
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::curve::{BestCurve, CurveAggregator};
use crate::error::CoreResult;
use crate::types::{ActivityScope, ActivityType, DateRange, MetricKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedScope {
    pub label: String,
    pub scope: ActivityScope,
}

impl NamedScope {
    pub fn new(label: impl Into<String>, scope: ActivityScope) -> Self {
        Self {
            label: label.into(),
            scope,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSeries {
    pub label: String,
    pub curve: BestCurve,
}

/// Én rad i diagrammet: varighet + verdi per serie (samme rekkefølge som seriene).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRow {
    pub duration_secs: u32,
    pub values: Vec<Option<u32>>,
}

pub struct CurveSeriesBuilder<'a> {
    aggregator: CurveAggregator<'a>,
}

impl<'a> CurveSeriesBuilder<'a> {
    pub fn new(aggregator: CurveAggregator<'a>) -> Self {
        Self { aggregator }
    }

    /// Én uavhengig aggregering per utvalg, i samme rekkefølge som input.
    pub fn build(&self, scopes: &[NamedScope], metric: MetricKind) -> CoreResult<Vec<CurveSeries>> {
        scopes
            .iter()
            .map(|named| -> CoreResult<CurveSeries> {
                Ok(CurveSeries {
                    label: named.label.clone(),
                    curve: self.aggregator.best_curve_in_scope(&named.scope, metric)?,
                })
            })
            .collect()
    }
}

/// "All time", "Last 45 days", "Last 90 days", deretter hvert år fra i år og bakover
/// til første aktivitets år (ikke før `min_year`).
pub fn standard_scopes(
    now: DateTime<Utc>,
    first_activity_start: Option<DateTime<Utc>>,
    activity_types: &[ActivityType],
    min_year: Option<i32>,
) -> Vec<NamedScope> {
    let mut scopes = vec![
        NamedScope::new("All time", ActivityScope::all().with_activity_types(activity_types)),
        NamedScope::new(
            "Last 45 days",
            ActivityScope::in_range(DateRange::last_x_days(now, 45)).with_activity_types(activity_types),
        ),
        NamedScope::new(
            "Last 90 days",
            ActivityScope::in_range(DateRange::last_x_days(now, 90)).with_activity_types(activity_types),
        ),
    ];

    if let Some(first) = first_activity_start {
        let first_year = min_year.map_or(first.year(), |m| m.max(first.year()));
        scopes.extend((first_year..=now.year()).rev().filter_map(|year| {
            DateRange::year(year).map(|range| {
                NamedScope::new(
                    year.to_string(),
                    ActivityScope::in_range(range).with_activity_types(activity_types),
                )
            })
        }));
    }

    scopes
}

/// Stiller seriene opp på felles varigheter for diagram.
pub fn chart_rows(series: &[CurveSeries]) -> Vec<ChartRow> {
    let durations: BTreeSet<u32> = series
        .iter()
        .flat_map(|s| s.curve.keys().copied())
        .collect();

    durations
        .into_iter()
        .map(|d| ChartRow {
            duration_secs: d,
            values: series
                .iter()
                .map(|s| s.curve.get(&d).map(|e| e.value))
                .collect(),
        })
        .collect()
}
