// core/src/engine.rs
use chrono::{DateTime, Utc};

use crate::config::EngineConfig;
use crate::curve::{BestCurve, CurveAggregator};
use crate::curve_series::{standard_scopes, CurveSeries, CurveSeriesBuilder, NamedScope};
use crate::error::CoreResult;
use crate::recompute::{RecomputeDriver, RecomputeReport};
use crate::storage::{ActivityRepository, StreamProvider};
use crate::types::{ActivityScope, MetricKind};

/// Inngangen for presentasjon/CLI: beregning og kurve-spørringer over samme lager.
pub struct CurveEngine<'a> {
    repo: &'a dyn ActivityRepository,
    streams: &'a dyn StreamProvider,
    config: EngineConfig,
}

impl<'a> CurveEngine<'a> {
    pub fn new(
        repo: &'a dyn ActivityRepository,
        streams: &'a dyn StreamProvider,
        config: EngineConfig,
    ) -> CoreResult<Self> {
        Ok(Self {
            repo,
            streams,
            config: config.validated()?,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn recompute(&self, force_all: bool) -> CoreResult<RecomputeReport> {
        RecomputeDriver::new(self.repo, self.streams, &self.config)?.run(force_all)
    }

    pub fn best_curve(&self, scope: &ActivityScope, metric: MetricKind) -> CoreResult<BestCurve> {
        CurveAggregator::new(self.repo).best_curve_in_scope(scope, metric)
    }

    pub fn best_curve_series(&self, scopes: &[NamedScope], metric: MetricKind) -> CoreResult<Vec<CurveSeries>> {
        CurveSeriesBuilder::new(CurveAggregator::new(self.repo)).build(scopes, metric)
    }

    /// Standard-utvalgene (all time, 45/90 dager, per år) for `metric`.
    pub fn standard_curve_series(&self, now: DateTime<Utc>, metric: MetricKind) -> CoreResult<Vec<CurveSeries>> {
        let scopes = standard_scopes(
            now,
            self.repo.first_activity_start()?,
            &self.config.activity_types,
            self.config.min_year,
        );
        self.best_curve_series(&scopes, metric)
    }
}
