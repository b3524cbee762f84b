pub mod best_averages;
pub mod cli;
pub mod config;
pub mod curve;
pub mod curve_series;
pub mod durations;
pub mod engine;
pub mod error;
pub mod json_api;
pub mod metrics;
pub mod recompute;
pub mod series;
pub mod storage;
pub mod types;
pub mod window;

#[cfg(feature = "python")]
mod py;

pub use best_averages::BestAverageSet;
pub use config::{load_config, EngineConfig};
pub use curve::{fold_best_curve, BestCurve, CurveAggregator, CurveEntry};
pub use curve_series::{chart_rows, standard_scopes, ChartRow, CurveSeries, CurveSeriesBuilder, NamedScope};
pub use durations::{TIME_INTERVALS_IN_SECONDS_OVERALL, TIME_INTERVALS_IN_SECONDS_REDACTED};
pub use engine::CurveEngine;
pub use error::{CoreError, CoreResult};
pub use recompute::{RecomputeDriver, RecomputeReport, SkippedActivity};
pub use series::{Run, Sample, TimeSeries};
pub use storage::{ActivityRepository, InMemoryStore, JsonFileStore, StreamProvider};
pub use types::{Activity, ActivityId, ActivityScope, ActivityType, DateRange, MetricKind};
pub use window::{best_average, best_average_for_samples, best_window_mean, Rounding};
