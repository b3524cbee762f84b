// core/src/config.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_path_to_error as spte;
use std::path::Path;

use crate::durations::TIME_INTERVALS_IN_SECONDS_OVERALL;
use crate::error::{CoreError, CoreResult};
use crate::types::{ActivityType, MetricKind};
use crate::window::Rounding;

pub const DEFAULT_BATCH_SIZE: usize = 100;

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_durations() -> Vec<u32> {
    TIME_INTERVALS_IN_SECONDS_OVERALL.to_vec()
}

fn default_metrics() -> Vec<MetricKind> {
    vec![MetricKind::Power]
}

fn default_activity_types() -> Vec<ActivityType> {
    vec![ActivityType::Ride, ActivityType::VirtualRide]
}

/// Innstillinger for motoren. Alle felt har default, så `{}` er gyldig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Antall aktiviteter per side i inkrementell kjøring.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_durations")]
    pub durations: Vec<u32>,
    #[serde(default)]
    pub rounding: Rounding,
    /// Hull på inntil så mange manglende sekunder fylles med forrige verdi.
    #[serde(default)]
    pub gap_fill_secs: u32,
    #[serde(default = "default_metrics")]
    pub metrics: Vec<MetricKind>,
    /// Aktivitetstyper standard-kurvene dekker.
    #[serde(default = "default_activity_types")]
    pub activity_types: Vec<ActivityType>,
    /// Tidligste år som får egen årskurve.
    #[serde(default)]
    pub min_year: Option<i32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            durations: default_durations(),
            rounding: Rounding::default(),
            gap_fill_secs: 0,
            metrics: default_metrics(),
            activity_types: default_activity_types(),
            min_year: None,
        }
    }
}

impl EngineConfig {
    /// Sjekker grenser og normaliserer varighetene (sortert, unike).
    pub fn validated(mut self) -> CoreResult<Self> {
        if self.batch_size == 0 {
            return Err(CoreError::InvalidConfig("batch_size must be > 0".into()));
        }
        if self.durations.is_empty() {
            return Err(CoreError::InvalidConfig("durations must not be empty".into()));
        }
        if self.durations.contains(&0) {
            return Err(CoreError::InvalidConfig("durations must be positive".into()));
        }
        if self.metrics.is_empty() {
            return Err(CoreError::InvalidConfig("metrics must not be empty".into()));
        }
        self.durations.sort_unstable();
        self.durations.dedup();
        self.metrics.sort();
        self.metrics.dedup();
        Ok(self)
    }

    /// Parser JSON og rapporterer stien til feltet som feilet.
    pub fn from_json_str(json_in: &str) -> CoreResult<Self> {
        let mut de = serde_json::Deserializer::from_str(json_in);
        let cfg: EngineConfig = spte::deserialize(&mut de).map_err(|e| {
            CoreError::InvalidConfig(format!("parse error (EngineConfig) at {}: {}", e.path(), e))
        })?;
        cfg.validated()
    }
}

/// Leser konfig fra disk (JSON). Finnes ikke filen, brukes default.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<EngineConfig> {
    let path = path.as_ref();
    if !path.exists() {
        log::warn!(
            "Fant ikke konfig på {}, bruker default (batch_size={})",
            path.display(),
            DEFAULT_BATCH_SIZE
        );
        return Ok(EngineConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("kunne ikke lese {}", path.display()))?;
    let cfg = EngineConfig::from_json_str(&contents)
        .with_context(|| format!("ugyldig konfig i {}", path.display()))?;
    log::info!(
        "Konfig lastet fra {} ({} varigheter, batch_size={})",
        path.display(),
        cfg.durations.len(),
        cfg.batch_size
    );
    Ok(cfg)
}
