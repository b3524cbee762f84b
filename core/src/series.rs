// core/src/series.rs
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{ActivityId, MetricKind};

/// Ett målepunkt: (sekunder fra start, verdi). Serialiseres som `[t, v]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(u32, f64)", into = "(u32, f64)")]
pub struct Sample {
    pub t: u32,
    pub value: f64,
}

impl Sample {
    pub fn new(t: u32, value: f64) -> Self {
        Self { t, value }
    }
}

impl From<(u32, f64)> for Sample {
    fn from((t, value): (u32, f64)) -> Self {
        Self { t, value }
    }
}

impl From<Sample> for (u32, f64) {
    fn from(s: Sample) -> Self {
        (s.t, s.value)
    }
}

/// Sammenhengende løp @1 Hz uten hull. `values[i]` hører til sekund `start + i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub start: u32,
    pub values: Vec<f64>,
}

impl Run {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Siste offset i løpet (inklusiv).
    pub fn end(&self) -> u32 {
        self.start + self.values.len().saturating_sub(1) as u32
    }
}

/// Uforanderlig serie for én aktivitet og én strøm, lagret som liste av løp.
///
/// Et vindu kan aldri krysse et opptaksopphold fordi hvert løp er en egen
/// tett vektor.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    activity_id: ActivityId,
    metric: MetricKind,
    runs: Vec<Run>,
}

impl TimeSeries {
    /// Bygger serien uten hull-utfylling: ett manglende sekund er et opphold.
    pub fn from_samples(
        activity_id: ActivityId,
        metric: MetricKind,
        samples: &[Sample],
    ) -> CoreResult<Self> {
        Self::with_gap_fill(activity_id, metric, samples, 0)
    }

    /// Som `from_samples`, men hull på inntil `gap_fill_secs` manglende sekunder
    /// fylles med forrige verdi. Større hull starter et nytt løp.
    pub fn with_gap_fill(
        activity_id: ActivityId,
        metric: MetricKind,
        samples: &[Sample],
        gap_fill_secs: u32,
    ) -> CoreResult<Self> {
        let mut runs: Vec<Run> = Vec::new();
        let mut prev: Option<Sample> = None;

        for s in samples {
            if !s.value.is_finite() || s.value < 0.0 {
                return Err(CoreError::data_integrity(
                    activity_id.as_str(),
                    format!("invalid {} value {} at offset {}", metric, s.value, s.t),
                ));
            }

            match (prev, runs.last_mut()) {
                (Some(p), Some(run)) => {
                    if s.t <= p.t {
                        return Err(CoreError::data_integrity(
                            activity_id.as_str(),
                            format!("offset {} does not increase (previous {})", s.t, p.t),
                        ));
                    }
                    let missing = s.t - p.t - 1;
                    if missing == 0 {
                        run.values.push(s.value);
                    } else if missing <= gap_fill_secs {
                        // hold forrige verdi over det korte hullet
                        run.values
                            .extend(std::iter::repeat(p.value).take(missing as usize));
                        run.values.push(s.value);
                    } else {
                        runs.push(Run {
                            start: s.t,
                            values: vec![s.value],
                        });
                    }
                }
                _ => runs.push(Run {
                    start: s.t,
                    values: vec![s.value],
                }),
            }
            prev = Some(*s);
        }

        Ok(Self {
            activity_id,
            metric,
            runs,
        })
    }

    pub fn activity_id(&self) -> &ActivityId {
        &self.activity_id
    }

    pub fn metric(&self) -> MetricKind {
        self.metric
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Siste offset minus første offset. 0 for tom serie.
    pub fn span_secs(&self) -> u32 {
        match (self.runs.first(), self.runs.last()) {
            (Some(first), Some(last)) => last.end() - first.start,
            _ => 0,
        }
    }

    /// Lengste sammenhengende løp (sekunder).
    pub fn longest_run_secs(&self) -> usize {
        self.runs.iter().map(Run::len).max().unwrap_or(0)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.runs
            .iter()
            .flat_map(|r| r.values.iter().copied())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
    }
}
