// core/src/window.rs
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::series::{Sample, TimeSeries};
use crate::types::{ActivityId, MetricKind};

/// Toleranse mot flyttallsstøy før avrunding (f.eks. 299.99999999 → 300).
const MEAN_EPSILON: f64 = 1e-9;

/// Hvordan snittet gjøres om til hele watt/bpm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    #[default]
    Floor,
    Nearest,
}

impl Rounding {
    pub fn apply(self, mean: f64) -> u32 {
        let v = match self {
            Rounding::Floor => (mean + MEAN_EPSILON).floor(),
            Rounding::Nearest => mean.round(),
        };
        // `as` metter for negative/for store verdier
        v as u32
    }
}

/// Beste vindussum over ett tett løp via prefiks-summer, O(n).
fn best_window_sum(values: &[f64], duration: usize) -> Option<f64> {
    if duration == 0 || values.len() < duration {
        return None;
    }

    let mut prefix = Vec::with_capacity(values.len() + 1);
    let mut acc = 0.0f64;
    prefix.push(acc);
    for v in values {
        acc += v;
        prefix.push(acc);
    }

    (duration..=values.len())
        .map(|end| OrderedFloat(prefix[end] - prefix[end - duration]))
        .max()
        .map(|s| s.into_inner())
}

/// Høyeste snitt (uavrundet) over et vindu på nøyaktig `duration_secs` sekunder
/// som ligger helt inne i ett løp. `None` = ikke beregnbar.
pub fn best_window_mean(series: &TimeSeries, duration_secs: u32) -> Option<f64> {
    if duration_secs == 0 || series.is_empty() {
        return None;
    }
    // spennet er for kort til at noe vindu får plass
    if series.span_secs() < duration_secs - 1 {
        return None;
    }
    if series.longest_run_secs() < duration_secs as usize {
        return None;
    }

    let d = duration_secs as usize;
    series
        .runs()
        .iter()
        .filter_map(|run| best_window_sum(&run.values, d))
        .map(OrderedFloat)
        .max()
        .map(|best| best.into_inner() / duration_secs as f64)
}

/// Beste snitt for én varighet, avrundet etter `rounding`.
pub fn best_average(series: &TimeSeries, duration_secs: u32, rounding: Rounding) -> Option<u32> {
    best_window_mean(series, duration_secs).map(|m| rounding.apply(m))
}

/// Validerer rå samples og beregner beste snitt. Ødelagt serie gir `DataIntegrity`.
pub fn best_average_for_samples(
    activity_id: &ActivityId,
    metric: MetricKind,
    samples: &[Sample],
    duration_secs: u32,
    rounding: Rounding,
) -> CoreResult<Option<u32>> {
    let series = TimeSeries::from_samples(activity_id.clone(), metric, samples)?;
    Ok(best_average(&series, duration_secs, rounding))
}
