// core/src/best_averages.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::series::TimeSeries;
use crate::types::{ActivityId, MetricKind};
use crate::window::{best_average, Rounding};

/// Beste snitt per varighet for én aktivitet og én strøm.
///
/// Settet byttes alltid ut i sin helhet; en varighet som ikke var beregnbar
/// mangler (fravær ≠ 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestAverageSet {
    pub activity_id: ActivityId,
    pub metric: MetricKind,
    /// varighet (sek) → beste snitt (hele watt/bpm)
    pub values: BTreeMap<u32, u32>,
}

impl BestAverageSet {
    pub fn empty(activity_id: ActivityId, metric: MetricKind) -> Self {
        Self {
            activity_id,
            metric,
            values: BTreeMap::new(),
        }
    }

    /// Ren funksjon av serie + katalog: samme input gir identisk sett.
    pub fn compute(series: &TimeSeries, durations: &[u32], rounding: Rounding) -> Self {
        let values = durations
            .iter()
            .filter_map(|&d| best_average(series, d, rounding).map(|v| (d, v)))
            .collect();
        Self {
            activity_id: series.activity_id().clone(),
            metric: series.metric(),
            values,
        }
    }

    pub fn get(&self, duration_secs: u32) -> Option<u32> {
        self.values.get(&duration_secs).copied()
    }

    pub fn durations(&self) -> impl Iterator<Item = u32> + '_ {
        self.values.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.values.iter().map(|(d, v)| (*d, *v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}
