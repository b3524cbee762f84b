// core/src/curve.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::best_averages::BestAverageSet;
use crate::error::{CoreError, CoreResult};
use crate::metrics;
use crate::storage::ActivityRepository;
use crate::types::{Activity, ActivityId, ActivityScope, MetricKind};

/// Beste verdi for én varighet innenfor et utvalg, med hvor den kom fra.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveEntry {
    pub duration_secs: u32,
    pub value: u32,
    pub activity_id: ActivityId,
    pub start_time: DateTime<Utc>,
}

impl CurveEntry {
    /// Høyere verdi vinner; ved likhet vinner tidligste start, deretter minste id.
    pub fn beats(&self, other: &CurveEntry) -> bool {
        match self.value.cmp(&other.value) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => {
                (self.start_time, &self.activity_id) < (other.start_time, &other.activity_id)
            }
        }
    }
}

/// varighet (sek) → beste innslag
pub type BestCurve = BTreeMap<u32, CurveEntry>;

/// Fold over (aktivitet, sett): maxBy(verdi, tie-break = tidligste dato), per varighet.
/// Resultatet avhenger ikke av rekkefølgen på input.
pub fn fold_best_curve<'a, I>(sets: I) -> BestCurve
where
    I: IntoIterator<Item = (&'a Activity, &'a BestAverageSet)>,
{
    sets.into_iter()
        .flat_map(|(activity, set)| {
            set.iter().map(move |(duration_secs, value)| CurveEntry {
                duration_secs,
                value,
                activity_id: activity.id.clone(),
                start_time: activity.start_time,
            })
        })
        .fold(BestCurve::new(), |mut curve, entry| {
            match curve.entry(entry.duration_secs) {
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
                Entry::Occupied(mut slot) => {
                    if entry.beats(slot.get()) {
                        slot.insert(entry);
                    }
                }
            }
            curve
        })
}

/// Leser lagrede sett og bygger beste kurve. Ingen egen tilstand.
pub struct CurveAggregator<'a> {
    repo: &'a dyn ActivityRepository,
}

impl<'a> CurveAggregator<'a> {
    pub fn new(repo: &'a dyn ActivityRepository) -> Self {
        Self { repo }
    }

    /// Aktiviteter uten sett (eller uten varigheten) hoppes over.
    pub fn best_curve(&self, activities: &[Activity], metric: MetricKind) -> CoreResult<BestCurve> {
        let mut pairs: Vec<(&Activity, BestAverageSet)> = Vec::with_capacity(activities.len());
        for activity in activities {
            match self.repo.find_best_averages(&activity.id, metric) {
                Ok(Some(set)) => pairs.push((activity, set)),
                Ok(None) | Err(CoreError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        metrics::record_curve_query(metric);
        Ok(fold_best_curve(pairs.iter().map(|(a, s)| (*a, s))))
    }

    pub fn best_curve_in_scope(&self, scope: &ActivityScope, metric: MetricKind) -> CoreResult<BestCurve> {
        let activities = self.repo.find_in_scope(scope)?;
        self.best_curve(&activities, metric)
    }

    /// Beste sett for én aktivitet; `NotFound` hvis aktiviteten eller settet mangler.
    pub fn best_averages_for(&self, id: &ActivityId, metric: MetricKind) -> CoreResult<BestAverageSet> {
        self.repo.find(id)?;
        self.repo
            .find_best_averages(id, metric)?
            .ok_or_else(|| CoreError::NotFound(format!("{metric} best averages for activity {id}")))
    }
}
