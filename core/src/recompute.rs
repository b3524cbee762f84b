// core/src/recompute.rs
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::best_averages::BestAverageSet;
use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult};
use crate::metrics;
use crate::series::TimeSeries;
use crate::storage::{ActivityRepository, StreamProvider};
use crate::types::{Activity, ActivityId, MetricKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedActivity {
    pub activity_id: ActivityId,
    pub metric: MetricKind,
    pub reason: String,
}

/// Resultat av én kjøring.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecomputeReport {
    /// Aktiviteter som fikk nytt sett lagret.
    pub processed: usize,
    pub per_metric: BTreeMap<MetricKind, usize>,
    pub skipped: Vec<SkippedActivity>,
    pub batches: usize,
}

impl RecomputeReport {
    fn merge(&mut self, other: RecomputeReport) {
        self.processed += other.processed;
        for (m, n) in other.per_metric {
            *self.per_metric.entry(m).or_default() += n;
        }
        self.skipped.extend(other.skipped);
        self.batches += other.batches;
    }
}

enum Outcome {
    Saved,
    Skipped(String),
}

/// Finner aktiviteter uten (eller med utdatert) sett og regner dem ut.
///
/// Kan stoppes etter en hvilken som helst ferdig batch og startes igjen:
/// neste kjøring spør bare etter det som fortsatt mangler.
pub struct RecomputeDriver<'a> {
    repo: &'a dyn ActivityRepository,
    streams: &'a dyn StreamProvider,
    config: EngineConfig,
}

impl<'a> RecomputeDriver<'a> {
    /// Validerer `config`; f.eks. `batch_size` 0 gir `InvalidConfig`.
    pub fn new(
        repo: &'a dyn ActivityRepository,
        streams: &'a dyn StreamProvider,
        config: &EngineConfig,
    ) -> CoreResult<Self> {
        Ok(Self {
            repo,
            streams,
            config: config.clone().validated()?,
        })
    }

    /// Kjører alle strømmer i `config.metrics`. I/O-feil avbryter; alt som
    /// allerede er lagret blir stående.
    pub fn run(&self, force: bool) -> CoreResult<RecomputeReport> {
        info!("Calculating best stream averages...");
        if force {
            info!("  => Including all streams");
        }

        let mut report = RecomputeReport::default();
        for &metric in &self.config.metrics {
            report.merge(self.run_metric(metric, force)?);
        }

        info!("  => Calculated averages for {} streams", report.processed);
        if !report.skipped.is_empty() {
            warn!("  => Skipped {} streams", report.skipped.len());
        }
        Ok(report)
    }

    pub fn run_metric(&self, metric: MetricKind, force: bool) -> CoreResult<RecomputeReport> {
        let mut report = RecomputeReport::default();

        if force {
            // én runde over hele korpuset
            let all = self.repo.find_all()?;
            metrics::record_batch(true);
            report.batches += 1;
            self.process_batch(&all, metric, &mut report)?;
            return Ok(report);
        }

        let mut seen: HashSet<ActivityId> = HashSet::new();
        loop {
            let page = self
                .repo
                .find_without_best_averages(metric, self.config.batch_size)?;
            if page.is_empty() {
                break;
            }

            let fresh: Vec<Activity> = page
                .into_iter()
                .filter(|a| seen.insert(a.id.clone()))
                .collect();
            if fresh.is_empty() {
                warn!(
                    "repository returned only already handled {metric} activities, stopping after {} batches",
                    report.batches
                );
                break;
            }

            metrics::record_batch(false);
            report.batches += 1;
            debug!("batch {} ({metric}): {} activities", report.batches, fresh.len());
            self.process_batch(&fresh, metric, &mut report)?;
        }

        Ok(report)
    }

    fn process_batch(
        &self,
        activities: &[Activity],
        metric: MetricKind,
        report: &mut RecomputeReport,
    ) -> CoreResult<()> {
        for activity in activities {
            match self.process_activity(&activity.id, metric)? {
                Outcome::Saved => {
                    report.processed += 1;
                    *report.per_metric.entry(metric).or_default() += 1;
                }
                Outcome::Skipped(reason) => report.skipped.push(SkippedActivity {
                    activity_id: activity.id.clone(),
                    metric,
                    reason,
                }),
            }
        }
        Ok(())
    }

    /// Ødelagt serie eller manglende strøm hoppes over; I/O-feil returneres.
    fn process_activity(&self, id: &ActivityId, metric: MetricKind) -> CoreResult<Outcome> {
        let samples = match self.streams.fetch_time_series(id, metric) {
            Ok(s) => s,
            Err(e @ CoreError::NotFound(_)) => return self.skip(id, metric, e),
            Err(e) => return Err(e),
        };

        let series = match TimeSeries::with_gap_fill(id.clone(), metric, &samples, self.config.gap_fill_secs) {
            Ok(s) => s,
            Err(e @ CoreError::DataIntegrity { .. }) => return self.skip(id, metric, e),
            Err(e) => return Err(e),
        };

        let set = BestAverageSet::compute(&series, &self.config.durations, self.config.rounding);
        self.repo.save_best_averages(&set)?;
        metrics::record_computed(metric);
        debug!("{metric} best averages for {id}: {} durations", set.len());
        Ok(Outcome::Saved)
    }

    fn skip(&self, id: &ActivityId, metric: MetricKind, err: CoreError) -> CoreResult<Outcome> {
        warn!("skipping {metric} stream for activity {id}: {err}");
        metrics::record_skipped(metric, err.kind());
        let reason = err.to_string();
        match self.repo.mark_unprocessable(id, metric, &reason) {
            Ok(()) => {}
            // slettet underveis, ingenting å merke
            Err(CoreError::NotFound(_)) => debug!("activity {id} vanished before it could be marked"),
            Err(e) => return Err(e),
        }
        Ok(Outcome::Skipped(reason))
    }
}
