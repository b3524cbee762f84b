// core/src/storage.rs
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_path_to_error as spte;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::best_averages::BestAverageSet;
use crate::error::{CoreError, CoreResult};
use crate::series::Sample;
use crate::types::{Activity, ActivityId, ActivityScope, MetricKind};

/// Lagringssiden motoren leser og skriver gjennom.
///
/// Implementasjonen må serialisere skriving per aktivitet; `save_best_averages`
/// er en atomisk erstatning av hele settet.
pub trait ActivityRepository {
    /// Aktiviteter med strøm for `metric` som mangler sett og ikke er merket ubrukelige.
    fn find_without_best_averages(&self, metric: MetricKind, limit: usize) -> CoreResult<Vec<Activity>>;
    fn find_all(&self) -> CoreResult<Vec<Activity>>;
    fn find_in_scope(&self, scope: &ActivityScope) -> CoreResult<Vec<Activity>>;
    /// `NotFound` hvis aktiviteten ikke finnes.
    fn find(&self, id: &ActivityId) -> CoreResult<Activity>;
    /// `Ok(None)` når settet mangler.
    fn find_best_averages(&self, id: &ActivityId, metric: MetricKind) -> CoreResult<Option<BestAverageSet>>;
    fn save_best_averages(&self, set: &BestAverageSet) -> CoreResult<()>;
    /// Hindrer at en ødelagt aktivitet plukkes opp igjen.
    fn mark_unprocessable(&self, id: &ActivityId, metric: MetricKind, reason: &str) -> CoreResult<()>;
    /// Sletter settet slik at aktiviteten regnes ut på nytt.
    fn mark_stale(&self, id: &ActivityId, metric: MetricKind) -> CoreResult<()>;
    /// Sletter aktiviteten med strømmer og sett.
    fn delete_activity(&self, id: &ActivityId) -> CoreResult<()>;
    fn first_activity_start(&self) -> CoreResult<Option<DateTime<Utc>>>;
}

/// Rå-strømmer per aktivitet.
pub trait StreamProvider {
    /// `NotFound` hvis aktiviteten ikke har strøm for `metric`.
    fn fetch_time_series(&self, id: &ActivityId, metric: MetricKind) -> CoreResult<Vec<Sample>>;
}

/// Felles tilstand for minne- og fil-lagring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub activities: BTreeMap<ActivityId, Activity>,
    #[serde(default)]
    pub streams: BTreeMap<ActivityId, BTreeMap<MetricKind, Vec<Sample>>>,
    #[serde(default)]
    pub best_averages: BTreeMap<ActivityId, BTreeMap<MetricKind, BestAverageSet>>,
    #[serde(default)]
    pub unprocessable: BTreeMap<ActivityId, BTreeMap<MetricKind, String>>,
}

fn chronological(mut activities: Vec<Activity>) -> Vec<Activity> {
    activities.sort_by(|a, b| (a.start_time, &a.id).cmp(&(b.start_time, &b.id)));
    activities
}

/// Tidligere tilstand for ett (aktivitet, metrikk)-par.
struct EntryUndo {
    id: ActivityId,
    metric: MetricKind,
    best: Option<BestAverageSet>,
    unprocessable: Option<String>,
}

/// Alt som fjernes når en aktivitet slettes.
struct RemovedActivity {
    activity: Activity,
    streams: Option<BTreeMap<MetricKind, Vec<Sample>>>,
    best_averages: Option<BTreeMap<MetricKind, BestAverageSet>>,
    unprocessable: Option<BTreeMap<MetricKind, String>>,
}

fn set_entry<T>(map: &mut BTreeMap<ActivityId, BTreeMap<MetricKind, T>>, id: &ActivityId, metric: MetricKind, value: Option<T>) {
    match value {
        Some(v) => {
            map.entry(id.clone()).or_default().insert(metric, v);
        }
        None => {
            if let Some(m) = map.get_mut(id) {
                m.remove(&metric);
                if m.is_empty() {
                    map.remove(id);
                }
            }
        }
    }
}

impl StoreData {
    fn has_entry<T>(map: &BTreeMap<ActivityId, BTreeMap<MetricKind, T>>, id: &ActivityId, metric: MetricKind) -> bool {
        map.get(id).map_or(false, |m| m.contains_key(&metric))
    }

    fn without_best_averages(&self, metric: MetricKind, limit: usize) -> Vec<Activity> {
        let pending = self
            .activities
            .values()
            .filter(|a| Self::has_entry(&self.streams, &a.id, metric))
            .filter(|a| !Self::has_entry(&self.best_averages, &a.id, metric))
            .filter(|a| !Self::has_entry(&self.unprocessable, &a.id, metric))
            .cloned()
            .collect();
        chronological(pending).into_iter().take(limit).collect()
    }

    fn in_scope(&self, scope: &ActivityScope) -> Vec<Activity> {
        chronological(
            self.activities
                .values()
                .filter(|a| scope.matches(a))
                .cloned()
                .collect(),
        )
    }

    fn get(&self, id: &ActivityId) -> CoreResult<Activity> {
        self.activities
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("activity {id}")))
    }

    fn ensure_activity(&self, id: &ActivityId) -> CoreResult<()> {
        if self.activities.contains_key(id) {
            Ok(())
        } else {
            Err(CoreError::NotFound(format!("activity {id}")))
        }
    }

    fn best(&self, id: &ActivityId, metric: MetricKind) -> Option<BestAverageSet> {
        self.best_averages.get(id).and_then(|m| m.get(&metric)).cloned()
    }

    fn capture(&self, id: &ActivityId, metric: MetricKind) -> EntryUndo {
        EntryUndo {
            id: id.clone(),
            metric,
            best: self.best(id, metric),
            unprocessable: self.unprocessable.get(id).and_then(|m| m.get(&metric)).cloned(),
        }
    }

    fn restore(&mut self, undo: EntryUndo) {
        set_entry(&mut self.best_averages, &undo.id, undo.metric, undo.best);
        set_entry(&mut self.unprocessable, &undo.id, undo.metric, undo.unprocessable);
    }

    fn put_best(&mut self, set: &BestAverageSet) -> CoreResult<()> {
        self.ensure_activity(&set.activity_id)?;
        set_entry(&mut self.unprocessable, &set.activity_id, set.metric, None);
        set_entry(&mut self.best_averages, &set.activity_id, set.metric, Some(set.clone()));
        Ok(())
    }

    fn put_unprocessable(&mut self, id: &ActivityId, metric: MetricKind, reason: &str) -> CoreResult<()> {
        self.ensure_activity(id)?;
        set_entry(&mut self.unprocessable, id, metric, Some(reason.to_string()));
        Ok(())
    }

    fn clear_best(&mut self, id: &ActivityId, metric: MetricKind) {
        set_entry(&mut self.best_averages, id, metric, None);
        set_entry(&mut self.unprocessable, id, metric, None);
    }

    fn remove_activity(&mut self, id: &ActivityId) -> CoreResult<RemovedActivity> {
        let activity = self
            .activities
            .remove(id)
            .ok_or_else(|| CoreError::NotFound(format!("activity {id}")))?;
        Ok(RemovedActivity {
            activity,
            streams: self.streams.remove(id),
            best_averages: self.best_averages.remove(id),
            unprocessable: self.unprocessable.remove(id),
        })
    }

    fn restore_activity(&mut self, removed: RemovedActivity) {
        let id = removed.activity.id.clone();
        if let Some(s) = removed.streams {
            self.streams.insert(id.clone(), s);
        }
        if let Some(b) = removed.best_averages {
            self.best_averages.insert(id.clone(), b);
        }
        if let Some(u) = removed.unprocessable {
            self.unprocessable.insert(id, u);
        }
        self.put_activity(removed.activity);
    }

    fn put_activity(&mut self, activity: Activity) -> Option<Activity> {
        self.activities.insert(activity.id.clone(), activity)
    }

    /// Ny strøm gjør eventuelt gammelt sett utdatert.
    fn put_stream(&mut self, id: &ActivityId, metric: MetricKind, samples: Vec<Sample>) -> Option<Vec<Sample>> {
        let previous = self.streams.entry(id.clone()).or_default().insert(metric, samples);
        self.clear_best(id, metric);
        previous
    }

    fn restore_stream(&mut self, id: &ActivityId, metric: MetricKind, samples: Option<Vec<Sample>>) {
        set_entry(&mut self.streams, id, metric, samples);
    }

    /// Fjerner sett og merker som peker på aktiviteter som ikke finnes.
    fn prune_orphans(&mut self) -> usize {
        let activities = &self.activities;
        let before = self.best_averages.len() + self.unprocessable.len();
        self.best_averages.retain(|id, _| activities.contains_key(id));
        self.unprocessable.retain(|id, _| activities.contains_key(id));
        before - self.best_averages.len() - self.unprocessable.len()
    }

    fn first_start(&self) -> Option<DateTime<Utc>> {
        self.activities.values().map(|a| a.start_time).min()
    }

    fn stream(&self, id: &ActivityId, metric: MetricKind) -> CoreResult<Vec<Sample>> {
        self.streams
            .get(id)
            .and_then(|m| m.get(&metric))
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("{metric} stream for activity {id}")))
    }
}

fn lock(data: &Mutex<StoreData>) -> CoreResult<MutexGuard<'_, StoreData>> {
    data.lock()
        .map_err(|_| CoreError::CollaboratorUnavailable("store lock poisoned".into()))
}

// ──────────────────────────────────────────────────────────────────────────────
// MINNE-LAGRING
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: Mutex<StoreData>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_activity(&self, activity: Activity) -> CoreResult<()> {
        lock(&self.data)?.put_activity(activity);
        Ok(())
    }

    pub fn insert_stream(&self, id: &ActivityId, metric: MetricKind, samples: Vec<Sample>) -> CoreResult<()> {
        let mut data = lock(&self.data)?;
        data.ensure_activity(id)?;
        data.put_stream(id, metric, samples);
        Ok(())
    }

    /// Kopi av hele tilstanden (for sammenligning i tester og eksport).
    pub fn snapshot(&self) -> CoreResult<StoreData> {
        Ok(lock(&self.data)?.clone())
    }
}

impl ActivityRepository for InMemoryStore {
    fn find_without_best_averages(&self, metric: MetricKind, limit: usize) -> CoreResult<Vec<Activity>> {
        Ok(lock(&self.data)?.without_best_averages(metric, limit))
    }

    fn find_all(&self) -> CoreResult<Vec<Activity>> {
        Ok(lock(&self.data)?.in_scope(&ActivityScope::all()))
    }

    fn find_in_scope(&self, scope: &ActivityScope) -> CoreResult<Vec<Activity>> {
        Ok(lock(&self.data)?.in_scope(scope))
    }

    fn find(&self, id: &ActivityId) -> CoreResult<Activity> {
        lock(&self.data)?.get(id)
    }

    fn find_best_averages(&self, id: &ActivityId, metric: MetricKind) -> CoreResult<Option<BestAverageSet>> {
        Ok(lock(&self.data)?.best(id, metric))
    }

    fn save_best_averages(&self, set: &BestAverageSet) -> CoreResult<()> {
        lock(&self.data)?.put_best(set)
    }

    fn mark_unprocessable(&self, id: &ActivityId, metric: MetricKind, reason: &str) -> CoreResult<()> {
        lock(&self.data)?.put_unprocessable(id, metric, reason)
    }

    fn mark_stale(&self, id: &ActivityId, metric: MetricKind) -> CoreResult<()> {
        lock(&self.data)?.clear_best(id, metric);
        Ok(())
    }

    fn delete_activity(&self, id: &ActivityId) -> CoreResult<()> {
        lock(&self.data)?.remove_activity(id).map(|_| ())
    }

    fn first_activity_start(&self) -> CoreResult<Option<DateTime<Utc>>> {
        Ok(lock(&self.data)?.first_start())
    }
}

impl StreamProvider for InMemoryStore {
    fn fetch_time_series(&self, id: &ActivityId, metric: MetricKind) -> CoreResult<Vec<Sample>> {
        lock(&self.data)?.stream(id, metric)
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// FIL-LAGRING (JSON)
// ──────────────────────────────────────────────────────────────────────────────

/// Aktiviteter og strømmer i én JSON-fil (`path`), beste snitt og
/// ubrukelig-merker i en egen, liten fil ved siden av (`*.averages.json`).
/// Utregning skriver bare den lille filen. Hver skriving går til en temp-fil
/// som så døpes om, så en halvskrevet fil er aldri synlig.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    averages_path: PathBuf,
    data: Mutex<StoreData>,
}

#[derive(Serialize)]
struct CatalogRef<'a> {
    activities: &'a BTreeMap<ActivityId, Activity>,
    streams: &'a BTreeMap<ActivityId, BTreeMap<MetricKind, Vec<Sample>>>,
}

#[derive(Serialize)]
struct AveragesRef<'a> {
    best_averages: &'a BTreeMap<ActivityId, BTreeMap<MetricKind, BestAverageSet>>,
    unprocessable: &'a BTreeMap<ActivityId, BTreeMap<MetricKind, String>>,
}

#[derive(Deserialize)]
struct AveragesFile {
    #[serde(default)]
    best_averages: BTreeMap<ActivityId, BTreeMap<MetricKind, BestAverageSet>>,
    #[serde(default)]
    unprocessable: BTreeMap<ActivityId, BTreeMap<MetricKind, String>>,
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)?;
    let mut de = serde_json::Deserializer::from_str(&contents);
    spte::deserialize(&mut de)
        .map_err(|e| anyhow::anyhow!("parse error ({what}) at {}: {}", e.path(), e))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

fn write_atomic(path: &Path, json: String) -> CoreResult<()> {
    let tmp = tmp_path(path);
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

impl JsonFileStore {
    /// Leser lageret fra disk. Finnes ikke filen, startes et tomt lager.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let averages_path = path.with_extension("averages.json");

        let mut data = if path.exists() {
            let data: StoreData = read_json(&path, "StoreData")?;
            log::info!(
                "📂 Lager lastet fra {} ({} aktiviteter)",
                path.display(),
                data.activities.len()
            );
            data
        } else {
            log::warn!("⚠️ Fant ikke lager på {}, starter tomt", path.display());
            StoreData::default()
        };

        if averages_path.exists() {
            let averages: AveragesFile = read_json(&averages_path, "AveragesFile")?;
            data.best_averages = averages.best_averages;
            data.unprocessable = averages.unprocessable;
        }
        let pruned = data.prune_orphans();
        if pruned > 0 {
            log::warn!("⚠️ Fjernet {pruned} sett uten aktivitet fra {}", averages_path.display());
        }

        Ok(Self {
            path,
            averages_path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn averages_path(&self) -> &Path {
        &self.averages_path
    }

    fn persist_catalog(&self, data: &StoreData) -> CoreResult<()> {
        let json = serde_json::to_string_pretty(&CatalogRef {
            activities: &data.activities,
            streams: &data.streams,
        })?;
        write_atomic(&self.path, json)?;
        log::debug!("✅ Lager lagret til {}", self.path.display());
        Ok(())
    }

    fn persist_averages(&self, data: &StoreData) -> CoreResult<()> {
        let json = serde_json::to_string(&AveragesRef {
            best_averages: &data.best_averages,
            unprocessable: &data.unprocessable,
        })?;
        write_atomic(&self.averages_path, json)
    }

    /// Endrer ett (aktivitet, metrikk)-par og skriver snitt-filen. Feiler
    /// skrivingen, settes bare det paret tilbake i minnet.
    fn mutate_entry(
        &self,
        id: &ActivityId,
        metric: MetricKind,
        change: impl FnOnce(&mut StoreData) -> CoreResult<()>,
    ) -> CoreResult<()> {
        let mut guard = lock(&self.data)?;
        let undo = guard.capture(id, metric);
        change(&mut *guard)?;
        if let Err(e) = self.persist_averages(&*guard) {
            guard.restore(undo);
            return Err(e);
        }
        Ok(())
    }

    pub fn insert_activity(&self, activity: Activity) -> CoreResult<()> {
        let mut guard = lock(&self.data)?;
        let id = activity.id.clone();
        let previous = guard.put_activity(activity);
        if let Err(e) = self.persist_catalog(&*guard) {
            match previous {
                Some(p) => {
                    guard.put_activity(p);
                }
                None => {
                    guard.activities.remove(&id);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Snitt-filen skrives først, så et gammelt sett aldri overlever en ny strøm på disk.
    pub fn insert_stream(&self, id: &ActivityId, metric: MetricKind, samples: Vec<Sample>) -> CoreResult<()> {
        let mut guard = lock(&self.data)?;
        guard.ensure_activity(id)?;
        let undo = guard.capture(id, metric);
        let previous = guard.put_stream(id, metric, samples);

        if let Err(e) = self.persist_averages(&*guard) {
            guard.restore_stream(id, metric, previous);
            guard.restore(undo);
            return Err(e);
        }
        if let Err(e) = self.persist_catalog(&*guard) {
            guard.restore_stream(id, metric, previous);
            guard.restore(undo);
            if let Err(again) = self.persist_averages(&*guard) {
                log::warn!("⚠️ Klarte ikke å skrive tilbake {}: {again}", self.averages_path.display());
            }
            return Err(e);
        }
        Ok(())
    }
}

impl ActivityRepository for JsonFileStore {
    fn find_without_best_averages(&self, metric: MetricKind, limit: usize) -> CoreResult<Vec<Activity>> {
        Ok(lock(&self.data)?.without_best_averages(metric, limit))
    }

    fn find_all(&self) -> CoreResult<Vec<Activity>> {
        Ok(lock(&self.data)?.in_scope(&ActivityScope::all()))
    }

    fn find_in_scope(&self, scope: &ActivityScope) -> CoreResult<Vec<Activity>> {
        Ok(lock(&self.data)?.in_scope(scope))
    }

    fn find(&self, id: &ActivityId) -> CoreResult<Activity> {
        lock(&self.data)?.get(id)
    }

    fn find_best_averages(&self, id: &ActivityId, metric: MetricKind) -> CoreResult<Option<BestAverageSet>> {
        Ok(lock(&self.data)?.best(id, metric))
    }

    fn save_best_averages(&self, set: &BestAverageSet) -> CoreResult<()> {
        self.mutate_entry(&set.activity_id, set.metric, |d| d.put_best(set))
    }

    fn mark_unprocessable(&self, id: &ActivityId, metric: MetricKind, reason: &str) -> CoreResult<()> {
        self.mutate_entry(id, metric, |d| d.put_unprocessable(id, metric, reason))
    }

    fn mark_stale(&self, id: &ActivityId, metric: MetricKind) -> CoreResult<()> {
        self.mutate_entry(id, metric, |d| {
            d.clear_best(id, metric);
            Ok(())
        })
    }

    /// Katalogen avgjør: feiler bare snitt-filen, ryddes restene bort ved neste `open`.
    fn delete_activity(&self, id: &ActivityId) -> CoreResult<()> {
        let mut guard = lock(&self.data)?;
        let removed = guard.remove_activity(id)?;
        if let Err(e) = self.persist_catalog(&*guard) {
            guard.restore_activity(removed);
            return Err(e);
        }
        if let Err(e) = self.persist_averages(&*guard) {
            log::warn!("⚠️ Sett for slettet aktivitet {id} ligger igjen i {}: {e}", self.averages_path.display());
        }
        Ok(())
    }

    fn first_activity_start(&self) -> CoreResult<Option<DateTime<Utc>>> {
        Ok(lock(&self.data)?.first_start())
    }
}

impl StreamProvider for JsonFileStore {
    fn fetch_time_series(&self, id: &ActivityId, metric: MetricKind) -> CoreResult<Vec<Sample>> {
        lock(&self.data)?.stream(id, metric)
    }
}
