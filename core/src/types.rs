use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aktivitets-id (Strava-id som tekst).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub String);

impl ActivityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActivityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Hvilken strøm serien kommer fra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    #[serde(rename = "watts", alias = "power")]
    Power,
    #[serde(rename = "heartrate", alias = "heart_rate", alias = "hr")]
    HeartRate,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Power => "watts",
            MetricKind::HeartRate => "heartrate",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    Ride,
    VirtualRide,
    Run,
    VirtualRun,
    Walk,
    Hike,
    Swim,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub start_time: DateTime<Utc>,
    pub activity_type: ActivityType,
}

impl Activity {
    pub fn new(id: impl Into<String>, start_time: DateTime<Utc>, activity_type: ActivityType) -> Self {
        Self {
            id: ActivityId::new(id),
            start_time,
            activity_type,
        }
    }
}

/// Lukket tidsintervall [from, till].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub till: DateTime<Utc>,
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::seconds(1)
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, till: DateTime<Utc>) -> Self {
        Self { from, till }
    }

    /// Fra starten av dagen for `now - days` til slutten av dagen for `now`.
    pub fn last_x_days(now: DateTime<Utc>, days: i64) -> Self {
        let first = (now - Duration::days(days)).date_naive();
        Self {
            from: start_of_day(first),
            till: end_of_day(now.date_naive()),
        }
    }

    /// Hele kalenderåret. `None` for år chrono ikke kan representere.
    pub fn year(year: i32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let last = NaiveDate::from_ymd_opt(year, 12, 31)?;
        Some(Self {
            from: start_of_day(first),
            till: end_of_day(last),
        })
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.from <= t && t <= self.till
    }
}

/// Filter over aktiviteter. Tomt filter = alle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityScope {
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub activity_types: Option<Vec<ActivityType>>,
}

impl ActivityScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_range(range: DateRange) -> Self {
        Self {
            date_range: Some(range),
            activity_types: None,
        }
    }

    pub fn with_activity_types(mut self, types: &[ActivityType]) -> Self {
        self.activity_types = Some(types.to_vec());
        self
    }

    pub fn matches(&self, activity: &Activity) -> bool {
        let in_range = self
            .date_range
            .map_or(true, |r| r.contains(activity.start_time));
        let type_ok = self
            .activity_types
            .as_ref()
            .map_or(true, |ts| ts.contains(&activity.activity_type));
        in_range && type_ok
    }
}
