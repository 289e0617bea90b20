use crate::errors::WorkoutError;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Month names used for descriptions. Locale formatting is deliberately not used.
const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A latitude/longitude pair in degrees. Stored as `[lat, lng]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(c: Coords) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
        }
    }

    /// Capitalized name, as used in descriptions.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Running => "🏃‍♂️",
            Self::Cycling => "🚴‍♀️",
        }
    }

    /// Marker style handed to the map.
    pub const fn popup_style(self) -> &'static str {
        match self {
            Self::Running => "running-popup",
            Self::Cycling => "cycling-popup",
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutKind {
    type Err = WorkoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("running") {
            Ok(Self::Running)
        } else if s.eq_ignore_ascii_case("cycling") {
            Ok(Self::Cycling)
        } else {
            Err(WorkoutError::UnknownKind(s.to_string()))
        }
    }
}

/// Kind-specific input of a workout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activity {
    Running { cadence_spm: f64 },
    /// Elevation gain may be zero or negative.
    Cycling { elevation_gain_m: f64 },
}

impl Activity {
    pub const fn kind(&self) -> WorkoutKind {
        match self {
            Self::Running { .. } => WorkoutKind::Running,
            Self::Cycling { .. } => WorkoutKind::Cycling,
        }
    }

    fn validate(&self) -> Result<(), WorkoutError> {
        match *self {
            Self::Running { cadence_spm } => check_positive("cadence", cadence_spm).map(drop),
            Self::Cycling { elevation_gain_m } => {
                check_finite("elevation", elevation_gain_m).map(drop)
            }
        }
    }
}

/// Pace for running, speed for cycling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DerivedMetric {
    /// Minutes per kilometre.
    Pace(f64),
    /// Kilometres per hour.
    Speed(f64),
}

impl DerivedMetric {
    pub fn compute(activity: &Activity, distance_km: f64, duration_min: f64) -> Self {
        match activity {
            Activity::Running { .. } => Self::Pace(duration_min / distance_km),
            Activity::Cycling { .. } => Self::Speed(distance_km / (duration_min / 60.0)),
        }
    }

    pub const fn value(self) -> f64 {
        match self {
            Self::Pace(v) | Self::Speed(v) => v,
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::Pace(_) => "min/km",
            Self::Speed(_) => "km/h",
        }
    }
}

/// One logged activity. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WorkoutRecord", into = "WorkoutRecord")]
pub struct Workout {
    id: String,
    created_at: DateTime<Utc>,
    coords: Coords,
    distance_km: f64,
    duration_min: f64,
    description: String,
    activity: Activity,
    metric: DerivedMetric,
}

impl Workout {
    /// Build a workout created at `created_at`. The id is the creation time in
    /// milliseconds, so two workouts created in the same millisecond collide.
    pub fn new(
        activity: Activity,
        coords: Coords,
        distance_km: f64,
        duration_min: f64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, WorkoutError> {
        let id = created_at.timestamp_millis().to_string();
        Self::build(
            id,
            created_at,
            coords,
            distance_km,
            duration_min,
            activity,
            None,
        )
    }

    fn build(
        id: String,
        created_at: DateTime<Utc>,
        coords: Coords,
        distance_km: f64,
        duration_min: f64,
        activity: Activity,
        description: Option<String>,
    ) -> Result<Self, WorkoutError> {
        if !coords.lat.is_finite() || !coords.lng.is_finite() {
            return Err(WorkoutError::BadCoords(coords));
        }
        let distance_km = check_positive("distance", distance_km)?;
        let duration_min = check_positive("duration", duration_min)?;
        activity.validate()?;

        let description =
            description.unwrap_or_else(|| describe(activity.kind(), created_at));
        let metric = DerivedMetric::compute(&activity, distance_km, duration_min);

        Ok(Self {
            id,
            created_at,
            coords,
            distance_km,
            duration_min,
            description,
            activity,
            metric,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub const fn coords(&self) -> Coords {
        self.coords
    }

    pub const fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub const fn duration_min(&self) -> f64 {
        self.duration_min
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn kind(&self) -> WorkoutKind {
        self.activity.kind()
    }

    pub const fn activity(&self) -> Activity {
        self.activity
    }

    pub const fn metric(&self) -> DerivedMetric {
        self.metric
    }

    pub const fn pace_min_per_km(&self) -> Option<f64> {
        match self.metric {
            DerivedMetric::Pace(v) => Some(v),
            DerivedMetric::Speed(_) => None,
        }
    }

    pub const fn speed_km_per_h(&self) -> Option<f64> {
        match self.metric {
            DerivedMetric::Speed(v) => Some(v),
            DerivedMetric::Pace(_) => None,
        }
    }

    /// Popup text for the map marker, e.g. `🏃‍♂️ Running on April 14`.
    pub fn marker_label(&self) -> String {
        format!("{} {}", self.kind().icon(), self.description)
    }

    pub fn summary(&self) -> WorkoutSummary {
        let (detail_value, detail_unit) = match self.activity {
            Activity::Running { cadence_spm } => (cadence_spm, "spm"),
            Activity::Cycling { elevation_gain_m } => (elevation_gain_m, "m"),
        };

        WorkoutSummary {
            id: self.id.clone(),
            kind: self.kind(),
            description: self.description.clone(),
            distance_km: self.distance_km,
            duration_min: self.duration_min,
            metric: self.metric,
            detail_value,
            detail_unit,
        }
    }
}

/// `"<Kind> on <Month> <day>"`, month and day taken in UTC.
pub fn describe(kind: WorkoutKind, created_at: DateTime<Utc>) -> String {
    let month = MONTHS[created_at.month0() as usize];
    format!("{} on {month} {}", kind.label(), created_at.day())
}

/// Plain data handed to the list renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSummary {
    pub id: String,
    pub kind: WorkoutKind,
    pub description: String,
    pub distance_km: f64,
    pub duration_min: f64,
    pub metric: DerivedMetric,
    /// Cadence (spm) for running, elevation gain (m) for cycling.
    pub detail_value: f64,
    pub detail_unit: &'static str,
}

fn check_finite(field: &'static str, value: f64) -> Result<f64, WorkoutError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(WorkoutError::NotFinite { field, value })
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<f64, WorkoutError> {
    let value = check_finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(WorkoutError::NotPositive { field, value })
    }
}

/// Persisted shape of a workout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkoutRecord {
    date: DateTime<Utc>,
    id: String,
    coords: Coords,
    distance: f64,
    duration: f64,
    #[serde(rename = "type")]
    kind: WorkoutKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cadence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pace: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    elevation_gain: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speed: Option<f64>,
}

impl TryFrom<WorkoutRecord> for Workout {
    type Error = WorkoutError;

    // Stored pace/speed are ignored and derived again.
    fn try_from(r: WorkoutRecord) -> Result<Self, Self::Error> {
        let activity = match r.kind {
            WorkoutKind::Running => Activity::Running {
                cadence_spm: r.cadence.ok_or(WorkoutError::MissingField {
                    kind: r.kind,
                    field: "cadence",
                })?,
            },
            WorkoutKind::Cycling => Activity::Cycling {
                elevation_gain_m: r.elevation_gain.ok_or(WorkoutError::MissingField {
                    kind: r.kind,
                    field: "elevationGain",
                })?,
            },
        };

        Self::build(
            r.id,
            r.date,
            r.coords,
            r.distance,
            r.duration,
            activity,
            r.description,
        )
    }
}

impl From<Workout> for WorkoutRecord {
    fn from(w: Workout) -> Self {
        let (cadence, elevation_gain) = match w.activity {
            Activity::Running { cadence_spm } => (Some(cadence_spm), None),
            Activity::Cycling { elevation_gain_m } => (None, Some(elevation_gain_m)),
        };
        let (pace, speed) = (w.pace_min_per_km(), w.speed_km_per_h());

        Self {
            date: w.created_at,
            id: w.id,
            coords: w.coords,
            distance: w.distance_km,
            duration: w.duration_min,
            kind: w.activity.kind(),
            description: Some(w.description),
            cadence,
            pace,
            elevation_gain,
            speed,
        }
    }
}
