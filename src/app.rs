//! Application controller.
//!
//! `App` owns the workout list and the pending map pick. Every user or
//! environment event goes through one of its handlers; the collaborators in
//! [`crate::ui`] and [`crate::database`] only ever receive plain data.

use crate::database::{Storage, load_workouts, save_workouts};
use crate::dlog;
use crate::errors::{AppError, WorkoutError};
use crate::types::{Activity, Coords, Workout, WorkoutKind};
use crate::ui::{Geolocation, MapView, WorkoutView};
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

pub const DEFAULT_STORAGE_KEY: &str = "workouts";
pub const DEFAULT_ZOOM_LEVEL: u8 = 13;
pub const DEFAULT_GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(10);

const POSITION_WARNING: &str = "Could not get your position";
const INVALID_INPUT_WARNING: &str = "Inputs have to be positive numbers!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Key the whole workout list is stored under.
    pub storage_key: String,
    pub zoom_level: u8,
    pub geolocation_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            zoom_level: DEFAULT_ZOOM_LEVEL,
            geolocation_timeout: DEFAULT_GEOLOCATION_TIMEOUT,
        }
    }
}

/// Raw form input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    pub kind: String,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

impl FormValues {
    /// Read the fields relevant to the selected kind.
    ///
    /// Only parsing happens here; range checks belong to [`Workout::new`].
    pub fn parse(&self) -> Result<(Activity, f64, f64), WorkoutError> {
        let kind: WorkoutKind = self.kind.parse()?;
        let distance = parse_number("distance", &self.distance)?;
        let duration = parse_number("duration", &self.duration)?;

        let activity = match kind {
            WorkoutKind::Running => Activity::Running {
                cadence_spm: parse_number("cadence", &self.cadence)?,
            },
            WorkoutKind::Cycling => Activity::Cycling {
                elevation_gain_m: parse_number("elevation", &self.elevation)?,
            },
        };

        Ok((activity, distance, duration))
    }
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, WorkoutError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| WorkoutError::NotANumber {
            field,
            raw: raw.to_string(),
        })
}

/// Where the pick-then-submit flow stands.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Pending {
    #[default]
    Idle,
    /// A map point was picked and the form is open.
    PendingPick(Coords),
}

/// Discrete inputs the controller reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    LocationPicked(Coords),
    TypeChanged(WorkoutKind),
    Submit(FormValues),
    Cancel,
    ListItemClicked(String),
    Reset,
}

pub type Clock = Box<dyn FnMut() -> DateTime<Utc>>;

pub struct App<S, M, V, G> {
    config: AppConfig,
    storage: S,
    map: M,
    view: V,
    geolocation: G,
    clock: Clock,

    workouts: Vec<Workout>,
    pending: Pending,
    map_ready: bool,
}

impl<S, M, V, G> App<S, M, V, G>
where
    S: Storage,
    M: MapView,
    V: WorkoutView,
    G: Geolocation,
{
    pub fn new(config: AppConfig, storage: S, map: M, view: V, geolocation: G) -> Self {
        Self {
            config,
            storage,
            map,
            view,
            geolocation,
            clock: Box::new(Utc::now),
            workouts: Vec::new(),
            pending: Pending::Idle,
            map_ready: false,
        }
    }

    /// Replace the wall clock used for creation timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: impl FnMut() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Restore stored workouts, then try to bring up the map.
    ///
    /// A missing position is not fatal: the list still works, only picking
    /// new locations stays disabled.
    pub fn start(&mut self) {
        let restored = self.restore();
        if let Err(e) = self.acquire_origin() {
            dlog!("started without map: {e}");
        }
        tracing::info!(
            restored,
            map_ready = self.map_ready,
            "application started"
        );
    }

    /// Ask the environment for the current position and initialise the map
    /// there. Markers for workouts already in state are placed once the view
    /// exists.
    pub fn acquire_origin(&mut self) -> Result<Coords, AppError> {
        match self
            .geolocation
            .current_position(self.config.geolocation_timeout)
        {
            Ok(origin) => {
                self.map.init_view(origin, self.config.zoom_level);
                self.map_ready = true;
                for w in &self.workouts {
                    render_marker(&mut self.map, w);
                }
                tracing::info!(origin = %origin, markers = self.workouts.len(), "map ready");
                Ok(origin)
            }
            Err(e) => {
                tracing::warn!(err = %e, "geolocation unavailable; location picking disabled");
                self.view.alert(POSITION_WARNING);
                Err(AppError::GeolocationUnavailable(e))
            }
        }
    }

    /// Dispatch one event to its handler.
    pub fn handle(&mut self, event: Event) -> Result<(), AppError> {
        match event {
            Event::LocationPicked(at) => self.on_location_picked(at),
            Event::TypeChanged(kind) => {
                self.view.toggle_fields_for_type(kind);
                Ok(())
            }
            Event::Submit(form) => self.submit_workout(&form).map(|_| ()),
            Event::Cancel => {
                self.cancel();
                Ok(())
            }
            Event::ListItemClicked(id) => {
                self.move_to_workout(&id);
                Ok(())
            }
            Event::Reset => self.reset_all(),
        }
    }

    /// Remember the picked point and open the form. A later pick replaces it.
    pub fn on_location_picked(&mut self, at: Coords) -> Result<(), AppError> {
        if !self.map_ready {
            tracing::warn!(at = %at, "location picked before the map was ready");
            return Err(AppError::MapNotReady);
        }

        if let Pending::PendingPick(previous) = self.pending {
            dlog!("replacing pending pick {previous} with {at}");
        }
        self.pending = Pending::PendingPick(at);
        self.view.show_form();
        Ok(())
    }

    /// Validate the form and create a workout at the pending pick.
    ///
    /// On invalid input the user is alerted and nothing else changes: the
    /// form stays open, the pick is kept, nothing is rendered or stored. If the final
    /// write to storage fails the workout stays in memory and the error is
    /// returned.
    pub fn submit_workout(&mut self, form: &FormValues) -> Result<&Workout, AppError> {
        let Pending::PendingPick(at) = self.pending else {
            return Err(AppError::NoPendingLocation);
        };

        let (activity, distance_km, duration_min) =
            form.parse().map_err(|e| self.reject(e))?;
        let created_at = self.next_timestamp();
        let workout = Workout::new(activity, at, distance_km, duration_min, created_at)
            .map_err(|e| self.reject(e))?;

        tracing::info!(
            id = workout.id(),
            kind = %workout.kind(),
            distance_km,
            duration_min,
            "workout created"
        );

        self.workouts.push(workout);
        let idx = self.workouts.len() - 1;

        if self.map_ready {
            render_marker(&mut self.map, &self.workouts[idx]);
        }
        self.view.render_list_entry(&self.workouts[idx].summary());
        self.view.hide_form_and_clear();
        self.pending = Pending::Idle;

        self.persist()?;
        Ok(&self.workouts[idx])
    }

    /// Close the form without creating anything.
    pub fn cancel(&mut self) {
        self.pending = Pending::Idle;
        self.view.hide_form_and_clear();
    }

    /// Write the full list to storage, replacing the previous snapshot.
    pub fn persist(&mut self) -> Result<(), AppError> {
        save_workouts(&mut self.storage, &self.config.storage_key, &self.workouts)?;
        Ok(())
    }

    /// Replace in-memory state with the stored list and render it.
    ///
    /// Markers are not placed here; that happens when the map becomes ready.
    /// Returns the number of restored workouts.
    pub fn restore(&mut self) -> usize {
        let Some(workouts) = load_workouts(&self.storage, &self.config.storage_key) else {
            return 0;
        };

        self.workouts = workouts;
        for w in &self.workouts {
            self.view.render_list_entry(&w.summary());
        }
        dlog!("restored workouts={}", self.workouts.len());
        self.workouts.len()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id() == id)
    }

    /// Pan the map to a workout. Unknown ids and a missing map are no-ops.
    pub fn move_to_workout(&mut self, id: &str) -> bool {
        let Some(at) = self.find_by_id(id).map(Workout::coords) else {
            dlog!("no workout with id={id}");
            return false;
        };
        if !self.map_ready {
            dlog!("map not ready; not panning to id={id}");
            return false;
        }

        self.map.pan_to(at, self.config.zoom_level);
        true
    }

    /// Drop stored and in-memory state, then start over.
    pub fn reset_all(&mut self) -> Result<(), AppError> {
        self.storage.remove(&self.config.storage_key)?;

        let dropped = self.workouts.len();
        self.workouts.clear();
        self.pending = Pending::Idle;
        self.map_ready = false;
        self.map.clear_markers();
        self.view.hide_form_and_clear();
        self.view.clear_list();
        tracing::info!(dropped, "all workouts cleared");

        self.start();
        Ok(())
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn pending(&self) -> Pending {
        self.pending
    }

    pub fn is_map_ready(&self) -> bool {
        self.map_ready
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    fn reject(&mut self, e: WorkoutError) -> AppError {
        tracing::warn!(err = %e, "rejected workout input");
        self.view.alert(INVALID_INPUT_WARNING);
        AppError::InvalidWorkoutInput(e)
    }

    /// Creation time for the next workout. Ids are millisecond timestamps, so
    /// the time is pushed past the newest workout when the clock lags or repeats.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = (self.clock)();
        let newest = self.workouts.iter().map(Workout::created_at).max();
        match newest {
            Some(newest) if now.timestamp_millis() <= newest.timestamp_millis() => {
                newest + TimeDelta::milliseconds(1)
            }
            _ => now,
        }
    }
}

fn render_marker(map: &mut impl MapView, w: &Workout) {
    map.place_marker(w.coords(), &w.marker_label(), w.kind().popup_style());
}
