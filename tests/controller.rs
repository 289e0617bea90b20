//! End-to-end controller behaviour against recording collaborators.

use chrono::{DateTime, TimeZone, Utc};
use mapty::app::{App, AppConfig, Event, FormValues, Pending};
use mapty::database::{MemoryStorage, SqliteStorage, Storage, load_workouts};
use mapty::errors::{AppError, GeolocationError};
use mapty::types::{Coords, WorkoutKind, WorkoutSummary};
use mapty::ui::{FixedLocation, Geolocation, MapView, WorkoutView};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum MapCall {
    Init(Coords, u8),
    Marker(Coords, String, String),
    Pan(Coords, u8),
    ClearMarkers,
}

#[derive(Debug, Default)]
struct RecordingMap {
    calls: Vec<MapCall>,
}

impl RecordingMap {
    fn markers(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, MapCall::Marker(..)))
            .count()
    }

    /// Markers placed since the last clear.
    fn markers_on_map(&self) -> usize {
        self.calls
            .iter()
            .rev()
            .take_while(|c| !matches!(c, MapCall::ClearMarkers))
            .filter(|c| matches!(c, MapCall::Marker(..)))
            .count()
    }
}

impl MapView for RecordingMap {
    fn init_view(&mut self, center: Coords, zoom: u8) {
        self.calls.push(MapCall::Init(center, zoom));
    }

    fn place_marker(&mut self, at: Coords, popup_label: &str, style: &str) {
        self.calls
            .push(MapCall::Marker(at, popup_label.to_string(), style.to_string()));
    }

    fn pan_to(&mut self, to: Coords, zoom: u8) {
        self.calls.push(MapCall::Pan(to, zoom));
    }

    fn clear_markers(&mut self) {
        self.calls.push(MapCall::ClearMarkers);
    }
}

#[derive(Debug, Default)]
struct RecordingView {
    form_open: bool,
    toggled: Vec<WorkoutKind>,
    entries: Vec<WorkoutSummary>,
    alerts: Vec<String>,
    clears: usize,
}

impl WorkoutView for RecordingView {
    fn show_form(&mut self) {
        self.form_open = true;
    }

    fn hide_form_and_clear(&mut self) {
        self.form_open = false;
    }

    fn toggle_fields_for_type(&mut self, kind: WorkoutKind) {
        self.toggled.push(kind);
    }

    fn render_list_entry(&mut self, workout: &WorkoutSummary) {
        self.entries.push(workout.clone());
    }

    fn clear_list(&mut self) {
        self.entries.clear();
        self.clears += 1;
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

/// Geolocation that always fails with the given error.
struct Denied(GeolocationError);

impl Geolocation for Denied {
    fn current_position(&mut self, _timeout: Duration) -> Result<Coords, GeolocationError> {
        Err(self.0.clone())
    }
}

const HOME: Coords = Coords::new(51.5, -0.1);
const PARK: Coords = Coords::new(51.51, -0.12);

fn ms(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap()
}

/// Clock handing out the given instants in order, then repeating the last.
fn ticking(times: Vec<i64>) -> impl FnMut() -> DateTime<Utc> {
    let mut i = 0;
    move || {
        let t = times[i.min(times.len() - 1)];
        i += 1;
        ms(t)
    }
}

fn running_form(distance: &str, duration: &str, cadence: &str) -> FormValues {
    FormValues {
        kind: "running".to_string(),
        distance: distance.to_string(),
        duration: duration.to_string(),
        cadence: cadence.to_string(),
        ..FormValues::default()
    }
}

fn cycling_form(distance: &str, duration: &str, elevation: &str) -> FormValues {
    FormValues {
        kind: "cycling".to_string(),
        distance: distance.to_string(),
        duration: duration.to_string(),
        elevation: elevation.to_string(),
        ..FormValues::default()
    }
}

fn app_with<S: Storage>(
    storage: S,
    clock: Vec<i64>,
) -> App<S, RecordingMap, RecordingView, FixedLocation> {
    App::new(
        AppConfig::default(),
        storage,
        RecordingMap::default(),
        RecordingView::default(),
        FixedLocation(Some(HOME)),
    )
    .with_clock(ticking(clock))
}

fn started(clock: Vec<i64>) -> App<MemoryStorage, RecordingMap, RecordingView, FixedLocation> {
    let mut app = app_with(MemoryStorage::new(), clock);
    app.start();
    app
}

#[test]
fn start_initialises_map_at_origin() {
    let app = started(vec![0]);
    assert!(app.is_map_ready());
    assert_eq!(app.map().calls, vec![MapCall::Init(HOME, 13)]);
    assert!(app.workouts().is_empty());
}

#[test]
fn creating_a_running_workout() {
    let mut app = started(vec![1_700_000_000_000]);
    app.handle(Event::LocationPicked(HOME)).unwrap();
    assert_eq!(app.pending(), Pending::PendingPick(HOME));
    assert!(app.view().form_open);

    let w = app.submit_workout(&running_form("5.2", "24", "178")).unwrap();
    assert_eq!(w.id(), "1700000000000");
    assert!((w.pace_min_per_km().unwrap() - 4.615).abs() < 1e-3);
    assert_eq!(w.description(), "Running on November 14");
    assert_eq!(w.coords(), HOME);

    assert_eq!(app.workouts().len(), 1);
    assert_eq!(app.pending(), Pending::Idle);
    assert!(!app.view().form_open);
    assert_eq!(app.view().entries.len(), 1);
    assert_eq!(
        app.map().calls.last(),
        Some(&MapCall::Marker(
            HOME,
            "🏃‍♂️ Running on November 14".to_string(),
            "running-popup".to_string()
        ))
    );

    let stored = load_workouts(app.storage(), "workouts").unwrap();
    assert_eq!(stored, app.workouts());
}

#[test]
fn invalid_input_changes_nothing() {
    let mut app = started(vec![1_700_000_000_000]);
    app.handle(Event::LocationPicked(HOME)).unwrap();
    let map_calls = app.map().calls.len();

    for form in [
        running_form("0", "24", "178"),
        running_form("-3", "24", "178"),
        running_form("abc", "24", "178"),
        running_form("", "24", "178"),
        running_form("5", "24", "0"),
        running_form("inf", "24", "178"),
        cycling_form("20", "NaN", "10"),
    ] {
        let err = app.handle(Event::Submit(form.clone())).unwrap_err();
        assert!(
            matches!(err, AppError::InvalidWorkoutInput(_)),
            "{form:?} gave {err:?}"
        );
    }

    assert!(app.workouts().is_empty());
    assert_eq!(app.pending(), Pending::PendingPick(HOME));
    assert!(app.view().form_open);
    assert!(app.view().entries.is_empty());
    assert_eq!(app.view().alerts.len(), 7);
    assert_eq!(app.map().calls.len(), map_calls);
    assert_eq!(app.storage().get("workouts").unwrap(), None);
}

#[test]
fn cycling_accepts_zero_elevation() {
    let mut app = started(vec![1_700_000_000_500]);
    app.handle(Event::LocationPicked(PARK)).unwrap();
    let w = app.submit_workout(&cycling_form("27", "95", "0")).unwrap();
    assert_eq!(w.speed_km_per_h(), Some(27.0 / (95.0 / 60.0)));
    assert_eq!(w.kind(), WorkoutKind::Cycling);
}

#[test]
fn non_finite_pick_is_rejected_and_saved_list_survives() {
    let mut app = started(vec![1_000, 2_000]);
    app.handle(Event::LocationPicked(HOME)).unwrap();
    app.submit_workout(&running_form("5", "25", "170")).unwrap();

    app.handle(Event::LocationPicked(Coords::new(f64::NAN, 2.0)))
        .unwrap();
    let err = app
        .handle(Event::Submit(running_form("5", "25", "170")))
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidWorkoutInput(_)));
    assert_eq!(app.workouts().len(), 1);

    let stored = load_workouts(app.storage(), "workouts").unwrap();
    assert_eq!(stored.len(), 1);
}

#[test]
fn submit_without_pick_is_rejected() {
    let mut app = started(vec![0]);
    let err = app
        .handle(Event::Submit(running_form("5", "24", "178")))
        .unwrap_err();
    assert!(matches!(err, AppError::NoPendingLocation));
    assert!(app.workouts().is_empty());
}

#[test]
fn new_pick_replaces_pending_one() {
    let mut app = started(vec![1_000]);
    app.handle(Event::LocationPicked(HOME)).unwrap();
    app.handle(Event::LocationPicked(PARK)).unwrap();
    let w = app.submit_workout(&running_form("5", "25", "170")).unwrap();
    assert_eq!(w.coords(), PARK);
}

#[test]
fn cancel_returns_to_idle() {
    let mut app = started(vec![0]);
    app.handle(Event::LocationPicked(HOME)).unwrap();
    app.handle(Event::Cancel).unwrap();
    assert_eq!(app.pending(), Pending::Idle);
    assert!(!app.view().form_open);
}

#[test]
fn type_change_toggles_form_fields() {
    let mut app = started(vec![0]);
    app.handle(Event::TypeChanged(WorkoutKind::Cycling)).unwrap();
    assert_eq!(app.view().toggled, vec![WorkoutKind::Cycling]);
}

#[test]
fn geolocation_failure_disables_picking() {
    let mut app = App::new(
        AppConfig::default(),
        MemoryStorage::new(),
        RecordingMap::default(),
        RecordingView::default(),
        Denied(GeolocationError::Denied),
    );
    app.start();

    assert!(!app.is_map_ready());
    assert!(app.map().calls.is_empty());
    assert_eq!(app.view().alerts, vec!["Could not get your position"]);

    let err = app.handle(Event::LocationPicked(HOME)).unwrap_err();
    assert!(matches!(err, AppError::MapNotReady));
    assert_eq!(app.pending(), Pending::Idle);

    let err = app.acquire_origin().unwrap_err();
    assert!(matches!(
        err,
        AppError::GeolocationUnavailable(GeolocationError::Denied)
    ));
}

#[test]
fn restore_alone_does_not_ask_for_a_position() {
    let mut storage = MemoryStorage::new();
    storage.set("workouts", "[]").unwrap();
    let mut app = App::new(
        AppConfig::default(),
        storage,
        RecordingMap::default(),
        RecordingView::default(),
        Denied(GeolocationError::Unsupported),
    );
    assert_eq!(app.restore(), 0);
    assert!(app.view().alerts.is_empty());
    assert!(!app.is_map_ready());
}

#[test]
fn restore_renders_list_and_markers_follow_the_map() {
    let mut first = started(vec![1_700_000_000_000, 1_700_000_000_500]);
    first.handle(Event::LocationPicked(HOME)).unwrap();
    first.submit_workout(&running_form("5.2", "24", "178")).unwrap();
    first.handle(Event::LocationPicked(PARK)).unwrap();
    first.submit_workout(&cycling_form("27", "95", "120")).unwrap();
    let storage = first.storage().clone();

    let mut second = App::new(
        AppConfig::default(),
        storage,
        RecordingMap::default(),
        RecordingView::default(),
        FixedLocation(Some(HOME)),
    );
    assert_eq!(second.restore(), 2);
    assert_eq!(second.workouts(), first.workouts());
    assert!(second.map().calls.is_empty());
    let ids: Vec<_> = second.view().entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["1700000000000", "1700000000500"]);

    second.acquire_origin().unwrap();
    assert_eq!(second.map().markers(), 2);

    let found = second.find_by_id("1700000000500").unwrap();
    assert_eq!(found.kind(), WorkoutKind::Cycling);
    assert_eq!(found.coords(), PARK);
    assert!(second.find_by_id("nonexistent").is_none());
}

#[test]
fn corrupt_storage_starts_empty() {
    let mut storage = MemoryStorage::new();
    storage.set("workouts", "[{\"broken\":").unwrap();
    let mut app = app_with(storage, vec![0]);
    app.start();
    assert!(app.workouts().is_empty());
    assert!(app.view().alerts.is_empty());
    assert!(app.is_map_ready());
}

#[test]
fn list_click_pans_to_workout_or_ignores_unknown_id() {
    let mut app = started(vec![1_700_000_000_000]);
    app.handle(Event::LocationPicked(PARK)).unwrap();
    app.submit_workout(&running_form("5", "25", "170")).unwrap();

    app.handle(Event::ListItemClicked("1700000000000".to_string()))
        .unwrap();
    assert_eq!(app.map().calls.last(), Some(&MapCall::Pan(PARK, 13)));

    let before = app.map().calls.len();
    app.handle(Event::ListItemClicked("nonexistent".to_string()))
        .unwrap();
    assert!(!app.move_to_workout("nonexistent"));
    assert_eq!(app.map().calls.len(), before);
}

#[test]
fn ids_stay_distinct_when_clock_repeats() {
    let mut app = started(vec![5_000]);
    for _ in 0..3 {
        app.handle(Event::LocationPicked(HOME)).unwrap();
        app.submit_workout(&running_form("5", "25", "170")).unwrap();
    }
    let ids: Vec<_> = app.workouts().iter().map(|w| w.id().to_string()).collect();
    assert_eq!(ids, ["5000", "5001", "5002"]);
}

#[test]
fn reset_clears_storage_and_state() {
    let mut app = started(vec![1_700_000_000_000]);
    app.handle(Event::LocationPicked(HOME)).unwrap();
    app.submit_workout(&running_form("5", "25", "170")).unwrap();
    app.handle(Event::LocationPicked(PARK)).unwrap();

    assert_eq!(app.map().markers_on_map(), 1);

    app.handle(Event::Reset).unwrap();

    assert_eq!(app.map().markers_on_map(), 0);
    assert!(app.workouts().is_empty());
    assert_eq!(app.pending(), Pending::Idle);
    assert_eq!(app.storage().get("workouts").unwrap(), None);
    assert!(app.view().entries.is_empty());
    assert_eq!(app.view().clears, 1);
    assert!(app.is_map_ready());
}

#[test]
fn sqlite_backed_app_round_trips_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapty.sqlite3");

    let created = {
        let mut app = app_with(SqliteStorage::open(&path).unwrap(), vec![1_700_000_000_000]);
        app.start();
        app.handle(Event::LocationPicked(HOME)).unwrap();
        app.submit_workout(&running_form("5.2", "24", "178")).unwrap();
        app.workouts().to_vec()
    };

    let mut app = app_with(SqliteStorage::open(&path).unwrap(), vec![0]);
    app.start();
    assert_eq!(app.workouts(), created.as_slice());
    assert_eq!(app.view().entries[0].description, "Running on November 14");
}
