//! Collaborators the controller talks to, and their terminal implementations.

use crate::errors::GeolocationError;
use crate::types::{Coords, WorkoutKind, WorkoutSummary};
use crate::utils::format_number;
use std::time::Duration;

/// Map widget: view, markers, panning.
pub trait MapView {
    fn init_view(&mut self, center: Coords, zoom: u8);
    fn place_marker(&mut self, at: Coords, popup_label: &str, style: &str);
    fn pan_to(&mut self, to: Coords, zoom: u8);
    /// Remove every marker placed so far.
    fn clear_markers(&mut self);
}

/// Entry form and workout list.
pub trait WorkoutView {
    fn show_form(&mut self);
    fn hide_form_and_clear(&mut self);
    fn toggle_fields_for_type(&mut self, kind: WorkoutKind);
    fn render_list_entry(&mut self, workout: &WorkoutSummary);
    fn clear_list(&mut self);
    /// User-visible warning or error.
    fn alert(&mut self, message: &str);
}

/// Source of the user's current position. Answers exactly once per call and
/// must give up with [`GeolocationError::Timeout`] once `timeout` has passed.
pub trait Geolocation {
    fn current_position(&mut self, timeout: Duration) -> Result<Coords, GeolocationError>;
}

/// Position supplied up front (command line, environment).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedLocation(pub Option<Coords>);

impl Geolocation for FixedLocation {
    fn current_position(&mut self, _timeout: Duration) -> Result<Coords, GeolocationError> {
        self.0.ok_or(GeolocationError::Unsupported)
    }
}

/// Map that has nothing to draw on. Markers are logged; pans are printed.
#[derive(Debug, Default)]
pub struct TerminalMap {
    view: Option<(Coords, u8)>,
    markers: usize,
}

impl TerminalMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn marker_count(&self) -> usize {
        self.markers
    }

    /// Current center and zoom, once the view exists.
    pub const fn view(&self) -> Option<(Coords, u8)> {
        self.view
    }
}

impl MapView for TerminalMap {
    fn init_view(&mut self, center: Coords, zoom: u8) {
        tracing::info!(center = %center, zoom, "map view ready");
        self.view = Some((center, zoom));
    }

    fn place_marker(&mut self, at: Coords, popup_label: &str, style: &str) {
        self.markers += 1;
        tracing::debug!(at = %at, style, "marker {popup_label}");
    }

    fn pan_to(&mut self, to: Coords, zoom: u8) {
        self.view = Some((to, zoom));
        println!("{}\t{}\tzoom={zoom}", to.lat, to.lng);
    }

    fn clear_markers(&mut self) {
        tracing::debug!(removed = self.markers, "markers cleared");
        self.markers = 0;
    }
}

/// Prints list entries to stdout and alerts to stderr.
#[derive(Debug, Default)]
pub struct TerminalView {
    pub details: bool,
    form_open: bool,
}

impl TerminalView {
    pub fn new(details: bool) -> Self {
        Self {
            details,
            form_open: false,
        }
    }

    pub const fn form_open(&self) -> bool {
        self.form_open
    }
}

impl WorkoutView for TerminalView {
    fn show_form(&mut self) {
        self.form_open = true;
        tracing::debug!("form shown");
    }

    fn hide_form_and_clear(&mut self) {
        self.form_open = false;
        tracing::debug!("form hidden and cleared");
    }

    fn toggle_fields_for_type(&mut self, kind: WorkoutKind) {
        tracing::debug!(%kind, "form fields switched");
    }

    fn render_list_entry(&mut self, w: &WorkoutSummary) {
        let metric = format!("{:.1} {}", w.metric.value(), w.metric.unit());
        if self.details {
            println!(
                "{}\t{} {}\t{} km\t{} min\t{metric}\t{} {}",
                w.id,
                w.kind.icon(),
                w.description,
                format_number(w.distance_km),
                format_number(w.duration_min),
                format_number(w.detail_value),
                w.detail_unit,
            );
        } else {
            println!("{}\t{}\t{metric}", w.id, w.description);
        }
    }

    fn clear_list(&mut self) {
        tracing::debug!("workout list cleared");
    }

    fn alert(&mut self, message: &str) {
        eprintln!("{message}");
    }
}
