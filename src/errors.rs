use thiserror::Error;

use crate::types::{Coords, WorkoutKind};

/// Precondition violations when building a [`crate::types::Workout`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkoutError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} is not a number: {raw:?}")]
    NotANumber { field: &'static str, raw: String },

    #[error("coordinates must be finite, got {0}")]
    BadCoords(Coords),

    #[error("unknown workout type: {0:?}")]
    UnknownKind(String),

    #[error("{kind} workout is missing {field}")]
    MissingField {
        kind: WorkoutKind,
        field: &'static str,
    },
}

/// Why the environment could not hand out a position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("permission to read the position was denied")]
    Denied,

    #[error("geolocation is not available in this environment")]
    Unsupported,

    #[error("no position within {0:?}")]
    Timeout(std::time::Duration),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("could not get your position: {0}")]
    GeolocationUnavailable(#[from] GeolocationError),

    #[error("invalid workout input: {0}")]
    InvalidWorkoutInput(#[from] WorkoutError),

    #[error("map is not ready; picking a location is disabled")]
    MapNotReady,

    #[error("no location picked on the map")]
    NoPendingLocation,

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
