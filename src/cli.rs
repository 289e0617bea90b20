use crate::app::{DEFAULT_STORAGE_KEY, DEFAULT_ZOOM_LEVEL};
use crate::types::Coords;
use crate::utils::parse_coords;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "mapty.sqlite3";

#[derive(Parser, Debug)]
#[command(
    name = "mapty",
    about = "Log running and cycling workouts at map locations"
)]
pub struct Cli {
    /// SQLite file holding the saved workouts.
    #[arg(long, env = "MAPTY_DB", default_value = DEFAULT_DB_PATH, global = true)]
    pub db: PathBuf,

    /// Current position as LAT,LON. Without it the map stays unavailable.
    #[arg(long, env = "MAPTY_ORIGIN", value_parser = parse_coords, allow_hyphen_values = true, global = true)]
    pub origin: Option<Coords>,

    /// Map zoom level used for the initial view and for jumps.
    #[arg(long, env = "MAPTY_ZOOM", default_value_t = DEFAULT_ZOOM_LEVEL, global = true)]
    pub zoom: u8,

    /// Storage key the workout list lives under.
    #[arg(long, default_value = DEFAULT_STORAGE_KEY, hide = true, global = true)]
    pub storage_key: String,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Print every saved workout (default).
    List {
        /// Show distance, duration and the kind-specific field too.
        #[arg(long)]
        details: bool,
    },

    /// Log a new workout.
    Add {
        #[command(subcommand)]
        workout: NewWorkout,
    },

    /// Jump the map to a saved workout.
    Show {
        /// Workout id as printed by `list`.
        id: String,
    },

    /// Delete every saved workout.
    Reset,
}

#[derive(Subcommand, Debug)]
pub enum NewWorkout {
    Running {
        #[command(flatten)]
        common: CommonFields,

        /// Steps per minute.
        #[arg(long, allow_hyphen_values = true)]
        cadence: String,
    },
    Cycling {
        #[command(flatten)]
        common: CommonFields,

        /// Elevation gain in metres.
        #[arg(long, allow_hyphen_values = true)]
        elevation: String,
    },
}

/// Values are kept as typed; the controller validates them.
#[derive(Args, Debug)]
pub struct CommonFields {
    /// Distance in km.
    #[arg(long, allow_hyphen_values = true)]
    pub distance: String,

    /// Duration in minutes.
    #[arg(long, allow_hyphen_values = true)]
    pub duration: String,

    /// Where the workout happened as LAT,LON. Defaults to the origin.
    #[arg(long, value_parser = parse_coords, allow_hyphen_values = true)]
    pub at: Option<Coords>,
}
