#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result};
use clap::Parser;
use mapty::app::{App, AppConfig, Event, FormValues};
use mapty::cli::{self, Cmd, NewWorkout};
use mapty::database::SqliteStorage;
use mapty::ui::{FixedLocation, TerminalMap, TerminalView};
use mapty::utils;

#[macro_use]
extern crate mapty;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    let config = AppConfig {
        storage_key: cli.storage_key,
        zoom_level: cli.zoom,
        ..AppConfig::default()
    };
    let storage = SqliteStorage::open(&cli.db)?;
    let details = matches!(cli.cmd, Some(Cmd::List { details: true }));
    dlog!("db={} origin={:?} zoom={}", cli.db.display(), cli.origin, cli.zoom);

    let mut app = App::new(
        config,
        storage,
        TerminalMap::new(),
        TerminalView::new(details),
        FixedLocation(cli.origin),
    );
    if matches!(cli.cmd, None | Some(Cmd::List { .. })) {
        app.restore();
    } else {
        app.start();
    }

    match cli.cmd {
        None | Some(Cmd::List { .. }) => {
            if app.workouts().is_empty() {
                tracing::info!("no workouts saved yet");
            }
        }
        Some(Cmd::Add { workout }) => {
            let (common, form) = match workout {
                NewWorkout::Running { common, cadence } => {
                    let form = FormValues {
                        kind: "running".to_string(),
                        distance: common.distance.clone(),
                        duration: common.duration.clone(),
                        cadence,
                        ..FormValues::default()
                    };
                    (common, form)
                }
                NewWorkout::Cycling { common, elevation } => {
                    let form = FormValues {
                        kind: "cycling".to_string(),
                        distance: common.distance.clone(),
                        duration: common.duration.clone(),
                        elevation,
                        ..FormValues::default()
                    };
                    (common, form)
                }
            };

            let at = common
                .at
                .or(cli.origin)
                .context("no location: pass --at or --origin")?;
            app.handle(Event::LocationPicked(at))
                .context("picking workout location")?;
            app.handle(Event::TypeChanged(form.kind.parse()?))?;
            app.handle(Event::Submit(form))
                .context("saving workout")?;
        }
        Some(Cmd::Show { id }) => {
            if app.find_by_id(&id).is_none() {
                anyhow::bail!("No workout with id {id}");
            }
            if !app.is_map_ready() {
                anyhow::bail!("Map unavailable: pass --origin to jump to a workout");
            }
            app.handle(Event::ListItemClicked(id))?;
        }
        Some(Cmd::Reset) => {
            let dropped = app.workouts().len();
            app.handle(Event::Reset)?;
            println!("removed {dropped} workouts");
        }
    }

    Ok(())
}
