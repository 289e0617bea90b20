pub mod app;
pub mod cli;
pub mod database;
pub mod errors;
pub mod types;
pub mod ui;
pub mod utils;
