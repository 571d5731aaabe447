//! Command-line front end for `simdata_core`.
//!
//! Inspects, arranges and analyzes experiments saved under an output
//! directory, and generates Saltelli samples for new parameter sweeps.

pub mod commands;
pub mod config;
pub mod logging;
pub mod util;

pub use config::Config;
pub use logging::init_logging;
