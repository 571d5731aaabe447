//! Simulation output toolkit
//!
//! This crate collects the recorded output of agent-based simulations and
//! turns it into analysis-ready tables. It supports:
//! - An [`OutputRecord`] with typed `log`, `parameters`, `variables` and
//!   `reporters` sections
//! - Combining per-type variables and sampled parameters into single tables
//! - Joining variables, reporters and parameters with `arrange`
//! - Sobol sensitivity indices over a Saltelli parameter sweep
//! - Saving records to experiment directories of CSV and JSON files
//!
//! # Example
//!
//! ```ignore
//! use simdata_core::{ArrangeOptions, OutputRecord, Table};
//!
//! let record = OutputRecord::builder()
//!     .model_type("VirusModel")
//!     .sample_size(4)
//!     .sample(sample)
//!     .reporters(reporters)
//!     .build();
//!
//! let table = record.arrange(&ArrangeOptions::new().reporters(true).parameters(true))?;
//! let report = record.save(Path::new("ap_output"), None, None)?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod arrange;
pub mod error;
pub mod persist;
pub mod sensitivity;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use arrange::{ArrangeOptions, Selection};
pub use model::{Cell, Entry, OutputRecord, Table, Value, ValueMap};
pub use sensitivity::{ParameterRanges, SobolOptions};
