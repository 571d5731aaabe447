//! Integration tests for the simdata output toolkit
//!
//! Tests are organized by topic:
//! - `arrange` - Combining variables, parameters and reporters
//! - `persistence` - Saving and loading experiment directories
//! - `sensitivity` - Saltelli sampling and Sobol estimation end to end

mod arrange;
mod fixtures;
mod sensitivity;
