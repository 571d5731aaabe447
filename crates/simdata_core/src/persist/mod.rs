//! Saving and loading output records.
//!
//! Directory layout of a saved experiment:
//!
//! ```text
//! {path}/
//!   {name}_{id}/
//!     log.json
//!     parameters_constants.json
//!     parameters_sample.csv
//!     variables_{obj_type}.csv
//!     reporters.csv
//!     sensitivity.csv
//! ```

mod experiment;
mod load;
pub mod portable;
mod save;
mod tabular;

pub use experiment::{last_exp_id, latest_experiment};
pub use load::{LoadFailure, LoadReport};
pub use save::SaveReport;
pub use tabular::{read_table, write_table, write_table_to};
