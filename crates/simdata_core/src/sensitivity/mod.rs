//! Variance-based (Sobol) sensitivity analysis.
//!
//! A sweep is set up and analyzed in three steps:
//!
//! ```ignore
//! use simdata_core::sensitivity::{ParameterRanges, SobolOptions, sample_saltelli};
//!
//! let ranges = ParameterRanges::new()
//!     .range("infection_chance", 0.1, 0.5)
//!     .fixed("population", 1000);
//!
//! // 1. Generate the sample and run the model once per row (external)
//! let sample = sample_saltelli(&ranges, 256, false, 42)?;
//!
//! // 2. Record the sweep's reporters in an OutputRecord
//! // 3. Estimate the indices
//! record.calc_sobol(&ranges, None, false, &SobolOptions::default())?;
//! let s1 = record.sensitivity.as_ref().unwrap();
//! ```

mod analyze;
mod estimator;
mod ranges;
mod sampler;
mod table;

pub use estimator::{SaltelliEstimator, SobolEstimator, SobolIndices, SobolOptions};
pub use ranges::{ParamSpec, ParameterRanges, Problem};
pub use sampler::sample_saltelli;
pub use table::{ColumnKey, Order, PARAMETER, REPORTER, SensitivityRow, SensitivityTable};
