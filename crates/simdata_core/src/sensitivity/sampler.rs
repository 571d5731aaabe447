//! Saltelli parameter samples

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::ParameterRanges;
use crate::error::SensitivityError;
use crate::model::{Cell, IndexLevel, Table};

/// Generate a parameter sample for Sobol analysis.
///
/// Draws two independent `n x D` matrices `A` and `B` uniformly within the
/// range parameters' bounds and emits, for every base row `i`, the block
/// `A_i, AB_1, .., AB_D, [BA_1, .., BA_D,] B_i` where `AB_j` is `A_i` with
/// column `j` taken from `B_i` (and `BA_j` the reverse). The table is indexed
/// by `sample_id` and holds one column per range parameter; fixed parameters
/// are left to the record's constants.
pub fn sample_saltelli(
    ranges: &ParameterRanges,
    n: usize,
    calc_second_order: bool,
    seed: u64,
) -> Result<Table, SensitivityError> {
    if n == 0 {
        return Err(SensitivityError::InvalidOption(
            "base sample size must be positive".to_string(),
        ));
    }
    let problem = ranges.problem()?;
    let d = problem.num_vars();
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut draw = || -> Vec<f64> {
        problem
            .bounds
            .iter()
            .map(|&(low, high)| low + (high - low) * rng.random::<f64>())
            .collect()
    };

    let step = if calc_second_order { 2 * d + 2 } else { d + 2 };
    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(n * step);
    for _ in 0..n {
        let a = draw();
        let b = draw();
        rows.push(a.clone());
        for j in 0..d {
            let mut ab = a.clone();
            ab[j] = b[j];
            rows.push(ab);
        }
        if calc_second_order {
            for j in 0..d {
                let mut ba = b.clone();
                ba[j] = a[j];
                rows.push(ba);
            }
        }
        rows.push(b);
    }

    let mut table = Table::indexed_by(IndexLevel::SampleId.name(), 0..rows.len());
    for (j, name) in problem.names.iter().enumerate() {
        let values: Vec<Cell> = rows.iter().map(|r| Cell::Float(r[j])).collect();
        table.push_column(name.clone(), values).map_err(|e| {
            SensitivityError::InvalidOption(format!("parameter '{name}': {e}"))
        })?;
    }
    tracing::debug!(
        parameters = d,
        base_samples = n,
        rows = table.nrows(),
        "Generated Saltelli sample"
    );
    Ok(table)
}
