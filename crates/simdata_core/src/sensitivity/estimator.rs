//! Variance-based Sobol index estimation
//!
//! [`SaltelliEstimator`] reads a model output vector laid out in the block
//! order produced by [`sample_saltelli`](super::sample_saltelli):
//!
//! ```text
//! A, AB_1, .., AB_D, [BA_1, .., BA_D,] B
//! ```
//!
//! and estimates first order indices with the Saltelli (2010) estimator,
//! total order indices with the Jansen estimator and, optionally, second
//! order interaction indices. Confidence intervals come from a bootstrap over
//! the base samples.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::Problem;
use crate::error::SensitivityError;

/// Estimated indices of one model output
#[derive(Debug, Clone, PartialEq)]
pub struct SobolIndices {
    pub s1: Vec<f64>,
    pub s1_conf: Vec<f64>,
    pub st: Vec<f64>,
    pub st_conf: Vec<f64>,
    /// `D x D` matrix, filled above the diagonal only
    pub s2: Option<Vec<Vec<f64>>>,
    pub s2_conf: Option<Vec<Vec<f64>>>,
}

/// Estimates Sobol indices from one output vector.
///
/// Implementations are shared across threads when reporters are analyzed in
/// parallel.
pub trait SobolEstimator: Sync {
    fn analyze(
        &self,
        problem: &Problem,
        outputs: &[f64],
        calc_second_order: bool,
    ) -> Result<SobolIndices, SensitivityError>;
}

/// Bootstrap settings for confidence intervals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SobolOptions {
    pub num_resamples: usize,
    pub conf_level: f64,
    /// Seed for bootstrap resampling. Drawn at random when absent.
    pub seed: Option<u64>,
}

impl Default for SobolOptions {
    fn default() -> Self {
        Self {
            num_resamples: 100,
            conf_level: 0.95,
            seed: None,
        }
    }
}

impl SobolOptions {
    pub fn validate(&self) -> Result<(), SensitivityError> {
        if self.num_resamples < 2 {
            return Err(SensitivityError::InvalidOption(format!(
                "num_resamples must be at least 2, got {}",
                self.num_resamples
            )));
        }
        if !(self.conf_level > 0.0 && self.conf_level < 1.0) {
            return Err(SensitivityError::InvalidOption(format!(
                "conf_level must be in (0, 1), got {}",
                self.conf_level
            )));
        }
        Ok(())
    }
}

/// Default estimator
#[derive(Debug, Clone)]
pub struct SaltelliEstimator {
    options: SobolOptions,
}

impl SaltelliEstimator {
    pub fn new(options: SobolOptions) -> Result<Self, SensitivityError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &SobolOptions {
        &self.options
    }
}

/// Output vector split into its sample blocks
struct Blocks {
    a: Vec<f64>,
    b: Vec<f64>,
    ab: Vec<Vec<f64>>,
    ba: Vec<Vec<f64>>,
}

impl Blocks {
    fn split(outputs: &[f64], num_vars: usize, second_order: bool) -> Self {
        let step = block_step(num_vars, second_order);
        let n = outputs.len() / step;
        let column = |offset: usize| -> Vec<f64> {
            (0..n).map(|i| outputs[i * step + offset]).collect()
        };
        Self {
            a: column(0),
            b: column(step - 1),
            ab: (0..num_vars).map(|j| column(j + 1)).collect(),
            ba: if second_order {
                (0..num_vars).map(|j| column(j + 1 + num_vars)).collect()
            } else {
                Vec::new()
            },
        }
    }
}

fn block_step(num_vars: usize, second_order: bool) -> usize {
    if second_order {
        2 * num_vars + 2
    } else {
        num_vars + 2
    }
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population variance
fn variance(xs: &[f64]) -> f64 {
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64
}

/// Sample standard deviation (ddof = 1)
fn sample_std(xs: &[f64]) -> f64 {
    let m = mean(xs);
    let ss = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    (ss / (xs.len() - 1) as f64).sqrt()
}

fn joint_variance(a: &[f64], b: &[f64]) -> f64 {
    let joined: Vec<f64> = a.iter().chain(b).copied().collect();
    variance(&joined)
}

fn first_order(a: &[f64], ab: &[f64], b: &[f64]) -> f64 {
    let v: Vec<f64> = b
        .iter()
        .zip(ab)
        .zip(a)
        .map(|((b, ab), a)| b * (ab - a))
        .collect();
    mean(&v) / joint_variance(a, b)
}

fn total_order(a: &[f64], ab: &[f64], b: &[f64]) -> f64 {
    let v: Vec<f64> = a.iter().zip(ab).map(|(a, ab)| (a - ab).powi(2)).collect();
    0.5 * mean(&v) / joint_variance(a, b)
}

fn second_order(a: &[f64], ab_j: &[f64], ab_k: &[f64], ba_j: &[f64], b: &[f64]) -> f64 {
    let v: Vec<f64> = (0..a.len())
        .map(|i| ba_j[i] * ab_k[i] - a[i] * b[i])
        .collect();
    let vjk = mean(&v) / joint_variance(a, b);
    vjk - first_order(a, ab_j, b) - first_order(a, ab_k, b)
}

fn pick(xs: &[f64], idx: &[usize]) -> Vec<f64> {
    idx.iter().map(|&i| xs[i]).collect()
}

/// Inverse of the standard normal CDF (Acklam's rational approximation)
pub(crate) fn probit(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_690e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.024_25;

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

impl SobolEstimator for SaltelliEstimator {
    fn analyze(
        &self,
        problem: &Problem,
        outputs: &[f64],
        calc_second_order: bool,
    ) -> Result<SobolIndices, SensitivityError> {
        let d = problem.num_vars();
        if d == 0 {
            return Err(SensitivityError::NoRanges);
        }
        let step = block_step(d, calc_second_order);
        if outputs.is_empty() || outputs.len() % step != 0 {
            return Err(SensitivityError::SampleLayout {
                len: outputs.len(),
                step,
                num_vars: d,
                second_order: calc_second_order,
            });
        }

        // Normalize outputs; a constant output leaves every index NaN
        let m = mean(outputs);
        let sd = variance(outputs).sqrt();
        let normalized: Vec<f64> = outputs.iter().map(|y| (y - m) / sd).collect();
        let blocks = Blocks::split(&normalized, d, calc_second_order);
        let n = blocks.a.len();

        let seed = self.options.seed.unwrap_or_else(rand::random);
        let mut rng = SmallRng::seed_from_u64(seed);
        let resamples: Vec<Vec<usize>> = (0..self.options.num_resamples)
            .map(|_| (0..n).map(|_| rng.random_range(0..n)).collect())
            .collect();
        let z = probit(0.5 + self.options.conf_level / 2.0);
        let conf = |estimate: &dyn Fn(&[usize]) -> f64| -> f64 {
            let draws: Vec<f64> = resamples.iter().map(|idx| estimate(idx)).collect();
            z * sample_std(&draws)
        };

        let mut s1 = Vec::with_capacity(d);
        let mut s1_conf = Vec::with_capacity(d);
        let mut st = Vec::with_capacity(d);
        let mut st_conf = Vec::with_capacity(d);
        for j in 0..d {
            let ab = &blocks.ab[j];
            s1.push(first_order(&blocks.a, ab, &blocks.b));
            st.push(total_order(&blocks.a, ab, &blocks.b));
            s1_conf.push(conf(&|idx| {
                first_order(&pick(&blocks.a, idx), &pick(ab, idx), &pick(&blocks.b, idx))
            }));
            st_conf.push(conf(&|idx| {
                total_order(&pick(&blocks.a, idx), &pick(ab, idx), &pick(&blocks.b, idx))
            }));
        }

        let (s2, s2_conf) = if calc_second_order {
            let mut s2 = vec![vec![f64::NAN; d]; d];
            let mut s2_conf = vec![vec![f64::NAN; d]; d];
            for j in 0..d {
                for k in (j + 1)..d {
                    s2[j][k] = second_order(
                        &blocks.a,
                        &blocks.ab[j],
                        &blocks.ab[k],
                        &blocks.ba[j],
                        &blocks.b,
                    );
                    s2_conf[j][k] = conf(&|idx| {
                        second_order(
                            &pick(&blocks.a, idx),
                            &pick(&blocks.ab[j], idx),
                            &pick(&blocks.ab[k], idx),
                            &pick(&blocks.ba[j], idx),
                            &pick(&blocks.b, idx),
                        )
                    });
                }
            }
            (Some(s2), Some(s2_conf))
        } else {
            (None, None)
        };

        Ok(SobolIndices {
            s1,
            s1_conf,
            st,
            st_conf,
            s2,
            s2_conf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem(d: usize) -> Problem {
        Problem {
            names: (0..d).map(|i| format!("x{i}")).collect(),
            bounds: vec![(0.0, 1.0); d],
        }
    }

    #[test]
    fn test_probit() {
        assert!((probit(0.975) - 1.959_964).abs() < 1e-5);
        assert!(probit(0.5).abs() < 1e-12);
        assert!((probit(0.01) + 2.326_348).abs() < 1e-5);
    }

    #[test]
    fn test_rejects_bad_layout() {
        let estimator = SaltelliEstimator::new(SobolOptions::default()).unwrap();
        let err = estimator.analyze(&problem(2), &[1.0; 10], false).unwrap_err();
        assert_eq!(
            err,
            SensitivityError::SampleLayout {
                len: 10,
                step: 4,
                num_vars: 2,
                second_order: false
            }
        );
        assert!(estimator.analyze(&problem(2), &[1.0; 12], true).is_ok());
    }

    #[test]
    fn test_invalid_options() {
        let options = SobolOptions {
            num_resamples: 1,
            ..Default::default()
        };
        assert!(matches!(
            SaltelliEstimator::new(options),
            Err(SensitivityError::InvalidOption(_))
        ));
        let options = SobolOptions {
            conf_level: 1.0,
            ..Default::default()
        };
        assert!(SaltelliEstimator::new(options).is_err());
    }

    #[test]
    fn test_constant_output_is_nan() {
        let estimator = SaltelliEstimator::new(SobolOptions {
            seed: Some(1),
            ..Default::default()
        })
        .unwrap();
        let indices = estimator.analyze(&problem(1), &[2.0; 9], false).unwrap();
        assert!(indices.s1[0].is_nan());
        assert!(indices.s2.is_none());
    }

    #[test]
    fn test_seed_is_reproducible() {
        let options = SobolOptions {
            seed: Some(7),
            ..Default::default()
        };
        let estimator = SaltelliEstimator::new(options).unwrap();
        let outputs: Vec<f64> = (0..40).map(|i| ((i * 37) % 11) as f64).collect();
        let first = estimator.analyze(&problem(2), &outputs, false).unwrap();
        let second = estimator.analyze(&problem(2), &outputs, false).unwrap();
        assert_eq!(first, second);
    }
}
