//! Sobol analysis of a record's reporters

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{
    ParameterRanges, Problem, SaltelliEstimator, SensitivityRow, SensitivityTable, SobolEstimator,
    SobolIndices, SobolOptions,
};
use crate::error::{RecordError, SensitivityError, TableError};
use crate::model::OutputRecord;

/// Output vector of one reporter column
fn reporter_outputs(record: &OutputRecord, reporter: &str) -> Result<Vec<f64>, RecordError> {
    let table = record
        .reporters
        .as_ref()
        .ok_or(RecordError::MissingSection("reporters"))?;
    let column = table
        .column(reporter)
        .ok_or_else(|| TableError::MissingColumn(reporter.to_string()))?;
    column
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            cell.as_f64().ok_or_else(|| {
                RecordError::from(SensitivityError::NonNumeric {
                    reporter: reporter.to_string(),
                    row,
                })
            })
        })
        .collect()
}

fn push_rows(
    table: &mut SensitivityTable,
    reporter: &str,
    names: &[String],
    first: &[f64],
    total: &[f64],
    second: Option<&Vec<Vec<f64>>>,
) {
    for (j, name) in names.iter().enumerate() {
        table.push(SensitivityRow {
            reporter: reporter.to_string(),
            parameter: name.clone(),
            s1: first[j],
            st: total[j],
            s2: second.map(|m| m[j].clone()).unwrap_or_default(),
        });
    }
}

impl OutputRecord {
    /// Compute Sobol sensitivity indices of the reporters with the default
    /// [`SaltelliEstimator`].
    ///
    /// See [`OutputRecord::calc_sobol_with`].
    pub fn calc_sobol(
        &mut self,
        ranges: &ParameterRanges,
        reporters: Option<&[&str]>,
        calc_second_order: bool,
        options: &SobolOptions,
    ) -> Result<&mut Self, RecordError> {
        let estimator = SaltelliEstimator::new(options.clone())?;
        self.calc_sobol_with(&estimator, ranges, reporters, calc_second_order)
    }

    /// Compute Sobol sensitivity indices of the reporters.
    ///
    /// Only range parameters take part, in mapping order. The reporters must
    /// come from a sweep over a sample in the layout the estimator expects,
    /// see [`sample_saltelli`](super::sample_saltelli). `reporters` defaults
    /// to every reporter column.
    ///
    /// Results are stored as `sensitivity` (indices) and `sensitivity_conf`
    /// (confidence intervals), indexed by `(reporter, parameter)`.
    pub fn calc_sobol_with<E: SobolEstimator>(
        &mut self,
        estimator: &E,
        ranges: &ParameterRanges,
        reporters: Option<&[&str]>,
        calc_second_order: bool,
    ) -> Result<&mut Self, RecordError> {
        self.validate()?;
        let mut problem = ranges.problem()?;
        if let Some(sample) = self.combine_parameters(true, false)? {
            if sample.ncols() != problem.num_vars() {
                return Err(SensitivityError::ParameterCount {
                    sample: sample.ncols(),
                    ranges: problem.num_vars(),
                }
                .into());
            }
            // Rows are labelled by the sample's own column names
            problem.names = sample.columns().to_vec();
        }

        let names: Vec<String> = match reporters {
            Some(keys) => keys.iter().map(|k| k.to_string()).collect(),
            None => self
                .reporters
                .as_ref()
                .ok_or(RecordError::MissingSection("reporters"))?
                .columns()
                .to_vec(),
        };
        let outputs = names
            .iter()
            .map(|name| reporter_outputs(self, name))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            reporters = names.len(),
            parameters = problem.num_vars(),
            second_order = calc_second_order,
            "Computing Sobol indices"
        );

        let analyze = |y: &Vec<f64>| estimator.analyze(&problem, y, calc_second_order);

        #[cfg(feature = "parallel")]
        let results: Vec<SobolIndices> = outputs
            .par_iter()
            .map(analyze)
            .collect::<Result<_, _>>()?;

        #[cfg(not(feature = "parallel"))]
        let results: Vec<SobolIndices> = outputs
            .iter()
            .map(analyze)
            .collect::<Result<_, _>>()?;

        let (sensitivity, conf) = assemble(&problem, &names, &results, calc_second_order);
        self.sensitivity = Some(sensitivity);
        self.sensitivity_conf = Some(conf);
        Ok(self)
    }
}

/// Build the per-reporter tables and stack them
fn assemble(
    problem: &Problem,
    reporters: &[String],
    results: &[SobolIndices],
    calc_second_order: bool,
) -> (SensitivityTable, SensitivityTable) {
    let partners = if calc_second_order {
        problem.names.clone()
    } else {
        Vec::new()
    };
    let mut values = Vec::with_capacity(reporters.len());
    let mut confs = Vec::with_capacity(reporters.len());
    for (reporter, indices) in reporters.iter().zip(results) {
        let mut v = SensitivityTable::new(partners.clone());
        push_rows(
            &mut v,
            reporter,
            &problem.names,
            &indices.s1,
            &indices.st,
            indices.s2.as_ref(),
        );
        values.push(v);

        let mut c = SensitivityTable::new(partners.clone());
        push_rows(
            &mut c,
            reporter,
            &problem.names,
            &indices.s1_conf,
            &indices.st_conf,
            indices.s2_conf.as_ref(),
        );
        confs.push(c);
    }
    (
        SensitivityTable::concat(&values),
        SensitivityTable::concat(&confs),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Table, Value, ValueMap};
    use crate::sensitivity::{ColumnKey, sample_saltelli};

    struct FixedEstimator;

    impl SobolEstimator for FixedEstimator {
        fn analyze(
            &self,
            problem: &Problem,
            _outputs: &[f64],
            calc_second_order: bool,
        ) -> Result<SobolIndices, SensitivityError> {
            let d = problem.num_vars();
            let matrix = calc_second_order.then(|| vec![vec![0.25; d]; d]);
            Ok(SobolIndices {
                s1: vec![0.5; d],
                s1_conf: vec![0.1; d],
                st: vec![0.75; d],
                st_conf: vec![0.2; d],
                s2: matrix.clone(),
                s2_conf: matrix,
            })
        }
    }

    fn swept_record() -> (OutputRecord, ParameterRanges) {
        let ranges = ParameterRanges::new()
            .range("x", 0.0, 1.0)
            .fixed("n", 10i64)
            .range("y", 0.0, 1.0);
        let sample = sample_saltelli(&ranges, 4, false, 3).unwrap();
        let rows = sample.nrows();
        let out: Vec<f64> = (0..rows).map(|i| i as f64).collect();
        let reporters = Table::indexed_by("sample_id", 0..rows)
            .with_column("out", out)
            .unwrap()
            .with_column("label", vec!["a"; rows])
            .unwrap();
        let record = OutputRecord::builder()
            .model_type("M")
            .sample_size(rows)
            .constants(ValueMap::from([("n".to_string(), Value::Int(10))]))
            .sample(sample)
            .reporters(reporters)
            .build();
        (record, ranges)
    }

    #[test]
    fn test_first_order_tables() {
        let (mut record, ranges) = swept_record();
        record
            .calc_sobol_with(&FixedEstimator, &ranges, Some(&["out"][..]), false)
            .unwrap();

        let s = record.sensitivity.as_ref().unwrap();
        assert_eq!(s.column_keys(), [ColumnKey::s1(), ColumnKey::st()]);
        let pairs: Vec<(&str, &str)> = s
            .rows()
            .iter()
            .map(|r| (r.reporter.as_str(), r.parameter.as_str()))
            .collect();
        assert_eq!(pairs, [("out", "x"), ("out", "y")]);
        let conf = record.sensitivity_conf.as_ref().unwrap();
        assert_eq!(conf.get("out", "y", &ColumnKey::st()), Some(0.2));
    }

    #[test]
    fn test_second_order_columns() {
        let (mut record, ranges) = swept_record();
        record
            .calc_sobol_with(&FixedEstimator, &ranges, Some(&["out"][..]), true)
            .unwrap();
        let s = record.sensitivity.as_ref().unwrap();
        assert_eq!(s.partners(), ["x", "y"]);
        assert_eq!(s.get("out", "x", &ColumnKey::s2("y")), Some(0.25));
    }

    #[test]
    fn test_non_numeric_reporter() {
        let (mut record, ranges) = swept_record();
        let err = record
            .calc_sobol_with(&FixedEstimator, &ranges, None, false)
            .unwrap_err();
        assert_eq!(
            err,
            RecordError::Sensitivity(SensitivityError::NonNumeric {
                reporter: "label".into(),
                row: 0
            })
        );
    }

    #[test]
    fn test_sample_size_must_match_log() {
        let (mut record, ranges) = swept_record();
        record.log.as_mut().unwrap().insert("sample_size", 3i64);
        let err = record
            .calc_sobol_with(&FixedEstimator, &ranges, Some(&["out"][..]), false)
            .unwrap_err();
        assert_eq!(
            err,
            RecordError::SampleSizeMismatch {
                rows: 16,
                sample_size: 3
            }
        );
        assert!(record.sensitivity.is_none());
    }

    #[test]
    fn test_parameter_count_mismatch() {
        let (mut record, _) = swept_record();
        let ranges = ParameterRanges::new().range("x", 0.0, 1.0);
        let err = record
            .calc_sobol_with(&FixedEstimator, &ranges, Some(&["out"][..]), false)
            .unwrap_err();
        assert!(matches!(
            err,
            RecordError::Sensitivity(SensitivityError::ParameterCount { sample: 2, ranges: 1 })
        ));
    }
}
