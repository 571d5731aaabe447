//! Subcommand implementations.
//!
//! Each command writes its result to `out` (stdout in the binary) and logs
//! through `tracing`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use color_eyre::eyre::{WrapErr, eyre};
use simdata_core::persist::{LoadReport, write_table_to};
use simdata_core::{ArrangeOptions, OutputRecord, ParameterRanges, Selection, Table};

use crate::config::Config;
use crate::util::io::atomic_write;

/// Which saved experiment to open
#[derive(Args, Debug, Clone, Default)]
pub struct ExperimentArgs {
    /// Directory holding experiment folders (default: config output_path, else ./ap_output)
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Experiment name (default: the most recently modified experiment)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Experiment id (default: the highest id saved under the name)
    #[arg(short, long)]
    pub id: Option<u32>,
}

impl ExperimentArgs {
    fn output_path(&self, config: &Config) -> PathBuf {
        self.path.clone().unwrap_or_else(|| config.output_path())
    }

    fn load(&self, config: &Config) -> color_eyre::Result<LoadReport> {
        let path = self.output_path(config);
        let report = OutputRecord::load(&path, self.name.as_deref(), self.id)
            .wrap_err_with(|| format!("failed to load experiment from {}", path.display()))?;
        tracing::info!(
            dir = %report.dir.display(),
            failures = report.failures.len(),
            "Loaded experiment"
        );
        Ok(report)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ArrangeArgs {
    #[command(flatten)]
    pub experiment: ExperimentArgs,

    /// Variables to include; the bare flag selects all
    #[arg(long, num_args = 0..)]
    pub variables: Option<Vec<String>>,

    /// Reporters to include; the bare flag selects all
    #[arg(long, num_args = 0..)]
    pub reporters: Option<Vec<String>>,

    /// Parameters to include; the bare flag selects the varying ones
    #[arg(long, num_args = 0..)]
    pub parameters: Option<Vec<String>>,

    /// Object types whose variables are included (default: all)
    #[arg(long, num_args = 1..)]
    pub obj_types: Option<Vec<String>>,

    /// Keep identifier columns as the table index
    #[arg(long)]
    pub index: bool,

    /// Write the CSV here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ArrangeArgs {
    /// With no section flags, variables are joined with the varying
    /// parameters.
    fn options(&self) -> ArrangeOptions {
        let mut options = if self.variables.is_none()
            && self.reporters.is_none()
            && self.parameters.is_none()
        {
            ArrangeOptions::new().variables(true).parameters(true)
        } else {
            ArrangeOptions::new()
                .variables(selection(&self.variables))
                .reporters(selection(&self.reporters))
                .parameters(selection(&self.parameters))
        };
        if let Some(obj_types) = &self.obj_types {
            options = options.obj_types(obj_types.clone());
        }
        options.keep_index(self.index)
    }
}

#[derive(Args, Debug, Clone)]
pub struct SampleArgs {
    /// YAML file mapping parameter names to fixed values or [low, high] ranges
    #[arg(short, long)]
    pub ranges: PathBuf,

    /// Base sample count; the table holds N * (d + 2) rows, or N * (2d + 2)
    /// with --second-order
    #[arg(short = 'N', long, default_value_t = 1024)]
    pub base_samples: usize,

    /// Add the blocks needed for second-order indices
    #[arg(long)]
    pub second_order: bool,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Write the CSV here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SobolArgs {
    #[command(flatten)]
    pub experiment: ExperimentArgs,

    /// YAML file with the parameter ranges the sample was drawn from
    #[arg(short, long)]
    pub ranges: PathBuf,

    /// Reporters to analyze (default: all)
    #[arg(long, num_args = 1..)]
    pub reporters: Option<Vec<String>>,

    /// Also estimate second-order indices
    #[arg(long)]
    pub second_order: bool,

    /// Bootstrap seed, overriding the config
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the confidence intervals instead of the indices
    #[arg(long)]
    pub conf: bool,

    /// Save the analyzed record as a new experiment next to the loaded one
    #[arg(long)]
    pub save: bool,
}

fn selection(keys: &Option<Vec<String>>) -> Selection {
    match keys {
        None => Selection::None,
        Some(keys) if keys.is_empty() => Selection::All,
        Some(keys) => Selection::Keys(keys.clone()),
    }
}

pub fn read_ranges(path: &Path) -> color_eyre::Result<ParameterRanges> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read parameter ranges {}", path.display()))?;
    serde_saphyr::from_str(&content)
        .map_err(|e| eyre!("failed to parse parameter ranges {}: {e}", path.display()))
}

fn emit_table(table: &Table, output: Option<&Path>, out: &mut impl Write) -> color_eyre::Result<()> {
    match output {
        Some(path) => {
            let mut buffer = Vec::new();
            write_table_to(&mut buffer, table)?;
            atomic_write(path, &buffer)
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), rows = table.nrows(), "Wrote table");
        }
        None => write_table_to(out, table)?,
    }
    Ok(())
}

/// Print the directory and tree summary of a saved experiment
pub fn summary(
    config: &Config,
    args: &ExperimentArgs,
    out: &mut impl Write,
) -> color_eyre::Result<()> {
    let report = args.load(config)?;
    writeln!(out, "{}", report.dir.display())?;
    writeln!(out, "{}", report.record)?;
    for failure in &report.failures {
        writeln!(
            out,
            "not loaded: {} ({})",
            failure.file.display(),
            failure.error
        )?;
    }
    Ok(())
}

pub fn arrange(config: &Config, args: &ArrangeArgs, out: &mut impl Write) -> color_eyre::Result<()> {
    let report = args.experiment.load(config)?;
    let table = report
        .record
        .arrange(&args.options())?
        .ok_or_else(|| eyre!("nothing to arrange in {}", report.dir.display()))?;
    emit_table(&table, args.output.as_deref(), out)
}

pub fn sample(args: &SampleArgs, out: &mut impl Write) -> color_eyre::Result<()> {
    let ranges = read_ranges(&args.ranges)?;
    let table = simdata_core::sensitivity::sample_saltelli(
        &ranges,
        args.base_samples,
        args.second_order,
        args.seed,
    )?;
    emit_table(&table, args.output.as_deref(), out)
}

pub fn sobol(config: &Config, args: &SobolArgs, out: &mut impl Write) -> color_eyre::Result<()> {
    let ranges = read_ranges(&args.ranges)?;
    let mut report = args.experiment.load(config)?;

    let mut options = config.sobol.clone();
    if args.seed.is_some() {
        options.seed = args.seed;
    }
    let reporters: Option<Vec<&str>> = args
        .reporters
        .as_ref()
        .map(|names| names.iter().map(String::as_str).collect());

    let record = &mut report.record;
    record.calc_sobol(&ranges, reporters.as_deref(), args.second_order, &options)?;

    let table = if args.conf {
        record.sensitivity_conf.as_ref()
    } else {
        record.sensitivity.as_ref()
    };
    if let Some(table) = table {
        write_table_to(&mut *out, &table.to_table())?;
    }

    if args.save {
        let path = args.experiment.output_path(config);
        let saved = record.save(&path, args.experiment.name.as_deref(), None)?;
        tracing::info!(dir = %saved.dir.display(), "Saved analyzed experiment");
        writeln!(out, "saved to {}", saved.dir.display())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use simdata_core::persist::read_table;
    use simdata_core::sensitivity::sample_saltelli;
    use tempfile::TempDir;

    const RANGES: &str = "a: [0.0, 1.0]\nlabel: linear\nb: [0.0, 1.0]\n";

    fn config_for(temp: &TempDir) -> Config {
        Config {
            output_path: Some(temp.path().join("runs")),
            sobol: simdata_core::SobolOptions {
                seed: Some(1),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Save a sweep of `y = 2a + b` over a Saltelli sample
    fn save_sweep(temp: &TempDir) -> PathBuf {
        let ranges_path = temp.path().join("ranges.yaml");
        fs::write(&ranges_path, RANGES).unwrap();
        let ranges = read_ranges(&ranges_path).unwrap();

        let sample = sample_saltelli(&ranges, 512, false, 3).unwrap();
        let rows = sample.nrows();
        let value = |r: usize, name: &str| sample.get(r, name).unwrap().as_f64().unwrap();
        let y: Vec<f64> = (0..rows).map(|r| 2.0 * value(r, "a") + value(r, "b")).collect();
        let reporters = Table::indexed_by("sample_id", 0..rows)
            .with_column("y", y)
            .unwrap();
        let record = OutputRecord::builder()
            .model_type("Linear")
            .sample_size(rows)
            .sample(sample)
            .constants(ranges.constants())
            .reporters(reporters)
            .build();
        record
            .save(&temp.path().join("runs"), None, None)
            .unwrap();
        ranges_path
    }

    fn output_text(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_selection_from_flags() {
        assert_eq!(selection(&None), Selection::None);
        assert_eq!(selection(&Some(vec![])), Selection::All);
        assert_eq!(
            selection(&Some(vec!["x".to_string()])),
            Selection::Keys(vec!["x".to_string()])
        );
    }

    #[test]
    fn test_arrange_defaults_to_variables() {
        let options = ArrangeArgs::default().options();
        assert_eq!(options, ArrangeOptions::new().variables(true).parameters(true));

        let args = ArrangeArgs {
            reporters: Some(vec![]),
            index: true,
            ..Default::default()
        };
        let options = args.options();
        assert_eq!(options.reporters, Selection::All);
        assert_eq!(options.variables, Selection::None);
        assert!(options.index);
    }

    #[test]
    fn test_sample_writes_csv() {
        let temp = TempDir::new().unwrap();
        let ranges = temp.path().join("ranges.yaml");
        fs::write(&ranges, RANGES).unwrap();
        let output = temp.path().join("sample.csv");

        let args = SampleArgs {
            ranges,
            base_samples: 4,
            second_order: false,
            seed: 0,
            output: Some(output.clone()),
        };
        let mut out = Vec::new();
        sample(&args, &mut out).unwrap();
        assert!(out.is_empty());

        let table = read_table(&output).unwrap();
        assert_eq!(table.nrows(), 4 * (2 + 2));
        assert_eq!(table.index_names(), ["sample_id"]);
        assert_eq!(table.columns(), ["a", "b"]);
    }

    #[test]
    fn test_summary_names_directory() {
        let temp = TempDir::new().unwrap();
        save_sweep(&temp);

        let mut out = Vec::new();
        summary(&config_for(&temp), &ExperimentArgs::default(), &mut out).unwrap();
        let text = output_text(out);
        assert!(text.starts_with(&temp.path().join("runs").join("Linear_1").display().to_string()));
        assert!(text.contains("'reporters': "));
        assert!(!text.contains("not loaded"));
    }

    #[test]
    fn test_arrange_reporters_to_stdout() {
        let temp = TempDir::new().unwrap();
        save_sweep(&temp);

        let args = ArrangeArgs {
            reporters: Some(vec![]),
            parameters: Some(vec![]),
            ..Default::default()
        };
        let mut out = Vec::new();
        arrange(&config_for(&temp), &args, &mut out).unwrap();
        let text = output_text(out);
        let header = text.lines().next().unwrap();
        assert_eq!(header, "sample_id,y,a,b");
        assert_eq!(text.lines().count(), 1 + 512 * 4);
    }

    #[test]
    fn test_arrange_nothing_is_an_error() {
        let temp = TempDir::new().unwrap();
        save_sweep(&temp);

        // The sweep has no variables
        let args = ArrangeArgs {
            variables: Some(vec![]),
            ..Default::default()
        };
        let mut out = Vec::new();
        let err = arrange(&config_for(&temp), &args, &mut out).unwrap_err();
        assert!(err.to_string().contains("nothing to arrange"));
    }

    #[test]
    fn test_sobol_prints_and_saves() {
        let temp = TempDir::new().unwrap();
        let ranges = save_sweep(&temp);
        let config = config_for(&temp);

        let args = SobolArgs {
            experiment: ExperimentArgs {
                name: Some("Linear".to_string()),
                ..Default::default()
            },
            ranges,
            reporters: None,
            second_order: false,
            seed: None,
            conf: false,
            save: true,
        };
        let mut out = Vec::new();
        sobol(&config, &args, &mut out).unwrap();
        let text = output_text(out);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "reporter,parameter,S1,ST");
        assert!(lines[1].starts_with("y,a,"));
        assert!(lines[2].starts_with("y,b,"));
        assert!(lines[3].starts_with("saved to "));

        let loaded = OutputRecord::load(&temp.path().join("runs"), Some("Linear"), Some(2)).unwrap();
        assert!(loaded.failures.is_empty());
        assert!(loaded.record.sensitivity.is_some());
        assert!(loaded.record.sensitivity_conf.is_some());
    }
}
