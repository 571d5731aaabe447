use clap::{Parser, Subcommand};
use simdata::commands::{self, ArrangeArgs, ExperimentArgs, SampleArgs, SobolArgs};
use simdata::{Config, init_logging};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "simdata")]
#[command(about = "Inspect, arrange and analyze saved simulation experiments")]
struct Args {
    /// Path to the data directory holding config.yaml and the log (default: ~/.simdata/)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (default: {data_dir}/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a tree summary of a saved experiment
    Summary(ExperimentArgs),
    /// Combine record sections into one CSV table
    Arrange(ArrangeArgs),
    /// Generate a Saltelli sample from parameter ranges
    Sample(SampleArgs),
    /// Estimate Sobol sensitivity indices for a saved sweep
    Sobol(SobolArgs),
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".simdata")
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let data_dir = args.data_dir.unwrap_or_else(default_data_dir);
    let config = Config::resolve(args.config.as_deref(), &data_dir)?;
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or_else(|| config.log_level())
        .to_string();

    init_logging(&data_dir, &log_level)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match &args.command {
        Command::Summary(experiment) => commands::summary(&config, experiment, &mut out)?,
        Command::Arrange(arrange) => commands::arrange(&config, arrange, &mut out)?,
        Command::Sample(sample) => commands::sample(sample, &mut out)?,
        Command::Sobol(sobol) => commands::sobol(&config, sobol, &mut out)?,
    }
    out.flush()?;

    tracing::debug!("simdata finished");
    Ok(())
}
