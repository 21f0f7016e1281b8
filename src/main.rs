use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use commander::archive::archive_inputs;
use commander::format::Registry;
use commander::params::{read_job, ParseMode};
use commander::platform::Platform;
use commander::preflight::preflight;
use commander::WorkingDirectory;

/// Generate cluster job scripts from a parameter file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Plain text or JSON (.json) parameter file
    #[arg(value_name = "PARAMS")]
    params: PathBuf,

    /// Cluster scheduler to write scripts for
    #[arg(short, long, value_enum, default_value_t = Platform::Slurm)]
    platform: Platform,

    /// Directory the scripts are written to
    #[arg(short, long, default_value = ".")]
    outdir: PathBuf,

    /// Check sample files and output directories before writing anything
    #[arg(long)]
    preflight: bool,

    /// Copy the parameter and samples files into the analysis config directory
    #[arg(long)]
    archive: bool,

    /// Reject malformed boolean and integer values instead of defaulting them
    #[arg(long)]
    strict: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    info!("Generating {} scripts from {}", args.platform, args.params.display());

    let mode = match args.strict {
        true => ParseMode::Strict,
        false => ParseMode::Permissive,
    };
    let job = read_job(&args.params, args.platform, mode)
        .with_context(|| format!("Can't parse parameter file {}", args.params.display()))?;

    if args.preflight {
        preflight(&job).context("Preflight checks failed")?;
    }

    if args.archive {
        archive_inputs(&job, &args.params).context("Can't archive job inputs")?;
    }

    let wd = WorkingDirectory { path: args.outdir };
    let job_path = job
        .create(&wd, &Registry::default())
        .with_context(|| format!("Can't write job scripts to {}", wd.path.display()))?;

    info!("Wrote {} and {} shell script(s)", job_path.path.display(), job_path.scripts.len());
    Ok(())
}
