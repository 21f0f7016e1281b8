use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::JobError;
use crate::model::job::Job;

/// Created and removed again to prove a directory is writable
const MARKER: &str = ".commander_write_test";

/// Check the filesystem is ready for a job before any script is written
///
/// Every sample directory and read file must already exist. The raw sample directory stands in
/// when there are no samples. The analysis directory and each tool's output directory, per
/// sample output path, are created when missing, then tested for write permission. Nothing is
/// created unless the sample checks pass.
pub fn preflight(job: &Job) -> Result<(), JobError> {
    let experiment = &job.experiment;
    info!("Performing pipeline preflight checks");

    let mut sample_dirs: BTreeSet<PathBuf> = experiment.samples.iter().map(|s| s.path.clone()).collect();
    if sample_dirs.is_empty() {
        sample_dirs.insert(experiment.raw_sample_path());
    }
    for dir in sample_dirs {
        info!("Checking existence of sample directory {}", dir.display());
        if !dir.is_dir() {
            return Err(JobError::MissingSampleDirectory(dir));
        }
    }

    info!("Checking existence of {} sample(s)", experiment.samples.len());
    let missing: Vec<PathBuf> = experiment
        .samples
        .iter()
        .flat_map(|s| s.read_paths())
        .filter(|p| !p.exists())
        .collect();
    if !missing.is_empty() {
        for path in &missing {
            warn!("Sample file {} could not be found", path.display());
        }
        return Err(JobError::MissingSampleFiles(missing));
    }

    prepare_directory(&experiment.analysis_path())?;

    let mut output_roots: BTreeSet<PathBuf> = experiment.samples.iter().map(|s| s.output_path.clone()).collect();
    output_roots.insert(experiment.analysis_path());
    let tool_dirs: BTreeSet<PathBuf> = output_roots
        .iter()
        .flat_map(|root| job.commands.iter().map(move |c| root.join(c.name())))
        .collect();
    for dir in tool_dirs {
        prepare_directory(&dir)?;
    }

    info!("Preflight checks passed");
    Ok(())
}

/// Create a directory if absent and make sure it can be written to
fn prepare_directory(dir: &Path) -> Result<(), JobError> {
    if !dir.is_dir() {
        info!("Directory {} does not exist, creating it", dir.display());
        fs::create_dir_all(dir).map_err(unwritable(dir))?;
    }

    let marker = dir.join(MARKER);
    fs::write(&marker, b"").map_err(unwritable(dir))?;
    fs::remove_file(&marker).map_err(unwritable(dir))
}

fn unwritable(dir: &Path) -> impl FnOnce(std::io::Error) -> JobError {
    let path = dir.to_path_buf();
    move |source| JobError::Unwritable { path, source }
}
