//! Read parameter files into a job
//!
//! Parameter files come in two flavours, selected by file extension: JSON documents (`.json`) and
//! line oriented `TAG=value` plain text. Both produce the same [Job], which is then completed with
//! its samples and resolved input/output paths.

use std::path::Path;

use log::info;

use crate::error::JobError;
use crate::model::job::Job;
use crate::platform::Platform;

pub use plaintext::ParseMode;

/// Tag lookup table for plain text parameter files
pub mod tags;
/// `TAG=value[;;comment]` parameter files
pub mod plaintext;
/// JSON parameter files
pub mod json;
/// Samples and design files
pub mod samples;

pub fn is_json_params(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "json")
}

/// Parse a parameter file, load its samples, and resolve command paths
pub fn read_job(path: &Path, platform: Platform, mode: ParseMode) -> Result<Job, JobError> {
    let mut job = match is_json_params(path) {
        true => json::read(path, platform)?,
        false => plaintext::read(path, platform, mode)?,
    };
    info!("Parsed job {} with {} command(s)", job.details.name, job.commands.len());

    match job.samples_file().map(Path::to_path_buf) {
        Some(samples_file) => samples::read_samples(&samples_file, &mut job.experiment)?,
        None => {
            if let Some(batch) = job.commands.iter().find(|c| c.batch) {
                return Err(JobError::NoSamplesFile(batch.name().to_string()));
            }
        }
    }

    job.resolve_paths();
    Ok(job)
}
