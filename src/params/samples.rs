use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::JobError;
use crate::model::experiment::{Experiment, Sample};

/// Read a samples (or design) file into the experiment
///
/// Recognised lines:
/// - `SAMPLE_PATH=<dir>` / `OUTPUT_PATH=<dir>`: root and output directory for the samples that follow
/// - `SAMPLE=<forward> [<reverse>]`: one sample, read files separated by a single space
/// - `PI=`, `EXPERIMENT=`, `ANALYSIS_ID=`: design file details that override the experiment
///
/// Samples listed before any `SAMPLE_PATH` / `OUTPUT_PATH` use the experiment's raw sample path
/// and analysis path.
pub fn read_samples(path: &Path, experiment: &mut Experiment) -> Result<(), JobError> {
    info!("Reading samples file {}", path.display());
    let content = fs::read_to_string(path).map_err(JobError::read(path))?;
    parse_samples(&content, path, experiment)
}

fn parse_samples(content: &str, path: &Path, experiment: &mut Experiment) -> Result<(), JobError> {
    let mut sample_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut samples: Vec<Sample> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let line = line.trim_end();
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((tag, value)) = line.split_once('=') else {
            warn!("Ignoring line {} of {}: {}", i + 1, path.display(), line);
            continue;
        };

        match tag.trim() {
            "SAMPLE_PATH" => sample_path = Some(PathBuf::from(value)),
            "OUTPUT_PATH" => output_path = Some(PathBuf::from(value)),
            "PI" => experiment.pi = value.to_string(),
            "EXPERIMENT" => experiment.name = value.to_string(),
            "ANALYSIS_ID" => experiment.analysis_id = value.to_string(),
            "SAMPLE" => {
                let mut files = value.split(' ').filter(|f| !f.is_empty());
                let forward = files.next().ok_or_else(|| JobError::MalformedSample { path: path.to_path_buf(), line: i + 1 })?;
                let reverse = files.next();
                samples.push(Sample::new(
                    forward,
                    reverse,
                    sample_path.as_deref().unwrap_or(&experiment.raw_sample_path()),
                    output_path.as_deref().unwrap_or(&experiment.analysis_path()),
                ));
            }
            other => warn!("Ignoring unknown samples file tag {} on line {}", other, i + 1),
        }
    }

    info!("Read {} samples", samples.len());
    experiment.samples = samples;
    Ok(())
}
