use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::JobError;
use crate::model::job::Job;

/// Copy the parameter file and any samples or design file into `{analysis}/config/`
///
/// Returns the config directory. Existing copies are overwritten.
pub fn archive_inputs(job: &Job, param_file: &Path) -> Result<PathBuf, JobError> {
    let config = job.experiment.analysis_path().join("config");
    fs::create_dir_all(&config).map_err(JobError::write(&config))?;
    info!("Archiving job inputs to {}", config.display());

    let mut inputs = vec![param_file];
    inputs.extend(job.experiment.samples_file.as_deref());
    inputs.extend(job.details.design_file.as_deref());
    inputs.dedup();

    for input in inputs {
        let Some(filename) = input.file_name() else {
            continue;
        };
        let target = config.join(filename);
        info!("Copying {} to {}", input.display(), target.display());
        fs::copy(input, &target).map_err(JobError::read(input))?;
    }

    Ok(config)
}
