use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::JobError;
use crate::format::Formatted;
use crate::model::command::Command;
use crate::model::experiment::{Experiment, Sample};
use crate::script::template::render_shell;

/// Shell line continuation
const CONTINUATION: &str = " \\";

/// Container invocation for a command, one line per element with continuations
///
/// The working directory is bound into the container unless a volume already mounts it there.
///
/// ```text
/// singularity run \
/// --bind /data:/data,/work \
/// --pwd /work \
/// /containers/star.sif \
/// STAR \
/// --runThreadN 8 \
/// ...
/// ```
pub fn invocation(command: &Command, experiment: &Experiment, formatted: &Formatted) -> Vec<String> {
    let params = &command.params;
    let mut lines = vec!["singularity run".to_string()];

    let work_dir = params
        .work_dir
        .clone()
        .or_else(|| experiment.working_directory.as_ref().map(|p| p.display().to_string()));

    let mut binds: Vec<String> = params.volumes.iter().map(|v| v.to_string()).collect();
    if let Some(work_dir) = &work_dir {
        if !params.volumes.iter().any(|v| &v.container_path == work_dir) {
            binds.push(work_dir.clone());
        }
    }
    if !binds.is_empty() {
        lines.push(format!("--bind {}", binds.join(",")));
    }

    if let Some(work_dir) = work_dir {
        lines.push(format!("--pwd {}", work_dir));
    }

    let image = container_image(&params.container_path, &params.container_image);
    if !image.is_empty() {
        lines.push(image);
    }
    lines.push(params.command_line());
    lines.extend(formatted.options.iter().cloned());
    lines.extend(formatted.arguments.iter().cloned());

    continue_lines(lines)
}

fn container_image(path: &str, image: &str) -> String {
    match path.is_empty() {
        true => image.to_string(),
        false => Path::new(path).join(image).display().to_string(),
    }
}

/// Append a continuation to every line but the last
fn continue_lines(lines: Vec<String>) -> Vec<String> {
    let last = lines.len().saturating_sub(1);
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| match i < last {
            true => format!("{}{}", line, CONTINUATION),
            false => line,
        })
        .collect()
}

/// `{command}_{sample}.sh`
pub fn sample_script_name(command: &Command, sample: &Sample) -> String {
    format!("{}_{}.sh", command.name(), sample.prefix)
}

/// `{command}.sh`
pub fn command_script_name(command: &Command) -> String {
    format!("{}.sh", command.name())
}

/// Render and write an executable shell script into `dir`
pub fn write_script(dir: &Path, filename: &str, invocation: &[String]) -> Result<PathBuf, JobError> {
    let path = dir.join(filename);
    let content = render_shell(invocation)?;
    info!("Writing shell script {}", path.display());
    fs::write(&path, content).map_err(JobError::write(&path))?;
    make_executable(&path)?;
    Ok(path)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), JobError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(JobError::write(path))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), JobError> {
    Ok(())
}
