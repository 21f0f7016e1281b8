use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::error::JobError;
use crate::format::{Formatted, Registry};
use crate::model::command::Command;
use crate::model::job::Job;
use crate::model::preamble::Preamble;
use crate::script::shell::{command_script_name, invocation, sample_script_name, write_script};
use crate::script::template::{read_environment, render_header};
use crate::WorkingDirectory;

/// Synchronisation barrier closing every stage
const WAIT: &str = "wait";

/// Paths of everything written for a job
///
/// The scheduler script at `path` expects the shell scripts in `scripts` to sit next to it.
#[derive(Debug)]
pub struct JobPath {
    pub path: PathBuf,
    pub scripts: Vec<PathBuf>,
}

impl Job {
    /// Write the scheduler script and every shell script it dispatches into the working directory
    ///
    /// Files are written in order and the first failure stops emission. Files that were already
    /// written are left in place.
    pub fn create(&self, wd: &WorkingDirectory, registry: &Registry) -> Result<JobPath, JobError> {
        let extension = self.preamble.platform().extension();
        let path = wd.path.join(format!("{}.{}", self.details.name, extension));
        info!("Creating job {} in working directory {}", self.details.name, wd.path.display());

        let mut scheduler = SchedulerScript::create(&path)?;
        let mut scripts: Vec<PathBuf> = Vec::new();

        let inline = match self.commands.as_slice() {
            [command] if !command.batch => Some(command),
            _ => None,
        };
        let header = render_header(self, inline.map(|c| &c.preamble))?;
        scheduler.write(&header.content)?;
        scheduler.write(&read_environment().content)?;

        if self.is_pipeline() {
            for (i, command) in self.commands.iter().enumerate() {
                info!("Writing stage {} ({})", i + 1, command.params.command_line());
                scheduler.line(&format!("# Stage {}: {}", i + 1, command.params.command_line()))?;
                match command.batch {
                    true => self.write_batch(command, &wd.path, registry, &mut scheduler, &mut scripts)?,
                    false => {
                        let formatted = Formatted::verbatim(command);
                        let lines = invocation(command, &self.experiment, &formatted);
                        let script = write_script(&wd.path, &command_script_name(command), &lines)?;
                        scheduler.line(&dispatch(&self.preamble, command, &script, false))?;
                        scripts.push(script);
                    }
                }
                scheduler.line(WAIT)?;
                scheduler.line("")?;
            }
        } else if let Some(command) = inline {
            info!("Inlining {} into the scheduler script", command.params.command_line());
            let formatted = Formatted::verbatim(command);
            for line in invocation(command, &self.experiment, &formatted) {
                scheduler.line(&line)?;
            }
            scheduler.line("")?;
        } else {
            let command = &self.commands[0];
            self.write_batch(command, &wd.path, registry, &mut scheduler, &mut scripts)?;
            scheduler.line(WAIT)?;
            scheduler.line("")?;
        }

        let cleanup = self.cleanup_lines();
        if !cleanup.is_empty() {
            scheduler.line("# Cleanup")?;
            for line in cleanup {
                scheduler.line(&line)?;
            }
        }

        scheduler.finish()?;
        info!("Scheduler script {} written", path.display());
        Ok(JobPath { path, scripts })
    }

    /// One shell script per sample, each dispatched in the background
    fn write_batch(
        &self,
        command: &Command,
        dir: &Path,
        registry: &Registry,
        scheduler: &mut SchedulerScript,
        scripts: &mut Vec<PathBuf>,
    ) -> Result<(), JobError> {
        info!("Writing {} batch scripts for {}", self.experiment.samples.len(), command.name());
        for sample in &self.experiment.samples {
            let formatted = registry.format(command, sample);
            let lines = invocation(command, &self.experiment, &formatted);
            let script = write_script(dir, &sample_script_name(command, sample), &lines)?;
            scheduler.line(&dispatch(&self.preamble, command, &script, true))?;
            scripts.push(script);
        }
        Ok(())
    }
}

/// Scheduler line launching a shell script with the command's own resource request
fn dispatch(preamble: &Preamble, command: &Command, script: &Path, background: bool) -> String {
    let resources = &command.preamble;
    let tasks = resources.tasks.max(1);
    let cpus = resources.cpus.max(1);
    let filename = script.file_name().map(|f| f.to_string_lossy()).unwrap_or_default();

    let mut line = match preamble {
        Preamble::Slurm(_) => {
            let mut line = format!("srun --input=none -K1 -n{} -c{}", tasks, cpus);
            if resources.memory > 0 {
                line.push_str(&format!(" --mem-per-cpu={}", resources.memory));
            }
            line
        }
        Preamble::Sge(sge) => {
            let mut line = "qrsh -now no -cwd -V".to_string();
            if !sge.parallel_environment.is_empty() {
                line.push_str(&format!(" -pe {} {}", sge.parallel_environment, tasks * cpus));
            }
            if resources.memory > 0 {
                line.push_str(&format!(" -l h_vmem={}M", resources.memory));
            }
            line
        }
    };

    line.push_str(&format!(" ./{}", filename));
    if background {
        line.push_str(" &");
    }
    line
}

/// Scheduler script being written, sections are appended in order
struct SchedulerScript {
    path: PathBuf,
    file: BufWriter<File>,
}

impl SchedulerScript {
    fn create(path: &Path) -> Result<SchedulerScript, JobError> {
        info!("Writing scheduler script to {}", path.display());
        let file = File::create(path).map_err(JobError::write(path))?;
        Ok(SchedulerScript { path: path.to_path_buf(), file: BufWriter::new(file) })
    }

    fn write(&mut self, content: &str) -> Result<(), JobError> {
        self.file.write_all(content.as_bytes()).map_err(JobError::write(&self.path))
    }

    fn line(&mut self, line: &str) -> Result<(), JobError> {
        writeln!(self.file, "{}", line).map_err(JobError::write(&self.path))
    }

    fn finish(mut self) -> Result<(), JobError> {
        self.file.flush().map_err(JobError::write(&self.path))
    }
}
