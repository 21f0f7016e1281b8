use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::JobError;
use crate::model::command::{Command, Volume};
use crate::model::experiment::Experiment;
use crate::model::job::{CleanupAction, Job, JobDetails};
use crate::model::preamble::Preamble;
use crate::params::tags::{lookup, Field, Tag, Value};
use crate::platform::Platform;

/// Delimits a trailing comment on a parameter line
const COMMENT_DELIMITER: &str = ";;";

/// How to treat boolean and integer values that can't be parsed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Fall back to false / 0 and log a warning, older parameter files depend on this
    #[default]
    Permissive,
    /// Fail with the offending tag and line
    Strict,
}

/// Read a plain text parameter file
pub fn read(path: &Path, platform: Platform, mode: ParseMode) -> Result<Job, JobError> {
    info!("Parsing plain text parameter file {}", path.display());
    let content = fs::read_to_string(path).map_err(JobError::read(path))?;
    parse(&content, platform, mode)
}

/// Parse `TAG=value[;;comment]` lines into a job
///
/// A command block ends when `JOB_NAME` follows an `OPTION` or `ARGUMENT` line, or at an explicit
/// `END_COMMAND` line.
pub fn parse(content: &str, platform: Platform, mode: ParseMode) -> Result<Job, JobError> {
    let mut builder = JobBuilder::new(platform, mode);
    let mut last_tag = "";

    for (i, line) in content.lines().enumerate() {
        if ignore_line(line) {
            continue;
        }
        let (name, value) = split_line(line);

        if name == "JOB_NAME" && matches!(last_tag, "OPTION" | "ARGUMENT") {
            builder.finish_command();
        }

        match lookup(name) {
            Some(tag) => builder.set(tag, value, i + 1)?,
            None => warn!("Ignoring unknown tag {} on line {}", name, i + 1),
        }
        last_tag = name;
    }

    builder.finish()
}

fn ignore_line(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#')
}

/// Split a line into its tag and cleaned value
fn split_line(line: &str) -> (&str, &str) {
    match line.split_once('=') {
        Some((tag, value)) => (tag.trim(), clean_value(value)),
        None => (line.trim(), ""),
    }
}

/// Drop the trailing comment and trailing whitespace
fn clean_value(value: &str) -> &str {
    let value = value.split(COMMENT_DELIMITER).next().unwrap_or_default();
    value.trim_end()
}

/// Collects tag values into a job as lines are read
struct JobBuilder {
    mode: ParseMode,
    details: JobDetails,
    experiment: Experiment,
    preamble: Preamble,
    misc_preamble: Vec<String>,
    cleanup: Vec<CleanupAction>,
    commands: Vec<Command>,
    command: Command,
    /// Whether any command tag has been set since the last command was finished
    started: bool,
}

impl JobBuilder {
    fn new(platform: Platform, mode: ParseMode) -> JobBuilder {
        JobBuilder {
            mode,
            details: JobDetails::default(),
            experiment: Experiment::default(),
            preamble: Preamble::new(platform),
            misc_preamble: Vec::new(),
            cleanup: Vec::new(),
            commands: Vec::new(),
            command: Command::default(),
            started: false,
        }
    }

    fn finish_command(&mut self) {
        if self.started {
            debug!("Finished command block {}", self.command.name());
            self.commands.push(std::mem::take(&mut self.command));
            self.started = false;
        }
    }

    fn finish(mut self) -> Result<Job, JobError> {
        self.finish_command();
        if self.commands.is_empty() {
            return Err(JobError::NoCommands);
        }
        if self.details.name.is_empty() {
            self.details.name = self.commands[0].name().to_string();
        }

        Ok(Job {
            details: self.details,
            experiment: self.experiment,
            preamble: self.preamble,
            misc_preamble: self.misc_preamble,
            commands: self.commands,
            cleanup: self.cleanup,
        })
    }

    /// Coerce a raw value and store it in the field the tag points at
    fn set(&mut self, tag: &Tag, raw: &str, line: usize) -> Result<(), JobError> {
        let value = match tag.coerce.apply(raw) {
            Some(value) => value,
            None if self.mode == ParseMode::Strict => {
                return Err(JobError::Malformed { tag: tag.name.to_string(), value: raw.to_string(), line });
            }
            None => {
                warn!("Malformed value {:?} for {} on line {}, using {:?}", raw, tag.name, line, tag.coerce.zero());
                tag.coerce.zero()
            }
        };

        if tag.is_command_scoped() {
            self.started = true;
        }

        match tag.field {
            Field::EndCommand => self.finish_command(),
            Field::Name => self.details.name = value.into_text(),
            Field::Misc => self.misc_preamble.push(value.into_text()),
            Field::Cleanup => self.cleanup.push(parse_cleanup(&value.into_text(), line)?),
            Field::SamplesFile => self.experiment.samples_file = non_empty(value.into_text()).map(PathBuf::from),
            Field::Pi => self.experiment.pi = value.into_text(),
            Field::Experiment => self.experiment.name = value.into_text(),
            Field::AnalysisId => self.experiment.analysis_id = value.into_text(),
            Field::SamplePath => self.experiment.sample_path = PathBuf::from(value.into_text()),
            Field::AnalysisPath => self.experiment.analysis_path = PathBuf::from(value.into_text()),
            Field::WorkingDir => self.experiment.working_directory = non_empty(value.into_text()).map(PathBuf::from),
            Field::Queue => self.preamble.set_queue(value.into_text()),
            Field::WallTime => self.preamble.set_wall_time(value.into_text()),
            Field::NotifyBegin => self.preamble.notifications_mut().begin = value.as_bool(),
            Field::NotifyEnd => self.preamble.notifications_mut().end = value.as_bool(),
            Field::NotifyFail => self.preamble.notifications_mut().fail = value.as_bool(),
            Field::EmailAddress => self.preamble.notifications_mut().email_address = value.into_text(),
            Field::Shell | Field::ParallelEnvironment | Field::CurrentDirectory | Field::JoinOutput | Field::SgeMemory => {
                self.set_sge(tag, value)
            }
            _ => self.set_command(tag.field, value),
        }
        Ok(())
    }

    fn set_sge(&mut self, tag: &Tag, value: Value) {
        let Some(sge) = self.preamble.sge_mut() else {
            warn!("{} only applies to SGE, ignoring it", tag.name);
            return;
        };
        match tag.field {
            Field::Shell => sge.shell = value.into_text(),
            Field::ParallelEnvironment => sge.parallel_environment = value.into_text(),
            Field::CurrentDirectory => sge.current_directory = value.as_bool(),
            Field::JoinOutput => sge.join_output = value.as_bool(),
            Field::SgeMemory => sge.memory = value.into_text(),
            _ => {}
        }
    }

    fn set_command(&mut self, field: Field, value: Value) {
        let preamble = &mut self.command.preamble;
        let params = &mut self.command.params;
        match field {
            Field::Batch => self.command.batch = value.as_bool(),
            Field::JobName => {
                let name = value.into_text();
                if self.details.name.is_empty() {
                    self.details.name = name.clone();
                }
                preamble.job_name = name;
            }
            Field::Tasks => preamble.tasks = value.as_int(),
            Field::Cpus => preamble.cpus = value.as_int(),
            Field::Memory => preamble.memory = value.as_int(),
            Field::Time => preamble.time = value.into_text(),
            Field::ContainerPath => params.container_path = value.into_text(),
            Field::ContainerImage => params.container_image = value.into_text(),
            Field::WorkDir => params.work_dir = non_empty(value.into_text()),
            Field::Volume => params.volumes.extend(parse_volumes(&value.into_text())),
            Field::Command => params.command = value.into_text(),
            Field::Subcommand => params.subcommand = non_empty(value.into_text()),
            Field::InputFromStep => self.command.input_from_step = non_empty(value.into_text()),
            Field::Option => params.options.push(value.into_text()),
            Field::Argument => params.arguments.push(value.into_text()),
            _ => {}
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    match value.is_empty() {
        true => None,
        false => Some(value),
    }
}

/// `host:container[,host:container...]`, a bare path is mounted at the same location
fn parse_volumes(value: &str) -> Vec<Volume> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| match v.split_once(':') {
            Some((host, container)) => Volume { host_path: host.to_string(), container_path: container.to_string() },
            None => Volume { host_path: v.to_string(), container_path: v.to_string() },
        })
        .collect()
}

/// `<tool> <action> <source> [<destination>]`
fn parse_cleanup(value: &str, line: usize) -> Result<CleanupAction, JobError> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        [tool, action, source] => CleanupAction::new(tool.to_string(), action, source.to_string(), None),
        [tool, action, source, destination] => {
            CleanupAction::new(tool.to_string(), action, source.to_string(), Some(destination.to_string()))
        }
        _ => Err(JobError::Malformed { tag: "CLEANUP".to_string(), value: value.to_string(), line }),
    }
}
