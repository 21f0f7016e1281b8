use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;
use serde_json::Value;

use crate::error::JobError;
use crate::model::command::{Command, CommandParams, CommandPreamble, Volume};
use crate::model::experiment::{Experiment, DEFAULT_ANALYSIS_ID};
use crate::model::job::{CleanupAction, Job, JobDetails};
use crate::model::preamble::{Notifications, Preamble, SgePreamble, SlurmPreamble};
use crate::platform::Platform;

/// Read a JSON parameter file
pub fn read(path: &Path, platform: Platform) -> Result<Job, JobError> {
    info!("Parsing JSON parameter file {}", path.display());
    let json_string = fs::read_to_string(path).map_err(JobError::read(path))?;
    parse(&json_string, platform)
}

/// Parse a JSON parameter document into a job
///
/// Required fields are checked in document order and the first missing one is reported by name.
pub fn parse(json_string: &str, platform: Platform) -> Result<Job, JobError> {
    // from_str is a generic function, so request Value (generic json) first
    let json: Value = serde_json::from_str(json_string)?;
    let params: JsonParams = serde_json::from_value(json)?;
    params.into_job(platform)
}

/// Every field is optional here so that missing ones can be reported with their JSON name
#[derive(Debug, Deserialize)]
struct JsonParams {
    job_details: Option<JsonJobDetails>,
    slurm_preamble: Option<JsonSlurmPreamble>,
    sge_preamble: Option<JsonSgePreamble>,
    misc_preamble: Option<Vec<String>>,
    experiment_details: Option<JsonExperiment>,
    commands: Option<Vec<JsonCommand>>,
    cleanup: Option<Vec<JsonCleanup>>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonJobDetails {
    job_name: Option<String>,
    design_file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonSlurmPreamble {
    wall_time: Option<String>,
    partition: Option<String>,
    email_begin: Option<bool>,
    email_end: Option<bool>,
    email_fail: Option<bool>,
    email_address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonSgePreamble {
    current_directory: Option<bool>,
    join_output: Option<bool>,
    email_address: Option<String>,
    email_begin: Option<bool>,
    email_end: Option<bool>,
    email_fail: Option<bool>,
    shell: Option<String>,
    parallel_environment: Option<String>,
    memory: Option<String>,
    queue: Option<String>,
    wall_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonExperiment {
    pi: Option<String>,
    experiment: Option<String>,
    analysis_id: Option<String>,
    sample_path: Option<String>,
    analysis_path: Option<String>,
    working_directory: Option<String>,
    samples_file: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonCommand {
    batch: Option<bool>,
    command: Option<String>,
    input_from_step: Option<String>,
    job_name: Option<String>,
    tasks: Option<f64>,
    cpus: Option<f64>,
    memory: Option<f64>,
    time: Option<String>,
    volumes: Option<Vec<JsonVolume>>,
    singularity_path: Option<String>,
    singularity_image: Option<String>,
    workdir: Option<String>,
    subcommand: Option<String>,
    options: Option<Vec<String>>,
    arguments: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct JsonVolume {
    host_path: Option<String>,
    container_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonCleanup {
    tool: Option<String>,
    action: Option<String>,
    source: Option<String>,
    destination: Option<String>,
}

fn required<T>(value: Option<T>, name: &'static str) -> Result<T, JobError> {
    value.ok_or(JobError::MissingParameter(name))
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// JSON numbers arrive as floats and are truncated
fn truncate(value: f64) -> u32 {
    value as u32
}

impl JsonParams {
    fn into_job(self, platform: Platform) -> Result<Job, JobError> {
        let details = self.job_details.unwrap_or_default().into_details()?;

        let preamble = match platform {
            Platform::Slurm => Preamble::Slurm(self.slurm_preamble.unwrap_or_default().into_preamble()?),
            Platform::Sge => Preamble::Sge(self.sge_preamble.unwrap_or_default().into_preamble()?),
        };

        let experiment = match self.experiment_details {
            Some(experiment) => experiment.into_experiment()?,
            None => {
                info!("No experiment details given, using defaults");
                Experiment::default()
            }
        };

        let commands = required(self.commands, "commands")?
            .into_iter()
            .map(JsonCommand::into_command)
            .collect::<Result<Vec<Command>, JobError>>()?;
        if commands.is_empty() {
            return Err(JobError::NoCommands);
        }

        let cleanup = self
            .cleanup
            .unwrap_or_default()
            .into_iter()
            .map(JsonCleanup::into_action)
            .collect::<Result<Vec<CleanupAction>, JobError>>()?;

        Ok(Job {
            details,
            experiment,
            preamble,
            misc_preamble: self.misc_preamble.unwrap_or_default(),
            commands,
            cleanup,
        })
    }
}

impl JsonJobDetails {
    fn into_details(self) -> Result<JobDetails, JobError> {
        Ok(JobDetails {
            name: required(self.job_name, "job_name")?,
            design_file: optional(self.design_file).map(PathBuf::from),
        })
    }
}

impl JsonSlurmPreamble {
    fn into_preamble(self) -> Result<SlurmPreamble, JobError> {
        let wall_time = required(self.wall_time, "wall_time")?;
        let partition = required(self.partition, "partition")?;
        let notifications = Notifications {
            begin: required(self.email_begin, "email_begin")?,
            end: required(self.email_end, "email_end")?,
            fail: required(self.email_fail, "email_fail")?,
            email_address: required(self.email_address, "email_address")?,
        };
        Ok(SlurmPreamble { partition, wall_time, notifications })
    }
}

impl JsonSgePreamble {
    fn into_preamble(self) -> Result<SgePreamble, JobError> {
        let email_address = required(self.email_address, "email_address")?;
        Ok(SgePreamble {
            queue: self.queue.unwrap_or_default(),
            wall_time: self.wall_time.unwrap_or_default(),
            notifications: Notifications {
                begin: self.email_begin.unwrap_or_default(),
                end: self.email_end.unwrap_or_default(),
                fail: self.email_fail.unwrap_or_default(),
                email_address,
            },
            current_directory: self.current_directory.unwrap_or_default(),
            join_output: self.join_output.unwrap_or_default(),
            shell: required(self.shell, "shell")?,
            parallel_environment: required(self.parallel_environment, "parallel_environment")?,
            memory: required(self.memory, "memory")?,
        })
    }
}

impl JsonExperiment {
    fn into_experiment(self) -> Result<Experiment, JobError> {
        Ok(Experiment {
            pi: required(self.pi, "pi")?,
            name: required(self.experiment, "experiment")?,
            analysis_id: optional(self.analysis_id).unwrap_or_else(|| DEFAULT_ANALYSIS_ID.to_string()),
            sample_path: PathBuf::from(required(self.sample_path, "sample_path")?),
            analysis_path: PathBuf::from(required(self.analysis_path, "analysis_path")?),
            working_directory: optional(self.working_directory).map(PathBuf::from),
            samples_file: optional(self.samples_file).map(PathBuf::from),
            samples: Vec::new(),
        })
    }
}

impl JsonCommand {
    fn into_command(self) -> Result<Command, JobError> {
        let batch = required(self.batch, "batch")?;
        let command = required(self.command, "command")?;

        let preamble = CommandPreamble {
            job_name: self.job_name.unwrap_or_else(|| command.clone()),
            tasks: truncate(required(self.tasks, "tasks")?),
            cpus: truncate(required(self.cpus, "cpus")?),
            memory: truncate(required(self.memory, "memory")?),
            time: self.time.unwrap_or_default(),
        };

        let volumes = required(self.volumes, "volumes")?
            .into_iter()
            .map(JsonVolume::into_volume)
            .collect::<Result<Vec<Volume>, JobError>>()?;

        let params = CommandParams {
            container_path: required(self.singularity_path, "singularity_path")?,
            container_image: required(self.singularity_image, "singularity_image")?,
            work_dir: optional(self.workdir),
            volumes,
            command,
            subcommand: optional(self.subcommand),
            options: self.options.unwrap_or_default(),
            arguments: self.arguments.unwrap_or_default(),
        };

        Ok(Command {
            batch,
            input_from_step: optional(self.input_from_step),
            preamble,
            params,
            ..Default::default()
        })
    }
}

impl JsonVolume {
    fn into_volume(self) -> Result<Volume, JobError> {
        Ok(Volume {
            host_path: required(self.host_path, "host_path")?,
            container_path: required(self.container_path, "container_path")?,
        })
    }
}

impl JsonCleanup {
    fn into_action(self) -> Result<CleanupAction, JobError> {
        let tool = required(self.tool, "tool")?;
        let action = required(self.action, "action")?;
        let source = required(self.source, "source")?;
        CleanupAction::new(tool, &action, source, optional(self.destination))
    }
}
