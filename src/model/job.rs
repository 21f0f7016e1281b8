use std::fmt;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::JobError;
use crate::model::command::Command;
use crate::model::experiment::Experiment;
use crate::model::preamble::Preamble;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JobDetails {
    pub name: String,
    pub design_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupVerb {
    Remove,
    Move,
    Copy,
}

impl CleanupVerb {
    pub fn parse(action: &str) -> Result<CleanupVerb, JobError> {
        match action {
            "rm" => Ok(CleanupVerb::Remove),
            "mv" => Ok(CleanupVerb::Move),
            "cp" => Ok(CleanupVerb::Copy),
            other => Err(JobError::UnknownCleanupAction(other.to_string())),
        }
    }
}

impl fmt::Display for CleanupVerb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CleanupVerb::Remove => write!(f, "rm -r"),
            CleanupVerb::Move => write!(f, "mv"),
            CleanupVerb::Copy => write!(f, "cp -r"),
        }
    }
}

/// Housekeeping run once every command has finished
///
/// `source` is relative to the tool's output directory. A relative `destination` is resolved
/// against the analysis path, an absolute one is used as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupAction {
    pub tool: String,
    pub verb: CleanupVerb,
    pub source: String,
    pub destination: Option<String>,
}

impl CleanupAction {
    pub fn new(tool: String, action: &str, source: String, destination: Option<String>) -> Result<CleanupAction, JobError> {
        let verb = CleanupVerb::parse(action)?;
        if verb != CleanupVerb::Remove && destination.is_none() {
            return Err(JobError::MissingCleanupDestination(action.to_string()));
        }
        Ok(CleanupAction { tool, verb, source, destination })
    }

    /// Render as a shell command
    pub fn to_shell(&self, experiment: &Experiment) -> String {
        let source = experiment.tool_path(&self.tool).join(&self.source);
        match (&self.verb, &self.destination) {
            (CleanupVerb::Remove, _) | (_, None) => format!("{} {}", CleanupVerb::Remove, source.display()),
            (verb, Some(destination)) => {
                let destination = experiment.analysis_path().join(destination);
                format!("{} {} {}", verb, source.display(), destination.display())
            }
        }
    }
}

/// A complete job: one scheduler script plus the shell scripts it dispatches
///
/// A job with more than one command is a pipeline, stages run in the order they're listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub details: JobDetails,
    pub experiment: Experiment,
    pub preamble: Preamble,
    pub misc_preamble: Vec<String>,
    pub commands: Vec<Command>,
    pub cleanup: Vec<CleanupAction>,
}

impl Job {
    pub fn is_pipeline(&self) -> bool {
        self.commands.len() > 1
    }

    /// CPUs requested at the scheduler level
    ///
    /// Stages run one after another, so a pipeline only ever needs as many CPUs as its most
    /// demanding command.
    pub fn max_cpus(&self) -> u32 {
        self.commands.iter().map(|c| c.preamble.cpus).max().unwrap_or_default()
    }

    /// Scheduler wall time, falling back to the first command that sets one
    pub fn wall_time(&self) -> &str {
        match self.preamble.wall_time() {
            "" => self
                .commands
                .iter()
                .map(|c| c.preamble.time.as_str())
                .find(|t| !t.is_empty())
                .unwrap_or_default(),
            time => time,
        }
    }

    /// The samples or design file listing this job's samples, if any
    pub fn samples_file(&self) -> Option<&Path> {
        self.experiment
            .samples_file
            .as_deref()
            .or(self.details.design_file.as_deref())
    }

    /// Set each command's input and output prefixes from the experiment layout
    ///
    /// A command reads raw samples unless it takes its input from an earlier step, in which case
    /// it reads that step's output directory.
    pub fn resolve_paths(&mut self) {
        let raw = self.experiment.raw_sample_path();
        let mut seen: Vec<String> = Vec::new();

        for command in self.commands.iter_mut() {
            command.output_path_prefix = self.experiment.tool_path(command.name());
            command.input_path_prefix = match &command.input_from_step {
                Some(step) => {
                    if !seen.contains(step) {
                        warn!("{} takes input from {}, which isn't an earlier step", command.name(), step);
                    }
                    self.experiment.tool_path(step)
                }
                None => raw.clone(),
            };
            seen.push(command.name().to_string());
        }
    }

    pub fn cleanup_lines(&self) -> Vec<String> {
        self.cleanup.iter().map(|c| c.to_shell(&self.experiment)).collect()
    }
}
