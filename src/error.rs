use std::io;
use std::path::PathBuf;

/// Everything that can stop a job from being generated
///
/// Errors fall into three groups: parameter files that can't be understood, files that can't be
/// read or written, and preflight checks that fail against the filesystem. None are retried.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("JSON error: Missing parameter \"{0}\"")]
    MissingParameter(&'static str),

    #[error("JSON error: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Malformed value {value:?} for {tag} on line {line}")]
    Malformed {
        tag: String,
        value: String,
        line: usize,
    },

    #[error("Malformed SAMPLE line {line} in {path:?}: expected a forward read file")]
    MalformedSample { path: PathBuf, line: usize },

    #[error("Unknown cleanup action {0:?}, expected one of rm, mv, cp")]
    UnknownCleanupAction(String),

    #[error("Cleanup action {0:?} needs a destination")]
    MissingCleanupDestination(String),

    #[error("Parameter file doesn't define any commands")]
    NoCommands,

    #[error("Command {0} runs in batch mode but no samples file was given")]
    NoSamplesFile(String),

    #[error("Can't read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Can't write {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("Can't render template: {0}")]
    Template(#[from] tinytemplate::error::Error),

    #[error("Directory {0:?} does not exist. Please check that you have specified the sample path correctly.")]
    MissingSampleDirectory(PathBuf),

    #[error("Missing sample files {0:?}. Please check that you have specified the sample path correctly.")]
    MissingSampleFiles(Vec<PathBuf>),

    #[error("Directory {path:?} is not writable: {source}")]
    Unwritable { path: PathBuf, source: io::Error },
}

impl JobError {
    pub(crate) fn read(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> JobError {
        let path = path.into();
        move |source| JobError::Read { path, source }
    }

    pub(crate) fn write(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> JobError {
        let path = path.into();
        move |source| JobError::Write { path, source }
    }
}
