use std::path::PathBuf;

pub mod platform;

pub mod error;

/// The job model shared by the parsers and the script emitter
pub mod model;

pub mod params;

pub mod format;

pub mod script;

/// Filesystem checks run before any script is written
pub mod preflight;

/// Keep a copy of the files a job was generated from
pub mod archive;

/// Directory the scheduler script and shell scripts are written into
#[derive(Debug, Clone)]
pub struct WorkingDirectory {
    pub path: PathBuf,
}
