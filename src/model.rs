//! In-memory job model built by the parameter file parsers and consumed by the script emitter

/// Root aggregate: a job owns its experiment, commands, and cleanup actions
pub mod job;

/// Where sample data lives and where analysis output goes
pub mod experiment;

/// A single containerised tool invocation
pub mod command;

/// Scheduler directives (Slurm or SGE)
pub mod preamble;
