//! Render the job model into a scheduler script and the shell scripts it dispatches

/// Read script templates and render them with job content
pub mod template;

/// Container invocations and standalone shell scripts
pub mod shell;

/// Write the scheduler script for a job, stage by stage
pub mod job;
