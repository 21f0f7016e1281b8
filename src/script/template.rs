use chrono::Utc;
use serde::Serialize;
use tinytemplate::{format_unescaped, TinyTemplate};

use crate::error::JobError;
use crate::model::command::CommandPreamble;
use crate::model::job::Job;
use crate::model::preamble::Preamble;

/// Open file descriptor limit set at the top of every shell script
pub const OPEN_FILES: u32 = 10000;

/// Rendered scheduler directives
///
/// Scheduler options are read from `#SBATCH` (Slurm) or `#$` (SGE) lines before the first
/// executable command, so the header always comes first in the scheduler script.
pub struct Header {
    pub content: String,
}

/// Static environment setup run before any command: prints where the job landed and loads
/// the container runtime
pub struct Environment {
    pub content: String,
}

/// Rendering context for the Slurm header
#[derive(Serialize)]
struct SlurmHeaderContext<'a> {
    name: &'a str,
    partition: &'a str,
    mail_type: String,
    email: &'a str,
    wall_time: &'a str,
    cpus: u32,
    tasks: Option<u32>,
    memory: Option<u32>,
    misc_preamble: &'a [String],
    time_now: String,
}

/// Rendering context for the SGE header
#[derive(Serialize)]
struct SgeHeaderContext<'a> {
    name: &'a str,
    queue: &'a str,
    mail_options: String,
    email: &'a str,
    wall_time: &'a str,
    current_directory: bool,
    join_output: bool,
    shell: &'a str,
    parallel_environment: &'a str,
    cpus: u32,
    memory: &'a str,
    misc_preamble: &'a [String],
    time_now: String,
}

/// Rendering context for a shell script
#[derive(Serialize)]
struct ShellContext<'a> {
    open_files: u32,
    invocation: &'a [String],
}

/// Render a template without HTML escaping, scripts are full of `&` and `<`
fn render<C: Serialize>(name: &'static str, template: &'static str, context: &C) -> Result<String, JobError> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&format_unescaped);
    tt.add_template(name, template)?;
    Ok(tt.render(name, context)?)
}

/// Render the scheduler header
///
/// `resources` is the request of a single command inlined into the scheduler script. Jobs that
/// dispatch sub-scripts only request CPUs at this level.
pub fn render_header(job: &Job, resources: Option<&CommandPreamble>) -> Result<Header, JobError> {
    static SLURM_HEADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/slurm_header.txt"));
    static SGE_HEADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/sge_header.txt"));

    let time_now = Utc::now().to_string();
    let content = match &job.preamble {
        Preamble::Slurm(preamble) => {
            let context = SlurmHeaderContext {
                name: &job.details.name,
                partition: &preamble.partition,
                mail_type: preamble.notifications.mail_type(),
                email: &preamble.notifications.email_address,
                wall_time: job.wall_time(),
                cpus: job.max_cpus(),
                tasks: resources.map(|r| r.tasks),
                memory: resources.map(|r| r.memory),
                misc_preamble: &job.misc_preamble,
                time_now,
            };
            render("slurm_header", SLURM_HEADER, &context)?
        }
        Preamble::Sge(preamble) => {
            let context = SgeHeaderContext {
                name: &job.details.name,
                queue: &preamble.queue,
                mail_options: preamble.notifications.mail_options(),
                email: &preamble.notifications.email_address,
                wall_time: job.wall_time(),
                current_directory: preamble.current_directory,
                join_output: preamble.join_output,
                shell: &preamble.shell,
                parallel_environment: &preamble.parallel_environment,
                cpus: job.max_cpus(),
                memory: &preamble.memory,
                misc_preamble: &job.misc_preamble,
                time_now,
            };
            render("sge_header", SGE_HEADER, &context)?
        }
    };

    Ok(Header { content })
}

/// Read the environment setup, everything is static
pub fn read_environment() -> Environment {
    static ENVIRONMENT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/environment.txt"));
    Environment { content: ENVIRONMENT.to_string() }
}

/// Render a standalone shell script around a container invocation
pub fn render_shell(invocation: &[String]) -> Result<String, JobError> {
    static SHELL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/shell.txt"));
    let context = ShellContext { open_files: OPEN_FILES, invocation };
    render("shell", SHELL, &context)
}
