use std::fmt;
use std::path::PathBuf;

/// Resource request for a single command
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandPreamble {
    pub job_name: String,
    pub tasks: u32,
    pub cpus: u32,
    pub memory: u32,
    pub time: String,
}

/// A host directory bound into the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub host_path: String,
    pub container_path: String,
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.host_path, self.container_path)
    }
}

/// How to run the tool: container, command line, and mounts
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandParams {
    pub container_path: String,
    pub container_image: String,
    pub work_dir: Option<String>,
    pub volumes: Vec<Volume>,
    pub command: String,
    pub subcommand: Option<String>,
    pub options: Vec<String>,
    pub arguments: Vec<String>,
}

impl CommandParams {
    /// The tool followed by its subcommand, if any
    pub fn command_line(&self) -> String {
        match &self.subcommand {
            Some(sub) => format!("{} {}", self.command, sub),
            None => self.command.clone(),
        }
    }
}

/// One tool invocation in a job
///
/// Input and output prefixes are empty until the owning job resolves them against its experiment.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Command {
    pub batch: bool,
    pub input_from_step: Option<String>,
    pub input_path_prefix: PathBuf,
    pub output_path_prefix: PathBuf,
    pub preamble: CommandPreamble,
    pub params: CommandParams,
}

impl Command {
    pub fn name(&self) -> &str {
        &self.params.command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let mut params = CommandParams { command: "kallisto".to_string(), ..Default::default() };
        assert_eq!(params.command_line(), "kallisto");
        params.subcommand = Some("quant".to_string());
        assert_eq!(params.command_line(), "kallisto quant");
    }

    #[test]
    fn test_volume_display() {
        let volume = Volume { host_path: "/scratch".to_string(), container_path: "/data".to_string() };
        assert_eq!(volume.to_string(), "/scratch:/data");
    }
}
