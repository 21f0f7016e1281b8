//! Per-tool option and argument formatting for batch commands
//!
//! When a command runs once per sample, some tools need sample-specific paths spliced into their
//! command line. Formatters are registered by tool name and, optionally, subcommand. A formatter
//! registered without a subcommand applies to every subcommand of the tool that doesn't have a
//! more specific formatter. Tools without a formatter get their options and arguments verbatim.
//!
//! Paths are per sample: raw reads come from the sample's own root, and each tool writes under
//! the sample's output path. With the default samples layout these are the command's input and
//! output prefixes.

use std::collections::HashMap;
use std::path::PathBuf;

use log::debug;

use crate::model::command::Command;
use crate::model::experiment::Sample;

/// Options and arguments of a command line, in order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub options: Vec<String>,
    pub arguments: Vec<String>,
}

impl Formatted {
    /// Options and arguments exactly as configured
    pub fn verbatim(command: &Command) -> Formatted {
        Formatted {
            options: command.params.options.clone(),
            arguments: command.params.arguments.clone(),
        }
    }
}

pub type FormatFn = fn(&Command, &Sample) -> Formatted;

type ToolKey = (String, Option<String>);

pub struct Registry {
    formatters: HashMap<ToolKey, FormatFn>,
}

impl Default for Registry {
    /// A registry with formatters for all supported tools
    fn default() -> Self {
        let mut registry = Registry::empty();
        registry
            .register("STAR", None, star)
            .register("trim_galore", None, trim_galore)
            .register("kallisto", Some("quant"), kallisto_quant)
            .register("rsem-calculate-expression", None, rsem_calculate_expression)
            .register("fastqc", None, fastqc)
            .register("samtools", Some("index"), samtools_index);
        registry
    }
}

impl Registry {
    pub fn empty() -> Registry {
        Registry { formatters: HashMap::new() }
    }

    /// Add or replace the formatter for a tool (and subcommand)
    pub fn register(&mut self, tool: &str, subcommand: Option<&str>, formatter: FormatFn) -> &mut Registry {
        self.formatters.insert((tool.to_string(), subcommand.map(str::to_string)), formatter);
        self
    }

    /// Most specific formatter for a command: exact tool and subcommand first, then tool alone
    pub fn lookup(&self, command: &Command) -> Option<FormatFn> {
        let tool = command.params.command.clone();
        let subcommand = command.params.subcommand.clone();

        let exact = subcommand.as_ref().and_then(|_| self.formatters.get(&(tool.clone(), subcommand.clone())));
        exact.or_else(|| self.formatters.get(&(tool, None))).copied()
    }

    pub fn format(&self, command: &Command, sample: &Sample) -> Formatted {
        match self.lookup(command) {
            Some(formatter) => {
                debug!("Formatting {} for sample {}", command.params.command_line(), sample.prefix);
                formatter(command, sample)
            }
            None => generic(command, sample),
        }
    }
}

/// Formatting for tools without a registered formatter
pub fn generic(command: &Command, _sample: &Sample) -> Formatted {
    Formatted::verbatim(command)
}

/// Replace the value of every option whose key (text before the first space) matches
fn rewrite_option(options: &[String], key: &str, value: &str) -> Vec<String> {
    options
        .iter()
        .map(|opt| match opt.split(' ').next() {
            Some(k) if k == key => format!("{} {}", key, value),
            _ => opt.clone(),
        })
        .collect()
}

/// Directory a command reads a sample from
///
/// The sample's own root for raw reads, otherwise the earlier step's output for that sample.
fn input_dir(command: &Command, sample: &Sample) -> PathBuf {
    match &command.input_from_step {
        Some(step) => sample.output_path.join(step),
        None => sample.path.clone(),
    }
}

/// Directory a command writes a sample's output to
fn output_dir(command: &Command, sample: &Sample) -> PathBuf {
    sample.output_path.join(command.name())
}

/// Sample read files as the command sees them, forward first
fn input_reads(command: &Command, sample: &Sample) -> Vec<String> {
    let dir = input_dir(command, sample);
    sample.read_files().iter().map(|f| dir.join(f).display().to_string()).collect()
}

/// Read files written by trim_galore for a sample
fn trimmed_reads(command: &Command, sample: &Sample) -> Vec<String> {
    let dir = input_dir(command, sample);
    let files = match sample.is_paired() {
        true => vec![format!("{}_val_1.fq.gz", sample.prefix), format!("{}_val_2.fq.gz", sample.prefix)],
        false => vec![format!("{}_trimmed.fq.gz", sample.prefix)],
    };
    files.iter().map(|f| dir.join(f).display().to_string()).collect()
}

fn star(command: &Command, sample: &Sample) -> Formatted {
    let prefix = format!("{}_", output_dir(command, sample).join(&sample.prefix).display());
    let reads = input_reads(command, sample).join(" ");

    let options = rewrite_option(&command.params.options, "--outFileNamePrefix", &prefix);
    let options = rewrite_option(&options, "--readFilesIn", &reads);
    Formatted { options, arguments: command.params.arguments.clone() }
}

fn trim_galore(command: &Command, sample: &Sample) -> Formatted {
    let output_dir = output_dir(command, sample).display().to_string();
    Formatted {
        options: rewrite_option(&command.params.options, "--output_dir", &output_dir),
        arguments: input_reads(command, sample),
    }
}

fn kallisto_quant(command: &Command, sample: &Sample) -> Formatted {
    let output_dir = format!("{}_quant/{}", output_dir(command, sample).display(), sample.prefix);
    Formatted {
        options: rewrite_option(&command.params.options, "--output-dir", &output_dir),
        arguments: trimmed_reads(command, sample),
    }
}

/// Trimmed reads, then the configured reference arguments, then the sample name
fn rsem_calculate_expression(command: &Command, sample: &Sample) -> Formatted {
    let mut arguments = trimmed_reads(command, sample);
    arguments.extend(command.params.arguments.iter().cloned());
    arguments.push(output_dir(command, sample).join(&sample.prefix).display().to_string());
    Formatted { options: command.params.options.clone(), arguments }
}

fn fastqc(command: &Command, sample: &Sample) -> Formatted {
    Formatted {
        options: command.params.options.clone(),
        arguments: vec![input_reads(command, sample).join(" ")],
    }
}

fn samtools_index(command: &Command, sample: &Sample) -> Formatted {
    Formatted {
        options: command.params.options.clone(),
        arguments: trimmed_reads(command, sample),
    }
}
