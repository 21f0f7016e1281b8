//! Plain text parameter tags
//!
//! Every recognised tag maps to the model field it updates and how its value is coerced, so
//! supporting a new tag means adding a row to [TAGS].

/// Which part of the job a tag belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    /// Batch mode and the samples file
    Batch,
    /// Scheduler directives, one set per file
    Scheduler,
    /// Resource request of the current command
    CommandPreamble,
    /// Container and command line of the current command
    CommandParams,
    /// Experiment layout
    Experiment,
    /// Job-wide settings: display name, passthrough preamble, cleanup, block delimiter
    Job,
}

/// How a raw value is turned into a typed one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coerce {
    Bool,
    Int,
    Text,
    /// Text appended to an ordered list, repeats keep their order
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Batch,
    SamplesFile,
    Queue,
    NotifyBegin,
    NotifyEnd,
    NotifyFail,
    EmailAddress,
    WallTime,
    Shell,
    ParallelEnvironment,
    CurrentDirectory,
    JoinOutput,
    SgeMemory,
    JobName,
    Tasks,
    Cpus,
    Memory,
    Time,
    ContainerPath,
    ContainerImage,
    WorkDir,
    Volume,
    Command,
    Subcommand,
    InputFromStep,
    Option,
    Argument,
    Pi,
    Experiment,
    AnalysisId,
    SamplePath,
    AnalysisPath,
    WorkingDir,
    Name,
    Misc,
    Cleanup,
    EndCommand,
}

#[derive(Debug)]
pub struct Tag {
    pub name: &'static str,
    pub class: TagClass,
    pub field: Field,
    pub coerce: Coerce,
}

impl Tag {
    /// Whether the tag writes to the command currently being built
    pub fn is_command_scoped(&self) -> bool {
        matches!(self.class, TagClass::CommandPreamble | TagClass::CommandParams) || self.field == Field::Batch
    }
}

const fn tag(name: &'static str, class: TagClass, field: Field, coerce: Coerce) -> Tag {
    Tag { name, class, field, coerce }
}

pub static TAGS: &[Tag] = &[
    tag("BATCH", TagClass::Batch, Field::Batch, Coerce::Bool),
    tag("SAMPLES_FILE", TagClass::Batch, Field::SamplesFile, Coerce::Text),

    tag("PARTITION", TagClass::Scheduler, Field::Queue, Coerce::Text),
    tag("QUEUE", TagClass::Scheduler, Field::Queue, Coerce::Text),
    tag("NOTIFICATION_BEGIN", TagClass::Scheduler, Field::NotifyBegin, Coerce::Bool),
    tag("NOTIFICATION_END", TagClass::Scheduler, Field::NotifyEnd, Coerce::Bool),
    tag("NOTIFICATION_FAIL", TagClass::Scheduler, Field::NotifyFail, Coerce::Bool),
    tag("NOTIFICATION_EMAIL", TagClass::Scheduler, Field::EmailAddress, Coerce::Text),
    tag("EMAIL_BEGIN", TagClass::Scheduler, Field::NotifyBegin, Coerce::Bool),
    tag("EMAIL_END", TagClass::Scheduler, Field::NotifyEnd, Coerce::Bool),
    tag("EMAIL_FAIL", TagClass::Scheduler, Field::NotifyFail, Coerce::Bool),
    tag("EMAIL_ADDRESS", TagClass::Scheduler, Field::EmailAddress, Coerce::Text),
    tag("WALL_TIME", TagClass::Scheduler, Field::WallTime, Coerce::Text),
    tag("SHELL", TagClass::Scheduler, Field::Shell, Coerce::Text),
    tag("PARALLEL_ENVIRONMENT", TagClass::Scheduler, Field::ParallelEnvironment, Coerce::Text),
    tag("CURRENT_DIRECTORY", TagClass::Scheduler, Field::CurrentDirectory, Coerce::Bool),
    tag("JOIN_OUTPUT", TagClass::Scheduler, Field::JoinOutput, Coerce::Bool),
    tag("SGE_MEMORY", TagClass::Scheduler, Field::SgeMemory, Coerce::Text),

    tag("JOB_NAME", TagClass::CommandPreamble, Field::JobName, Coerce::Text),
    tag("TASKS", TagClass::CommandPreamble, Field::Tasks, Coerce::Int),
    tag("CPUS", TagClass::CommandPreamble, Field::Cpus, Coerce::Int),
    tag("MEMORY", TagClass::CommandPreamble, Field::Memory, Coerce::Int),
    tag("TIME", TagClass::CommandPreamble, Field::Time, Coerce::Text),

    tag("SINGULARITY_PATH", TagClass::CommandParams, Field::ContainerPath, Coerce::Text),
    tag("SINGULARITY_IMAGE", TagClass::CommandParams, Field::ContainerImage, Coerce::Text),
    tag("WORK_DIR", TagClass::CommandParams, Field::WorkDir, Coerce::Text),
    tag("VOLUME", TagClass::CommandParams, Field::Volume, Coerce::Append),
    tag("COMMAND", TagClass::CommandParams, Field::Command, Coerce::Text),
    tag("SUBCOMMAND", TagClass::CommandParams, Field::Subcommand, Coerce::Text),
    tag("INPUT_FROM_STEP", TagClass::CommandParams, Field::InputFromStep, Coerce::Text),
    tag("OPTION", TagClass::CommandParams, Field::Option, Coerce::Append),
    tag("ARGUMENT", TagClass::CommandParams, Field::Argument, Coerce::Append),

    tag("PI", TagClass::Experiment, Field::Pi, Coerce::Text),
    tag("EXPERIMENT", TagClass::Experiment, Field::Experiment, Coerce::Text),
    tag("ANALYSIS_ID", TagClass::Experiment, Field::AnalysisId, Coerce::Text),
    tag("SAMPLE_PATH", TagClass::Experiment, Field::SamplePath, Coerce::Text),
    tag("ANALYSIS_PATH", TagClass::Experiment, Field::AnalysisPath, Coerce::Text),
    tag("WORKING_DIR", TagClass::Experiment, Field::WorkingDir, Coerce::Text),

    tag("NAME", TagClass::Job, Field::Name, Coerce::Text),
    tag("MISC", TagClass::Job, Field::Misc, Coerce::Append),
    tag("CLEANUP", TagClass::Job, Field::Cleanup, Coerce::Append),
    tag("END_COMMAND", TagClass::Job, Field::EndCommand, Coerce::Text),
];

pub fn lookup(name: &str) -> Option<&'static Tag> {
    TAGS.iter().find(|t| t.name == name)
}

/// A coerced tag value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(u32),
    Text(String),
}

impl Value {
    pub fn into_text(self) -> String {
        match self {
            Value::Text(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
        }
    }

    pub fn as_bool(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    pub fn as_int(&self) -> u32 {
        match self {
            Value::Int(i) => *i,
            _ => 0,
        }
    }
}

impl Coerce {
    /// Coerce a raw value, `None` if it isn't a valid literal for this kind
    pub fn apply(&self, raw: &str) -> Option<Value> {
        match self {
            Coerce::Bool => parse_bool(raw).map(Value::Bool),
            Coerce::Int => raw.trim().parse::<u32>().ok().map(Value::Int),
            Coerce::Text | Coerce::Append => Some(Value::Text(raw.to_string())),
        }
    }

    /// Value used when a raw value can't be coerced
    pub fn zero(&self) -> Value {
        match self {
            Coerce::Bool => Value::Bool(false),
            Coerce::Int => Value::Int(0),
            Coerce::Text | Coerce::Append => Value::Text(String::new()),
        }
    }
}

/// `1`, `t`, `T`, `TRUE`, `true`, `True` and their false counterparts
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_names_are_unique() {
        for (i, tag) in TAGS.iter().enumerate() {
            assert!(TAGS[i + 1..].iter().all(|t| t.name != tag.name), "duplicate tag {}", tag.name);
        }
    }

    #[test]
    fn test_lookup() {
        let tag = lookup("CPUS").unwrap();
        assert_eq!(tag.field, Field::Cpus);
        assert_eq!(tag.coerce, Coerce::Int);
        assert!(tag.is_command_scoped());

        assert!(lookup("BATCH").unwrap().is_command_scoped());
        assert!(!lookup("SAMPLES_FILE").unwrap().is_command_scoped());
        assert!(!lookup("PARTITION").unwrap().is_command_scoped());
        assert!(lookup("cpus").is_none());
    }

    #[test]
    fn test_coerce() {
        assert_eq!(Coerce::Bool.apply("True"), Some(Value::Bool(true)));
        assert_eq!(Coerce::Bool.apply("0"), Some(Value::Bool(false)));
        assert_eq!(Coerce::Bool.apply("yes"), None);
        assert_eq!(Coerce::Int.apply("16"), Some(Value::Int(16)));
        assert_eq!(Coerce::Int.apply("16G"), None);
        assert_eq!(Coerce::Int.apply("-1"), None);
        assert_eq!(Coerce::Int.zero(), Value::Int(0));
    }
}
