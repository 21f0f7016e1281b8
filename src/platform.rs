use std::fmt;
use clap::ValueEnum;

/// Cluster scheduler the generated scripts are written for
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Platform {
    #[default]
    Slurm,
    Sge
}

impl Platform {
    /// File extension of the scheduler script
    pub fn extension(&self) -> &'static str {
        match self {
            Platform::Slurm => "slurm",
            Platform::Sge => "sge"
        }
    }
}

impl fmt::Display for Platform {
      fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Platform::Slurm => write!(f, "slurm"),
            Platform::Sge => write!(f, "sge")
        }
    }
}
