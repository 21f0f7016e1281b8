use std::path::{Path, PathBuf};

pub const DEFAULT_PI: &str = "pi";
pub const DEFAULT_EXPERIMENT: &str = "experiment";
pub const DEFAULT_ANALYSIS_ID: &str = "analysis";
pub const DEFAULT_SAMPLE_PATH: &str = "samples";
pub const DEFAULT_ANALYSIS_PATH: &str = "analysis";

/// Read file extensions removed when deriving a sample prefix, longest first
const READ_EXTENSIONS: [&str; 6] = [".fastq.gz", ".fq.gz", ".fastq.bz2", ".fq.bz2", ".fastq", ".fq"];

/// Describes where an experiment's raw data lives and where its analysis is written
///
/// Raw reads are expected under `{sample_path}/{pi}/{name}` and every tool writes to
/// `{analysis_path}/{pi}/{name}/{analysis_id}/{tool}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Experiment {
    pub pi: String,
    pub name: String,
    pub analysis_id: String,
    pub sample_path: PathBuf,
    pub analysis_path: PathBuf,
    pub working_directory: Option<PathBuf>,
    pub samples_file: Option<PathBuf>,
    pub samples: Vec<Sample>,
}

impl Default for Experiment {
    fn default() -> Self {
        Experiment {
            pi: DEFAULT_PI.to_string(),
            name: DEFAULT_EXPERIMENT.to_string(),
            analysis_id: DEFAULT_ANALYSIS_ID.to_string(),
            sample_path: PathBuf::from(DEFAULT_SAMPLE_PATH),
            analysis_path: PathBuf::from(DEFAULT_ANALYSIS_PATH),
            working_directory: None,
            samples_file: None,
            samples: Vec::new(),
        }
    }
}

impl Experiment {
    pub fn raw_sample_path(&self) -> PathBuf {
        self.sample_path.join(&self.pi).join(&self.name)
    }

    pub fn analysis_path(&self) -> PathBuf {
        self.analysis_path.join(&self.pi).join(&self.name).join(&self.analysis_id)
    }

    /// Output directory of a tool
    pub fn tool_path(&self, tool: &str) -> PathBuf {
        self.analysis_path().join(tool)
    }
}

/// One sequencing unit: a forward read file and an optional reverse read file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub path: PathBuf,
    pub output_path: PathBuf,
    pub prefix: String,
    pub forward_read_file: String,
    pub reverse_read_file: String,
}

impl Sample {
    pub fn new(forward: &str, reverse: Option<&str>, path: &Path, output_path: &Path) -> Sample {
        Sample {
            path: path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            prefix: sample_prefix(forward),
            forward_read_file: forward.to_string(),
            reverse_read_file: reverse.unwrap_or_default().to_string(),
        }
    }

    pub fn is_paired(&self) -> bool {
        !self.reverse_read_file.is_empty()
    }

    /// Read file names, forward first
    pub fn read_files(&self) -> Vec<&str> {
        let mut files = vec![self.forward_read_file.as_str()];
        if self.is_paired() {
            files.push(&self.reverse_read_file);
        }
        files
    }

    /// Read files under the sample's own root path
    pub fn read_paths(&self) -> Vec<PathBuf> {
        self.read_files().into_iter().map(|f| self.path.join(f)).collect()
    }
}

/// Derive a sample prefix from a forward read file name
///
/// `sampleA_R1.fastq.gz` and `sampleA_R1_001.fastq.gz` both become `sampleA`.
pub fn sample_prefix(read_file: &str) -> String {
    let filename = read_file.rsplit('/').next().unwrap_or(read_file);
    let stem = READ_EXTENSIONS
        .iter()
        .find_map(|ext| filename.strip_suffix(ext))
        .unwrap_or(filename);

    match stem.rfind("_R") {
        Some(i) if i > 0 => stem[..i].to_string(),
        _ => stem.to_string(),
    }
}
