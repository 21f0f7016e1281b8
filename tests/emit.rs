use std::fs;
use std::path::PathBuf;

use commander::error::JobError;
use commander::format::Registry;
use commander::params::{read_job, ParseMode};
use commander::platform::Platform;
use commander::preflight::preflight;
use commander::WorkingDirectory;

/// Parameter file, samples file, and output directory for one job
struct Fixture {
    inputs: tempfile::TempDir,
    out: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Fixture {
        Fixture { inputs: tempfile::tempdir().unwrap(), out: tempfile::tempdir().unwrap() }
    }

    fn samples(&self, reads: &[&str]) -> PathBuf {
        let path = self.inputs.path().join("samples.txt");
        let content: String = reads.iter().map(|r| format!("SAMPLE={}\n", r)).collect();
        fs::write(&path, content).unwrap();
        path
    }

    fn params(&self, filename: &str, content: &str) -> PathBuf {
        let path = self.inputs.path().join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    fn wd(&self) -> WorkingDirectory {
        WorkingDirectory { path: self.out.path().to_path_buf() }
    }

    fn read(&self, filename: &str) -> String {
        fs::read_to_string(self.out.path().join(filename)).unwrap()
    }
}

fn batch_command(name: &str, tool: &str, extra: &str) -> String {
    format!(
        "JOB_NAME={name}\nBATCH=true\nTASKS=1\nCPUS=4\nMEMORY=4000\nSINGULARITY_PATH=/containers\n\
         SINGULARITY_IMAGE={tool}.sif\nVOLUME=/data:/data\nCOMMAND={tool}\n{extra}END_COMMAND\n"
    )
}

fn count(content: &str, predicate: impl Fn(&str) -> bool) -> usize {
    content.lines().filter(|l| predicate(l)).count()
}

#[test]
fn test_batch_dispatches_every_sample_then_waits() {
    let fixture = Fixture::new();
    let samples = fixture.samples(&["s1_R1.fastq.gz s1_R2.fastq.gz", "s2_R1.fastq.gz s2_R2.fastq.gz", "s3_R1.fastq.gz"]);
    let params = format!(
        "SAMPLES_FILE={}\nSAMPLE_PATH=/raw\nANALYSIS_PATH=/analysis\nPI=smith\nEXPERIMENT=rnaseq\n{}",
        samples.display(),
        batch_command("align", "STAR", "OPTION=--runThreadN 4\nOPTION=--outFileNamePrefix x\nOPTION=--readFilesIn x\n")
    );
    let params = fixture.params("params.txt", &params);

    let job = read_job(&params, Platform::Slurm, ParseMode::Permissive).unwrap();
    let job_path = job.create(&fixture.wd(), &Registry::default()).unwrap();

    assert_eq!(job_path.path, fixture.out.path().join("align.slurm"));
    assert_eq!(job_path.scripts.len(), 3);

    let scheduler = fixture.read("align.slurm");
    assert_eq!(count(&scheduler, |l| l.ends_with(" &")), 3);
    assert_eq!(count(&scheduler, |l| l == "wait"), 1);
    assert!(scheduler.contains("srun --input=none -K1 -n1 -c4 --mem-per-cpu=4000 ./STAR_s1.sh &\n"));
    assert!(scheduler.contains("#SBATCH --job-name=align\n"));

    let script = fixture.read("STAR_s1.sh");
    assert!(script.starts_with("#!/bin/bash\n\nulimit -n 10000\n\n"));
    assert!(script.contains("--bind /data:/data \\\n"));
    assert!(script.contains("/containers/STAR.sif \\\n"));
    assert!(script.contains("--outFileNamePrefix /analysis/smith/rnaseq/analysis/STAR/s1_ \\\n"));
    assert!(script.contains("--readFilesIn /raw/smith/rnaseq/s1_R1.fastq.gz /raw/smith/rnaseq/s1_R2.fastq.gz\n"));

    let single = fixture.read("STAR_s3.sh");
    assert!(single.contains("--readFilesIn /raw/smith/rnaseq/s3_R1.fastq.gz\n"));
}

#[test]
fn test_pipeline_waits_after_every_stage() {
    let fixture = Fixture::new();
    let samples = fixture.samples(&["s1_R1.fastq.gz s1_R2.fastq.gz", "s2_R1.fastq.gz s2_R2.fastq.gz"]);
    let params = format!(
        "SAMPLES_FILE={}\nANALYSIS_PATH=/analysis\n{}{}CLEANUP=trim_galore rm tmp\n",
        samples.display(),
        batch_command("rnaseq", "trim_galore", "OPTION=--paired\nOPTION=--output_dir x\n"),
        batch_command("quant", "kallisto", "SUBCOMMAND=quant\nINPUT_FROM_STEP=trim_galore\nOPTION=--output-dir x\n"),
    );
    let params = fixture.params("pipeline.txt", &params);

    let job = read_job(&params, Platform::Slurm, ParseMode::Permissive).unwrap();
    let job_path = job.create(&fixture.wd(), &Registry::default()).unwrap();
    assert_eq!(job_path.scripts.len(), 4);

    let scheduler = fixture.read("rnaseq.slurm");
    assert_eq!(count(&scheduler, |l| l == "wait"), 2);
    assert_eq!(count(&scheduler, |l| l.ends_with(" &")), 4);

    let stage_two = scheduler.find("# Stage 2: kallisto quant").unwrap();
    let first_wait = scheduler.find("\nwait\n").unwrap();
    assert!(first_wait < stage_two);
    assert!(scheduler.find("./trim_galore_s2.sh &").unwrap() < first_wait);
    assert!(scheduler.find("./kallisto_s1.sh &").unwrap() > stage_two);
    assert!(scheduler.contains("# Cleanup\nrm -r /analysis/pi/experiment/analysis/trim_galore/tmp\n"));

    let quant = fixture.read("kallisto_s1.sh");
    let input = "/analysis/pi/experiment/analysis/trim_galore";
    assert!(quant.contains(&format!("{input}/s1_val_1.fq.gz \\\n{input}/s1_val_2.fq.gz\n")));
    assert!(quant.contains("--output-dir /analysis/pi/experiment/analysis/kallisto_quant/s1 \\\n"));
}

#[test]
fn test_samples_file_locations_reach_scripts() {
    let fixture = Fixture::new();
    let lane = fixture.inputs.path().join("lane2");
    let custom = fixture.inputs.path().join("custom");
    fs::create_dir_all(&lane).unwrap();
    fs::write(lane.join("s1_R1.fastq.gz"), b"").unwrap();

    let samples = fixture.inputs.path().join("samples.txt");
    fs::write(
        &samples,
        format!("SAMPLE_PATH={}\nOUTPUT_PATH={}\nSAMPLE=s1_R1.fastq.gz\n", lane.display(), custom.display()),
    )
    .unwrap();
    let params = format!(
        "SAMPLES_FILE={}\nANALYSIS_PATH={}\n{}{}",
        samples.display(),
        fixture.inputs.path().join("analysis").display(),
        batch_command("rnaseq", "trim_galore", "OPTION=--output_dir x\n"),
        batch_command("quant", "kallisto", "SUBCOMMAND=quant\nINPUT_FROM_STEP=trim_galore\nOPTION=--output-dir x\n"),
    );
    let params = fixture.params("params.txt", &params);

    let job = read_job(&params, Platform::Slurm, ParseMode::Permissive).unwrap();
    preflight(&job).unwrap();
    assert!(custom.join("trim_galore").is_dir());
    assert!(custom.join("kallisto").is_dir());

    job.create(&fixture.wd(), &Registry::default()).unwrap();

    let trim = fixture.read("trim_galore_s1.sh");
    assert!(trim.contains(&format!("--output_dir {} \\\n", custom.join("trim_galore").display())));
    assert!(trim.contains(&format!("{}\n", lane.join("s1_R1.fastq.gz").display())));

    let quant = fixture.read("kallisto_s1.sh");
    assert!(quant.contains(&format!("--output-dir {}_quant/s1 \\\n", custom.join("kallisto").display())));
    assert!(quant.contains(&custom.join("trim_galore/s1_trimmed.fq.gz").display().to_string()));
}

#[cfg(unix)]
#[test]
fn test_pipeline_with_single_script_stage() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = Fixture::new();
    let samples = fixture.samples(&["s1_R1.fastq.gz", "s2_R1.fastq.gz"]);
    let params = format!(
        "SAMPLES_FILE={}\n{}JOB_NAME=index\nBATCH=false\nTASKS=1\nCPUS=2\nSINGULARITY_IMAGE=multiqc.sif\n\
         COMMAND=multiqc\nARGUMENT=/analysis\nEND_COMMAND\n",
        samples.display(),
        batch_command("qc", "fastqc", ""),
    );
    let params = fixture.params("params.txt", &params);

    let job = read_job(&params, Platform::Slurm, ParseMode::Permissive).unwrap();
    let job_path = job.create(&fixture.wd(), &Registry::default()).unwrap();
    assert_eq!(job_path.scripts.len(), 3);

    let scheduler = fixture.read("qc.slurm");
    assert_eq!(count(&scheduler, |l| l == "wait"), 2);
    assert_eq!(count(&scheduler, |l| l.ends_with(" &")), 2);
    assert!(scheduler.contains("srun --input=none -K1 -n1 -c2 ./multiqc.sh\nwait\n"));
    assert!(scheduler.find("./fastqc_s2.sh &").unwrap() < scheduler.find("./multiqc.sh").unwrap());

    let script = fixture.out.path().join("multiqc.sh");
    assert_eq!(job_path.scripts.last(), Some(&script));
    assert_eq!(fs::metadata(&script).unwrap().permissions().mode() & 0o777, 0o755);
    assert!(fixture.read("multiqc.sh").contains("multiqc.sif \\\nmultiqc \\\n/analysis\n"));
}

#[cfg(unix)]
#[test]
fn test_shell_scripts_are_executable() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = Fixture::new();
    let samples = fixture.samples(&["s1_R1.fastq.gz"]);
    let params = format!("SAMPLES_FILE={}\n{}", samples.display(), batch_command("qc", "fastqc", ""));
    let params = fixture.params("params.txt", &params);

    let job = read_job(&params, Platform::Slurm, ParseMode::Permissive).unwrap();
    let job_path = job.create(&fixture.wd(), &Registry::default()).unwrap();

    for script in &job_path.scripts {
        let mode = fs::metadata(script).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755, "{}", script.display());
    }
}

#[test]
fn test_single_command_is_inlined() {
    let fixture = Fixture::new();
    let params = fixture.params(
        "index.txt",
        "JOB_NAME=index\nTASKS=1\nCPUS=2\nMEMORY=2000\nSINGULARITY_PATH=/containers\nSINGULARITY_IMAGE=samtools.sif\n\
         COMMAND=samtools\nSUBCOMMAND=faidx\nARGUMENT=/ref/genome.fa\n",
    );

    let job = read_job(&params, Platform::Slurm, ParseMode::Permissive).unwrap();
    let job_path = job.create(&fixture.wd(), &Registry::default()).unwrap();
    assert!(job_path.scripts.is_empty());

    let scheduler = fixture.read("index.slurm");
    assert!(scheduler.contains("#SBATCH --ntasks=1\n"));
    assert!(scheduler.contains("#SBATCH --mem=2000\n"));
    assert!(scheduler.contains("singularity run \\\n/containers/samtools.sif \\\nsamtools faidx \\\n/ref/genome.fa\n"));
    assert!(!scheduler.contains("srun"));
    assert_eq!(count(&scheduler, |l| l == "wait"), 0);
}

#[test]
fn test_sge_job() {
    let fixture = Fixture::new();
    let samples = fixture.samples(&["s1_R1.fastq.gz", "s2_R1.fastq.gz"]);
    let params = format!(
        "SAMPLES_FILE={}\nQUEUE=all.q\nSHELL=/bin/bash\nPARALLEL_ENVIRONMENT=smp\nSGE_MEMORY=8G\nJOIN_OUTPUT=true\n{}",
        samples.display(),
        batch_command("qc", "fastqc", "")
    );
    let params = fixture.params("params.txt", &params);

    let job = read_job(&params, Platform::Sge, ParseMode::Permissive).unwrap();
    let job_path = job.create(&fixture.wd(), &Registry::default()).unwrap();
    assert_eq!(job_path.path, fixture.out.path().join("qc.sge"));

    let scheduler = fixture.read("qc.sge");
    assert!(scheduler.contains("#$ -N qc\n"));
    assert!(scheduler.contains("#$ -q all.q\n"));
    assert!(scheduler.contains("#$ -pe smp 4\n"));
    assert!(scheduler.contains("qrsh -now no -cwd -V -pe smp 4 -l h_vmem=4000M ./fastqc_s2.sh &\n"));
    assert!(!scheduler.contains("#SBATCH"));
}

#[test]
fn test_json_job() {
    let fixture = Fixture::new();
    let samples = fixture.samples(&["s1_R1.fastq.gz s1_R2.fastq.gz"]);
    let params = serde_json::json!({
        "job_details": { "job_name": "trim" },
        "slurm_preamble": {
            "wall_time": "02:00:00",
            "partition": "short",
            "email_begin": false,
            "email_end": true,
            "email_fail": true,
            "email_address": "someone@example.org"
        },
        "misc_preamble": ["#SBATCH --account=lab"],
        "experiment_details": {
            "pi": "smith",
            "experiment": "rnaseq",
            "sample_path": "/raw",
            "analysis_path": "/analysis",
            "samples_file": samples
        },
        "commands": [{
            "batch": true,
            "command": "trim_galore",
            "tasks": 1,
            "cpus": 2.0,
            "memory": 1000,
            "volumes": [{ "host_path": "/data", "container_path": "/mnt" }],
            "singularity_path": "/containers",
            "singularity_image": "trim_galore.sif",
            "options": ["--paired", "--output_dir x"]
        }]
    });
    let params = fixture.params("params.json", &params.to_string());

    let job = read_job(&params, Platform::Slurm, ParseMode::Permissive).unwrap();
    job.create(&fixture.wd(), &Registry::default()).unwrap();

    let scheduler = fixture.read("trim.slurm");
    assert!(scheduler.contains("#SBATCH --partition=short\n"));
    assert!(scheduler.contains("#SBATCH --mail-type=END,FAIL\n"));
    assert!(scheduler.contains("#SBATCH --time=02:00:00\n"));
    assert!(scheduler.contains("#SBATCH --account=lab\n"));
    assert!(scheduler.contains("-c2 --mem-per-cpu=1000 ./trim_galore_s1.sh &\n"));

    let script = fixture.read("trim_galore_s1.sh");
    assert!(script.contains("--bind /data:/mnt \\\n"));
    assert!(script.contains("--output_dir /analysis/smith/rnaseq/analysis/trim_galore \\\n"));
    assert!(script.contains("/raw/smith/rnaseq/s1_R1.fastq.gz \\\n/raw/smith/rnaseq/s1_R2.fastq.gz\n"));
}

#[test]
fn test_json_missing_command_writes_nothing() {
    let fixture = Fixture::new();
    let params = serde_json::json!({
        "job_details": { "job_name": "trim" },
        "slurm_preamble": {
            "wall_time": "02:00:00",
            "partition": "short",
            "email_begin": false,
            "email_end": false,
            "email_fail": false,
            "email_address": ""
        },
        "commands": [{
            "batch": false,
            "tasks": 1,
            "cpus": 1,
            "memory": 1000,
            "volumes": [],
            "singularity_path": "/containers",
            "singularity_image": "tool.sif"
        }]
    });
    let params = fixture.params("params.json", &params.to_string());

    let err = read_job(&params, Platform::Slurm, ParseMode::Permissive).unwrap_err();
    assert!(matches!(err, JobError::MissingParameter("command")));
    assert_eq!(err.to_string(), "JSON error: Missing parameter \"command\"");
    assert_eq!(fs::read_dir(fixture.out.path()).unwrap().count(), 0);
}

#[test]
fn test_batch_without_samples_file() {
    let fixture = Fixture::new();
    let params = fixture.params("params.txt", &batch_command("qc", "fastqc", ""));

    let err = read_job(&params, Platform::Slurm, ParseMode::Permissive).unwrap_err();
    assert!(matches!(err, JobError::NoSamplesFile(ref command) if command == "fastqc"));
}

#[test]
fn test_missing_output_directory() {
    let fixture = Fixture::new();
    let params = fixture.params(
        "params.txt",
        "JOB_NAME=index\nSINGULARITY_IMAGE=samtools.sif\nCOMMAND=samtools\n",
    );
    let job = read_job(&params, Platform::Slurm, ParseMode::Permissive).unwrap();

    let wd = WorkingDirectory { path: PathBuf::from("/nonexistent/commander/out") };
    let err = job.create(&wd, &Registry::default()).unwrap_err();
    assert!(matches!(err, JobError::Write { .. }));
}
