use crate::platform::Platform;

/// Email notification settings shared by both schedulers
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Notifications {
    pub begin: bool,
    pub end: bool,
    pub fail: bool,
    pub email_address: String,
}

impl Notifications {
    /// Slurm `--mail-type` value, e.g. `BEGIN,FAIL`, or `NONE` if nothing is set
    pub fn mail_type(&self) -> String {
        let types: Vec<&str> = [(self.begin, "BEGIN"), (self.end, "END"), (self.fail, "FAIL")]
            .into_iter()
            .filter_map(|(set, name)| set.then_some(name))
            .collect();

        match types.is_empty() {
            true => "NONE".to_string(),
            false => types.join(","),
        }
    }

    /// SGE `-m` value: a combination of `b`, `e`, `a`, or `n` for none
    pub fn mail_options(&self) -> String {
        let options: String = [(self.begin, 'b'), (self.end, 'e'), (self.fail, 'a')]
            .into_iter()
            .filter_map(|(set, flag)| set.then_some(flag))
            .collect();

        match options.is_empty() {
            true => "n".to_string(),
            false => options,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SlurmPreamble {
    pub partition: String,
    pub wall_time: String,
    pub notifications: Notifications,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SgePreamble {
    pub queue: String,
    pub wall_time: String,
    pub notifications: Notifications,
    pub current_directory: bool,
    pub join_output: bool,
    pub shell: String,
    pub parallel_environment: String,
    pub memory: String,
}

/// Scheduler-level directives, exactly one per job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preamble {
    Slurm(SlurmPreamble),
    Sge(SgePreamble),
}

impl Preamble {
    /// An empty preamble for the selected platform
    pub fn new(platform: Platform) -> Preamble {
        match platform {
            Platform::Slurm => Preamble::Slurm(SlurmPreamble::default()),
            Platform::Sge => Preamble::Sge(SgePreamble::default()),
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            Preamble::Slurm(_) => Platform::Slurm,
            Preamble::Sge(_) => Platform::Sge,
        }
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        match self {
            Preamble::Slurm(p) => &mut p.notifications,
            Preamble::Sge(p) => &mut p.notifications,
        }
    }

    pub fn wall_time(&self) -> &str {
        match self {
            Preamble::Slurm(p) => &p.wall_time,
            Preamble::Sge(p) => &p.wall_time,
        }
    }

    pub fn set_wall_time(&mut self, wall_time: String) {
        match self {
            Preamble::Slurm(p) => p.wall_time = wall_time,
            Preamble::Sge(p) => p.wall_time = wall_time,
        }
    }

    /// Slurm partition or SGE queue
    pub fn set_queue(&mut self, queue: String) {
        match self {
            Preamble::Slurm(p) => p.partition = queue,
            Preamble::Sge(p) => p.queue = queue,
        }
    }

    /// Mutable access to SGE-only settings, `None` on Slurm
    pub fn sge_mut(&mut self) -> Option<&mut SgePreamble> {
        match self {
            Preamble::Sge(p) => Some(p),
            Preamble::Slurm(_) => None,
        }
    }
}
