use std::fmt;
use clap::ValueEnum;

/// What to do with the rendered tasks
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum ExecutionMode {
    /// Submit array jobs with qsub
    #[default]
    Pbs,
    /// Run each task sequentially in this process
    Local,
    /// Print the rendered scripts and stop
    DryRun,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExecutionMode::Pbs => write!(f, "pbs"),
            ExecutionMode::Local => write!(f, "local"),
            ExecutionMode::DryRun => write!(f, "dry-run")
        }
    }
}
