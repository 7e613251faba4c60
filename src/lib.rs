//! Submit PBS array jobs from lists of argument tuples
//!
//! Every tuple becomes one array task running `COMMAND ARG1 ARG2 ...`. The subjob itself never
//! needs to know about `$PBS_ARRAY_INDEX`: the generated script maps the index back to the
//! arguments before calling the program.

/// Argument sets and the JSON files they are read from
pub mod request;

/// Render PBS array job scripts and submit them with qsub
pub mod pbs;

/// Run every task on this machine instead of submitting
pub mod local;

pub mod mode;

pub mod error;

pub use error::SubmitError;
pub use pbs::{PbsOptions, SchedulerConfig, SubmissionResult, Submitter};
pub use request::argument_set::{Argument, ArgumentSet, CommandTemplate};
