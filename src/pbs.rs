//! Render PBS array job scripts and submit them
//!
//! Tasks are split into array chunks, each chunk is rendered into one script with a `case` over
//! `$PBS_ARRAY_INDEX`, and every script is handed to qsub.

/// Directives written into the script header and how to call qsub
pub mod options;

/// Split tasks into array jobs PBS will accept
pub mod chunk;

/// Render array job scripts with TinyTemplate
pub mod script;

/// Write scripts to disk and run qsub
pub mod submit;

pub use options::{PbsOptions, SchedulerConfig};
pub use script::SubmissionScript;
pub use submit::{SubmissionResult, Submitter};
