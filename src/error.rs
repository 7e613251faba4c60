use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a submission
///
/// Errors are terminal: nothing is retried and already submitted chunks are left alone.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("can't write submission script {}: {source}", .path.display())]
    ScriptWriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("can't render submission script: {0}")]
    Render(#[from] tinytemplate::error::Error),

    #[error("`{command}` failed: {reason}")]
    SubmissionError { command: String, reason: String },

    #[error("can't run local task `{command}`: {source}")]
    LocalRun {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl SubmitError {
    pub(crate) fn script_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SubmitError::ScriptWriteError { path: path.into(), source }
    }
}
