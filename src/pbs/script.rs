use std::io::Write;
use std::path::Path;

use chrono::Utc;
use log::info;
use serde::Serialize;
use tempfile::NamedTempFile;
use tinytemplate::TinyTemplate;

use crate::error::SubmitError;
use crate::pbs::chunk::{ArrayChunk, Task};
use crate::pbs::options::PbsOptions;

/// included array job template
static ARRAY_JOB: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/array_job.txt"));

/// A rendered array job script, ready to be written and passed to qsub
///
/// The header carries the `#PBS` directives (`-J` only for chunks of two or more tasks). The body
/// changes to the working directory, echoes the task's arguments into the job log and runs the
/// task matching `$PBS_ARRAY_INDEX`.
#[derive(Clone, Debug)]
pub struct SubmissionScript {
    pub chunk: ArrayChunk,
    pub content: String,
}

/// Rendering context for the array job template
#[derive(Serialize)]
struct ScriptContext<'a> {
    time_now: String,
    name: &'a str,
    project: Option<&'a str>,
    queue: &'a str,
    log_dir: String,
    select: u32,
    ncpus: u32,
    mem: &'a str,
    walltime: &'a str,
    array_range: Option<String>,
    first_index: usize,
    workdir: &'a str,
    tasks: &'a [Task],
}

impl SubmissionScript {
    /// Render one chunk with TinyTemplate
    pub fn render(options: &PbsOptions, output_dir: &Path, chunk: ArrayChunk) -> Result<Self, SubmitError> {
        let mut tt = TinyTemplate::new();
        // commands are shell text, not HTML
        tt.set_default_formatter(&tinytemplate::format_unescaped);
        tt.add_template("array_job", ARRAY_JOB)?;

        let context = ScriptContext {
            time_now: Utc::now().to_rfc3339(),
            name: &options.name,
            project: options.project.as_deref(),
            queue: &options.queue,
            log_dir: output_dir.join("job").display().to_string(),
            select: options.select,
            ncpus: options.ncpus,
            mem: &options.mem,
            walltime: &options.walltime,
            array_range: chunk.array_range(),
            first_index: chunk.first_index(),
            workdir: options.workdir(),
            tasks: &chunk.tasks,
        };
        let content = tt.render("array_job", &context)?;

        Ok(SubmissionScript { chunk, content })
    }

    /// Command lines in array index order, before shell quoting
    pub fn task_lines(&self) -> Vec<&str> {
        self.chunk.tasks.iter().map(|task| task.command.line.as_str()).collect()
    }

    /// Write the script to a fresh file in `dir`, deleted when the returned handle is dropped
    pub fn write(&self, dir: &Path) -> Result<NamedTempFile, SubmitError> {
        let mut file = tempfile::Builder::new()
            .prefix("array-")
            .suffix(".pbs")
            .tempfile_in(dir)
            .map_err(|source| SubmitError::script_write(dir, source))?;
        info!("Writing array job script to {}", file.path().display());

        let path = file.path().to_path_buf();
        file.write_all(self.content.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| SubmitError::script_write(path, source))?;

        Ok(file)
    }
}
