use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use log::{debug, info, warn};
use rand::seq::SliceRandom;

use crate::error::SubmitError;
use crate::pbs::chunk::{chunk_commands, TaskCommand};
use crate::pbs::options::{PbsOptions, SchedulerConfig};
use crate::pbs::script::SubmissionScript;
use crate::request::argument_set::{shell_quote, ArgumentSet, CommandTemplate};

/// Job identifiers printed by qsub, one per array chunk in submission order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionResult {
    pub job_ids: Vec<String>,
    pub task_count: usize,
}

/// Turns a command template and argument sets into submitted PBS array jobs
pub struct Submitter {
    options: PbsOptions,
    scheduler: SchedulerConfig,
}

impl Submitter {
    pub fn new(options: PbsOptions, scheduler: SchedulerConfig) -> Self {
        Submitter { options, scheduler }
    }

    /// Render every array chunk without touching the filesystem
    pub fn render(&self, template: &CommandTemplate, sets: &ArgumentSet) -> Result<Vec<SubmissionScript>, SubmitError> {
        self.options.validate()?;
        let output_dir = self.options.output_dir(template)?;

        let mut commands = task_commands(template, sets, &self.options, &output_dir)?;
        if self.options.shuffle {
            info!("Shuffling {} tasks before chunking", commands.len());
            commands.shuffle(&mut rand::rng());
        }

        chunk_commands(commands, self.options.max_array_size)
            .into_iter()
            .map(|chunk| SubmissionScript::render(&self.options, &output_dir, chunk))
            .collect()
    }

    /// Write one script per array chunk and submit each with qsub
    ///
    /// Stops at the first failure. Chunks submitted before it stay queued.
    pub fn submit(&self, template: &CommandTemplate, sets: &ArgumentSet) -> Result<SubmissionResult, SubmitError> {
        let scripts = self.render(template, sets)?;
        let job_dir = self.options.output_dir(template)?.join("job");
        fs::create_dir_all(&job_dir).map_err(|source| SubmitError::script_write(&job_dir, source))?;

        info!("Submitting {} subjobs in {} array jobs", sets.len(), scripts.len());
        let mut job_ids = Vec::with_capacity(scripts.len());
        for script in &scripts {
            let file = script.write(&job_dir)?;
            let job_id = self.run_qsub(file.path())?;
            info!("PBS job id: {job_id} (tasks {}-{})", script.chunk.first_index(), script.chunk.last_index());

            if self.options.keep_script {
                let path = file.path().to_path_buf();
                file.keep().map_err(|err| SubmitError::script_write(path, err.error))?;
            }
            job_ids.push(job_id);
        }

        Ok(SubmissionResult { job_ids, task_count: sets.len() })
    }

    fn run_qsub(&self, script_path: &Path) -> Result<String, SubmitError> {
        let mut qsub = Command::new(&self.scheduler.qsub);
        let cmd = qsub.args(&self.scheduler.qsub_args).arg(script_path);
        let command = describe(&self.scheduler, script_path);
        info!("Running qsub process");
        debug!("{:?}", &cmd);

        let output = cmd.output().map_err(|err| {
            warn!("Can't start {}: {}", self.scheduler.qsub.display(), err);
            SubmitError::SubmissionError { command: command.clone(), reason: err.to_string() }
        })?;
        let output = check_command_output(output)
            .map_err(|reason| SubmitError::SubmissionError { command: command.clone(), reason })?;

        let job_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if job_id.is_empty() {
            return Err(SubmitError::SubmissionError { command, reason: "no job id on stdout".to_string() });
        }
        Ok(job_id)
    }
}

/// One command per argument tuple, in tuple order
pub(crate) fn task_commands(
    template: &CommandTemplate,
    sets: &ArgumentSet,
    options: &PbsOptions,
    output_dir: &Path,
) -> Result<Vec<TaskCommand>, SubmitError> {
    sets.iter()
        .map(|args| {
            let mut line = template.render(args);
            let mut shell = template.render_shell(args)?;
            let mut shown: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
            if options.append_output_dir {
                let dir = format!("{}/", output_dir.display());
                line = format!("{line} {dir}");
                shell = format!("{shell} {}", shell_quote(&dir)?);
                shown.push(dir);
            }
            let banner = shell_quote(&format!("pbs_array_args = {}", shown.join(" ")))?.into_owned();
            Ok(TaskCommand { line, shell, banner })
        })
        .collect()
}

fn check_command_output(output: Output) -> Result<Output, String> {
    let status = output.status;
    if !status.success() {
        return Err(format!(
            "{}\nstderr: {}\nstdout: {}",
            status,
            String::from_utf8_lossy(&output.stderr).trim(),
            String::from_utf8_lossy(&output.stdout).trim()
        ));
    }
    Ok(output)
}

fn describe(scheduler: &SchedulerConfig, script_path: &Path) -> String {
    let mut parts: Vec<String> = vec![scheduler.qsub.display().to_string()];
    parts.extend(scheduler.qsub_args.iter().cloned());
    parts.push(script_path.display().to_string());
    parts.join(" ")
}
