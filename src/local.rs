//! Run every task sequentially on this machine
//!
//! Intended for debugging a command template before submitting it: each task runs in its own
//! `bash` after changing to the working directory, echoing its arguments first, with the same
//! command line PBS would run.

use std::fs;
use std::process::Command;

use log::{info, warn};

use crate::error::SubmitError;
use crate::pbs::chunk::TaskCommand;
use crate::pbs::options::PbsOptions;
use crate::pbs::submit::task_commands;
use crate::request::argument_set::{ArgumentSet, CommandTemplate};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LocalReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Run all tasks in order, counting failures instead of stopping at the first one
///
/// Only a task that can't be started at all (no `bash`) is an error.
pub fn run_local(
    template: &CommandTemplate,
    sets: &ArgumentSet,
    options: &PbsOptions,
) -> Result<LocalReport, SubmitError> {
    options.validate()?;
    let output_dir = options.output_dir(template)?;
    if options.append_output_dir {
        fs::create_dir_all(&output_dir).map_err(|source| SubmitError::script_write(&output_dir, source))?;
    }
    let workdir = options.workdir.as_deref().unwrap_or(".");

    let mut report = LocalReport::default();
    for (index, command) in task_commands(template, sets, options, &output_dir)?.iter().enumerate() {
        info!("Running task {index}: {}", command.line);
        let status = Command::new("bash")
            .arg("-c")
            .arg(local_script(workdir, command))
            .status()
            .map_err(|source| SubmitError::LocalRun { command: command.line.clone(), source })?;

        if status.success() {
            report.succeeded += 1;
        } else {
            warn!("Task {index} failed with {status}");
            report.failed += 1;
        }
    }

    info!("{} tasks succeeded, {} failed", report.succeeded, report.failed);
    Ok(report)
}

/// Same body as one `case` arm of the PBS script
fn local_script(workdir: &str, command: &TaskCommand) -> String {
    format!("cd {workdir} || exit 1\necho {}\n{}\n", command.banner, command.shell)
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::path::Path;
    use std::process::Command;

    use super::{local_script, run_local, LocalReport};
    use crate::error::SubmitError;
    use crate::pbs::options::PbsOptions;
    use crate::pbs::submit::task_commands;
    use crate::request::argument_set::{ArgumentSet, CommandTemplate};

    #[test]
    fn counts_successes_and_failures() {
        let template = CommandTemplate::new("test").unwrap();
        let sets = ArgumentSet::from_inline(&["1 -eq 1", "1 -eq 2", "3 -gt 2"]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let options = PbsOptions { output_dir: Some(dir.path().join("out")), ..Default::default() };

        let report = run_local(&template, &sets, &options).unwrap();
        assert_eq!(report, LocalReport { succeeded: 2, failed: 1 });
    }

    #[test]
    fn runs_in_workdir_with_output_dir_appended() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("results");
        let template = CommandTemplate::new("touch").unwrap();
        let sets = ArgumentSet::from_inline(&["marker-a", "marker-b"]).unwrap();
        let options = PbsOptions {
            output_dir: Some(out.clone()),
            workdir: Some(dir.path().display().to_string()),
            ..Default::default()
        };
        run_local(&template, &sets, &options).unwrap();
        assert!(dir.path().join("marker-a").exists());
        assert!(dir.path().join("marker-b").exists());

        // `touch marker-c OUT/` creates the marker and touches the output directory
        let options = PbsOptions { append_output_dir: true, ..options };
        let sets = ArgumentSet::from_inline(&["marker-c"]).unwrap();
        let report = run_local(&template, &sets, &options).unwrap();
        assert_eq!(report.succeeded, 1);
        assert!(fs::metadata(&out).unwrap().is_dir());
    }

    #[test]
    fn echoes_arguments_then_runs_quoted_command() {
        let dir = tempfile::tempdir().unwrap();
        let template = CommandTemplate::new("printf '<%s>\\n'").unwrap();
        let sets = ArgumentSet::from_inline(&["#tag a;b 3"]).unwrap();
        let commands = task_commands(&template, &sets, &PbsOptions::default(), Path::new("/out")).unwrap();
        let workdir = dir.path().display().to_string();

        let output = Command::new("bash").arg("-c").arg(local_script(&workdir, &commands[0])).output().unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8(output.stdout).unwrap(), "pbs_array_args = #tag a;b 3\n<#tag>\n<a;b>\n<3>\n");
    }

    #[test]
    fn invalid_options_run_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let template = CommandTemplate::new("touch").unwrap();
        let sets = ArgumentSet::from_inline(&["marker"]).unwrap();
        let options = PbsOptions {
            output_dir: Some(dir.path().join("out")),
            workdir: Some(dir.path().display().to_string()),
            walltime: "1h".to_string(),
            ..Default::default()
        };
        assert!(matches!(run_local(&template, &sets, &options), Err(SubmitError::InvalidArguments(_))));
        assert!(!dir.path().join("marker").exists());
    }

    #[test]
    fn missing_workdir_fails_the_task() {
        let dir = tempfile::tempdir().unwrap();
        let template = CommandTemplate::new("true").unwrap();
        let sets = ArgumentSet::from_inline(&[""]).unwrap();
        let options = PbsOptions {
            output_dir: Some(dir.path().join("out")),
            workdir: Some(dir.path().join("gone").display().to_string()),
            ..Default::default()
        };
        let report = run_local(&template, &sets, &options).unwrap();
        assert_eq!(report, LocalReport { succeeded: 0, failed: 1 });
    }
}
