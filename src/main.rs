use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use qsubarray::local::run_local;
use qsubarray::mode::ExecutionMode;
use qsubarray::pbs::options::DEFAULT_MAX_ARRAY_SIZE;
use qsubarray::request::read::read_argument_sets;
use qsubarray::{ArgumentSet, CommandTemplate, PbsOptions, SchedulerConfig, Submitter};

/// Submit a PBS array job with one task per argument tuple
///
/// Every task runs COMMAND followed by its tuple's arguments, e.g. `python run.py 1 2`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Program to run, may contain constant arguments
    command: String,

    /// JSON file with one array of arguments per task, e.g. [[1, 2], [3, 4, 5]]
    #[arg(short, long, conflicts_with = "tuple")]
    args_file: Option<PathBuf>,

    /// Whitespace separated arguments of one task, repeat for every task
    #[arg(short, long)]
    tuple: Vec<String>,

    #[arg(long, value_enum, default_value_t = ExecutionMode::Pbs)]
    mode: ExecutionMode,

    /// Job name (#PBS -N)
    #[arg(short = 'N', long, default_value = "qsubarray")]
    name: String,

    /// Project to charge (#PBS -P)
    #[arg(short = 'P', long)]
    project: Option<String>,

    /// Destination queue (#PBS -q)
    #[arg(short, long, default_value = "defaultQ")]
    queue: String,

    #[arg(long, default_value_t = 1)]
    select: u32,

    #[arg(long, default_value_t = 1)]
    ncpus: u32,

    #[arg(long, default_value = "1GB")]
    mem: String,

    /// Maximum run time per task, HH:MM:SS
    #[arg(long, default_value = "23:59:00")]
    walltime: String,

    /// Where PBS writes task stdout and stderr (DIR/job), defaults to a directory named after COMMAND
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Working directory of each task, defaults to the submission directory
    #[arg(long)]
    workdir: Option<String>,

    /// Pass the output directory to every task as its last argument
    #[arg(long)]
    append_output_dir: bool,

    /// Most tasks in one array job, larger submissions are split
    #[arg(long, default_value_t = DEFAULT_MAX_ARRAY_SIZE)]
    max_array_size: usize,

    /// Randomise task order so long and short tasks spread across array jobs
    #[arg(long)]
    shuffle: bool,

    /// Keep submitted scripts in OUTPUT_DIR/job
    #[arg(long)]
    keep_script: bool,

    /// qsub binary
    #[arg(long, default_value = "qsub")]
    qsub: PathBuf,

    /// Extra argument passed to qsub before the script path, repeatable
    #[arg(long, allow_hyphen_values = true)]
    qsub_arg: Vec<String>,
}

impl Args {
    fn pbs_options(&self) -> PbsOptions {
        PbsOptions {
            name: self.name.clone(),
            project: self.project.clone(),
            queue: self.queue.clone(),
            select: self.select,
            ncpus: self.ncpus,
            mem: self.mem.clone(),
            walltime: self.walltime.clone(),
            output_dir: self.output_dir.clone(),
            workdir: self.workdir.clone(),
            append_output_dir: self.append_output_dir,
            max_array_size: self.max_array_size,
            shuffle: self.shuffle,
            keep_script: self.keep_script,
        }
    }

    fn argument_sets(&self) -> Result<ArgumentSet> {
        match &self.args_file {
            Some(path) => read_argument_sets(path)
                .with_context(|| format!("Reading argument sets from {}", path.display())),
            None if self.tuple.is_empty() => bail!("Either --args-file or at least one --tuple is required"),
            None => Ok(ArgumentSet::from_inline(&self.tuple)?),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    info!("terve! starting up :)");

    let args = Args::parse();
    let template = CommandTemplate::new(args.command.as_str())?;
    let sets = args.argument_sets()?;
    info!("{} argument sets for `{}`, mode {}", sets.len(), template, args.mode);

    let options = args.pbs_options();
    match args.mode {
        ExecutionMode::Pbs => {
            let scheduler = SchedulerConfig { qsub: args.qsub.clone(), qsub_args: args.qsub_arg.clone() };
            let result = Submitter::new(options, scheduler)
                .submit(&template, &sets)
                .context("Submitting array job")?;
            println!("Submitted {} subjobs", result.task_count);
            for job_id in &result.job_ids {
                println!("{job_id}");
            }
        }
        ExecutionMode::Local => {
            let report = run_local(&template, &sets, &options)?;
            if report.failed > 0 {
                bail!("{} of {} local tasks failed", report.failed, sets.len());
            }
        }
        ExecutionMode::DryRun => {
            let scripts = Submitter::new(options, SchedulerConfig::default()).render(&template, &sets)?;
            for script in scripts {
                print!("{}", script.content);
            }
        }
    }

    Ok(())
}
