use std::env;
use std::path::PathBuf;

use crate::error::SubmitError;
use crate::request::argument_set::CommandTemplate;

/// PBS array jobs are limited to 1000 subjobs by default
pub const DEFAULT_MAX_ARRAY_SIZE: usize = 1000;

/// Array job options
///
/// Most fields map onto a `#PBS` directive in the script header:
/// - `name` -> `-N`
/// - `project` -> `-P` (left out when unset)
/// - `queue` -> `-q`
/// - `select`, `ncpus`, `mem` -> `-l select=S:ncpus=N:mem=M`
/// - `walltime` -> `-l walltime=HH:MM:SS`
/// - `output_dir` -> `-o DIR/job -e DIR/job`
///
/// Environment export (`-V`) and no mail (`-m n`) are always set.
#[derive(Clone, Debug, PartialEq)]
pub struct PbsOptions {
    pub name: String,
    pub project: Option<String>,
    pub queue: String,
    pub select: u32,
    pub ncpus: u32,
    pub mem: String,
    pub walltime: String,
    /// Defaults to a directory named after the command template
    pub output_dir: Option<PathBuf>,
    /// Working directory of each task, `$PBS_O_WORKDIR` when unset
    pub workdir: Option<String>,
    /// Pass the output directory to every task as its last argument
    pub append_output_dir: bool,
    pub max_array_size: usize,
    /// Randomise task order before chunking
    pub shuffle: bool,
    /// Keep submitted scripts in the `job` directory instead of deleting them
    pub keep_script: bool,
}

impl Default for PbsOptions {
    fn default() -> Self {
        PbsOptions {
            name: "qsubarray".to_string(),
            project: None,
            queue: "defaultQ".to_string(),
            select: 1,
            ncpus: 1,
            mem: "1GB".to_string(),
            walltime: "23:59:00".to_string(),
            output_dir: None,
            workdir: None,
            append_output_dir: false,
            max_array_size: DEFAULT_MAX_ARRAY_SIZE,
            shuffle: false,
            keep_script: false,
        }
    }
}

impl PbsOptions {
    /// Directive values and the working directory go into the script as-is, so each must be one
    /// word on one line
    pub fn validate(&self) -> Result<(), SubmitError> {
        single_word("job name", &self.name)?;
        single_word("queue", &self.queue)?;
        single_word("mem", &self.mem)?;
        if let Some(project) = &self.project {
            single_word("project", project)?;
        }
        if let Some(workdir) = &self.workdir {
            single_word("working directory", workdir)?;
        }
        if let Some(dir) = &self.output_dir {
            single_word("output directory", &dir.display().to_string())?;
        }
        if !is_walltime(&self.walltime) {
            return Err(invalid(format!("walltime {:?} is not HH:MM:SS", self.walltime)));
        }
        // moving one task into a single-task last chunk must leave at least two behind
        if self.max_array_size < 3 {
            return Err(invalid(format!("max array size {} is below 3", self.max_array_size)));
        }
        if self.select == 0 || self.ncpus == 0 {
            return Err(invalid("select and ncpus must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Absolute output directory, PBS won't take relative `-o` and `-e` paths
    pub fn output_dir(&self, template: &CommandTemplate) -> Result<PathBuf, SubmitError> {
        let dir = match &self.output_dir {
            Some(dir) => dir.clone(),
            None => PathBuf::from(default_dir_name(template)),
        };
        let dir = match dir.is_absolute() {
            true => dir,
            false => env::current_dir().map_err(|source| SubmitError::script_write(&dir, source))?.join(dir),
        };
        single_word("output directory", &dir.display().to_string())?;
        Ok(dir)
    }

    pub fn workdir(&self) -> &str {
        self.workdir.as_deref().unwrap_or("$PBS_O_WORKDIR")
    }
}

/// How qsub is called: `QSUB [ARGS...] SCRIPT`
#[derive(Clone, Debug, PartialEq)]
pub struct SchedulerConfig {
    pub qsub: PathBuf,
    pub qsub_args: Vec<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig { qsub: PathBuf::from("qsub"), qsub_args: Vec::new() }
    }
}

impl SchedulerConfig {
    pub fn with_qsub(qsub: impl Into<PathBuf>) -> Self {
        SchedulerConfig { qsub: qsub.into(), ..Default::default() }
    }
}

fn invalid(reason: String) -> SubmitError {
    SubmitError::InvalidArguments(reason)
}

fn single_word(what: &str, value: &str) -> Result<(), SubmitError> {
    if value.is_empty() || value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid(format!("{what} {value:?} must be a single word")));
    }
    Ok(())
}

/// `python run.py` -> `python_run.py`
fn default_dir_name(template: &CommandTemplate) -> String {
    let name: String = template
        .as_str()
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || "._-".contains(c) { c } else { '_' })
        .collect();
    // `.` and `..` would point at the current or parent directory
    match name.chars().all(|c| c == '.') {
        true => name.replace('.', "_"),
        false => name,
    }
}

fn is_walltime(walltime: &str) -> bool {
    let parts: Vec<&str> = walltime.split(':').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit())) {
        return false;
    }
    parts[1..].iter().all(|p| p.len() == 2 && p.parse::<u32>().map_or(false, |v| v < 60))
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::{default_dir_name, is_walltime, PbsOptions};
    use crate::error::SubmitError;
    use crate::request::argument_set::CommandTemplate;

    #[test]
    fn defaults_are_valid() {
        PbsOptions::default().validate().unwrap();
    }

    #[test]
    fn walltime_format() {
        assert!(is_walltime("23:59:00"));
        assert!(is_walltime("120:00:00"));
        assert!(!is_walltime("1:00"));
        assert!(!is_walltime("01:60:00"));
        assert!(!is_walltime("01:5:00"));
        assert!(!is_walltime("aa:00:00"));
    }

    #[test]
    fn invalid_options() {
        let options = PbsOptions { walltime: "forever".to_string(), ..Default::default() };
        assert!(matches!(options.validate(), Err(SubmitError::InvalidArguments(_))));
        let options = PbsOptions { max_array_size: 2, ..Default::default() };
        assert!(options.validate().is_err());
        let options = PbsOptions { name: "my job".to_string(), ..Default::default() };
        assert!(options.validate().is_err());
    }

    #[test]
    fn directive_values_must_be_single_words() {
        let cases = [
            PbsOptions { queue: "workq\n#PBS -l select=100".to_string(), ..Default::default() },
            PbsOptions { queue: "".to_string(), ..Default::default() },
            PbsOptions { project: Some("ab 12".to_string()), ..Default::default() },
            PbsOptions { mem: "8GB\nrm -rf x".to_string(), ..Default::default() },
            PbsOptions { workdir: Some("/home/me/my project".to_string()), ..Default::default() },
            PbsOptions { workdir: Some("/data\nrm -rf x".to_string()), ..Default::default() },
            PbsOptions { output_dir: Some(PathBuf::from("/scratch/my out")), ..Default::default() },
            PbsOptions { name: "job\u{7}".to_string(), ..Default::default() },
        ];
        for options in cases {
            assert!(matches!(options.validate(), Err(SubmitError::InvalidArguments(_))), "{options:?}");
        }

        let template = CommandTemplate::new("python run.py").unwrap();
        let options = PbsOptions { output_dir: Some(PathBuf::from("/scratch/a\tb")), ..Default::default() };
        assert!(options.output_dir(&template).is_err());
    }

    #[test]
    fn default_output_dir_is_named_after_template() {
        let template = CommandTemplate::new("python run.py").unwrap();
        assert_eq!(default_dir_name(&template), "python_run.py");
        let dir = PbsOptions::default().output_dir(&template).unwrap();
        assert!(dir.is_absolute());
        assert!(dir.ends_with("python_run.py"));

        let slashed = CommandTemplate::new("/opt/bin/sim --fast").unwrap();
        assert_eq!(default_dir_name(&slashed), "_opt_bin_sim_--fast");
    }

    #[test]
    fn default_output_dir_stays_ascii_and_below_cwd() {
        let accented = CommandTemplate::new("./résumé ünï").unwrap();
        assert_eq!(default_dir_name(&accented), "._r_sum___n_");
        assert_eq!(default_dir_name(&CommandTemplate::new(".").unwrap()), "_");
        assert_eq!(default_dir_name(&CommandTemplate::new("..").unwrap()), "__");

        let dir = PbsOptions::default().output_dir(&CommandTemplate::new("..").unwrap()).unwrap();
        assert!(dir.ends_with("__"));
    }

    #[test]
    fn absolute_output_dir_is_kept() {
        let template = CommandTemplate::new("python run.py").unwrap();
        let options = PbsOptions { output_dir: Some(PathBuf::from("/scratch/out")), ..Default::default() };
        assert_eq!(options.output_dir(&template).unwrap(), PathBuf::from("/scratch/out"));
    }

    #[test]
    fn workdir_defaults_to_submission_directory() {
        assert_eq!(PbsOptions::default().workdir(), "$PBS_O_WORKDIR");
        let options = PbsOptions { workdir: Some("/data".to_string()), ..Default::default() };
        assert_eq!(options.workdir(), "/data");
    }
}
