use serde::Serialize;

/// What one task runs
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TaskCommand {
    /// Template and arguments joined by spaces, as the user program receives them
    pub line: String,
    /// `line` with every argument quoted for the shell
    pub shell: String,
    /// Quoted `pbs_array_args = ...` banner echoed into the job log before the task runs
    pub banner: String,
}

/// One command and the array index that runs it
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Task {
    pub index: usize,
    pub command: TaskCommand,
}

/// A contiguous run of tasks submitted as one array job
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayChunk {
    pub tasks: Vec<Task>,
}

impl ArrayChunk {
    pub fn first_index(&self) -> usize {
        self.tasks.first().map_or(0, |task| task.index)
    }

    pub fn last_index(&self) -> usize {
        self.tasks.last().map_or(0, |task| task.index)
    }

    /// `-J` range, `None` for a single task because PBS arrays need at least two subjobs
    pub fn array_range(&self) -> Option<String> {
        match self.tasks.len() {
            0 | 1 => None,
            _ => Some(format!("{}-{}", self.first_index(), self.last_index())),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Split commands into array chunks of at most `max_array_size` tasks
///
/// Chunk `i` is indexed from `i * max_array_size`. A single leftover task is pulled together with
/// the last task of the previous chunk so no array job ends up with one subjob. Task order is kept.
pub fn chunk_commands(commands: Vec<TaskCommand>, max_array_size: usize) -> Vec<ArrayChunk> {
    let mut groups: Vec<Vec<TaskCommand>> = commands
        .chunks(max_array_size.max(1))
        .map(|group| group.to_vec())
        .collect();

    let n = groups.len();
    if n >= 2 && groups[n - 1].len() == 1 {
        if let Some(moved) = groups[n - 2].pop() {
            groups[n - 1].insert(0, moved);
        }
    }

    groups
        .into_iter()
        .enumerate()
        .map(|(i, group)| {
            let offset = i * max_array_size;
            let tasks = group
                .into_iter()
                .enumerate()
                .map(|(j, command)| Task { index: offset + j, command })
                .collect();
            ArrayChunk { tasks }
        })
        .collect()
}
