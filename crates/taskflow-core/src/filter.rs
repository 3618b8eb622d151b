use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use taskflow_shared::{Task, TaskStatus};

/// View selector for the task list. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskFilter {
    #[default]
    All,
    Status(TaskStatus),
}

impl TaskFilter {
    pub const CHOICES: [TaskFilter; 4] = [
        TaskFilter::All,
        TaskFilter::Status(TaskStatus::Pending),
        TaskFilter::Status(TaskStatus::InProgress),
        TaskFilter::Status(TaskStatus::Completed),
    ];

    pub fn matches(self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Status(status) => task.status == status,
        }
    }

    /// Tasks passing the filter, in list order.
    pub fn apply(self, tasks: &[Task]) -> Vec<&Task> {
        tasks.iter().filter(|task| self.matches(task)).collect()
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskFilter::All => "All",
            TaskFilter::Status(status) => status.label(),
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskFilter::All => f.write_str("ALL"),
            TaskFilter::Status(status) => write!(f, "{status}"),
        }
    }
}

impl FromStr for TaskFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(TaskFilter::All);
        }
        s.parse::<TaskStatus>()
            .map(TaskFilter::Status)
            .map_err(|_| anyhow!("unknown filter `{s}` (expected all, pending, in-progress or completed)"))
    }
}
