use chrono::{DateTime, NaiveDate, Utc};
use taskflow_shared::{NewTask, Task, TaskPatch, TaskStatus};

/// Fields edited in the create/edit modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            status: TaskStatus::Pending,
            due_date: None,
        }
    }
}

impl TaskForm {
    /// Empty form for a new task, due the day after `today`.
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            due_date: Some(today.succ_opt().unwrap_or(today)),
            ..Self::default()
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            due_date: task.due_date,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn to_new_task(&self, now: DateTime<Utc>) -> NewTask {
        NewTask {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            due_date: self.due_date,
            created_at: now,
        }
    }

    pub fn to_patch(&self) -> TaskPatch {
        TaskPatch {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            status: Some(self.status),
            due_date: self.due_date,
        }
    }

    /// The existing task with the form's fields laid over it.
    pub fn merge_into(&self, existing: &Task, now: DateTime<Utc>) -> Task {
        Task {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            due_date: self.due_date.or(existing.due_date),
            updated_at: Some(now),
            ..existing.clone()
        }
    }

    pub fn to_local_task(&self, id: String, now: DateTime<Utc>) -> Task {
        Task {
            id,
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            due_date: self.due_date,
            created_at: now,
            updated_at: None,
        }
    }
}
