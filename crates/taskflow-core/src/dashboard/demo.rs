use chrono::{DateTime, Utc};
use taskflow_shared::{Task, TaskStatus};

/// Tasks shown when the backend cannot be reached, all due on `now`'s date.
pub fn seed_tasks(now: DateTime<Utc>) -> Vec<Task> {
    let today = now.date_naive();
    [
        (
            "1",
            "Backend Integration",
            "Connect to REST API endpoints.",
            TaskStatus::InProgress,
        ),
        (
            "2",
            "Database Schema",
            "Design User and Task tables.",
            TaskStatus::Completed,
        ),
        (
            "3",
            "Unit Testing",
            "Write tests for the controllers.",
            TaskStatus::Pending,
        ),
    ]
    .into_iter()
    .map(|(id, title, description, status)| Task {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        status,
        due_date: Some(today),
        created_at: now,
        updated_at: None,
    })
    .collect()
}

/// Identifier for a task created without the backend: Unix milliseconds,
/// bumped until it is unused in `tasks`.
pub fn local_task_id(tasks: &[Task], now: DateTime<Utc>) -> String {
    let mut candidate = now.timestamp_millis();
    while tasks.iter().any(|t| t.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}
