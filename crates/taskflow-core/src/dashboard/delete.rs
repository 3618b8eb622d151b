use taskflow_shared::Task;

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this task?";

/// Interactive confirmation asked before a delete proceeds.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        (*self)(prompt)
    }
}

/// Lifecycle of the most recent optimistic delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeletePhase {
    #[default]
    Idle,
    Pending {
        id: String,
    },
    Committed {
        id: String,
        /// Accepted without backend confirmation (offline or unreachable).
        offline: bool,
    },
    RolledBack {
        id: String,
    },
}

/// A removal already applied to the list, holding what is needed to undo it.
#[derive(Debug)]
pub(crate) struct PendingDelete {
    id: String,
    snapshot: Vec<Task>,
}

impl PendingDelete {
    pub(crate) fn begin(tasks: &mut Vec<Task>, id: &str) -> Self {
        let snapshot = tasks.clone();
        tasks.retain(|task| task.id != id);
        Self {
            id: id.to_string(),
            snapshot,
        }
    }

    pub(crate) fn phase(&self) -> DeletePhase {
        DeletePhase::Pending {
            id: self.id.clone(),
        }
    }

    pub(crate) fn commit(self, offline: bool) -> DeletePhase {
        DeletePhase::Committed {
            id: self.id,
            offline,
        }
    }

    pub(crate) fn roll_back(self, tasks: &mut Vec<Task>) -> DeletePhase {
        *tasks = self.snapshot;
        DeletePhase::RolledBack { id: self.id }
    }
}
