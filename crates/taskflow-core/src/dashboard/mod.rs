//! Dashboard state: the task list, its loading/error/offline flags, the
//! active filter and the create/edit modal.
//!
//! All backend failures are resolved here. Unreachable-network failures
//! switch the dashboard into demo mode, where the list is served from
//! [`demo::seed_tasks`] and every mutation is applied locally.

pub mod delete;
pub mod demo;
pub mod form;

use chrono::{NaiveDate, Utc};
use taskflow_shared::Task;
use tracing::{debug, info, instrument, warn};

use crate::api::TaskflowApi;
use crate::filter::TaskFilter;
use crate::stats::TaskStats;

pub use delete::{Confirm, DELETE_PROMPT, DeletePhase};
pub use form::TaskForm;

use delete::PendingDelete;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    Offline,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Title was blank; nothing was sent.
    Invalid,
    Saved(Task),
    /// Applied locally because the backend was unavailable.
    SavedLocally(Task),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Cancelled,
    Committed,
    CommittedOffline,
    RolledBack,
}

#[derive(Debug)]
pub struct Dashboard<A> {
    api: A,
    tasks: Vec<Task>,
    is_loading: bool,
    error: Option<String>,
    filter: TaskFilter,
    is_offline_mode: bool,
    is_modal_open: bool,
    editing: Option<Task>,
    form: TaskForm,
    is_submitting: bool,
    delete_phase: DeletePhase,
}

impl<A: TaskflowApi> Dashboard<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            tasks: Vec::new(),
            is_loading: true,
            error: None,
            filter: TaskFilter::All,
            is_offline_mode: false,
            is_modal_open: false,
            editing: None,
            form: TaskForm::default(),
            is_submitting: false,
            delete_phase: DeletePhase::Idle,
        }
    }

    #[instrument(skip(self))]
    pub async fn load(&mut self) -> LoadOutcome {
        self.is_loading = true;
        self.error = None;

        let outcome = match self.api.list_tasks().await {
            Ok(tasks) => {
                info!(count = tasks.len(), "tasks loaded");
                let count = tasks.len();
                self.tasks = tasks;
                self.is_offline_mode = false;
                LoadOutcome::Loaded(count)
            }
            Err(err) if err.is_network_unreachable() => {
                warn!(error = %err, "backend unreachable; switching to demo mode");
                self.is_offline_mode = true;
                self.tasks = demo::seed_tasks(Utc::now());
                LoadOutcome::Offline
            }
            Err(err) => {
                warn!(error = %err, "failed to load tasks");
                self.error = Some(err.message_or("Failed to fetch tasks"));
                LoadOutcome::Failed
            }
        };

        self.is_loading = false;
        outcome
    }

    pub fn open_create(&mut self, today: NaiveDate) {
        self.editing = None;
        self.form = TaskForm::blank(today);
        self.is_modal_open = true;
    }

    /// Opens the modal on an existing task. Returns false for unknown ids.
    pub fn open_edit(&mut self, id: &str) -> bool {
        let Some(task) = self.task(id).cloned() else {
            debug!(id, "edit requested for unknown task");
            return false;
        };
        self.form = TaskForm::from_task(&task);
        self.editing = Some(task);
        self.is_modal_open = true;
        true
    }

    pub fn close_modal(&mut self) {
        self.is_modal_open = false;
        self.editing = None;
        self.form = TaskForm::default();
    }

    pub fn form_mut(&mut self) -> &mut TaskForm {
        &mut self.form
    }

    #[instrument(skip(self), fields(editing = ?self.editing.as_ref().map(|t| &t.id)))]
    pub async fn submit(&mut self) -> SubmitOutcome {
        if !self.form.is_valid() {
            debug!("blank title; submission skipped");
            return SubmitOutcome::Invalid;
        }

        self.is_submitting = true;
        let editing = self.editing.clone();
        let now = Utc::now();

        let result = match &editing {
            Some(existing) => {
                self.api
                    .update_task(&existing.id, &self.form.to_patch())
                    .await
            }
            None => self.api.create_task(&self.form.to_new_task(now)).await,
        };

        let outcome = match result {
            Ok(saved) => {
                info!(id = %saved.id, "task saved");
                self.apply_saved(editing.as_ref(), saved.clone());
                self.close_modal();
                SubmitOutcome::Saved(saved)
            }
            Err(err) if self.is_offline_mode || err.is_network_unreachable() => {
                let local = match &editing {
                    Some(existing) => self.form.merge_into(existing, now),
                    None => self
                        .form
                        .to_local_task(demo::local_task_id(&self.tasks, now), now),
                };
                info!(id = %local.id, error = %err, "backend unavailable; task saved locally");
                self.apply_saved(editing.as_ref(), local.clone());
                self.close_modal();
                SubmitOutcome::SavedLocally(local)
            }
            Err(err) => {
                warn!(error = %err, "failed to save task");
                self.error = Some(err.message_or("Failed to save task"));
                SubmitOutcome::Failed
            }
        };

        self.is_submitting = false;
        outcome
    }

    /// Removes the task immediately, then asks the backend. Only a definite
    /// backend rejection restores the previous list.
    #[instrument(skip(self, confirm))]
    pub async fn delete<C>(&mut self, id: &str, confirm: &mut C) -> DeleteOutcome
    where
        C: Confirm + ?Sized,
    {
        if !confirm.confirm(DELETE_PROMPT) {
            debug!("delete not confirmed");
            return DeleteOutcome::Cancelled;
        }

        let pending = PendingDelete::begin(&mut self.tasks, id);
        self.delete_phase = pending.phase();

        let (phase, outcome) = match self.api.delete_task(id).await {
            Ok(()) => {
                info!("task deleted");
                (pending.commit(false), DeleteOutcome::Committed)
            }
            Err(err) if self.is_offline_mode || err.is_network_unreachable() => {
                debug!(error = %err, "delete accepted locally");
                (pending.commit(true), DeleteOutcome::CommittedOffline)
            }
            Err(err) => {
                warn!(error = %err, "delete rejected; restoring list");
                self.error = Some(err.message_or("Failed to delete task"));
                (pending.roll_back(&mut self.tasks), DeleteOutcome::RolledBack)
            }
        };

        self.delete_phase = phase;
        outcome
    }

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> TaskFilter {
        self.filter
    }

    pub fn filtered_tasks(&self) -> Vec<&Task> {
        self.filter.apply(&self.tasks)
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.tasks)
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_offline_mode(&self) -> bool {
        self.is_offline_mode
    }

    pub fn is_modal_open(&self) -> bool {
        self.is_modal_open
    }

    pub fn editing_task(&self) -> Option<&Task> {
        self.editing.as_ref()
    }

    pub fn form(&self) -> &TaskForm {
        &self.form
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn delete_phase(&self) -> &DeletePhase {
        &self.delete_phase
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn apply_saved(&mut self, editing: Option<&Task>, saved: Task) {
        let target_id = editing.map_or_else(|| saved.id.clone(), |t| t.id.clone());
        match self.tasks.iter_mut().find(|task| task.id == target_id) {
            Some(slot) => *slot = saved,
            None if editing.is_none() => self.tasks.push(saved),
            None => debug!(id = %target_id, "edited task no longer listed"),
        }
    }
}
