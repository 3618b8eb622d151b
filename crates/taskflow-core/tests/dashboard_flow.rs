use std::cell::RefCell;
use std::collections::VecDeque;

use chrono::{NaiveDate, TimeZone, Utc};
use taskflow_core::api::{ApiError, TaskflowApi};
use taskflow_core::dashboard::{
    DELETE_PROMPT, Dashboard, DeleteOutcome, DeletePhase, LoadOutcome, SubmitOutcome,
};
use taskflow_core::filter::TaskFilter;
use taskflow_shared::{
    AuthResponse, LoginRequest, NewTask, RegisterRequest, Task, TaskPatch, TaskStatus,
};

/// Backend double that replays queued results and records what it was sent.
#[derive(Default)]
struct ScriptedApi {
    lists: RefCell<VecDeque<Result<Vec<Task>, ApiError>>>,
    creates: RefCell<VecDeque<Result<Task, ApiError>>>,
    updates: RefCell<VecDeque<Result<Task, ApiError>>>,
    deletes: RefCell<VecDeque<Result<(), ApiError>>>,
    created: RefCell<Vec<NewTask>>,
    patched: RefCell<Vec<(String, TaskPatch)>>,
    deleted: RefCell<Vec<String>>,
}

fn unreachable() -> ApiError {
    ApiError::Unreachable("connection refused".to_string())
}

fn rejected(message: &str) -> ApiError {
    ApiError::Rejected {
        status: 500,
        message: message.to_string(),
    }
}

fn exhausted() -> ApiError {
    ApiError::Transport("no scripted response".to_string())
}

impl TaskflowApi for ScriptedApi {
    async fn login(&self, _credentials: &LoginRequest) -> Result<AuthResponse, ApiError> {
        Err(exhausted())
    }

    async fn register(&self, _account: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        Err(exhausted())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.lists.borrow_mut().pop_front().unwrap_or_else(|| Err(exhausted()))
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        self.created.borrow_mut().push(task.clone());
        self.creates.borrow_mut().pop_front().unwrap_or_else(|| Err(exhausted()))
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        self.patched.borrow_mut().push((id.to_string(), patch.clone()));
        self.updates.borrow_mut().pop_front().unwrap_or_else(|| Err(exhausted()))
    }

    async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        self.deleted.borrow_mut().push(id.to_string());
        self.deletes.borrow_mut().pop_front().unwrap_or_else(|| Err(exhausted()))
    }
}

fn task(id: &str, title: &str, status: TaskStatus) -> Task {
    Task {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        status,
        due_date: NaiveDate::from_ymd_opt(2026, 10, 20),
        created_at: Utc
            .with_ymd_and_hms(2026, 10, 18, 9, 0, 0)
            .single()
            .expect("timestamp"),
        updated_at: None,
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).expect("date")
}

fn ids(dashboard: &Dashboard<ScriptedApi>) -> Vec<&str> {
    dashboard.tasks().iter().map(|t| t.id.as_str()).collect()
}

async fn loaded_with(tasks: Vec<Task>) -> Dashboard<ScriptedApi> {
    let api = ScriptedApi::default();
    api.lists.borrow_mut().push_back(Ok(tasks));
    let mut dashboard = Dashboard::new(api);
    dashboard.load().await;
    dashboard
}

async fn offline_dashboard() -> Dashboard<ScriptedApi> {
    let api = ScriptedApi::default();
    api.lists.borrow_mut().push_back(Err(unreachable()));
    let mut dashboard = Dashboard::new(api);
    assert_eq!(dashboard.load().await, LoadOutcome::Offline);
    dashboard
}

#[tokio::test]
async fn load_replaces_list_and_clears_loading() {
    let api = ScriptedApi::default();
    api.lists
        .borrow_mut()
        .push_back(Ok(vec![task("a", "One", TaskStatus::Pending)]));
    let mut dashboard = Dashboard::new(api);
    assert!(dashboard.is_loading());

    assert_eq!(dashboard.load().await, LoadOutcome::Loaded(1));
    assert!(!dashboard.is_loading());
    assert!(!dashboard.is_offline_mode());
    assert_eq!(ids(&dashboard), vec!["a"]);
}

#[tokio::test]
async fn unreachable_backend_seeds_demo_tasks() {
    let dashboard = offline_dashboard().await;
    assert!(dashboard.is_offline_mode());
    assert!(dashboard.error().is_none());
    assert_eq!(ids(&dashboard), vec!["1", "2", "3"]);
    assert_eq!(dashboard.tasks()[0].status, TaskStatus::InProgress);
    assert_eq!(dashboard.tasks()[1].status, TaskStatus::Completed);
    assert_eq!(dashboard.tasks()[2].status, TaskStatus::Pending);
}

#[tokio::test]
async fn rejected_load_sets_error_without_demo_data() {
    let api = ScriptedApi::default();
    api.lists.borrow_mut().push_back(Err(rejected("Not authorized")));
    let mut dashboard = Dashboard::new(api);

    assert_eq!(dashboard.load().await, LoadOutcome::Failed);
    assert_eq!(dashboard.error(), Some("Not authorized"));
    assert!(!dashboard.is_offline_mode());
    assert!(dashboard.tasks().is_empty());

    dashboard.dismiss_error();
    assert!(dashboard.error().is_none());
}

#[tokio::test]
async fn create_appends_server_task() {
    let mut dashboard = loaded_with(vec![task("a", "One", TaskStatus::Pending)]).await;
    dashboard
        .api()
        .creates
        .borrow_mut()
        .push_back(Ok(task("srv-9", "Ship", TaskStatus::Pending)));

    dashboard.open_create(today());
    assert_eq!(dashboard.form().due_date, NaiveDate::from_ymd_opt(2026, 10, 19));
    dashboard.form_mut().title = "Ship".to_string();

    match dashboard.submit().await {
        SubmitOutcome::Saved(saved) => assert_eq!(saved.id, "srv-9"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(ids(&dashboard), vec!["a", "srv-9"]);
    assert!(!dashboard.is_modal_open());
    assert_eq!(dashboard.api().created.borrow()[0].title, "Ship");
}

#[tokio::test]
async fn blank_title_never_reaches_backend() {
    let mut dashboard = loaded_with(vec![]).await;
    dashboard.open_create(today());
    dashboard.form_mut().title = "   ".to_string();

    assert_eq!(dashboard.submit().await, SubmitOutcome::Invalid);
    assert!(dashboard.api().created.borrow().is_empty());
    assert!(dashboard.is_modal_open());
    assert!(dashboard.tasks().is_empty());
}

#[tokio::test]
async fn rejected_save_keeps_form_open_with_error() {
    let mut dashboard = loaded_with(vec![]).await;
    dashboard
        .api()
        .creates
        .borrow_mut()
        .push_back(Err(rejected("Title too long")));

    dashboard.open_create(today());
    dashboard.form_mut().title = "Too long".to_string();

    assert_eq!(dashboard.submit().await, SubmitOutcome::Failed);
    assert_eq!(dashboard.error(), Some("Title too long"));
    assert!(dashboard.is_modal_open());
    assert!(!dashboard.is_submitting());
    assert!(dashboard.tasks().is_empty());
}

#[tokio::test]
async fn update_replaces_task_in_place() {
    let mut dashboard = loaded_with(vec![
        task("a", "One", TaskStatus::Pending),
        task("b", "Two", TaskStatus::Pending),
    ])
    .await;
    dashboard
        .api()
        .updates
        .borrow_mut()
        .push_back(Ok(task("a", "One", TaskStatus::Completed)));

    assert!(dashboard.open_edit("a"));
    dashboard.form_mut().status = TaskStatus::Completed;
    assert!(matches!(dashboard.submit().await, SubmitOutcome::Saved(_)));

    assert_eq!(ids(&dashboard), vec!["a", "b"]);
    assert_eq!(dashboard.tasks()[0].status, TaskStatus::Completed);
    let patched = dashboard.api().patched.borrow();
    assert_eq!(patched[0].0, "a");
    assert_eq!(patched[0].1.status, Some(TaskStatus::Completed));
}

#[tokio::test]
async fn offline_edit_merges_locally() {
    let mut dashboard = offline_dashboard().await;

    assert!(dashboard.open_edit("3"));
    dashboard.form_mut().title = "Unit Testing (core)".to_string();
    dashboard.form_mut().status = TaskStatus::InProgress;

    match dashboard.submit().await {
        SubmitOutcome::SavedLocally(local) => {
            assert_eq!(local.id, "3");
            assert!(local.updated_at.is_some());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(ids(&dashboard), vec!["1", "2", "3"]);
    let edited = dashboard.task("3").expect("edited task");
    assert_eq!(edited.title, "Unit Testing (core)");
    assert_eq!(edited.status, TaskStatus::InProgress);
    assert!(dashboard.error().is_none());
}

#[tokio::test]
async fn unreachable_create_synthesizes_local_task() {
    let mut dashboard = loaded_with(vec![task("a", "One", TaskStatus::Pending)]).await;
    dashboard.api().creates.borrow_mut().push_back(Err(unreachable()));

    dashboard.open_create(today());
    dashboard.form_mut().title = "Offline idea".to_string();

    let local = match dashboard.submit().await {
        SubmitOutcome::SavedLocally(local) => local,
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert!(local.id.parse::<i64>().is_ok());
    assert_eq!(dashboard.tasks().len(), 2);
    assert_eq!(dashboard.tasks()[1].title, "Offline idea");
    assert!(dashboard.error().is_none());
}

#[tokio::test]
async fn delete_success_removes_task() {
    let mut dashboard = loaded_with(vec![
        task("a", "One", TaskStatus::Pending),
        task("b", "Two", TaskStatus::Pending),
    ])
    .await;
    dashboard.api().deletes.borrow_mut().push_back(Ok(()));

    let mut prompts = Vec::new();
    let mut confirm = |prompt: &str| {
        prompts.push(prompt.to_string());
        true
    };
    assert_eq!(
        dashboard.delete("a", &mut confirm).await,
        DeleteOutcome::Committed
    );
    assert_eq!(prompts, vec![DELETE_PROMPT.to_string()]);
    assert_eq!(ids(&dashboard), vec!["b"]);
    assert_eq!(
        dashboard.delete_phase(),
        &DeletePhase::Committed {
            id: "a".to_string(),
            offline: false
        }
    );
}

#[tokio::test]
async fn rejected_delete_restores_previous_list() {
    let mut dashboard = loaded_with(vec![
        task("a", "One", TaskStatus::Pending),
        task("b", "Two", TaskStatus::Completed),
    ])
    .await;
    dashboard
        .api()
        .deletes
        .borrow_mut()
        .push_back(Err(rejected("Task is locked")));

    let mut confirm = |_: &str| true;
    assert_eq!(
        dashboard.delete("b", &mut confirm).await,
        DeleteOutcome::RolledBack
    );
    assert_eq!(ids(&dashboard), vec!["a", "b"]);
    assert_eq!(dashboard.error(), Some("Task is locked"));
    assert_eq!(
        dashboard.delete_phase(),
        &DeletePhase::RolledBack {
            id: "b".to_string()
        }
    );
}

#[tokio::test]
async fn declined_delete_leaves_everything_alone() {
    let mut dashboard = loaded_with(vec![task("a", "One", TaskStatus::Pending)]).await;

    let mut confirm = |_: &str| false;
    assert_eq!(
        dashboard.delete("a", &mut confirm).await,
        DeleteOutcome::Cancelled
    );
    assert_eq!(ids(&dashboard), vec!["a"]);
    assert!(dashboard.api().deleted.borrow().is_empty());
    assert_eq!(dashboard.delete_phase(), &DeletePhase::Idle);
}

#[tokio::test]
async fn offline_delete_is_accepted_locally() {
    let mut dashboard = offline_dashboard().await;
    dashboard.api().deletes.borrow_mut().push_back(Err(unreachable()));

    let mut confirm = |_: &str| true;
    assert_eq!(
        dashboard.delete("2", &mut confirm).await,
        DeleteOutcome::CommittedOffline
    );
    assert_eq!(ids(&dashboard), vec!["1", "3"]);
    assert!(dashboard.error().is_none());
}

#[tokio::test]
async fn stats_and_filters_follow_the_list() {
    let empty = loaded_with(vec![]).await;
    let stats = empty.stats();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.completion_rate, 0);

    let mut dashboard = loaded_with(vec![
        task("a", "One", TaskStatus::Completed),
        task("b", "Two", TaskStatus::Pending),
        task("c", "Three", TaskStatus::InProgress),
        task("d", "Four", TaskStatus::Pending),
    ])
    .await;
    let stats = dashboard.stats();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.in_progress, 1);
    assert_eq!(stats.completion_rate, 25);

    dashboard.set_filter(TaskFilter::Status(TaskStatus::Pending));
    let pending: Vec<&str> = dashboard
        .filtered_tasks()
        .iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(pending, vec!["b", "d"]);

    dashboard.set_filter(TaskFilter::All);
    assert_eq!(dashboard.filtered_tasks().len(), 4);
}

#[tokio::test]
async fn rejected_delete_while_offline_keeps_removal() {
    let mut dashboard = offline_dashboard().await;
    dashboard
        .api()
        .deletes
        .borrow_mut()
        .push_back(Err(rejected("Not authorized")));

    let mut confirm = |_: &str| true;
    assert_eq!(
        dashboard.delete("1", &mut confirm).await,
        DeleteOutcome::CommittedOffline
    );
    assert_eq!(ids(&dashboard), vec!["2", "3"]);
    assert!(dashboard.error().is_none());
    assert_eq!(
        dashboard.delete_phase(),
        &DeletePhase::Committed {
            id: "1".to_string(),
            offline: true
        }
    );
}

#[tokio::test]
async fn rejected_submit_while_offline_saves_locally() {
    let mut dashboard = offline_dashboard().await;
    dashboard
        .api()
        .creates
        .borrow_mut()
        .push_back(Err(rejected("Not authorized")));
    dashboard
        .api()
        .updates
        .borrow_mut()
        .push_back(Err(rejected("Not authorized")));

    dashboard.open_create(today());
    dashboard.form_mut().title = "Demo follow-up".to_string();
    let created = match dashboard.submit().await {
        SubmitOutcome::SavedLocally(local) => local,
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert_eq!(dashboard.tasks().len(), 4);
    assert_eq!(dashboard.tasks()[3].id, created.id);

    assert!(dashboard.open_edit("2"));
    dashboard.form_mut().status = TaskStatus::Pending;
    assert!(matches!(
        dashboard.submit().await,
        SubmitOutcome::SavedLocally(_)
    ));
    assert_eq!(
        dashboard.task("2").map(|t| t.status),
        Some(TaskStatus::Pending)
    );
    assert_eq!(dashboard.tasks().len(), 4);
    assert!(dashboard.error().is_none());
    assert!(!dashboard.is_modal_open());
}

#[tokio::test]
async fn successful_reload_leaves_demo_mode() {
    let mut dashboard = offline_dashboard().await;
    dashboard
        .api()
        .lists
        .borrow_mut()
        .push_back(Ok(vec![task("srv-1", "Real task", TaskStatus::Pending)]));

    assert_eq!(dashboard.load().await, LoadOutcome::Loaded(1));
    assert!(!dashboard.is_offline_mode());
    assert_eq!(ids(&dashboard), vec!["srv-1"]);
}
