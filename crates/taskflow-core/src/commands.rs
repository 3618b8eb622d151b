use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use chrono::{NaiveDate, Utc};
use taskflow_shared::TaskStatus;
use tokio::runtime::Runtime;
use tracing::{debug, info, instrument};

use crate::api::HttpApiClient;
use crate::auth::{AuthOutcome, AuthScreen};
use crate::cli::Command;
use crate::config::Config;
use crate::dashboard::{Dashboard, DeleteOutcome, LoadOutcome, SubmitOutcome, TaskForm};
use crate::due::parse_due_expr;
use crate::filter::TaskFilter;
use crate::render::Renderer;
use crate::session::SessionStore;
use crate::shell;

/// Everything a command needs, built once per process.
pub struct App {
    pub cfg: Config,
    pub session: Arc<SessionStore>,
    pub api: HttpApiClient,
    pub renderer: Renderer,
    pub runtime: Runtime,
}

/// Partial edits to the task form, from flags or shell `key=value` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormEdits {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due: Option<String>,
}

impl FormEdits {
    pub fn apply(self, form: &mut TaskForm, today: NaiveDate) -> anyhow::Result<()> {
        if let Some(title) = self.title {
            form.title = title;
        }
        if let Some(description) = self.description {
            form.description = description;
        }
        if let Some(status) = self.status {
            form.status = status;
        }
        if let Some(due) = self.due {
            form.due_date = Some(parse_due_expr(&due, today)?);
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self == &FormEdits::default()
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[instrument(skip(app, command))]
pub fn dispatch(app: &mut App, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => cmd_login(app, &email, &password),
        Command::Register {
            name,
            email,
            password,
        } => cmd_register(app, &name, &email, &password),
        Command::Demo => cmd_demo(app),
        Command::Logout => cmd_logout(app),
        Command::Whoami => cmd_whoami(app),
        Command::List { filter } => cmd_list(app, filter.unwrap_or_default()),
        Command::Stats => cmd_stats(app),
        Command::Show { id } => cmd_show(app, &id),
        Command::Add {
            title,
            description,
            status,
            due,
        } => cmd_add(
            app,
            FormEdits {
                title: Some(title),
                description: Some(description),
                status,
                due,
            },
        ),
        Command::Edit {
            id,
            title,
            description,
            status,
            due,
        } => cmd_edit(
            app,
            &id,
            FormEdits {
                title,
                description,
                status,
                due,
            },
        ),
        Command::Delete { id, yes } => cmd_delete(app, &id, yes),
        Command::Shell => {
            let mut dashboard = mount_dashboard(app)?;
            shell::run(app, &mut dashboard)
        }
    }
}

fn cmd_login(app: &mut App, email: &str, password: &str) -> anyhow::Result<()> {
    let mut screen = AuthScreen::new();
    let outcome = app
        .runtime
        .block_on(screen.login(&app.api, &app.session, email, password));
    finish_auth(app, &screen, outcome)
}

fn cmd_register(app: &mut App, name: &str, email: &str, password: &str) -> anyhow::Result<()> {
    let mut screen = AuthScreen::new();
    let outcome = app
        .runtime
        .block_on(screen.register(&app.api, &app.session, name, email, password));
    finish_auth(app, &screen, outcome)
}

fn cmd_demo(app: &mut App) -> anyhow::Result<()> {
    let mut screen = AuthScreen::new();
    let outcome = app
        .runtime
        .block_on(screen.demo_login(&app.api, &app.session));
    if outcome == AuthOutcome::AuthenticatedOffline {
        eprintln!("Backend unreachable. Entering Demo Mode with mock data.");
    }
    finish_auth(app, &screen, outcome)
}

fn finish_auth(app: &App, screen: &AuthScreen, outcome: AuthOutcome) -> anyhow::Result<()> {
    match outcome {
        AuthOutcome::Authenticated | AuthOutcome::AuthenticatedOffline => {
            let name = app.session.display_name().unwrap_or_default();
            info!(user = %name, "signed in");
            println!("Welcome, {name}");
            Ok(())
        }
        AuthOutcome::Invalid | AuthOutcome::Failed => Err(anyhow!(
            "{}",
            screen.error().unwrap_or("sign-in failed")
        )),
    }
}

fn cmd_logout(app: &mut App) -> anyhow::Result<()> {
    app.session.logout().context("failed to clear session")?;
    println!("Signed out.");
    Ok(())
}

fn cmd_whoami(app: &mut App) -> anyhow::Result<()> {
    match app.session.user() {
        Some(user) => {
            println!("{} <{}> (id {})", user.display_name(), user.email, user.id);
            Ok(())
        }
        None => Err(not_signed_in()),
    }
}

/// Builds the dashboard and performs its mount-time load.
pub fn mount_dashboard(app: &App) -> anyhow::Result<Dashboard<HttpApiClient>> {
    if !app.session.is_authenticated() {
        return Err(not_signed_in());
    }
    let mut dashboard = Dashboard::new(app.api.clone());
    match app.runtime.block_on(dashboard.load()) {
        LoadOutcome::Loaded(count) => debug!(count, "dashboard mounted"),
        LoadOutcome::Offline => info!("backend unreachable; dashboard mounted with demo data"),
        LoadOutcome::Failed => debug!("dashboard mounted without tasks"),
    }
    Ok(dashboard)
}

pub fn print_dashboard(app: &App, dashboard: &Dashboard<HttpApiClient>) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    print_banner_and_header(app, dashboard, &mut out)?;
    app.renderer
        .write_task_table(&mut out, &dashboard.filtered_tasks(), dashboard.filter())?;
    Ok(())
}

pub fn print_banner_and_header<W: Write>(
    app: &App,
    dashboard: &Dashboard<HttpApiClient>,
    out: &mut W,
) -> anyhow::Result<()> {
    let name = app.session.display_name();
    app.renderer
        .write_header(out, name.as_deref(), dashboard.is_offline_mode())?;
    if let Some(message) = dashboard.error() {
        app.renderer.write_error_banner(out, message)?;
    }
    Ok(())
}

fn cmd_list(app: &mut App, filter: TaskFilter) -> anyhow::Result<()> {
    let mut dashboard = mount_dashboard(app)?;
    load_failure(&dashboard)?;
    dashboard.set_filter(filter);
    print_dashboard(app, &dashboard)
}

fn cmd_stats(app: &mut App) -> anyhow::Result<()> {
    let dashboard = mount_dashboard(app)?;
    load_failure(&dashboard)?;
    let mut out = io::stdout().lock();
    print_banner_and_header(app, &dashboard, &mut out)?;
    app.renderer.write_stats(&mut out, &dashboard.stats())
}

fn cmd_show(app: &mut App, id: &str) -> anyhow::Result<()> {
    let dashboard = mount_dashboard(app)?;
    load_failure(&dashboard)?;
    let task = dashboard
        .task(id)
        .ok_or_else(|| anyhow!("no task with id {id}"))?;
    app.renderer.write_task_info(&mut io::stdout().lock(), task)
}

fn cmd_add(app: &mut App, edits: FormEdits) -> anyhow::Result<()> {
    let mut dashboard = mount_dashboard(app)?;
    load_failure(&dashboard)?;
    let today = today();
    dashboard.open_create(today);
    edits.apply(dashboard.form_mut(), today)?;
    let outcome = app.runtime.block_on(dashboard.submit());
    report_submit(&dashboard, outcome)
}

fn cmd_edit(app: &mut App, id: &str, edits: FormEdits) -> anyhow::Result<()> {
    if edits.is_empty() {
        bail!("nothing to change; pass --title, --description, --status or --due");
    }
    let mut dashboard = mount_dashboard(app)?;
    load_failure(&dashboard)?;
    if !dashboard.open_edit(id) {
        bail!("no task with id {id}");
    }
    edits.apply(dashboard.form_mut(), today())?;
    let outcome = app.runtime.block_on(dashboard.submit());
    report_submit(&dashboard, outcome)
}

pub fn report_submit(
    dashboard: &Dashboard<HttpApiClient>,
    outcome: SubmitOutcome,
) -> anyhow::Result<()> {
    match outcome {
        SubmitOutcome::Saved(task) => {
            println!("Saved task {}.", task.id);
            Ok(())
        }
        SubmitOutcome::SavedLocally(task) => {
            println!("Saved task {} locally (demo mode).", task.id);
            Ok(())
        }
        SubmitOutcome::Invalid => Err(anyhow!("Title is required")),
        SubmitOutcome::Failed => Err(anyhow!(
            "{}",
            dashboard.error().unwrap_or("Failed to save task")
        )),
    }
}

fn cmd_delete(app: &mut App, id: &str, yes: bool) -> anyhow::Result<()> {
    let mut dashboard = mount_dashboard(app)?;
    load_failure(&dashboard)?;
    let skip_prompt = yes || !app.cfg.confirm_deletes()?;
    let mut confirm = |prompt: &str| skip_prompt || prompt_yes_no(prompt);
    let outcome = app.runtime.block_on(dashboard.delete(id, &mut confirm));
    report_delete(&dashboard, id, outcome)
}

pub fn report_delete(
    dashboard: &Dashboard<HttpApiClient>,
    id: &str,
    outcome: DeleteOutcome,
) -> anyhow::Result<()> {
    match outcome {
        DeleteOutcome::Cancelled => {
            println!("Delete cancelled.");
            Ok(())
        }
        DeleteOutcome::Committed => {
            println!("Deleted task {id}.");
            Ok(())
        }
        DeleteOutcome::CommittedOffline => {
            println!("Deleted task {id} locally (demo mode).");
            Ok(())
        }
        DeleteOutcome::RolledBack => Err(anyhow!(
            "{}",
            dashboard.error().unwrap_or("Failed to delete task")
        )),
    }
}

/// A hard load failure leaves one-shot commands without a list to act on.
fn load_failure(dashboard: &Dashboard<HttpApiClient>) -> anyhow::Result<()> {
    match dashboard.error() {
        Some(message) => Err(anyhow!("{message}")),
        None => Ok(()),
    }
}

pub fn prompt_yes_no(prompt: &str) -> bool {
    let mut stderr = io::stderr().lock();
    if write!(stderr, "{prompt} [y/N] ").and_then(|_| stderr.flush()).is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn not_signed_in() -> anyhow::Error {
    anyhow!("not signed in; run `taskflow login`, `taskflow register` or `taskflow demo`")
}
