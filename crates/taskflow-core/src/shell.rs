//! Line-oriented dashboard loop. One controller lives for the whole session,
//! so edits made in demo mode stay visible until the shell exits.

use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail};
use taskflow_shared::TaskStatus;
use tracing::{debug, instrument};

use crate::api::HttpApiClient;
use crate::commands::{
    App, FormEdits, print_banner_and_header, print_dashboard, prompt_yes_no, report_delete,
    report_submit, today,
};
use crate::dashboard::Dashboard;
use crate::filter::TaskFilter;

const HELP: &str = "\
commands:
  list [FILTER]                 show tasks (all, pending, in-progress, completed)
  filter FILTER                 change the active filter
  stats                         completion overview
  show ID                       task details
  add TITLE.. [key=value..]     create a task (desc=, status=, due=)
  edit ID key=value..           change title=, desc=, status=, due=
  status ID STATUS              set a task's status
  delete ID                     delete a task
  retry | cancel                resubmit or discard a form left open by an error
  refresh                       reload from the backend
  dismiss                       clear the error banner
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List(Option<TaskFilter>),
    Filter(TaskFilter),
    Stats,
    Show(String),
    Add(FormEdits),
    Edit(String, FormEdits),
    Status(String, TaskStatus),
    Delete(String),
    Retry,
    Cancel,
    Refresh,
    Dismiss,
    Help,
    Quit,
}

#[instrument(skip_all)]
pub fn run(app: &App, dashboard: &mut Dashboard<HttpApiClient>) -> anyhow::Result<()> {
    print_dashboard(app, dashboard)?;
    println!("\nType `help` for commands.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("taskflow> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match split_words(&line).and_then(|words| parse_line(&words)) {
            Ok(command) => command,
            Err(err) => {
                eprintln!("error: {err:#}");
                continue;
            }
        };
        debug!(?command, "shell command");

        if command == ShellCommand::Quit {
            break;
        }
        if let Err(err) = execute(app, dashboard, command) {
            eprintln!("error: {err:#}");
        }
    }

    Ok(())
}

fn execute(
    app: &App,
    dashboard: &mut Dashboard<HttpApiClient>,
    command: ShellCommand,
) -> anyhow::Result<()> {
    match command {
        ShellCommand::List(filter) => {
            if let Some(filter) = filter {
                dashboard.set_filter(filter);
            }
            print_dashboard(app, dashboard)
        }
        ShellCommand::Filter(filter) => {
            dashboard.set_filter(filter);
            print_dashboard(app, dashboard)
        }
        ShellCommand::Stats => {
            let mut out = io::stdout().lock();
            print_banner_and_header(app, dashboard, &mut out)?;
            app.renderer.write_stats(&mut out, &dashboard.stats())
        }
        ShellCommand::Show(id) => {
            let task = dashboard
                .task(&id)
                .ok_or_else(|| anyhow!("no task with id {id}"))?;
            app.renderer.write_task_info(&mut io::stdout().lock(), task)
        }
        ShellCommand::Add(edits) => {
            let today = today();
            dashboard.open_create(today);
            edits.apply(dashboard.form_mut(), today)?;
            submit(app, dashboard)
        }
        ShellCommand::Edit(id, edits) => {
            if !dashboard.open_edit(&id) {
                bail!("no task with id {id}");
            }
            edits.apply(dashboard.form_mut(), today())?;
            submit(app, dashboard)
        }
        ShellCommand::Status(id, status) => {
            if !dashboard.open_edit(&id) {
                bail!("no task with id {id}");
            }
            dashboard.form_mut().status = status;
            submit(app, dashboard)
        }
        ShellCommand::Delete(id) => {
            let skip_prompt = !app.cfg.confirm_deletes()?;
            let mut confirm = |prompt: &str| skip_prompt || prompt_yes_no(prompt);
            let outcome = app.runtime.block_on(dashboard.delete(&id, &mut confirm));
            report_delete(dashboard, &id, outcome)
        }
        ShellCommand::Retry => {
            if !dashboard.is_modal_open() {
                bail!("no form is open");
            }
            submit(app, dashboard)
        }
        ShellCommand::Cancel => {
            dashboard.close_modal();
            Ok(())
        }
        ShellCommand::Refresh => {
            app.runtime.block_on(dashboard.load());
            print_dashboard(app, dashboard)
        }
        ShellCommand::Dismiss => {
            dashboard.dismiss_error();
            Ok(())
        }
        ShellCommand::Help => {
            println!("{HELP}");
            Ok(())
        }
        ShellCommand::Quit => Ok(()),
    }
}

fn submit(app: &App, dashboard: &mut Dashboard<HttpApiClient>) -> anyhow::Result<()> {
    let outcome = app.runtime.block_on(dashboard.submit());
    let result = report_submit(dashboard, outcome);
    if result.is_err() && dashboard.is_modal_open() {
        eprintln!("form kept open; `retry` to resubmit or `cancel` to discard");
    }
    result
}

pub fn parse_line(words: &[String]) -> anyhow::Result<ShellCommand> {
    let Some((head, rest)) = words.split_first() else {
        bail!("empty command");
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "list" | "ls" => match rest {
            [] => ShellCommand::List(None),
            [filter] => ShellCommand::List(Some(filter.parse()?)),
            _ => bail!("usage: list [FILTER]"),
        },
        "filter" => match rest {
            [filter] => ShellCommand::Filter(filter.parse()?),
            _ => bail!("usage: filter FILTER"),
        },
        "stats" => ShellCommand::Stats,
        "show" | "info" => ShellCommand::Show(single_id(rest, "show ID")?),
        "add" | "new" => {
            let (mut edits, bare) = parse_edits(rest)?;
            if !bare.is_empty() {
                edits.title = Some(bare.join(" "));
            }
            ShellCommand::Add(edits)
        }
        "edit" | "modify" => {
            let Some((id, mods)) = rest.split_first() else {
                bail!("usage: edit ID key=value..");
            };
            let (edits, bare) = parse_edits(mods)?;
            if !bare.is_empty() {
                bail!("unexpected words: {}", bare.join(" "));
            }
            if edits.is_empty() {
                bail!("nothing to change; use title=, desc=, status= or due=");
            }
            ShellCommand::Edit(id.clone(), edits)
        }
        "status" => match rest {
            [id, status] => ShellCommand::Status(id.clone(), status.parse()?),
            _ => bail!("usage: status ID STATUS"),
        },
        "delete" | "rm" => ShellCommand::Delete(single_id(rest, "delete ID")?),
        "retry" => ShellCommand::Retry,
        "cancel" => ShellCommand::Cancel,
        "refresh" | "reload" => ShellCommand::Refresh,
        "dismiss" => ShellCommand::Dismiss,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => bail!("unknown command `{other}`; type `help`"),
    };
    Ok(command)
}

fn single_id(rest: &[String], usage: &str) -> anyhow::Result<String> {
    match rest {
        [id] => Ok(id.clone()),
        _ => Err(anyhow!("usage: {usage}")),
    }
}

/// Splits `key=value` modifiers from bare words.
fn parse_edits(words: &[String]) -> anyhow::Result<(FormEdits, Vec<String>)> {
    let mut edits = FormEdits::default();
    let mut bare = Vec::new();

    for word in words {
        let Some((key, value)) = word.split_once('=') else {
            bare.push(word.clone());
            continue;
        };
        match key.to_ascii_lowercase().as_str() {
            "title" => edits.title = Some(value.to_string()),
            "desc" | "description" => edits.description = Some(value.to_string()),
            "status" => edits.status = Some(value.parse()?),
            "due" => edits.due = Some(value.to_string()),
            _ => bare.push(word.clone()),
        }
    }

    Ok((edits, bare))
}

/// Whitespace splitting with single and double quotes grouping words.
pub fn split_words(line: &str) -> anyhow::Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_word = true;
            }
            None if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(ch);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        bail!("unterminated quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
