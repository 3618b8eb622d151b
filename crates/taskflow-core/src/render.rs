use std::io::{self, IsTerminal, Write};

use taskflow_shared::{Task, TaskStatus};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::filter::TaskFilter;
use crate::stats::TaskStats;

const APP_TITLE: &str = "TaskFlow Pro";
const BAR_WIDTH: usize = 30;
const DESCRIPTION_WIDTH: usize = 48;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.color()? && io::stdout().is_terminal();
        Ok(Self { color })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    /// App bar: title, welcome line and the demo-mode badge.
    pub fn write_header<W: Write>(
        &self,
        out: &mut W,
        display_name: Option<&str>,
        offline: bool,
    ) -> anyhow::Result<()> {
        let badge = if offline {
            format!("  {}", self.paint("[Demo Mode (Offline)]", "33"))
        } else {
            String::new()
        };
        writeln!(out, "{}{badge}", self.paint(APP_TITLE, "1"))?;
        if let Some(name) = display_name {
            writeln!(out, "Welcome, {name}")?;
        }
        writeln!(out)?;
        Ok(())
    }

    pub fn write_error_banner<W: Write>(&self, out: &mut W, message: &str) -> anyhow::Result<()> {
        writeln!(out, "{} {message}", self.paint("!", "31"))?;
        Ok(())
    }

    #[tracing::instrument(skip(self, out, tasks))]
    pub fn write_task_table<W: Write>(
        &self,
        out: &mut W,
        tasks: &[&Task],
        filter: TaskFilter,
    ) -> anyhow::Result<()> {
        writeln!(out, "Tasks ({})", filter.label())?;
        if tasks.is_empty() {
            writeln!(out, "No tasks found matching current filter.")?;
            return Ok(());
        }

        let headers = ["ID", "Status", "Due", "Title", "Description"]
            .into_iter()
            .map(str::to_string)
            .collect();

        let rows = tasks
            .iter()
            .map(|task| {
                let status = self.paint(task.status.label(), status_color(task.status));
                let due = task
                    .due_date
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "No Date".to_string());
                let title = if task.status == TaskStatus::Completed {
                    self.paint(&task.title, "9")
                } else {
                    task.title.clone()
                };
                vec![
                    self.paint(&task.id, "33"),
                    status,
                    due,
                    title,
                    truncate(&task.description, DESCRIPTION_WIDTH),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    pub fn write_task_info<W: Write>(&self, out: &mut W, task: &Task) -> anyhow::Result<()> {
        writeln!(out, "id          {}", task.id)?;
        writeln!(out, "title       {}", task.title)?;
        writeln!(out, "status      {}", task.status.label())?;
        writeln!(
            out,
            "due         {}",
            task.due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "No Date".to_string())
        )?;
        writeln!(out, "created     {}", task.created_at.to_rfc3339())?;
        if let Some(updated) = task.updated_at {
            writeln!(out, "updated     {}", updated.to_rfc3339())?;
        }
        if !task.description.is_empty() {
            writeln!(out, "description {}", task.description)?;
        }
        Ok(())
    }

    /// Task overview: completion bar plus per-status counts.
    pub fn write_stats<W: Write>(&self, out: &mut W, stats: &TaskStats) -> anyhow::Result<()> {
        writeln!(out, "Task Overview")?;
        if stats.total == 0 {
            writeln!(out, "  0% Done  No tasks created yet")?;
            return Ok(());
        }

        let filled = (usize::from(stats.completion_rate) * BAR_WIDTH + 50) / 100;
        let bar = format!(
            "{}{}",
            self.paint(&"#".repeat(filled), "32"),
            "-".repeat(BAR_WIDTH - filled)
        );
        writeln!(out, "  [{bar}] {}% Done", stats.completion_rate)?;
        for status in [TaskStatus::Completed, TaskStatus::InProgress, TaskStatus::Pending] {
            writeln!(
                out,
                "  {:<12}{}",
                self.paint(status.label(), status_color(status)),
                stats.count(status)
            )?;
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn status_color(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Completed => "32",
        TaskStatus::InProgress => "34",
        TaskStatus::Pending => "33",
    }
}

fn truncate(text: &str, max_width: usize) -> String {
    let single_line = text.replace(['\n', '\r'], " ");
    if UnicodeWidthStr::width(single_line.as_str()) <= max_width {
        return single_line;
    }
    let mut out = String::new();
    let mut width = 0;
    for ch in single_line.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + w > max_width.saturating_sub(1) {
            break;
        }
        width += w;
        out.push(ch);
    }
    out.push('…');
    out
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let header_line = headers
        .iter()
        .zip(&widths)
        .map(|(header, &width)| format!("{header:width$}"))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{}", header_line.trim_end())?;

    let rule = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{rule}")?;

    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let visible = UnicodeWidthStr::width(strip_ansi(cell).as_str());
                format!("{cell}{}", " ".repeat(width.saturating_sub(visible)))
            })
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{}", line.trim_end())?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
