use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use taskflow_shared::TaskStatus;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::filter::TaskFilter;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskflow",
    version,
    about = "TaskFlow Pro: manage your tasks from the terminal",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    /// Overrides api.base_url.
    #[arg(long = "api-url")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in with the demo account, falling back to offline demo mode.
    Demo,
    Logout,
    Whoami,
    /// Show the task list (default command).
    List {
        #[arg(
            short = 'f',
            long = "filter",
            value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<TaskFilter>())
        )]
        filter: Option<TaskFilter>,
    },
    /// Completion overview.
    Stats,
    Show {
        id: String,
    },
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
        /// today, tomorrow, +3d, 2026-11-01, ...
        #[arg(long)]
        due: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
        #[arg(long)]
        due: Option<String>,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
    /// Interactive dashboard that keeps its state between commands.
    Shell,
}

fn parse_status(s: &str) -> Result<TaskStatus, taskflow_shared::UnknownStatus> {
    s.parse()
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use taskflow_shared::TaskStatus;

    use super::{Command, GlobalCli};
    use crate::filter::TaskFilter;

    #[test]
    fn parses_list_filter_and_globals() {
        let cli = GlobalCli::try_parse_from([
            "taskflow",
            "--rc",
            "color=off",
            "list",
            "--filter",
            "completed",
            "-vv",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.rc_overrides[0].key, "color");
        match cli.command {
            Some(Command::List { filter }) => {
                assert_eq!(filter, Some(TaskFilter::Status(TaskStatus::Completed)));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn add_requires_title_and_parses_status() {
        assert!(GlobalCli::try_parse_from(["taskflow", "add"]).is_err());
        let cli = GlobalCli::try_parse_from([
            "taskflow",
            "add",
            "--title",
            "Write docs",
            "--status",
            "in-progress",
        ])
        .expect("parse");
        match cli.command {
            Some(Command::Add { title, status, .. }) => {
                assert_eq!(title, "Write docs");
                assert_eq!(status, Some(TaskStatus::InProgress));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
