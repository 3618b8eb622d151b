pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod due;
pub mod filter;
pub mod render;
pub mod session;
pub mod shell;
pub mod stats;
pub mod storage;

use std::ffi::OsString;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting taskflow CLI"
    );

    let mut cfg = config::Config::load(cli.config.as_deref())?;
    cfg.apply_overrides(
        cli.rc_overrides
            .into_iter()
            .map(|kv| (kv.key, kv.value))
            .chain(cli.api_url.map(|url| ("api.base_url".to_string(), url))),
    );

    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;

    let storage = storage::LocalStorage::open(&data_dir)
        .with_context(|| format!("failed to open local storage at {}", data_dir.display()))?;
    let session = Arc::new(session::SessionStore::restore(storage)?);
    debug!(
        authenticated = session.is_authenticated(),
        "session restored"
    );

    let api = api::HttpApiClient::new(&cfg.api_base_url(), cfg.api_timeout()?, Arc::clone(&session))?;
    let renderer = render::Renderer::new(&cfg)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let mut app = commands::App {
        cfg,
        session,
        api,
        renderer,
        runtime,
    };

    let command = cli
        .command
        .unwrap_or(cli::Command::List { filter: None });
    commands::dispatch(&mut app, command)
}
