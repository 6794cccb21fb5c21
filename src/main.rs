use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::RestClient;
use crate::app::App;
use crate::browser::runtime::Env;
use crate::browser::{ExitAction, Model, Settings};
use crate::config::{ConfigStore, KeyResolver, MemoryStore, TomlConfigStore};
use crate::debug::DebugLog;

mod api;
mod app;
mod browser;
mod cli;
mod config;
mod debug;
mod search;
mod ssh;
mod theme;
mod tui;
mod view;

pub use theme::Theme;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _guard = initialize_logging()?;
    info!("Starting cloudnav");

    let args = cli::Args::parse();
    let mut config = config::load()?;
    args.apply(&mut config);

    let store: Arc<dyn ConfigStore> = match config::loader::config_path() {
        Some(path) => Arc::new(TomlConfigStore::new(path)),
        None => Arc::new(MemoryStore::default()),
    };
    let project = match args.project.clone() {
        Some(project) => Some(project),
        None => store.default_project().unwrap_or_else(|e| {
            warn!(error = %e, "Could not read the default project");
            None
        }),
    };

    let debug_log = Arc::new(DebugLog::new(config.browser.debug_capacity));
    let client = RestClient::new(
        &config.api.endpoint,
        config.api.access_token.clone(),
        Arc::clone(&debug_log),
    )?;
    let keys = Arc::new(KeyResolver::new(Arc::new(config.keybindings.clone())));
    let theme = theme::theme_from_name(&config.theme.name);

    let model = Model::new(Settings::from(&config.browser), keys, debug_log, project);
    let env = Env {
        api: Arc::new(client),
        store,
    };

    let outcome = App::new(model, env, theme).run().await?;

    if let Some(ExitAction::Ssh(target)) = outcome.exit_action {
        println!("Connecting to {}", target.destination());
        ssh::run(&target).map_err(|e| eyre!(e))?;
    }

    info!("Exiting cloudnav");
    Ok(())
}

fn initialize_logging() -> Result<WorkerGuard> {
    let directory = dirs::data_local_dir().map_or_else(
        || std::path::PathBuf::from("logs"),
        |path| path.join("cloudnav").join("logs"),
    );
    std::fs::create_dir_all(&directory)?;

    let file_appender = tracing_appender::rolling::daily(&directory, "cloudnav.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true),
        )
        .init();

    Ok(guard)
}
