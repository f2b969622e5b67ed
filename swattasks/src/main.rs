// SwatTasks - local-first task list
// Bootstrap: logging, data directory, storage and initial load

use anyhow::Context;
use swattasks::app::{resolve_data_dir, AppState};
use swattasks::config::DEFAULT_LOG_FILTER;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting SwatTasks");

    let data_dir = resolve_data_dir()?;
    let state = AppState::initialize(data_dir)
        .await
        .context("failed to initialize storage")?;

    match std::env::args().nth(1).as_deref() {
        Some("export") => {
            let tasks = state.tasks.lock().await;
            println!("{}", tasks.export_selection(None)?);
        }
        Some(other) => anyhow::bail!("unknown command: {}", other),
        None => {
            let tasks = state.tasks.lock().await;
            let open = tasks.list().iter().filter(|t| !t.completed).count();
            tracing::info!(
                "{} tasks ({} open), theme {}",
                tasks.list().len(),
                open,
                tasks.effective_theme().cloned().unwrap_or_default()
            );
        }
    }

    Ok(())
}
