//! Application state and initialization
//!
//! Builds the storage tiers and the task repository once at startup.
//! The UI layer holds [`AppState`] and reaches the repository through it.

use crate::config::{APP_DIR_NAME, DATA_DIR_ENV, FALLBACK_STORE_FILE};
use crate::error::{AppError, Result};
use crate::services::TaskRepository;
use crate::storage::{JsonFileStore, SqliteStore};
use crate::theme::{ColorSchemeProbe, EnvColorScheme, Theme};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Central application state
#[derive(Clone)]
pub struct AppState {
    pub app_data_dir: PathBuf,
    pub tasks: Arc<Mutex<TaskRepository>>,
}

impl AppState {
    /// Open storage in `app_data_dir`, load tasks and apply the stored theme.
    pub async fn initialize(app_data_dir: PathBuf) -> Result<Self> {
        Self::initialize_with(app_data_dir, Arc::new(EnvColorScheme)).await
    }

    /// Same as [`initialize`](Self::initialize) with an explicit color-scheme source
    pub async fn initialize_with(
        app_data_dir: PathBuf,
        color_scheme: Arc<dyn ColorSchemeProbe>,
    ) -> Result<Self> {
        tracing::info!("Initializing application");
        tracing::info!("App data directory: {:?}", app_data_dir);

        std::fs::create_dir_all(&app_data_dir)?;

        let store = Arc::new(SqliteStore::in_dir(&app_data_dir));
        let fallback = Arc::new(JsonFileStore::new(fallback_store_path(&app_data_dir)));
        let mut repo = TaskRepository::new(store, fallback, color_scheme);

        repo.initialize().await?;
        repo.load().await;

        let theme = repo.get_theme().await;
        repo.apply_theme(&theme);

        tracing::info!("Application initialized successfully");

        Ok(Self {
            app_data_dir,
            tasks: Arc::new(Mutex::new(repo)),
        })
    }

    /// Theme currently applied
    pub async fn effective_theme(&self) -> Theme {
        self.tasks
            .lock()
            .await
            .effective_theme()
            .cloned()
            .unwrap_or_default()
    }
}

/// Data directory: the override variable if set, else the platform data dir.
pub fn resolve_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| AppError::Generic("Failed to get app data dir".to_string()))
}

/// Path of the fallback key/value file for a data directory
pub fn fallback_store_path(app_data_dir: &Path) -> PathBuf {
    app_data_dir.join(FALLBACK_STORE_FILE)
}
