//! Application configuration constants
//!
//! Central location for storage names, theme names and environment
//! variables used throughout the application.

// ===== Database =====

/// Logical database name; the SQLite file is derived from it
pub const DATABASE_NAME: &str = "TodoAppDB";

/// File extension appended to [`DATABASE_NAME`]
pub const DATABASE_FILE_EXTENSION: &str = "sqlite3";

/// Current schema version. Bump together with a new migration.
pub const SCHEMA_VERSION: i32 = 1;

/// Collection holding task items, keyed by `id`
pub const TODOS_COLLECTION: &str = "todos";

/// Collection holding settings records, keyed by `key`
pub const SETTINGS_COLLECTION: &str = "settings";

/// Seconds a write waits on a locked database before failing
pub const BUSY_TIMEOUT_SECS: u64 = 5;

// ===== Fallback Storage =====

/// File backing the secondary key/value store
pub const FALLBACK_STORE_FILE: &str = "fallback.json";

// ===== Theme =====

/// Settings key under which the theme is persisted
pub const THEME_SETTING_KEY: &str = "theme";

/// Theme names beyond auto/light/dark that the UI ships stylesheets for
pub const EXTENDED_THEMES: &[&str] = &["sepia", "nord", "solarized", "high-contrast"];

// ===== Environment =====

/// Overrides the data directory
pub const DATA_DIR_ENV: &str = "SWATTASKS_DATA_DIR";

/// Ambient color-scheme signal ("dark" or "light")
pub const COLOR_SCHEME_ENV: &str = "SWATTASKS_COLOR_SCHEME";

/// Directory name under the platform data dir
pub const APP_DIR_NAME: &str = "swattasks";

/// Log filter used when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "swattasks=debug,info";
