//! SwatTasks library
//!
//! Task persistence, settings and markup formatting for the SwatTasks
//! front end. The UI layer drives everything through [`app::AppState`].

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod markup;
pub mod services;
pub mod storage;
pub mod theme;

pub use database::{Priority, TaskItem};
pub use error::{AppError, Result};
pub use markup::format_markup;
pub use services::TaskRepository;
pub use theme::Theme;
