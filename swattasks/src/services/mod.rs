//! Services module
//!
//! Business logic that sits between the presentation layer and storage.

pub mod tasks;

pub use tasks::TaskRepository;
