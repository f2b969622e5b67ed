//! Database models
//!
//! Rust structs representing stored records.
//! Records are persisted as camelCase JSON documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Parse a stored priority, falling back to medium for anything unknown.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Priority::Low,
            "high" => Priority::High,
            _ => Priority::Medium,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single to-do entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskItem {
    pub id: String,
    pub title: String,
    /// Markup text, rendered through `markup::format_markup`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    /// UI selection state. Never written to storage.
    #[serde(default, skip_serializing)]
    pub selected: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskItem {
    /// New item with both timestamps set to now
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            notes: None,
            priority: Priority::default(),
            completed: false,
            selected: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// New item with a random UUID identifier
    pub fn with_generated_id(title: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4().to_string(), title)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }

    /// Build an item from a stored record, filling fields that older
    /// records may lack.
    ///
    /// Returns `None` when the record has no usable `id` or `title`.
    pub fn from_record(record: Value, now: DateTime<Utc>) -> Option<Self> {
        let stored: StoredTask = serde_json::from_value(record).ok()?;

        let id = stored.id.filter(|id| !id.is_empty())?;
        let title = stored.title.filter(|title| !title.trim().is_empty())?;

        let created_at = stored
            .created_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(now);
        let updated_at = stored
            .updated_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(created_at)
            .max(created_at);

        Some(Self {
            id,
            title,
            description: stored.description,
            notes: stored.notes,
            priority: stored
                .priority
                .as_deref()
                .map(Priority::parse_lenient)
                .unwrap_or_default(),
            completed: stored.completed.unwrap_or(false),
            selected: false,
            created_at,
            updated_at,
        })
    }
}

/// Loosely-typed view of a stored task record
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    notes: Option<String>,
    priority: Option<String>,
    completed: Option<bool>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Application setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: Value,
}
