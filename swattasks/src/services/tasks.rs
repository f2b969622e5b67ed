//! Task repository
//!
//! Owns the in-memory task list and keeps it in step with the record store.
//! Every mutator writes through to storage first and touches the in-memory
//! list only once the write has committed, so after a call resolves
//! [`TaskRepository::list`] reflects it.
//!
//! Ordering policy: a full [`load`](TaskRepository::load) sorts by creation
//! time, newest first. [`add`](TaskRepository::add) inserts at the front and
//! [`update`](TaskRepository::update) keeps the item's position.

use crate::config::THEME_SETTING_KEY;
use crate::database::{Setting, TaskItem};
use crate::error::{AppError, Result};
use crate::storage::{Collection, KeyValueStore, StoragePort};
use crate::theme::{ColorSchemeProbe, Theme};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Write-through cache of task items plus a settings accessor
pub struct TaskRepository {
    store: Arc<dyn StoragePort>,
    fallback: Arc<dyn KeyValueStore>,
    color_scheme: Arc<dyn ColorSchemeProbe>,
    items: Vec<TaskItem>,
    effective_theme: Option<Theme>,
}

impl TaskRepository {
    pub fn new(
        store: Arc<dyn StoragePort>,
        fallback: Arc<dyn KeyValueStore>,
        color_scheme: Arc<dyn ColorSchemeProbe>,
    ) -> Self {
        Self {
            store,
            fallback,
            color_scheme,
            items: Vec::new(),
            effective_theme: None,
        }
    }

    /// Open the underlying store. Safe to call more than once.
    pub async fn initialize(&self) -> Result<()> {
        self.store.initialize().await
    }

    /// Replace the in-memory list with a fresh read of storage.
    ///
    /// A failed read is logged and leaves the list empty.
    pub async fn load(&mut self) -> &[TaskItem] {
        match self.store.get_all(Collection::Todos).await {
            Ok(records) => {
                let now = Utc::now();
                let total = records.len();
                let mut items: Vec<TaskItem> = records
                    .into_iter()
                    .filter_map(|record| TaskItem::from_record(record, now))
                    .collect();

                if items.len() < total {
                    tracing::warn!(
                        "Skipped {} malformed task records",
                        total - items.len()
                    );
                }

                items.sort_by(|a, b| {
                    b.created_at
                        .cmp(&a.created_at)
                        .then_with(|| a.id.cmp(&b.id))
                });
                self.items = items;
                tracing::info!("Loaded {} tasks", self.items.len());
            }
            Err(e) => {
                tracing::error!("Failed to load tasks, starting with an empty list: {}", e);
                self.items.clear();
            }
        }

        &self.items
    }

    /// Current in-memory list
    pub fn list(&self) -> &[TaskItem] {
        &self.items
    }

    /// Mutable view for transient UI state such as `selected`.
    ///
    /// Durable field changes made here are not persisted until passed to
    /// [`update`](Self::update).
    pub fn list_mut(&mut self) -> &mut [TaskItem] {
        &mut self.items
    }

    /// Look up an item by id
    pub fn find(&self, id: &str) -> Result<&TaskItem> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    /// Persist a new item and put it at the front of the list.
    pub async fn add(&mut self, item: TaskItem) -> Result<()> {
        validate_item(&item)?;
        if item.updated_at < item.created_at {
            return Err(AppError::InvalidArgument(format!(
                "task {} was updated before it was created",
                item.id
            )));
        }

        self.store
            .put(Collection::Todos, &serde_json::to_value(&item)?)
            .await?;

        tracing::debug!("Added task: {}", item.id);
        self.items.retain(|existing| existing.id != item.id);
        self.items.insert(0, item);
        Ok(())
    }

    /// Persist changes to an item, stamping `updated_at`.
    ///
    /// The item keeps its list position. Returns the stored item.
    pub async fn update(&mut self, mut item: TaskItem) -> Result<TaskItem> {
        validate_item(&item)?;

        let position = self.items.iter().position(|existing| existing.id == item.id);
        let previous = position
            .map(|index| self.items[index].updated_at)
            .unwrap_or(item.updated_at);
        item.updated_at = next_update_stamp(Utc::now(), previous, item.created_at);

        self.store
            .put(Collection::Todos, &serde_json::to_value(&item)?)
            .await?;

        tracing::debug!("Updated task: {}", item.id);
        match position {
            Some(index) => self.items[index] = item.clone(),
            None => {
                tracing::warn!("Updated task {} was not in the list, inserting", item.id);
                self.items.insert(0, item.clone());
            }
        }
        Ok(item)
    }

    /// Remove an item. Unknown ids are not an error.
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        require_id(id)?;

        self.store.delete(Collection::Todos, id).await?;

        tracing::debug!("Deleted task: {}", id);
        self.items.retain(|item| item.id != id);
        Ok(())
    }

    /// Flip an item's completion state
    pub async fn toggle_completed(&mut self, id: &str) -> Result<TaskItem> {
        let mut item = self.find(id)?.clone();
        item.completed = !item.completed;
        self.update(item).await
    }

    /// Mark an item selected or not. Not persisted.
    pub fn set_selected(&mut self, id: &str, selected: bool) -> Result<()> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        item.selected = selected;
        Ok(())
    }

    /// Ids of selected items, in list order
    pub fn selected_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.selected)
            .map(|item| item.id.clone())
            .collect()
    }

    /// Delete every selected item. Returns how many were removed.
    pub async fn delete_selected(&mut self) -> Result<usize> {
        let ids = self.selected_ids();
        self.delete_each(ids).await
    }

    /// Delete every completed item. Returns how many were removed.
    pub async fn clear_completed(&mut self) -> Result<usize> {
        let ids: Vec<String> = self
            .items
            .iter()
            .filter(|item| item.completed)
            .map(|item| item.id.clone())
            .collect();
        self.delete_each(ids).await
    }

    /// One storage round-trip per id, in order. Stops at the first failure,
    /// leaving earlier deletions in place.
    async fn delete_each(&mut self, ids: Vec<String>) -> Result<usize> {
        let mut removed = 0;
        for id in ids {
            self.delete(&id).await?;
            removed += 1;
        }

        tracing::info!("Removed {} tasks", removed);
        Ok(removed)
    }

    /// Wipe tasks and settings, then best-effort clear the fallback store.
    pub async fn clear_all(&mut self) -> Result<()> {
        self.store.clear(Collection::Todos).await?;
        self.items.clear();
        self.store.clear(Collection::Settings).await?;

        if let Err(e) = self.fallback.clear_items().await {
            tracing::warn!("Failed to clear fallback store: {}", e);
        }

        tracing::info!("All data cleared");
        Ok(())
    }

    /// Pretty-printed JSON array of the items with the given ids, or of every
    /// item when `ids` is `None`. List order is kept.
    pub fn export_selection(&self, ids: Option<&[String]>) -> Result<String> {
        let wanted: Option<HashSet<&str>> =
            ids.map(|ids| ids.iter().map(String::as_str).collect());

        let selection: Vec<&TaskItem> = self
            .items
            .iter()
            .filter(|item| {
                wanted
                    .as_ref()
                    .map_or(true, |wanted| wanted.contains(item.id.as_str()))
            })
            .collect();

        Ok(serde_json::to_string_pretty(&selection)?)
    }

    /// Write a settings record
    pub async fn set_setting(&self, key: &str, value: Value) -> Result<()> {
        require_key(key)?;

        let setting = Setting {
            key: key.to_string(),
            value,
        };
        self.store
            .put(Collection::Settings, &serde_json::to_value(&setting)?)
            .await?;

        tracing::debug!("Set setting: {}", key);
        Ok(())
    }

    /// Read a settings value. `None` when the key has never been set.
    pub async fn get_setting(&self, key: &str) -> Result<Option<Value>> {
        require_key(key)?;

        match self.store.get(Collection::Settings, key).await? {
            Some(record) => {
                let setting: Setting = serde_json::from_value(record).map_err(|e| {
                    AppError::StorageRead(format!("corrupt setting {}: {}", key, e))
                })?;
                Ok(Some(setting.value))
            }
            None => Ok(None),
        }
    }

    /// Persist a theme and apply it. Returns the effective theme.
    ///
    /// Falls back to the secondary store when the primary write fails; a
    /// failure there too is logged, and the theme is still applied.
    pub async fn set_theme(&mut self, name: &str) -> Result<Theme> {
        let theme: Theme = name.parse()?;

        if let Err(e) = self
            .set_setting(THEME_SETTING_KEY, Value::String(theme.to_string()))
            .await
        {
            tracing::warn!("Failed to store theme, using fallback store: {}", e);
            if let Err(e) = self
                .fallback
                .set_item(THEME_SETTING_KEY, theme.as_str())
                .await
            {
                tracing::warn!("Failed to store theme in fallback store: {}", e);
            }
        }

        Ok(self.apply_theme(&theme))
    }

    /// Stored theme, from the primary store, then the fallback store, then
    /// light.
    pub async fn get_theme(&self) -> Theme {
        let primary = match self.get_setting(THEME_SETTING_KEY).await {
            Ok(Some(Value::String(name))) => Some(name),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Failed to read theme, trying fallback store: {}", e);
                None
            }
        };

        let stored = match primary {
            Some(name) => Some(name),
            None => match self.fallback.get_item(THEME_SETTING_KEY).await {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!("Failed to read theme from fallback store: {}", e);
                    None
                }
            },
        };

        stored
            .and_then(|name| match name.parse::<Theme>() {
                Ok(theme) => Some(theme),
                Err(e) => {
                    tracing::warn!("Ignoring stored theme: {}", e);
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Resolve a theme against the ambient color scheme and record it as
    /// the applied theme.
    pub fn apply_theme(&mut self, theme: &Theme) -> Theme {
        let effective = theme.effective(self.color_scheme.color_scheme());
        tracing::info!("Applying theme {} (effective {})", theme, effective);
        self.effective_theme = Some(effective.clone());
        effective
    }

    /// Theme most recently applied, if any
    pub fn effective_theme(&self) -> Option<&Theme> {
        self.effective_theme.as_ref()
    }
}

fn require_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(AppError::InvalidArgument("task id is required".to_string()));
    }
    Ok(())
}

fn require_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(AppError::InvalidArgument(
            "setting key is required".to_string(),
        ));
    }
    Ok(())
}

fn validate_item(item: &TaskItem) -> Result<()> {
    require_id(&item.id)?;
    if item.title.trim().is_empty() {
        return Err(AppError::InvalidArgument(
            "task title is required".to_string(),
        ));
    }
    Ok(())
}

/// Never earlier than `created_at`, always later than `previous`.
fn next_update_stamp(
    now: DateTime<Utc>,
    previous: DateTime<Utc>,
    created_at: DateTime<Utc>,
) -> DateTime<Utc> {
    let stamp = now.max(created_at);
    if stamp <= previous {
        previous + Duration::milliseconds(1)
    } else {
        stamp
    }
}
