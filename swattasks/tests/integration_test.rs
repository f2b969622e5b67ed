//! Integration tests for SwatTasks
//!
//! These tests run the task repository against the SQLite store on disk:
//! - Write-through CRUD and reload across process restarts
//! - Bulk clearing
//! - Theme persistence and fallback
//! - Application bootstrap

use chrono::{Duration, Utc};
use std::sync::Arc;
use swattasks::app::AppState;
use swattasks::database::{Priority, TaskItem};
use swattasks::services::TaskRepository;
use swattasks::storage::{Collection, JsonFileStore, KeyValueStore, SqliteStore, StoragePort};
use swattasks::theme::{ColorScheme, FixedColorScheme, Theme};
use swattasks::AppError;
use tempfile::TempDir;

/// Repository over a database and fallback file in `dir`
fn open_repo(dir: &TempDir) -> TaskRepository {
    TaskRepository::new(
        Arc::new(SqliteStore::in_dir(dir.path())),
        Arc::new(JsonFileStore::new(dir.path().join("fallback.json"))),
        Arc::new(FixedColorScheme(ColorScheme::Dark)),
    )
}

async fn create_test_repo() -> (TaskRepository, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let repo = open_repo(&temp_dir);
    repo.initialize().await.unwrap();
    (repo, temp_dir)
}

#[tokio::test]
async fn test_task_crud_operations() {
    let (mut repo, _temp) = create_test_repo().await;

    let item = TaskItem::new("t-1", "Buy milk")
        .with_description("from the **corner** shop")
        .with_priority(Priority::High);
    repo.add(item.clone()).await.unwrap();

    let matching: Vec<&TaskItem> = repo.list().iter().filter(|t| t.id == "t-1").collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0], &item);

    let mut edited = item.clone();
    edited.title = "Buy oat milk".to_string();
    let stored = repo.update(edited).await.unwrap();
    assert!(stored.updated_at > item.updated_at);
    assert_eq!(repo.find("t-1").unwrap().title, "Buy oat milk");

    repo.delete("t-1").await.unwrap();
    assert!(repo.list().iter().all(|t| t.id != "t-1"));
    repo.delete("t-1").await.unwrap();
}

#[tokio::test]
async fn test_reload_reproduces_list() {
    let temp_dir = TempDir::new().unwrap();

    let before = {
        let mut repo = open_repo(&temp_dir);
        repo.initialize().await.unwrap();

        for (i, title) in ["Plan trip", "Book hotel", "Pack bags", "Water plants"]
            .iter()
            .enumerate()
        {
            let item = TaskItem::new(format!("t-{}", i), *title)
                .with_notes("==remember==")
                .with_created_at(Utc::now() - Duration::minutes(10 * (i as i64 + 1)));
            repo.add(item).await.unwrap();
        }

        let mut done = repo.find("t-2").unwrap().clone();
        done.completed = true;
        repo.update(done).await.unwrap();
        repo.delete("t-3").await.unwrap();

        let mut snapshot = repo.list().to_vec();
        snapshot.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        snapshot
    };

    // Fresh repository over the same files, as after a restart
    let mut repo = open_repo(&temp_dir);
    repo.initialize().await.unwrap();
    let after = repo.load().await.to_vec();

    assert_eq!(after, before);
    let ids: Vec<&str> = after.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t-0", "t-1", "t-2"]);
    assert!(after[2].completed);
}

#[tokio::test]
async fn test_selection_does_not_survive_reload() {
    let temp_dir = TempDir::new().unwrap();

    {
        let mut repo = open_repo(&temp_dir);
        repo.initialize().await.unwrap();
        repo.add(TaskItem::new("a", "Task")).await.unwrap();
        repo.set_selected("a", true).unwrap();
        let item = repo.find("a").unwrap().clone();
        repo.update(item).await.unwrap();
    }

    let mut repo = open_repo(&temp_dir);
    repo.initialize().await.unwrap();
    repo.load().await;

    assert!(!repo.find("a").unwrap().selected);
}

#[tokio::test]
async fn test_clear_completed_and_clear_all() {
    let (mut repo, _temp) = create_test_repo().await;

    for i in 0..6 {
        let mut item = TaskItem::new(format!("t-{}", i), format!("Task {}", i));
        item.completed = i % 2 == 0;
        repo.add(item).await.unwrap();
    }
    repo.set_setting("sort", serde_json::json!("newest")).await.unwrap();

    assert_eq!(repo.clear_completed().await.unwrap(), 3);
    assert!(repo.list().iter().all(|t| !t.completed));
    assert_eq!(repo.list().len(), 3);
    assert_eq!(repo.load().await.len(), 3);

    repo.clear_all().await.unwrap();

    assert!(repo.list().is_empty());
    assert!(repo.load().await.is_empty());
    assert_eq!(repo.get_setting("sort").await.unwrap(), None);
}

#[tokio::test]
async fn test_theme_persists_in_primary_store() {
    let (mut repo, temp) = create_test_repo().await;

    assert_eq!(repo.get_theme().await, Theme::Light);
    assert_eq!(repo.set_theme("auto").await.unwrap(), Theme::Dark);

    let reopened = open_repo(&temp);
    assert_eq!(reopened.get_theme().await, Theme::Auto);

    let fallback = JsonFileStore::new(temp.path().join("fallback.json"));
    assert_eq!(fallback.get_item("theme").await.unwrap(), None);
}

#[tokio::test]
async fn test_theme_falls_back_when_database_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    // Directory in place of the database file: opening it fails
    let blocked = temp_dir.path().join("blocked");
    std::fs::create_dir_all(&blocked).unwrap();

    let mut repo = TaskRepository::new(
        Arc::new(SqliteStore::new(blocked)),
        Arc::new(JsonFileStore::new(temp_dir.path().join("fallback.json"))),
        Arc::new(FixedColorScheme(ColorScheme::Light)),
    );

    assert!(matches!(
        repo.initialize().await,
        Err(AppError::StorageUnavailable(_))
    ));
    assert!(repo.load().await.is_empty());
    assert!(repo.add(TaskItem::new("a", "Task")).await.is_err());

    assert_eq!(repo.set_theme("sepia").await.unwrap().as_str(), "sepia");
    assert_eq!(repo.get_theme().await, Theme::Named("sepia".to_string()));
}

#[tokio::test]
async fn test_store_records_use_camel_case() {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteStore::in_dir(temp_dir.path());
    let mut repo = TaskRepository::new(
        Arc::new(SqliteStore::in_dir(temp_dir.path())),
        Arc::new(JsonFileStore::new(temp_dir.path().join("fallback.json"))),
        Arc::new(FixedColorScheme(ColorScheme::Light)),
    );
    repo.initialize().await.unwrap();
    repo.add(TaskItem::new("a", "Task")).await.unwrap();

    let record = store.get(Collection::Todos, "a").await.unwrap().unwrap();

    assert_eq!(record["priority"], "medium");
    assert_eq!(record["completed"], false);
    assert!(record.get("createdAt").is_some());
    assert!(record.get("updatedAt").is_some());
    assert!(record.get("selected").is_none());
}

#[tokio::test]
async fn test_app_state_initialize_and_restart() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");

    {
        let state = AppState::initialize_with(
            data_dir.clone(),
            Arc::new(FixedColorScheme(ColorScheme::Dark)),
        )
        .await
        .unwrap();

        assert_eq!(state.effective_theme().await, Theme::Light);

        let mut tasks = state.tasks.lock().await;
        tasks.add(TaskItem::new("a", "Survives restart")).await.unwrap();
        tasks.set_theme("auto").await.unwrap();
    }

    let state = AppState::initialize_with(data_dir, Arc::new(FixedColorScheme(ColorScheme::Dark)))
        .await
        .unwrap();

    assert_eq!(state.effective_theme().await, Theme::Dark);
    let tasks = state.tasks.lock().await;
    assert_eq!(tasks.list().len(), 1);
    assert_eq!(tasks.list()[0].title, "Survives restart");
}
