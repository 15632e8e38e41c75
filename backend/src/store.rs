use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use shared::{Task, UpdateTaskRequest};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT,
    completed   BOOLEAN NOT NULL DEFAULT FALSE,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
)
"#;

const TASK_COLUMNS: &str = "id, title, description, completed, created_at, updated_at";

#[derive(Debug, FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            title: row.title,
            description: row.description,
            completed: row.completed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Handle on the task table. Constructed once at startup and cloned into
/// request handlers; the pool inside is the only shared state.
#[derive(Clone)]
pub struct TaskStore {
    pool: SqlitePool,
}

impl TaskStore {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        Self::connect_with(database_url, 5).await
    }

    pub async fn connect_with(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// All tasks, newest first.
    pub async fn list(&self) -> Result<Vec<Task>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TaskRow>(
            "SELECT id, title, description, completed, created_at, updated_at \
             FROM tasks ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Task::from).collect())
    }

    pub async fn create(
        &self,
        title: String,
        description: Option<String>,
    ) -> Result<Task, sqlx::Error> {
        // One `now` bound twice keeps created_at == updated_at at insert.
        let now = Utc::now();

        let row = sqlx::query_as::<_, TaskRow>(
            "INSERT INTO tasks (id, title, description, completed, created_at, updated_at) \
             VALUES (?, ?, ?, FALSE, ?, ?) \
             RETURNING id, title, description, completed, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(description)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// Applies only the fields present in `patch` and always refreshes
    /// `updated_at`. Returns `Ok(None)` when no row matches `id`.
    pub async fn update(
        &self,
        id: Uuid,
        patch: &UpdateTaskRequest,
    ) -> Result<Option<Task>, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE tasks SET updated_at = ");
        query.push_bind(Utc::now());

        if let Some(title) = &patch.title {
            query.push(", title = ").push_bind(title.clone());
        }
        if let Some(description) = &patch.description {
            query.push(", description = ").push_bind(description.clone());
        }
        if let Some(completed) = patch.completed {
            query.push(", completed = ").push_bind(completed);
        }

        query.push(" WHERE id = ").push_bind(id);
        query.push(" RETURNING ").push(TASK_COLUMNS);

        let row = query
            .build_query_as::<TaskRow>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Task::from))
    }

    /// Returns `Ok(false)` when no row matched `id`.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A single connection keeps every query on the same in-memory database.
    async fn memory_store() -> TaskStore {
        TaskStore::connect_with("sqlite::memory:", 1)
            .await
            .expect("in-memory store")
    }

    #[tokio::test]
    async fn create_defaults_to_pending_with_equal_timestamps() {
        let store = memory_store().await;

        let task = store.create("Buy milk".to_string(), None).await.unwrap();

        assert!(!task.completed);
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, None);
    }

    #[tokio::test]
    async fn list_orders_by_creation_newest_first() {
        let store = memory_store().await;

        for title in ["first", "second", "third"] {
            store.create(title.to_string(), None).await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let titles: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, ["third", "second", "first"]);
    }

    #[tokio::test]
    async fn update_touches_only_present_fields() {
        let store = memory_store().await;
        let task = store
            .create("Buy milk".to_string(), Some("2 liters".to_string()))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let patch = UpdateTaskRequest {
            completed: Some(true),
            ..Default::default()
        };
        let updated = store.update(task.id, &patch).await.unwrap().unwrap();

        assert!(updated.completed);
        assert_eq!(updated.title, "Buy milk");
        assert_eq!(updated.description, Some("2 liters".to_string()));
        assert_eq!(updated.created_at, task.created_at);
        assert!(updated.updated_at > task.updated_at);
    }

    #[tokio::test]
    async fn update_with_explicit_null_clears_description() {
        let store = memory_store().await;
        let task = store
            .create("Buy milk".to_string(), Some("2 liters".to_string()))
            .await
            .unwrap();

        let patch = UpdateTaskRequest {
            description: Some(None),
            ..Default::default()
        };
        let updated = store.update(task.id, &patch).await.unwrap().unwrap();

        assert_eq!(updated.description, None);
        assert_eq!(updated.title, "Buy milk");
    }

    #[tokio::test]
    async fn update_unknown_id_returns_none() {
        let store = memory_store().await;
        store.create("Buy milk".to_string(), None).await.unwrap();

        let patch = UpdateTaskRequest {
            completed: Some(true),
            ..Default::default()
        };
        let result = store.update(Uuid::new_v4(), &patch).await.unwrap();

        assert!(result.is_none());
        assert!(!store.list().await.unwrap()[0].completed);
    }

    #[tokio::test]
    async fn delete_removes_exactly_the_target_row() {
        let store = memory_store().await;
        let keep = store.create("keep".to_string(), None).await.unwrap();
        let remove = store.create("remove".to_string(), None).await.unwrap();

        assert!(store.delete(remove.id).await.unwrap());
        assert!(!store.delete(Uuid::new_v4()).await.unwrap());

        let remaining = store.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep.id);
    }
}
