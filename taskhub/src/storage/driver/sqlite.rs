use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Connection, FromRow, SqlitePool};

use crate::api::health::ReadyCheck;
use crate::domain::task::Task;
use crate::error::{AppError, Result};
use crate::storage::TaskStorage;

const MAX_OPEN_CONNECTIONS: u32 = 20;
const CONNECTION_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const CONNECTION_MAX_LIFETIME: Duration = Duration::from_secs(30 * 60);

const CREATE_TASKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id         TEXT    PRIMARY KEY NOT NULL,
    title      TEXT    NOT NULL,
    done       INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL DEFAULT (CAST((julianday('now') - 2440587.5) * 86400000000 AS INTEGER))
)
"#;

/// Opens a bounded pool for `dsn`, creating the database file if needed.
pub async fn connect(dsn: &str) -> Result<SqlitePool> {
    if dsn.trim().is_empty() {
        return Err(AppError::Internal("empty database connection string".to_string()));
    }
    let options = SqliteConnectOptions::from_str(dsn)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_OPEN_CONNECTIONS)
        .idle_timeout(CONNECTION_IDLE_TIMEOUT)
        .max_lifetime(CONNECTION_MAX_LIFETIME)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Creates the `tasks` table. Safe to run on every start.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::query(CREATE_TASKS_TABLE).execute(pool).await?;
    Ok(())
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: String,
    title: String,
    done: i64,
    created_at: i64,
}

impl TryFrom<TaskRow> for Task {
    type Error = AppError;

    fn try_from(row: TaskRow) -> Result<Self> {
        let created_at = DateTime::<Utc>::from_timestamp_micros(row.created_at).ok_or_else(|| {
            AppError::CorruptRow(format!("task {} has created_at {}", row.id, row.created_at))
        })?;
        Ok(Task {
            id: row.id,
            title: row.title,
            done: row.done != 0,
            created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SqliteTaskStorage {
    pool: SqlitePool,
}

impl SqliteTaskStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TaskStorage for SqliteTaskStorage {
    async fn create(&self, task: Task) -> Result<Task> {
        let result = sqlx::query("INSERT INTO tasks (id, title, done, created_at) VALUES ($1, $2, $3, $4)")
            .bind(&task.id)
            .bind(&task.title)
            .bind(i64::from(task.done))
            .bind(task.created_at.timestamp_micros())
            .execute(&self.pool)
            .await;
        match result {
            Ok(_) => Ok(task),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::DuplicateTask(task.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<Task>> {
        sqlx::query_as::<_, TaskRow>(
            "SELECT id, title, done, created_at FROM tasks ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Task::try_from)
        .collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Task>> {
        sqlx::query_as::<_, TaskRow>("SELECT id, title, done, created_at FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Task::try_from)
            .transpose()
    }

    async fn mark_done(&self, id: &str, done: bool) -> Result<Option<Task>> {
        let result = sqlx::query("UPDATE tasks SET done = $1 WHERE id = $2")
            .bind(i64::from(done))
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        // Re-read so the caller sees exactly what is persisted.
        self.get(id).await
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReadyCheck for SqliteTaskStorage {
    async fn ready(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }
}
