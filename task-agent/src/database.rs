//! SQLite-backed task persistence.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;
use uuid::Uuid;

use crate::error::StoreError;

/// Durable destination for confirmed tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a confirmed task with its (possibly empty) subtask list and
    /// return its new identifier. Subtask order is preserved.
    async fn commit(&self, task: &str, subtasks: &[String]) -> Result<Uuid, StoreError>;
}

/// A task as read back from the store.
#[derive(Debug, Clone)]
pub struct PersistedTask {
    pub id: Uuid,
    pub task: String,
    pub created_at: String,
    pub subtasks: Vec<String>,
}

/// SQLite store. Connection access is serialized behind a mutex; workflow
/// runs commit at most once so contention is not a concern.
pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
}

impl SqliteTaskStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests and dry runs.
    pub fn new_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                task TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS subtasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id TEXT NOT NULL REFERENCES tasks(id),
                position INTEGER NOT NULL,
                description TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Read a task back with its subtasks in committed order.
    pub fn fetch(&self, id: Uuid) -> Result<Option<PersistedTask>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let mut stmt = conn.prepare("SELECT task, created_at FROM tasks WHERE id = ?1")?;
        let row = stmt
            .query_row([id.to_string()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        let Some((task, created_at)) = row else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT description FROM subtasks WHERE task_id = ?1 ORDER BY position ASC",
        )?;
        let subtasks = stmt
            .query_map([id.to_string()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(PersistedTask {
            id,
            task,
            created_at,
            subtasks,
        }))
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn commit(&self, task: &str, subtasks: &[String]) -> Result<Uuid, StoreError> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let id = Uuid::new_v4();
        let created_at = chrono::Local::now().to_rfc3339();

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO tasks (id, task, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![id.to_string(), task, created_at],
        )?;
        for (position, description) in subtasks.iter().enumerate() {
            tx.execute(
                "INSERT INTO subtasks (task_id, position, description) VALUES (?1, ?2, ?3)",
                rusqlite::params![id.to_string(), position as i64, description],
            )?;
        }
        tx.commit()?;

        tracing::debug!(task_id = %id, subtask_count = subtasks.len(), "task committed");
        Ok(id)
    }
}
