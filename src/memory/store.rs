// src/memory/store.rs — SQLite operations

use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::core::types::{Action, Event, PatternKey, Workflow};
use crate::infra::errors::FlowError;
use crate::memory::{schema, Storage};

/// SQLite-backed [`Storage`]. Every row carries the namespace so several
/// kernels (tabs, profiles) can share one database file.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
    namespace: String,
    event_capacity: usize,
}

impl SqliteStorage {
    /// Wrap an already-migrated connection.
    pub fn new(conn: Connection, namespace: &str, event_capacity: usize) -> Self {
        Self {
            conn: Mutex::new(conn),
            namespace: namespace.to_string(),
            event_capacity,
        }
    }

    /// Open (or create) the database at the given path.
    pub fn open(path: &Path, namespace: &str, event_capacity: usize) -> Result<Self, FlowError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        schema::run_migrations(&conn)?;
        Ok(Self::new(conn, namespace, event_capacity))
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory(namespace: &str, event_capacity: usize) -> Result<Self, FlowError> {
        let conn = Connection::open_in_memory()?;
        schema::run_migrations(&conn)?;
        Ok(Self::new(conn, namespace, event_capacity))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, FlowError> {
        self.conn
            .lock()
            .map_err(|_| FlowError::Storage("sqlite connection lock poisoned".into()))
    }

    /// Number of events currently retained for this namespace.
    pub fn count_events(&self) -> Result<usize, FlowError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM events WHERE namespace = ?1",
            params![self.namespace],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Highest-count patterns first, for display.
    pub fn top_patterns(&self, limit: u32) -> Result<Vec<(PatternKey, u64)>, FlowError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT key_json, count FROM patterns WHERE namespace = ?1
             ORDER BY count DESC, length DESC, key_json ASC LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![self.namespace, limit], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (key_json, count) = row?;
            let key: PatternKey = serde_json::from_str(&key_json)?;
            result.push((key, count.max(0) as u64));
        }
        Ok(result)
    }
}

impl Storage for SqliteStorage {
    // -- Event log --

    fn append_event(&self, event: &Event) -> Result<(), FlowError> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO events (namespace, id, signature, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![self.namespace, event.id, event.signature, event.timestamp],
        )?;
        // Evict oldest entries beyond capacity
        tx.execute(
            "DELETE FROM events WHERE namespace = ?1 AND seq NOT IN (
                SELECT seq FROM events WHERE namespace = ?1 ORDER BY seq DESC LIMIT ?2
             )",
            params![self.namespace, self.event_capacity as i64],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn read_event_log(&self) -> Result<Vec<Event>, FlowError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, signature, timestamp FROM events
             WHERE namespace = ?1 ORDER BY seq ASC",
        )?;

        let rows = stmt.query_map(params![self.namespace], |row| {
            Ok(Event {
                id: row.get(0)?,
                signature: row.get(1)?,
                timestamp: row.get(2)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    // -- Patterns --

    fn get_patterns(&self) -> Result<HashMap<PatternKey, u64>, FlowError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT key_json, count FROM patterns WHERE namespace = ?1")?;

        let rows = stmt.query_map(params![self.namespace], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut result = HashMap::new();
        for row in rows {
            let (key_json, count) = row?;
            let key: PatternKey = serde_json::from_str(&key_json)?;
            result.insert(key, count.max(0) as u64);
        }
        Ok(result)
    }

    fn set_patterns(&self, patterns: &HashMap<PatternKey, u64>) -> Result<(), FlowError> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO patterns (namespace, key_json, length, count)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(namespace, key_json) DO UPDATE SET count = excluded.count",
            )?;
            for (key, count) in patterns {
                let key_json = serde_json::to_string(key)?;
                stmt.execute(params![
                    self.namespace,
                    key_json,
                    key.len() as i64,
                    i64::try_from(*count).unwrap_or(i64::MAX)
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // -- Actions --

    fn get_actions(&self) -> Result<HashMap<String, Action>, FlowError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, action_json FROM actions WHERE namespace = ?1")?;

        let rows = stmt.query_map(params![self.namespace], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut result = HashMap::new();
        for row in rows {
            let (id, json) = row?;
            result.insert(id, serde_json::from_str(&json)?);
        }
        Ok(result)
    }

    fn set_action(&self, action: &Action) -> Result<(), FlowError> {
        let json = serde_json::to_string(action)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO actions (namespace, id, action_json) VALUES (?1, ?2, ?3)
             ON CONFLICT(namespace, id) DO UPDATE SET action_json = excluded.action_json",
            params![self.namespace, action.id, json],
        )?;
        Ok(())
    }

    // -- Workflows --

    fn get_workflows(&self) -> Result<Vec<Workflow>, FlowError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, actions_json, frequency, last_executed
             FROM workflows WHERE namespace = ?1 ORDER BY seq ASC",
        )?;

        let rows = stmt.query_map(params![self.namespace], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, Option<i64>>(5)?,
            ))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (id, name, description, actions_json, frequency, last_executed) = row?;
            let actions: Vec<Action> = serde_json::from_str(&actions_json)?;
            result.push(Workflow::restore(
                id,
                name,
                description,
                actions,
                frequency.clamp(1, u32::MAX as i64) as u32,
                last_executed,
            ));
        }
        Ok(result)
    }

    fn set_workflow(&self, workflow: &Workflow) -> Result<(), FlowError> {
        let actions_json = serde_json::to_string(workflow.actions())?;
        let conn = self.conn()?;
        // Upsert keeps seq stable so creation order survives updates
        conn.execute(
            "INSERT INTO workflows (namespace, id, name, description, actions_json,
             frequency, last_executed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(namespace, id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                frequency = excluded.frequency,
                last_executed = excluded.last_executed",
            params![
                self.namespace,
                workflow.id,
                workflow.name,
                workflow.description,
                actions_json,
                workflow.frequency,
                workflow.last_executed
            ],
        )?;
        Ok(())
    }
}
