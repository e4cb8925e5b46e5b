//! Store Adapter
//!
//! Owns the SQLite connection for one session and executes exactly one
//! validated statement at a time. Execution errors are surfaced with
//! the underlying message and leave the connection usable for the next
//! request. Statements are never retried or rewritten here.

use crate::error::{ChatError, Result};
use crate::schema::{self, SchemaDescription};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

/// Result of one executed statement. Row-returning statements fill
/// `columns` and `rows`; INSERT/UPDATE report `rows_affected`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub rows_affected: usize,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A session-owned connection to the local relational store.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(|e| {
            ChatError::SchemaUnavailable(format!(
                "Failed to open store at {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ChatError::SchemaUnavailable(format!("Failed to open store: {}", e)))?;
        Ok(Self { conn })
    }

    /// Snapshot the current table/column layout.
    pub fn describe(&self) -> Result<SchemaDescription> {
        schema::introspect(&self.conn)
    }

    /// Run several statements at once. Deployment plumbing for schema
    /// bootstrap and seeding; the question path never calls this.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| ChatError::Execution(e.to_string()))
    }

    /// Execute one validated statement.
    pub fn execute(&self, sql: &str) -> Result<QueryResult> {
        debug!("Executing: {}", sql);
        if sql.trim().to_lowercase().starts_with("select") {
            self.fetch_rows(sql)
        } else {
            let rows_affected = self
                .conn
                .execute(sql, [])
                .map_err(|e| ChatError::Execution(e.to_string()))?;
            info!("Statement affected {} row(s)", rows_affected);
            Ok(QueryResult {
                rows_affected,
                ..QueryResult::default()
            })
        }
    }

    fn fetch_rows(&self, sql: &str) -> Result<QueryResult> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| ChatError::Execution(e.to_string()))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let column_count = columns.len();

        let mut result_rows = Vec::new();
        let mut rows = stmt
            .query([])
            .map_err(|e| ChatError::Execution(e.to_string()))?;
        while let Some(row) = rows.next().map_err(|e| ChatError::Execution(e.to_string()))? {
            let mut cells = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let value = row
                    .get_ref(i)
                    .map_err(|e| ChatError::Execution(e.to_string()))?;
                cells.push(scalar_to_json(value));
            }
            result_rows.push(cells);
        }

        info!("Query returned {} row(s)", result_rows.len());
        Ok(QueryResult {
            columns,
            rows: result_rows,
            rows_affected: 0,
        })
    }
}

fn scalar_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(format!("<blob {} bytes>", b.len())),
    }
}
