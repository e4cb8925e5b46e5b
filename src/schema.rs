//! Schema Introspection
//!
//! Reads the store's table/column metadata into a normalized in-memory
//! description. The description is an immutable snapshot: it is built
//! once per session and cached until the session ends.

use crate::error::{ChatError, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// One table with its columns in storage-defined order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    pub name: String,
    pub columns: Vec<String>,
}

/// Ordered snapshot of the store's tables and columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescription {
    tables: Vec<TableDescription>,
}

impl SchemaDescription {
    pub fn new(tables: Vec<TableDescription>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &[TableDescription] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Default binding target: the first table in iteration order.
    pub fn first_table(&self) -> Option<&str> {
        self.tables.first().map(|t| t.name.as_str())
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.name == name)
    }

    pub fn columns(&self, table: &str) -> Option<&[String]> {
        self.tables
            .iter()
            .find(|t| t.name == table)
            .map(|t| t.columns.as_slice())
    }

    /// Render the schema as text for prompts and embeddings.
    pub fn to_text(&self) -> String {
        self.tables
            .iter()
            .map(|t| format!("Table {} has columns: {}.", t.name, t.columns.join(", ")))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Read the current table set from a live connection.
///
/// Idempotent and side-effect-free. Tables come back in creation order,
/// columns in storage-defined order; SQLite internals are excluded.
pub fn introspect(conn: &Connection) -> Result<SchemaDescription> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY rowid",
        )
        .map_err(|e| ChatError::SchemaUnavailable(format!("Failed to read table list: {}", e)))?;

    let names: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .map_err(|e| ChatError::SchemaUnavailable(format!("Failed to read table list: {}", e)))?
        .collect::<rusqlite::Result<_>>()
        .map_err(|e| ChatError::SchemaUnavailable(format!("Failed to read table list: {}", e)))?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let mut info = conn
            .prepare(&format!("PRAGMA table_info(\"{}\")", name))
            .map_err(|e| {
                ChatError::SchemaUnavailable(format!("Failed to describe table {}: {}", name, e))
            })?;
        let columns: Vec<String> = info
            .query_map([], |row| row.get(1))
            .map_err(|e| {
                ChatError::SchemaUnavailable(format!("Failed to describe table {}: {}", name, e))
            })?
            .collect::<rusqlite::Result<_>>()
            .map_err(|e| {
                ChatError::SchemaUnavailable(format!("Failed to describe table {}: {}", name, e))
            })?;
        tables.push(TableDescription { name, columns });
    }

    Ok(SchemaDescription::new(tables))
}
