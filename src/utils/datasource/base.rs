use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use super::dialect::Dialect;
use super::object::ObjectName;
use crate::utils::AppError;

/// Read-only access to one external database.
#[async_trait]
pub trait DataSourceConnector: Send + Sync {
    fn dialect(&self) -> Dialect;

    async fn test_connection(&self) -> Result<bool, AppError>;
    async fn execute_query(&self, query: &str) -> Result<QueryResult, AppError>;

    /// Columns of a table or view in ordinal order; empty when it does not exist.
    async fn list_columns(&self, object: &ObjectName) -> Result<Vec<ColumnInfo>, AppError>;

    /// Views of `schema` (and base tables when asked), sorted by name.
    async fn list_objects(&self, schema: Option<&str>, include_tables: bool) -> Result<Vec<String>, AppError>;
}

/// Name and declared type of one column. The type is whatever the catalog
/// reports and may be empty (SQLite views).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Tabular result: ordered columns, rows aligned with them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub execution_time_ms: i64,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            execution_time_ms: 0,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A row as a column name to value mapping.
    pub fn row_map(&self, idx: usize) -> Option<Map<String, Value>> {
        let row = self.rows.get(idx)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect(),
        )
    }
}

// Timing differs between runs of the same query.
impl PartialEq for QueryResult {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && self.rows == other.rows
    }
}
