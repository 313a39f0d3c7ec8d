use super::base::{ColumnInfo, DataSourceConnector, QueryResult};
use super::dialect::Dialect;
use super::object::ObjectName;
use crate::utils::AppError;
use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Executor, Row as SqlxRow, TypeInfo, ValueRef};
use std::str::FromStr;
use tracing::{debug, info};

/// SQLite file database, opened read-only.
pub struct SQLiteConnector {
    pool: SqlitePool,
}

impl SQLiteConnector {
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        debug!("SQLite connection string: {}", url);
        let options = SqliteConnectOptions::from_str(url)?.read_only(true);
        // A single connection: this is a preview tool, not a pool manager.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool, e.g. an in-memory database seeded by the caller.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn query_strings(&self, query: &str) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>(0).map_err(AppError::from))
            .collect()
    }
}

#[async_trait]
impl DataSourceConnector for SQLiteConnector {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn test_connection(&self) -> Result<bool, AppError> {
        info!("Testing SQLite connection");
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(true)
    }

    async fn execute_query(&self, query: &str) -> Result<QueryResult, AppError> {
        let start = std::time::Instant::now();
        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        let columns: Vec<String> = match rows.first() {
            Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
            None => (&self.pool)
                .describe(query)
                .await?
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
        };

        let rows = rows.iter().map(row_to_json).collect();

        Ok(QueryResult {
            columns,
            rows,
            execution_time_ms: start.elapsed().as_millis() as i64,
        })
    }

    async fn list_columns(&self, object: &ObjectName) -> Result<Vec<ColumnInfo>, AppError> {
        let query = match &object.schema {
            Some(_) => "SELECT name, type FROM pragma_table_info(?1, ?2) ORDER BY cid",
            None => "SELECT name, type FROM pragma_table_info(?1) ORDER BY cid",
        };
        let mut q = sqlx::query(query).bind(object.name.as_str());
        if let Some(schema) = &object.schema {
            q = q.bind(schema.as_str());
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok::<_, AppError>(ColumnInfo::new(
                    row.try_get::<String, _>(0)?,
                    row.try_get::<Option<String>, _>(1)?.unwrap_or_default(),
                ))
            })
            .collect()
    }

    async fn list_objects(&self, schema: Option<&str>, include_tables: bool) -> Result<Vec<String>, AppError> {
        let master = match schema {
            Some(schema) => format!("{}.sqlite_master", Dialect::Sqlite.quote_ident(schema)),
            None => "sqlite_master".to_string(),
        };
        let types = if include_tables { "('view', 'table')" } else { "('view')" };
        let query = format!(
            "SELECT name FROM {} WHERE type IN {} AND name NOT LIKE 'sqlite_%' ORDER BY name",
            master, types
        );
        let mut names = self.query_strings(&query).await?;
        names.sort();
        Ok(names)
    }
}

fn row_to_json(row: &SqliteRow) -> Vec<Value> {
    (0..row.columns().len())
        .map(|idx| {
            let Ok(raw) = row.try_get_raw(idx) else {
                return Value::Null;
            };
            if raw.is_null() {
                return Value::Null;
            }
            // SQLite types values, not columns; ask the value.
            let type_name = raw.type_info().name().to_string();
            match type_name.as_str() {
                "INTEGER" | "BOOLEAN" => row.try_get::<i64, _>(idx).map(Value::from),
                "REAL" => row.try_get::<f64, _>(idx).map(|f| json!(f)),
                "BLOB" => row
                    .try_get::<Vec<u8>, _>(idx)
                    .map(|b| Value::String(format!("0x{}", hex::encode(b)))),
                _ => row.try_get::<String, _>(idx).map(Value::String),
            }
            .unwrap_or(Value::Null)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_connector() -> SQLiteConnector {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE t (id INTEGER, score REAL, label TEXT, payload BLOB)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO t VALUES (1, 2.5, 'a', x'ff00'), (2, NULL, NULL, NULL)")
            .execute(&pool)
            .await
            .unwrap();
        SQLiteConnector::from_pool(pool)
    }

    #[tokio::test]
    async fn test_values_convert_by_storage_class() {
        let connector = memory_connector().await;
        let result = connector.execute_query("SELECT * FROM t ORDER BY id").await.unwrap();
        assert_eq!(result.columns, vec!["id", "score", "label", "payload"]);
        assert_eq!(result.rows[0], vec![json!(1), json!(2.5), json!("a"), json!("0xff00")]);
        assert_eq!(result.rows[1], vec![json!(2), Value::Null, Value::Null, Value::Null]);
    }

    #[tokio::test]
    async fn test_empty_result_keeps_columns() {
        let connector = memory_connector().await;
        let result = connector.execute_query("SELECT id, label FROM t WHERE 0").await.unwrap();
        assert!(result.is_empty());
        assert_eq!(result.columns, vec!["id", "label"]);
    }

    #[tokio::test]
    async fn test_list_columns_of_missing_object_is_empty() {
        let connector = memory_connector().await;
        let missing = ObjectName::new(None, "nope").unwrap();
        assert!(connector.list_columns(&missing).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_columns_reports_declared_types() {
        let connector = memory_connector().await;
        let table = ObjectName::new(None, "t").unwrap();
        let columns = connector.list_columns(&table).await.unwrap();
        assert_eq!(
            columns,
            vec![
                ColumnInfo::new("id", "INTEGER"),
                ColumnInfo::new("score", "REAL"),
                ColumnInfo::new("label", "TEXT"),
                ColumnInfo::new("payload", "BLOB"),
            ]
        );
    }
}
