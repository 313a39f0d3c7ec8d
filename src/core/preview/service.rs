use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use super::cache::{CacheKey, CacheStats, ResultCache};
use super::QueryKind;
use crate::utils::datasource::{DataSourceConnector, ObjectName, QueryResult, RowCount};
use crate::utils::AppError;

pub const SUMMARY_COLUMNS: [&str; 4] = ["column", "count", "distinct", "nulls"];

/// The three preview queries, memoized through a shared [`ResultCache`].
#[derive(Clone)]
pub struct PreviewService {
    connector: Arc<dyn DataSourceConnector>,
    cache: Arc<ResultCache>,
}

impl PreviewService {
    pub fn new(connector: Arc<dyn DataSourceConnector>, cache: Arc<ResultCache>) -> Self {
        Self { connector, cache }
    }

    pub fn connector(&self) -> &Arc<dyn DataSourceConnector> {
        &self.connector
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// First `n` rows in the source's natural order.
    pub async fn fetch_top(&self, object: &ObjectName, n: RowCount) -> Result<Arc<QueryResult>, AppError> {
        let key = CacheKey::new(QueryKind::Top, object, Some(n));
        self.cache
            .get_or_try_insert_with(key, || async {
                info!("Loading TOP {} rows from {}", n, object);
                let sql = self.connector.dialect().top_sql(object, n);
                self.run(object, &sql).await
            })
            .await
    }

    /// `n` rows picked at random by the database. Cached like the rest, so the
    /// same sample is shown until the cache is cleared.
    pub async fn fetch_sample(&self, object: &ObjectName, n: RowCount) -> Result<Arc<QueryResult>, AppError> {
        let key = CacheKey::new(QueryKind::Sample, object, Some(n));
        self.cache
            .get_or_try_insert_with(key, || async {
                info!("Loading random sample of {} rows from {}", n, object);
                let sql = self.connector.dialect().sample_sql(object, n);
                self.run(object, &sql).await
            })
            .await
    }

    /// One row per column: total rows, distinct values, nulls.
    pub async fn fetch_summary(&self, object: &ObjectName) -> Result<Arc<QueryResult>, AppError> {
        let key = CacheKey::new(QueryKind::Summary, object, None);
        self.cache
            .get_or_try_insert_with(key, || async {
                info!("Computing summary statistics for {}", object);
                self.summarize(object).await
            })
            .await
    }

    pub async fn fetch(&self, kind: QueryKind, object: &ObjectName, n: RowCount) -> Result<Arc<QueryResult>, AppError> {
        match kind {
            QueryKind::Top => self.fetch_top(object, n).await,
            QueryKind::Sample => self.fetch_sample(object, n).await,
            QueryKind::Summary => self.fetch_summary(object).await,
        }
    }

    pub async fn clear_cache(&self) -> usize {
        self.cache.clear().await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    async fn run(&self, object: &ObjectName, sql: &str) -> Result<QueryResult, AppError> {
        self.connector.execute_query(sql).await.map_err(|e| {
            warn!("Query on {} failed: {}", object, e);
            e
        })
    }

    async fn summarize(&self, object: &ObjectName) -> Result<QueryResult, AppError> {
        let columns = self.connector.list_columns(object).await?;
        if columns.is_empty() {
            warn!("No columns found for {}", object);
            return Err(AppError::ObjectNotFound(object.to_string()));
        }

        let sql = self.connector.dialect().summary_sql(object, &columns);
        let scan = self.run(object, &sql).await?;
        let counts = scan
            .rows
            .first()
            .ok_or_else(|| AppError::DataAccess(format!("summary of {} returned no row", object)))?;

        let count_at = |idx: usize| -> Result<i64, AppError> {
            counts
                .get(idx)
                .and_then(Value::as_i64)
                .ok_or_else(|| AppError::DataAccess(format!("summary of {} is missing aggregate {}", object, idx)))
        };

        let total = count_at(0)?;
        let mut rows = Vec::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            let distinct = count_at(1 + 2 * idx)?;
            let non_null = count_at(2 + 2 * idx)?;
            rows.push(vec![
                Value::String(column.name.clone()),
                Value::from(total),
                Value::from(distinct),
                Value::from(total - non_null),
            ]);
        }

        Ok(QueryResult {
            columns: SUMMARY_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows,
            execution_time_ms: scan.execution_time_ms,
        })
    }
}
