use super::base::DataSourceConnector;
use super::sqlite::SQLiteConnector;
use super::sqlserver::SqlServerConnector;
use crate::utils::{AppError, DataSourceConfig};
use std::sync::Arc;
use tracing::info;

/// Opens the connector described by the startup configuration.
pub async fn create_connector(config: &DataSourceConfig) -> Result<Arc<dyn DataSourceConnector>, AppError> {
    match config {
        DataSourceConfig::SqlServer(settings) => {
            info!(
                "Using SQL Server {}:{} database {}",
                settings.host, settings.port, settings.database
            );
            Ok(Arc::new(SqlServerConnector::new(settings)))
        }
        DataSourceConfig::Sqlite { url } => {
            info!("Using SQLite database {}", url);
            Ok(Arc::new(SQLiteConnector::connect(url).await?))
        }
    }
}
