use super::base::{ColumnInfo, DataSourceConnector, QueryResult};
use super::dialect::Dialect;
use super::object::ObjectName;
use crate::utils::{AppError, SqlServerConfig};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{json, Value};
use tiberius::{AuthMethod, Client, ColumnData, Config, EncryptionLevel, FromSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, error, info, warn};

/// SQL Server over TDS. Opens a fresh connection per call; nothing is pooled.
pub struct SqlServerConnector {
    config: Config,
    server: String,
}

impl SqlServerConnector {
    pub fn new(settings: &SqlServerConfig) -> Self {
        let mut config = Config::new();
        config.host(&settings.host);
        config.port(settings.port);
        config.database(&settings.database);
        config.authentication(AuthMethod::sql_server(&settings.username, &settings.password));
        config.readonly(true);
        config.application_name("db-peeker");

        if settings.trust_server_certificate {
            config.trust_cert();
        }
        config.encryption(if settings.encrypt {
            EncryptionLevel::Required
        } else {
            EncryptionLevel::Off
        });

        let server = format!("{}:{}", settings.host, settings.port);
        debug!(
            "SQL Server connector configured for {} (database {}, encrypt {}, trust cert {})",
            server, settings.database, settings.encrypt, settings.trust_server_certificate
        );

        Self { config, server }
    }

    async fn connect(&self) -> Result<Client<Compat<TcpStream>>, AppError> {
        let tcp = TcpStream::connect(self.config.get_addr()).await.map_err(|e| {
            error!("Cannot reach SQL Server at {}: {}", self.server, e);
            AppError::DataAccess(format!("cannot reach {}: {}", self.server, e))
        })?;
        tcp.set_nodelay(true)
            .map_err(|e| AppError::DataAccess(e.to_string()))?;

        let client = Client::connect(self.config.clone(), tcp.compat_write())
            .await
            .map_err(|e| {
                error!("SQL Server login to {} failed: {}", self.server, e);
                AppError::from(e)
            })?;

        Ok(client)
    }
}

#[async_trait]
impl DataSourceConnector for SqlServerConnector {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    async fn test_connection(&self) -> Result<bool, AppError> {
        info!("Testing SQL Server connection to {}", self.server);
        let mut client = self.connect().await?;
        client.simple_query("SELECT 1").await?.into_results().await?;
        Ok(true)
    }

    async fn execute_query(&self, query: &str) -> Result<QueryResult, AppError> {
        let mut client = self.connect().await?;

        let start = std::time::Instant::now();
        let mut stream = client.simple_query(query).await?;
        // Column metadata arrives even when no row does.
        let columns: Vec<String> = stream
            .columns()
            .await?
            .map(|cols| cols.iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let rows = stream.into_first_result().await?;

        let rows = rows
            .iter()
            .map(|row| row.cells().map(|(_, data)| cell_to_json(data)).collect())
            .collect();

        Ok(QueryResult {
            columns,
            rows,
            execution_time_ms: start.elapsed().as_millis() as i64,
        })
    }

    async fn list_columns(&self, object: &ObjectName) -> Result<Vec<ColumnInfo>, AppError> {
        // CLR types (geography, geometry, hierarchyid) share system_type_id 240;
        // everything else reports its base type so alias types resolve.
        let query = "
            SELECT c.name,
                TYPE_NAME(CASE WHEN c.system_type_id = 240 THEN c.user_type_id ELSE c.system_type_id END)
            FROM sys.columns c
            WHERE c.object_id = OBJECT_ID(@P1)
            ORDER BY c.column_id
        ";
        let qualified = Dialect::SqlServer.qualify(object);
        let mut client = self.connect().await?;
        let rows = client
            .query(query, &[&qualified.as_str()])
            .await?
            .into_first_result()
            .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(name) = row.try_get::<&str, _>(0)? {
                let data_type = row.try_get::<&str, _>(1)?.unwrap_or_default();
                columns.push(ColumnInfo::new(name, data_type));
            }
        }
        Ok(columns)
    }

    async fn list_objects(&self, schema: Option<&str>, include_tables: bool) -> Result<Vec<String>, AppError> {
        let types = if include_tables {
            "('VIEW', 'BASE TABLE')"
        } else {
            "('VIEW')"
        };
        let query = format!(
            "
            SELECT TABLE_NAME
            FROM INFORMATION_SCHEMA.TABLES
            WHERE TABLE_TYPE IN {}
                AND TABLE_SCHEMA = COALESCE(NULLIF(@P1, ''), SCHEMA_NAME())
            ORDER BY TABLE_NAME
        ",
            types
        );

        let mut client = self.connect().await?;
        let rows = client
            .query(query.as_str(), &[&schema.unwrap_or("")])
            .await?
            .into_first_result()
            .await?;

        let mut names = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(name) = row.try_get::<&str, _>(0)? {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn cell_to_json(data: &ColumnData<'static>) -> Value {
    match data {
        ColumnData::U8(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I16(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I32(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I64(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::F32(v) => v.map(|f| json!(f)).unwrap_or(Value::Null),
        ColumnData::F64(v) => v.map(|f| json!(f)).unwrap_or(Value::Null),
        ColumnData::Bit(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::String(v) => v
            .as_ref()
            .map(|s| Value::String(s.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Guid(v) => v
            .as_ref()
            .map(|g| Value::String(g.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Numeric(v) => v
            .as_ref()
            .map(|n| Value::String(n.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Binary(v) => v
            .as_ref()
            .map(|b| Value::String(format!("0x{}", hex::encode(b))))
            .unwrap_or(Value::Null),
        ColumnData::Xml(v) => v
            .as_ref()
            .map(|x| Value::String(x.to_string()))
            .unwrap_or(Value::Null),
        other => temporal_to_json(other),
    }
}

fn temporal_to_json(data: &ColumnData<'static>) -> Value {
    if let Ok(Some(v)) = NaiveDateTime::from_sql(data) {
        return Value::String(v.to_string());
    }
    if let Ok(Some(v)) = NaiveDate::from_sql(data) {
        return Value::String(v.to_string());
    }
    if let Ok(Some(v)) = NaiveTime::from_sql(data) {
        return Value::String(v.to_string());
    }
    if let Ok(Some(v)) = DateTime::<FixedOffset>::from_sql(data) {
        return Value::String(v.to_rfc3339());
    }
    if !is_null(data) {
        warn!("No JSON mapping for {:?}; shown as NULL", data);
    }
    Value::Null
}

fn is_null(data: &ColumnData<'static>) -> bool {
    match data {
        ColumnData::DateTime(v) => v.is_none(),
        ColumnData::SmallDateTime(v) => v.is_none(),
        ColumnData::Time(v) => v.is_none(),
        ColumnData::Date(v) => v.is_none(),
        ColumnData::DateTime2(v) => v.is_none(),
        ColumnData::DateTimeOffset(v) => v.is_none(),
        _ => false,
    }
}
