use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_SCHEMA: &str = "dmd";
pub const DEFAULT_PAGES_DIR: &str = "pages";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8501";
pub const DEFAULT_SQLSERVER_PORT: u16 = 1433;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Connection parameters for SQL Server authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct SqlServerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub encrypt: bool,
    pub trust_server_certificate: bool,
}

impl fmt::Debug for SqlServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .field("encrypt", &self.encrypt)
            .field("trust_server_certificate", &self.trust_server_certificate)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceConfig {
    SqlServer(SqlServerConfig),
    Sqlite { url: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub datasource: DataSourceConfig,
    /// Schema whose views get a page. `None` means the connection default.
    pub schema: Option<String>,
    pub pages_dir: PathBuf,
    pub server_address: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let kind = get("CLIENT_DB_KIND").unwrap_or_else(|| "mssql".to_string());
        let datasource = match kind.to_lowercase().as_str() {
            "mssql" | "sqlserver" => {
                let port = match get("CLIENT_DB_PORT") {
                    Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                        var: "CLIENT_DB_PORT",
                        value: raw.clone(),
                        reason: e.to_string(),
                    })?,
                    None => DEFAULT_SQLSERVER_PORT,
                };
                DataSourceConfig::SqlServer(SqlServerConfig {
                    host: require("CLIENT_DB_HOST")?,
                    port,
                    username: require("CLIENT_DB_USER")?,
                    password: lookup("CLIENT_DB_PASSWORD").ok_or(ConfigError::Missing("CLIENT_DB_PASSWORD"))?,
                    database: require("CLIENT_DB_NAME")?,
                    encrypt: parse_flag("CLIENT_DB_ENCRYPT", get("CLIENT_DB_ENCRYPT"), true)?,
                    trust_server_certificate: parse_flag(
                        "CLIENT_DB_TRUST_CERT",
                        get("CLIENT_DB_TRUST_CERT"),
                        true,
                    )?,
                })
            }
            "sqlite" => DataSourceConfig::Sqlite {
                url: require("CLIENT_DB_URL")?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    var: "CLIENT_DB_KIND",
                    value: other.to_string(),
                    reason: "expected mssql or sqlite".to_string(),
                })
            }
        };

        // SQLite has no "dmd" schema, so only SQL Server falls back to it.
        let schema = match (&datasource, get("PEEKER_SCHEMA")) {
            (_, Some(schema)) => Some(schema),
            (DataSourceConfig::SqlServer(_), None) => Some(DEFAULT_SCHEMA.to_string()),
            (DataSourceConfig::Sqlite { .. }, None) => None,
        };

        Ok(Config {
            datasource,
            schema,
            pages_dir: PathBuf::from(get("PAGES_DIR").unwrap_or_else(|| DEFAULT_PAGES_DIR.to_string())),
            server_address: get("SERVER_ADDRESS").unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string()),
        })
    }
}

fn parse_flag(var: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw,
            reason: "expected yes/no".to_string(),
        }),
    }
}
