pub mod base;
pub mod dialect;
pub mod factory;
pub mod object;
pub mod sqlite;
pub mod sqlserver;

pub use base::{ColumnInfo, DataSourceConnector, QueryResult};
pub use dialect::Dialect;
pub use factory::*;
pub use object::{ObjectName, RowCount, DEFAULT_ROWS, MAX_ROWS, MIN_ROWS};
pub use sqlite::SQLiteConnector;
pub use sqlserver::SqlServerConnector;
