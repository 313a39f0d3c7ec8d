// db-peeker library
// Exposes the preview core so both the server and the page generator share it.

pub mod api;
pub mod core;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::core::pages::{PageDefinition, PageGenerator, PageRegistry};
pub use crate::core::preview::{PreviewService, QueryKind, ResultCache};
pub use utils::datasource::{DataSourceConnector, ObjectName, QueryResult, RowCount};
pub use utils::{AppError, AppState, Config};

/// Shared `tracing` setup for the binaries.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("db_peeker=info".parse()?)
                .add_directive("generate_pages=info".parse()?)
                .add_directive("salvo=info".parse()?)
                .add_directive("sqlx=warn".parse()?)
                .add_directive("tiberius=warn".parse()?),
        )
        .init();
    Ok(())
}
