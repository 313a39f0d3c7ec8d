use crate::core::pages::PageRegistry;
use crate::core::preview::{PreviewService, ResultCache};
use crate::utils::datasource::{create_connector, DataSourceConnector};
use crate::utils::{AppError, Config};
use salvo::Depot;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub preview: PreviewService,
    pub pages: Arc<PageRegistry>,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self, AppError> {
        info!("🔌 Opening data source...");
        let connector = create_connector(&config.datasource).await?;

        // An unreachable database is reported per page, not at startup.
        match connector.test_connection().await {
            Ok(_) => info!("✅ Data source reachable"),
            Err(e) => warn!("⚠️  Data source check failed: {}", e),
        }

        let pages = PageRegistry::discover(&config.pages_dir)?;
        Ok(Self::from_parts(config.clone(), connector, pages))
    }

    pub fn from_parts(config: Config, connector: Arc<dyn DataSourceConnector>, pages: PageRegistry) -> Self {
        AppState {
            config: Arc::new(config),
            preview: PreviewService::new(connector, Arc::new(ResultCache::new())),
            pages: Arc::new(pages),
        }
    }
}

/// Helper function to safely extract AppState from Depot
pub fn get_app_state(depot: &Depot) -> Result<&AppState, salvo::http::StatusError> {
    depot
        .obtain::<AppState>()
        .map_err(|_| salvo::http::StatusError::internal_server_error())
}
