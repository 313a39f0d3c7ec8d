use salvo::prelude::*;
use thiserror::Error;

use super::config::ConfigError;
use super::datasource::{MAX_ROWS, MIN_ROWS};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Data access failed: {0}")]
    DataAccess(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Invalid row count {0}: must be between {min} and {max}", min = MIN_ROWS, max = MAX_ROWS)]
    InvalidRowCount(i64),

    #[error("Invalid object name: {0}")]
    InvalidObjectName(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Page definition error: {0}")]
    TomlDeError(#[from] toml::de::Error),

    #[error("Page definition error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    #[error("HTTP status error: {0}")]
    StatusError(#[from] salvo::http::StatusError),
}

impl From<tiberius::error::Error> for AppError {
    fn from(err: tiberius::error::Error) -> Self {
        AppError::DataAccess(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DataAccess(err.to_string())
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::ObjectNotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_)
            | AppError::InvalidRowCount(_)
            | AppError::InvalidObjectName(_) => StatusCode::BAD_REQUEST,
            AppError::DataAccess(_) => StatusCode::BAD_GATEWAY,
            AppError::StatusError(status_error) => status_error.code,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure came from the database rather than from the request.
    pub fn is_data_access(&self) -> bool {
        matches!(self, AppError::DataAccess(_) | AppError::ObjectNotFound(_))
    }
}

#[async_trait]
impl Writer for AppError {
    async fn write(mut self, _req: &mut Request, _depot: &mut Depot, res: &mut Response) {
        res.status_code(self.status_code());
        res.render(Json(serde_json::json!({
            "error": self.to_string()
        })));
    }
}
