pub mod cache;
pub mod service;

pub use cache::{CacheKey, CacheStats, ResultCache};
pub use service::{PreviewService, SUMMARY_COLUMNS};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Top,
    Sample,
    Summary,
}

impl QueryKind {
    pub const ALL: [QueryKind; 3] = [QueryKind::Top, QueryKind::Sample, QueryKind::Summary];

    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::Top => "top",
            QueryKind::Sample => "sample",
            QueryKind::Summary => "summary",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "top" => Ok(QueryKind::Top),
            "sample" => Ok(QueryKind::Sample),
            "summary" => Ok(QueryKind::Summary),
            other => Err(AppError::BadRequest(format!("unknown mode {:?}", other))),
        }
    }
}
