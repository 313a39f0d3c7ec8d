pub mod generator;
pub mod registry;

pub use generator::{GeneratedPage, PageGenerator};
pub use registry::{Page, PageRegistry};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::utils::datasource::ObjectName;

pub const PAGE_EXTENSION: &str = "toml";

/// Contents of one generated page file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDefinition {
    pub title: String,
    pub object: ObjectName,
}

/// File stem for an object name: runs of anything outside `[A-Za-z0-9_]`
/// collapse to `_`, the result is trimmed of `_` and lowercased.
pub fn to_slug(name: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let re = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]+").expect("static regex"));
    re.replace_all(name, "_").trim_matches('_').to_lowercase()
}
