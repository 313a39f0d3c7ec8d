use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{to_slug, PageDefinition, PAGE_EXTENSION};
use crate::utils::datasource::{DataSourceConnector, ObjectName};
use crate::utils::AppError;

const HEADER: &str = "# Generated by generate_pages. Re-run it to refresh; edits are overwritten.\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPage {
    pub path: PathBuf,
    pub definition: PageDefinition,
}

/// Writes one page definition per view of a schema.
pub struct PageGenerator {
    pages_dir: PathBuf,
    schema: Option<String>,
    include_tables: bool,
}

impl PageGenerator {
    pub fn new(pages_dir: impl Into<PathBuf>, schema: Option<String>) -> Self {
        Self {
            pages_dir: pages_dir.into(),
            schema,
            include_tables: false,
        }
    }

    pub fn include_tables(mut self, include: bool) -> Self {
        self.include_tables = include;
        self
    }

    pub fn pages_dir(&self) -> &Path {
        &self.pages_dir
    }

    /// Lists the pages that would be written, without touching the filesystem.
    pub async fn plan(&self, connector: &dyn DataSourceConnector) -> Result<Vec<GeneratedPage>, AppError> {
        let mut names = connector
            .list_objects(self.schema.as_deref(), self.include_tables)
            .await?;
        names.sort();
        names.dedup();

        // Keyed by slug so two names that sanitize alike resolve to one file.
        let mut pages: BTreeMap<String, GeneratedPage> = BTreeMap::new();
        for name in names {
            let slug = to_slug(&name);
            if slug.is_empty() {
                warn!("Skipping {:?}: no usable characters for a file name", name);
                continue;
            }
            let object = match ObjectName::new(self.schema.as_deref(), &name) {
                Ok(object) => object,
                Err(e) => {
                    warn!("Skipping {:?}: {}", name, e);
                    continue;
                }
            };
            let definition = PageDefinition {
                title: name.clone(),
                object,
            };
            let path = self.pages_dir.join(format!("{}.{}", slug, PAGE_EXTENSION));
            if let Some(previous) = pages.get(&slug) {
                warn!(
                    "{:?} and {:?} both map to {}; keeping the latter",
                    previous.definition.title, name, slug
                );
            }
            pages.insert(slug, GeneratedPage { path, definition });
        }

        Ok(pages.into_values().collect())
    }

    /// Writes (or overwrites) every page file. Returns what was written.
    pub async fn run(&self, connector: &dyn DataSourceConnector) -> Result<Vec<GeneratedPage>, AppError> {
        let pages = self.plan(connector).await?;
        tokio::fs::create_dir_all(&self.pages_dir).await?;

        for page in &pages {
            let body = format!("{}{}", HEADER, toml::to_string(&page.definition)?);
            tokio::fs::write(&page.path, body).await?;
            info!("Wrote {}", page.path.display());
        }

        info!(
            "Generated {} page(s) in {}",
            pages.len(),
            self.pages_dir.display()
        );
        Ok(pages)
    }
}
