use std::path::Path;
use tracing::{info, warn};

use super::{PageDefinition, PAGE_EXTENSION};
use crate::utils::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub slug: String,
    pub definition: PageDefinition,
}

/// Pages found in the pages directory at startup, ordered by file name.
#[derive(Debug, Clone, Default)]
pub struct PageRegistry {
    pages: Vec<Page>,
}

impl PageRegistry {
    pub fn new(mut pages: Vec<Page>) -> Self {
        pages.sort_by(|a, b| a.slug.cmp(&b.slug));
        Self { pages }
    }

    /// Reads every `*.toml` file in `dir`. A missing directory yields an empty
    /// registry; unreadable files are skipped with a warning.
    pub fn discover(dir: &Path) -> Result<Self, AppError> {
        if !dir.exists() {
            warn!("Pages directory {} does not exist; run generate_pages", dir.display());
            return Ok(Self::default());
        }

        let mut pages = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PAGE_EXTENSION) {
                continue;
            }
            let Some(slug) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping page {}: {}", path.display(), e);
                    continue;
                }
            };
            match toml::from_str::<PageDefinition>(&text) {
                Ok(definition) => pages.push(Page { slug, definition }),
                Err(e) => warn!("Skipping page {}: {}", path.display(), e),
            }
        }

        info!("Registered {} page(s) from {}", pages.len(), dir.display());
        Ok(Self::new(pages))
    }

    pub fn get(&self, slug: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.slug == slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
