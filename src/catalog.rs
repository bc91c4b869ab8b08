//! Catalog loading: remote JSON document with a local, time-limited copy.

use anyhow::Result;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ModError;
use crate::http::HttpClient;
use crate::package::{PackageRecord, parse_catalog};
use crate::runtime::Runtime;
use crate::section::{Section, SectionContext};

/// Where a loaded package list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    /// Local copy within the freshness window
    LocalCache,
    /// Freshly fetched and persisted
    Remote,
    /// Local copy used because the remote fetch failed
    StaleCache,
}

#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub packages: Vec<PackageRecord>,
    pub source: CatalogSource,
}

pub struct CatalogLoader<'a, R: Runtime> {
    runtime: &'a R,
    http: &'a HttpClient,
    cache_root: PathBuf,
    max_age: Duration,
}

impl<'a, R: Runtime> CatalogLoader<'a, R> {
    pub fn new(runtime: &'a R, http: &'a HttpClient, cache_root: PathBuf, max_age: Duration) -> Self {
        Self {
            runtime,
            http,
            cache_root,
            max_age,
        }
    }

    /// Local copy of a section's catalog.
    ///
    /// Returns: `<cache_root>/<section>.json`
    pub fn catalog_path(&self, section: Section) -> PathBuf {
        self.cache_root.join(format!("{}.json", section.id()))
    }

    fn is_fresh(&self, path: &Path) -> bool {
        if !self.runtime.exists(path) {
            return false;
        }
        match self.runtime.modified(path) {
            Ok(modified) => self
                .runtime
                .now()
                .duration_since(modified)
                .map(|age| age <= self.max_age)
                // modified in the future: treat as fresh
                .unwrap_or(true),
            Err(e) => {
                debug!("Cannot read age of {:?}: {}", path, e);
                false
            }
        }
    }

    /// Load the package list of a section.
    ///
    /// `force` skips the freshness check and always asks the remote first.
    #[tracing::instrument(skip(self, ctx), fields(section = %ctx.section))]
    pub async fn load(&self, ctx: &SectionContext, force: bool) -> Result<LoadedCatalog> {
        let path = self.catalog_path(ctx.section);

        if !force && self.is_fresh(&path) {
            match self.runtime.read_to_string(&path) {
                Ok(content) => {
                    debug!("Using cached catalog {:?}", path);
                    return Ok(LoadedCatalog {
                        packages: self.parse(ctx.section, &content)?,
                        source: CatalogSource::LocalCache,
                    });
                }
                Err(e) => debug!("Cached catalog unreadable, refetching: {}", e),
            }
        }

        info!("Fetching {} catalog from {}", ctx.section, ctx.catalog_url);
        match self.http.get_text(&ctx.catalog_url).await {
            Ok(body) => {
                let packages = self.parse(ctx.section, &body)?;
                self.persist(&path, &body);
                Ok(LoadedCatalog {
                    packages,
                    source: CatalogSource::Remote,
                })
            }
            Err(fetch_error) => {
                warn!("Failed to fetch {} catalog: {:#}", ctx.section, fetch_error);
                if !self.runtime.exists(&path) {
                    return Err(ModError::CatalogUnavailable {
                        section: ctx.section.to_string(),
                        reason: format!("{:#}", fetch_error),
                    }
                    .into());
                }

                let content = self.runtime.read_to_string(&path).map_err(|e| {
                    ModError::CatalogUnavailable {
                        section: ctx.section.to_string(),
                        reason: format!("{:#}", e),
                    }
                })?;
                warn!("Using cached catalog {:?} instead", path);
                Ok(LoadedCatalog {
                    packages: self.parse(ctx.section, &content)?,
                    source: CatalogSource::StaleCache,
                })
            }
        }
    }

    fn parse(&self, section: Section, content: &str) -> Result<Vec<PackageRecord>> {
        let packages = parse_catalog(content).map_err(|e| ModError::CatalogParse {
            section: section.to_string(),
            reason: e.to_string(),
        })?;
        Ok(dedupe_by_name(drop_unsafe(packages)))
    }

    // The fetched document is already parsed; failing to keep a copy only costs a refetch.
    fn persist(&self, path: &Path, body: &str) {
        let result = path
            .parent()
            .map_or(Ok(()), |parent| self.runtime.create_dir_all(parent))
            .and_then(|_| self.runtime.write(path, body.as_bytes()));
        if let Err(e) = result {
            warn!("Failed to save catalog to {:?}: {:#}", path, e);
        }
    }
}

fn drop_unsafe(packages: Vec<PackageRecord>) -> Vec<PackageRecord> {
    packages
        .into_iter()
        .filter(|p| match p.check_paths() {
            Ok(()) => true,
            Err(e) => {
                warn!("Ignoring catalog entry: {}", e);
                false
            }
        })
        .collect()
}

/// Names are unique within a section; later duplicates are dropped.
fn dedupe_by_name(packages: Vec<PackageRecord>) -> Vec<PackageRecord> {
    let mut seen = HashSet::new();
    packages
        .into_iter()
        .filter(|p| {
            let first = seen.insert(p.name.clone());
            if !first {
                warn!("Ignoring duplicate catalog entry '{}'", p.name);
            }
            first
        })
        .collect()
}
