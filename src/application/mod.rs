//! Application layer: one section's catalog snapshot plus the operations the
//! presentation layer calls.

use anyhow::Result;
use log::warn;
use std::path::Path;
use std::sync::Arc;

use crate::cache::ContentCache;
use crate::catalog::{CatalogLoader, CatalogSource};
use crate::config::Config;
use crate::error::ModError;
use crate::http::HttpClient;
use crate::lifecycle::{Confirmer, Lifecycle, Outcome};
use crate::package::listing::{ListEntry, is_framework};
use crate::package::{DependencyGraph, PackageRecord, PackageView};
use crate::runtime::Runtime;
use crate::section::SectionContext;

/// Owns the package list of one section.
///
/// The list is an immutable snapshot: `refresh` swaps in a new one, and an
/// operation that already started keeps working on the snapshot it took.
/// `refresh` needs `&mut self`, so it cannot run while an operation borrows
/// the manager.
pub struct ModManager<R: Runtime> {
    runtime: R,
    ctx: SectionContext,
    http: HttpClient,
    cache: ContentCache,
    max_age: std::time::Duration,
    packages: Arc<[PackageRecord]>,
}

impl<R: Runtime> ModManager<R> {
    pub fn new(config: Config<R>) -> Self {
        let cache = ContentCache::new(config.cache_root, config.http.clone());
        Self {
            runtime: config.runtime,
            ctx: config.ctx,
            http: config.http,
            cache,
            max_age: config.max_age,
            packages: Arc::from(Vec::new()),
        }
    }

    pub fn context(&self) -> &SectionContext {
        &self.ctx
    }

    pub fn cache_root(&self) -> &Path {
        self.cache.root()
    }

    /// Current package-list snapshot.
    pub fn packages(&self) -> Arc<[PackageRecord]> {
        Arc::clone(&self.packages)
    }

    /// Reload the catalog.
    ///
    /// A parse failure keeps the previous list; an unavailable catalog
    /// empties it. Both are returned as errors for the caller to report.
    pub async fn refresh(&mut self, force: bool) -> Result<CatalogSource> {
        let loader = CatalogLoader::new(
            &self.runtime,
            &self.http,
            self.cache.root().to_path_buf(),
            self.max_age,
        );
        match loader.load(&self.ctx, force).await {
            Ok(loaded) => {
                self.packages = Arc::from(loaded.packages);
                Ok(loaded.source)
            }
            Err(e) => {
                if matches!(
                    e.downcast_ref::<ModError>(),
                    Some(ModError::CatalogUnavailable { .. })
                ) {
                    self.packages = Arc::from(Vec::new());
                }
                warn!("{:#}", e);
                Err(e)
            }
        }
    }

    fn lifecycle<'a>(&'a self, packages: &'a [PackageRecord]) -> Lifecycle<'a, R> {
        Lifecycle::new(&self.runtime, &self.ctx, packages, &self.cache)
    }

    /// Presentation data for every package, in catalog order.
    pub fn views(&self) -> Vec<PackageView> {
        let snapshot = self.packages();
        self.entries(&snapshot).into_iter().map(|e| e.view).collect()
    }

    pub fn view(&self, name: &str) -> Result<PackageView> {
        let snapshot = self.packages();
        self.entries(&snapshot)
            .into_iter()
            .find(|e| e.record.name == name)
            .map(|e| e.view)
            .ok_or_else(|| ModError::PackageNotFound(name.to_string()).into())
    }

    /// Records of `packages` paired with their current state.
    pub fn entries<'p>(&self, packages: &'p [PackageRecord]) -> Vec<ListEntry<'p>> {
        let lifecycle = self.lifecycle(packages);
        let inspector = lifecycle.inspector();
        let graph = DependencyGraph::new(packages);
        packages
            .iter()
            .map(|record| ListEntry {
                record,
                view: inspector.view(record, is_framework(&graph, record)),
            })
            .collect()
    }

    /// Names of installed packages with a newer catalog version, in catalog order.
    pub fn updates_available(&self) -> Vec<String> {
        self.views()
            .into_iter()
            .filter(|v| v.has_update)
            .map(|v| v.name)
            .collect()
    }

    pub async fn install<C: Confirmer + ?Sized>(&self, name: &str, confirmer: &C) -> Result<Outcome> {
        let snapshot = self.packages();
        self.lifecycle(&snapshot).install(name, confirmer).await
    }

    pub async fn uninstall<C: Confirmer + ?Sized>(&self, name: &str, confirmer: &C) -> Result<Outcome> {
        let snapshot = self.packages();
        self.lifecycle(&snapshot).uninstall(name, confirmer).await
    }

    pub async fn enable<C: Confirmer + ?Sized>(&self, name: &str, confirmer: &C) -> Result<Outcome> {
        let snapshot = self.packages();
        self.lifecycle(&snapshot).enable(name, confirmer).await
    }

    pub async fn disable<C: Confirmer + ?Sized>(&self, name: &str, confirmer: &C) -> Result<Outcome> {
        let snapshot = self.packages();
        self.lifecycle(&snapshot).disable(name, confirmer).await
    }

    pub async fn update<C: Confirmer + ?Sized>(&self, name: &str, confirmer: &C) -> Result<Outcome> {
        let snapshot = self.packages();
        self.lifecycle(&snapshot).update(name, confirmer).await
    }
}
