//! Install, uninstall, enable, disable and update of packages.
//!
//! Every operation runs in three phases:
//! 1. plan: resolve dependencies and dependents into primitive steps, asking
//!    the [`Confirmer`] at each cascade ([`plan`]);
//! 2. prefetch: make sure every payload the plan installs is in the content
//!    cache;
//! 3. apply: perform the steps on the install root.
//!
//! A declined prompt ends the operation after phase 1 and a failed download
//! after phase 2, in both cases before anything under the install root changes.

mod confirm;
mod plan;

pub use confirm::{AutoConfirmer, Confirmer, PromptConfirmer};
#[cfg(test)]
pub use confirm::MockConfirmer;
pub use plan::{Plan, Planner, Status, Step};

use anyhow::{Context, Result, bail};
use futures_util::future::try_join_all;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::archive::{ArchiveExtractor, ArchiveExtractorImpl};
use crate::cache::{CacheKey, ContentCache};
use crate::error::ModError;
use crate::package::{
    DependencyGraph, InstallLayout, InstallState, PackageInspector, PackageRecord, Receipt, ReceiptStore,
};
use crate::runtime::Runtime;
use crate::section::SectionContext;

/// Result of a lifecycle operation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Steps performed, in order. Empty if nothing needed to change.
    Applied(Vec<Step>),
    /// The user refused a cascade; nothing changed.
    Declined,
}

/// Lifecycle operations for one section, against one package-list snapshot.
pub struct Lifecycle<'a, R: Runtime> {
    runtime: &'a R,
    ctx: &'a SectionContext,
    graph: DependencyGraph<'a>,
    cache: &'a ContentCache,
    layout: InstallLayout,
    receipts: ReceiptStore<'a, R>,
    extractor: ArchiveExtractorImpl,
}

impl<'a, R: Runtime> Lifecycle<'a, R> {
    pub fn new(
        runtime: &'a R,
        ctx: &'a SectionContext,
        packages: &'a [PackageRecord],
        cache: &'a ContentCache,
    ) -> Self {
        let receipts_dir = cache.root().join(ctx.section.id()).join("receipts");
        Self {
            runtime,
            ctx,
            graph: DependencyGraph::new(packages),
            cache,
            layout: InstallLayout::new(ctx.install_root()),
            receipts: ReceiptStore::new(runtime, receipts_dir),
            extractor: ArchiveExtractorImpl::new(),
        }
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    pub fn receipts(&self) -> &ReceiptStore<'a, R> {
        &self.receipts
    }

    pub fn inspector(&self) -> PackageInspector<'_, R> {
        PackageInspector::new(self.runtime, &self.layout, &self.receipts)
    }

    /// Current state of every package, as the planner sees it.
    pub fn snapshot(&self) -> HashMap<String, Status> {
        let inspector = self.inspector();
        self.graph
            .packages()
            .iter()
            .map(|p| {
                let status = Status {
                    state: inspector.state(p),
                    has_update: inspector.has_update(p),
                };
                (p.name.clone(), status)
            })
            .collect()
    }

    fn planner<'c, C: Confirmer + ?Sized>(&self, confirmer: &'c C) -> Planner<'c, C>
    where
        'a: 'c,
    {
        Planner::new(self.graph, self.snapshot(), confirmer)
    }

    #[tracing::instrument(skip(self, confirmer), fields(section = %self.ctx.section))]
    pub async fn install<C: Confirmer + ?Sized>(&self, name: &str, confirmer: &C) -> Result<Outcome> {
        let plan = self.planner(confirmer).install(name)?;
        self.execute(plan).await
    }

    #[tracing::instrument(skip(self, confirmer), fields(section = %self.ctx.section))]
    pub async fn uninstall<C: Confirmer + ?Sized>(&self, name: &str, confirmer: &C) -> Result<Outcome> {
        let plan = self.planner(confirmer).uninstall(name)?;
        self.execute(plan).await
    }

    #[tracing::instrument(skip(self, confirmer), fields(section = %self.ctx.section))]
    pub async fn enable<C: Confirmer + ?Sized>(&self, name: &str, confirmer: &C) -> Result<Outcome> {
        let plan = self.planner(confirmer).enable(name)?;
        self.execute(plan).await
    }

    #[tracing::instrument(skip(self, confirmer), fields(section = %self.ctx.section))]
    pub async fn disable<C: Confirmer + ?Sized>(&self, name: &str, confirmer: &C) -> Result<Outcome> {
        let plan = self.planner(confirmer).disable(name)?;
        self.execute(plan).await
    }

    #[tracing::instrument(skip(self, confirmer), fields(section = %self.ctx.section))]
    pub async fn update<C: Confirmer + ?Sized>(&self, name: &str, confirmer: &C) -> Result<Outcome> {
        let plan = self.planner(confirmer).update(name)?;
        self.execute(plan).await
    }

    /// Prefetch, then apply every step of `plan`.
    pub async fn execute(&self, plan: Plan) -> Result<Outcome> {
        let steps = match plan {
            Plan::Declined => return Ok(Outcome::Declined),
            Plan::Steps(steps) => steps,
        };

        for step in &steps {
            self.record(step.package())?.check_paths()?;
        }

        let payloads = self.prefetch(&steps).await?;
        for step in &steps {
            self.apply(step, &payloads)?;
        }
        Ok(Outcome::Applied(steps))
    }

    fn record(&self, name: &str) -> Result<&'a PackageRecord> {
        self.graph
            .find(name)
            .ok_or_else(|| ModError::PackageNotFound(name.to_string()).into())
    }

    /// Ensure the payload of every installed package is cached.
    ///
    /// Returns: package name → cached payload path
    async fn prefetch(&self, steps: &[Step]) -> Result<HashMap<String, PathBuf>> {
        let mut wanted: Vec<&'a PackageRecord> = Vec::new();
        for step in steps {
            if let Step::Install(name) = step {
                let package = self.record(name)?;
                if !wanted.iter().any(|p| p.name == package.name) {
                    wanted.push(package);
                }
            }
        }

        let fetches = wanted.into_iter().map(|package| async move {
            let key = CacheKey::new(self.ctx.section, &package.name, &package.latest_version);
            let path = self
                .cache
                .ensure(self.runtime, &key, &package.latest_download_url)
                .await?;
            Ok::<_, anyhow::Error>((package.name.clone(), path))
        });
        Ok(try_join_all(fetches).await?.into_iter().collect())
    }

    fn apply(&self, step: &Step, payloads: &HashMap<String, PathBuf>) -> Result<()> {
        let package = self.record(step.package())?;
        debug!("Applying {:?}", step);
        match step {
            Step::Install(_) => {
                let payload = payloads
                    .get(&package.name)
                    .with_context(|| format!("No payload fetched for {}", package.name))?;
                self.install_payload(package, payload)
            }
            Step::Uninstall(_) => self.remove_files(package),
            Step::Enable(_) => move_artifact(
                self.runtime,
                &self.layout.disabled_plugin(package),
                &self.layout.enabled_plugin(package),
            ),
            Step::Disable(_) => move_artifact(
                self.runtime,
                &self.layout.enabled_plugin(package),
                &self.layout.disabled_plugin(package),
            ),
        }?;
        info!("{}", step);
        Ok(())
    }

    fn install_payload(&self, package: &PackageRecord, payload: &Path) -> Result<()> {
        let modding_dir = self.layout.modding_dir();
        self.runtime.create_dir_all(modding_dir)?;
        self.extractor
            .extract(self.runtime, payload, modding_dir)
            .with_context(|| format!("Failed to extract {} into {:?}", package.name, modding_dir))?;

        let enabled = self.layout.enabled_plugin(package);
        let disabled = self.layout.disabled_plugin(package);
        if self.runtime.is_file(&enabled) {
            // freshly extracted copy wins over a leftover disabled one
            if self.runtime.is_file(&disabled) {
                self.runtime.remove_file(&disabled)?;
            }
        } else if self.runtime.is_file(&disabled) {
            move_artifact(self.runtime, &disabled, &enabled)?;
        } else {
            bail!(
                "Payload of {} does not contain plugins/{}",
                package.name,
                package.plugin_file
            );
        }

        // the package is installed either way; the receipt only backs up its version
        let receipt = Receipt {
            name: package.name.clone(),
            version: package.latest_version.clone(),
            source_url: package.latest_download_url.clone(),
        };
        if let Err(e) = self.receipts.save(&receipt) {
            warn!("Failed to record installed version of {}: {:#}", package.name, e);
        }
        Ok(())
    }

    fn remove_files(&self, package: &PackageRecord) -> Result<()> {
        for file in self.layout.owned_files(package) {
            if self.runtime.is_file(&file) {
                self.runtime.remove_file(&file)?;
            }
        }
        for dir in self.layout.owned_dirs(package) {
            if self.runtime.is_dir(&dir) {
                self.runtime.remove_dir_all(&dir)?;
            }
        }
        for dll in self.unused_dlls(package) {
            let path = self.layout.shared_dll(dll);
            if self.runtime.is_file(&path) {
                debug!("Removing unused library {:?}", path);
                self.runtime.remove_file(&path)?;
            }
        }
        self.receipts.remove(&package.name)
    }

    /// Libraries `package` needs that no other installed package needs.
    fn unused_dlls(&self, package: &'a PackageRecord) -> Vec<&'a str> {
        let inspector = self.inspector();
        let still_needed = |dll: &str| {
            self.graph.packages().iter().any(|other| {
                other.name != package.name
                    && other.requires_dll(dll)
                    && inspector.state(other) != InstallState::NotInstalled
            })
        };
        package
            .required_dlls
            .iter()
            .map(String::as_str)
            .filter(|&dll| !still_needed(dll))
            .collect()
    }
}

/// Move a plugin between the enabled and disabled folders.
///
/// If a copy already exists at `to`, the one at `from` is discarded instead.
/// A missing `from` is a no-op.
fn move_artifact<R: Runtime>(runtime: &R, from: &Path, to: &Path) -> Result<()> {
    if !runtime.is_file(from) {
        return Ok(());
    }
    if runtime.is_file(to) {
        return runtime.remove_file(from);
    }
    if let Some(parent) = to.parent() {
        runtime.create_dir_all(parent)?;
    }
    runtime.rename(from, to)
}
