//! Install state derived from the filesystem.

use std::path::PathBuf;

use serde::Serialize;

use super::artifact::read_artifact_version;
use super::version::{Version, is_newer};
use super::{InstallLayout, PackageRecord, ReceiptStore};
use crate::runtime::Runtime;

/// Where a package's artifact currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InstallState {
    NotInstalled,
    Disabled,
    Enabled,
}

impl InstallState {
    pub fn is_installed(self) -> bool {
        self != InstallState::NotInstalled
    }

    pub fn is_enabled(self) -> bool {
        self == InstallState::Enabled
    }
}

/// What the presentation layer renders for one package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageView {
    pub name: String,
    pub author: String,
    pub installed_version: Option<String>,
    pub latest_version: String,
    pub state: InstallState,
    pub has_update: bool,
    pub framework: bool,
}

impl PackageView {
    pub fn is_installed(&self) -> bool {
        self.state.is_installed()
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    /// Version shown next to the name: installed if known, else latest.
    pub fn display_version(&self) -> &str {
        self.installed_version
            .as_deref()
            .unwrap_or(&self.latest_version)
    }
}

/// Reads install state and local versions for one section.
pub struct PackageInspector<'a, R: Runtime> {
    runtime: &'a R,
    layout: &'a InstallLayout,
    receipts: &'a ReceiptStore<'a, R>,
}

impl<'a, R: Runtime> PackageInspector<'a, R> {
    pub fn new(
        runtime: &'a R,
        layout: &'a InstallLayout,
        receipts: &'a ReceiptStore<'a, R>,
    ) -> Self {
        Self {
            runtime,
            layout,
            receipts,
        }
    }

    /// An enabled copy wins over a stale disabled one.
    pub fn state(&self, package: &PackageRecord) -> InstallState {
        if self.runtime.is_file(&self.layout.enabled_plugin(package)) {
            InstallState::Enabled
        } else if self.runtime.is_file(&self.layout.disabled_plugin(package)) {
            InstallState::Disabled
        } else {
            InstallState::NotInstalled
        }
    }

    fn artifact_path(&self, package: &PackageRecord) -> Option<PathBuf> {
        match self.state(package) {
            InstallState::Enabled => Some(self.layout.enabled_plugin(package)),
            InstallState::Disabled => Some(self.layout.disabled_plugin(package)),
            InstallState::NotInstalled => None,
        }
    }

    /// Version of the installed artifact, or `None` if not installed or unknown.
    pub fn local_version(&self, package: &PackageRecord) -> Option<String> {
        let artifact = self.artifact_path(package)?;

        if let Some(version) = read_artifact_version(self.runtime, &artifact) {
            return Some(match Version::parse(&version) {
                Ok(v) => v.to_string_n(3),
                Err(_) => version,
            });
        }

        self.receipts.load(&package.name).map(|r| r.version)
    }

    pub fn has_update(&self, package: &PackageRecord) -> bool {
        self.local_version(package)
            .is_some_and(|local| is_newer(&package.latest_version, &local))
    }

    pub fn view(&self, package: &PackageRecord, framework: bool) -> PackageView {
        let state = self.state(package);
        let installed_version = self.local_version(package);
        let has_update = installed_version
            .as_deref()
            .is_some_and(|local| is_newer(&package.latest_version, local));

        PackageView {
            name: package.name.clone(),
            author: package.author.clone(),
            installed_version,
            latest_version: package.latest_version.clone(),
            state,
            has_update,
            framework,
        }
    }
}
