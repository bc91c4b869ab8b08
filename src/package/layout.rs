//! Folder conventions of an install root.

use std::path::{Path, PathBuf};

use super::PackageRecord;

/// Paths a package may occupy under `<install_root>/Modding`.
pub struct InstallLayout {
    modding_dir: PathBuf,
}

impl InstallLayout {
    pub fn new(install_root: &Path) -> Self {
        Self {
            modding_dir: install_root.join("Modding"),
        }
    }

    /// Destination for extracted payloads.
    ///
    /// Returns: `<install_root>/Modding`
    pub fn modding_dir(&self) -> &Path {
        &self.modding_dir
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.modding_dir.join("plugins")
    }

    pub fn disabled_dir(&self) -> PathBuf {
        self.modding_dir.join("disabled")
    }

    pub fn enabled_plugin(&self, package: &PackageRecord) -> PathBuf {
        self.plugins_dir().join(&package.plugin_file)
    }

    pub fn disabled_plugin(&self, package: &PackageRecord) -> PathBuf {
        self.disabled_dir().join(&package.plugin_file)
    }

    pub fn config_file(&self, package: &PackageRecord) -> PathBuf {
        self.modding_dir
            .join("config")
            .join(format!("{}.cfg", package.name))
    }

    pub fn keybindings_file(&self, package: &PackageRecord) -> PathBuf {
        self.modding_dir
            .join("keybindings")
            .join(format!("{}.txt", package.name))
    }

    pub fn localization_file(&self, package: &PackageRecord) -> PathBuf {
        self.modding_dir
            .join("localization")
            .join(format!("{}.txt", package.name))
    }

    pub fn log_file(&self, package: &PackageRecord) -> PathBuf {
        self.modding_dir
            .join("logs")
            .join(format!("{}.log", package.name))
    }

    pub fn data_dir(&self, package: &PackageRecord) -> PathBuf {
        self.modding_dir.join("data").join(&package.name)
    }

    pub fn levels_dir(&self, package: &PackageRecord) -> PathBuf {
        self.modding_dir.join("levels").join(&package.name)
    }

    /// Shared libraries live directly in the data folder.
    pub fn shared_dll(&self, dll: &str) -> PathBuf {
        self.modding_dir.join("data").join(dll)
    }

    /// Per-package files removed on uninstall.
    pub fn owned_files(&self, package: &PackageRecord) -> [PathBuf; 6] {
        [
            self.enabled_plugin(package),
            self.disabled_plugin(package),
            self.config_file(package),
            self.keybindings_file(package),
            self.localization_file(package),
            self.log_file(package),
        ]
    }

    /// Per-package directories removed recursively on uninstall.
    pub fn owned_dirs(&self, package: &PackageRecord) -> [PathBuf; 2] {
        [self.data_dir(package), self.levels_dir(package)]
    }
}
