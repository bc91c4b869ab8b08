//! Independent catalogs managed by the installer.

use std::fmt;
use std::path::{Path, PathBuf};

/// One of the fixed catalogs. Sections never reference each other's packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Section {
    #[value(name = "blas1mods")]
    Blas1Mods,
    #[value(name = "blas2mods")]
    Blas2Mods,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::Blas1Mods, Section::Blas2Mods];

    /// Stable identifier used for cache namespaces and file names.
    pub fn id(&self) -> &'static str {
        match self {
            Section::Blas1Mods => "blas1mods",
            Section::Blas2Mods => "blas2mods",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Section::Blas1Mods => "Blasphemous Mods",
            Section::Blas2Mods => "Blasphemous II Mods",
        }
    }

    /// Upstream catalog document.
    pub fn catalog_url(&self) -> &'static str {
        match self {
            Section::Blas1Mods => {
                "https://raw.githubusercontent.com/BrandenEK/Blasphemous.Modding.Installer/main/BlasphemousMods.json"
            }
            Section::Blas2Mods => {
                "https://raw.githubusercontent.com/BrandenEK/Blasphemous.Modding.Installer/main/BlasphemousIIMods.json"
            }
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Everything an operation needs to know about the section it works on.
///
/// Passed explicitly to every catalog, cache and lifecycle call.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionContext {
    pub section: Section,
    /// Root folder of the target application for this section.
    pub install_root: PathBuf,
    pub catalog_url: String,
}

impl SectionContext {
    pub fn new(section: Section, install_root: impl Into<PathBuf>) -> Self {
        Self {
            section,
            install_root: install_root.into(),
            catalog_url: section.catalog_url().to_string(),
        }
    }

    pub fn with_catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = url.into();
        self
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;

    #[test]
    fn test_section_ids_are_unique() {
        assert_ne!(Section::Blas1Mods.id(), Section::Blas2Mods.id());
        assert_eq!(Section::Blas2Mods.to_string(), "blas2mods");
    }

    #[test]
    fn test_section_parses_from_cli_value() {
        assert_eq!(
            Section::from_str("blas1mods", false).unwrap(),
            Section::Blas1Mods
        );
        assert!(Section::from_str("skins", false).is_err());
    }

    #[test]
    fn test_context_catalog_url_override() {
        let ctx = SectionContext::new(Section::Blas1Mods, "/game");
        assert!(ctx.catalog_url.ends_with("BlasphemousMods.json"));

        let ctx = ctx.with_catalog_url("http://localhost/mods.json");
        assert_eq!(ctx.catalog_url, "http://localhost/mods.json");
        assert_eq!(ctx.install_root(), Path::new("/game"));
    }
}
