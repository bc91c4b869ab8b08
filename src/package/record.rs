use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

use crate::error::ModError;

/// A package as described by the section catalog.
///
/// Install state is never stored here; it is derived from the filesystem.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    pub name: String,
    pub author: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub github_author: String,
    #[serde(default)]
    pub github_repo: String,
    pub latest_version: String,
    #[serde(rename = "latestDownloadURL")]
    pub latest_download_url: String,
    #[serde(default)]
    pub latest_release_date: String,
    #[serde(default)]
    pub initial_release_date: String,
    pub plugin_file: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub required_dlls: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dependencies: Vec<String>,
}

impl PackageRecord {
    pub fn requires_dll(&self, dll: &str) -> bool {
        self.required_dlls.iter().any(|d| d == dll)
    }

    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependencies.iter().any(|d| d == name)
    }

    /// Names, plugin files and DLLs become file and folder names under the
    /// install root, so each must be one plain path component.
    pub fn check_paths(&self) -> Result<(), ModError> {
        let unsafe_field = |field: &'static str, value: &str| ModError::UnsafeRecord {
            name: self.name.clone(),
            field,
            value: value.to_string(),
        };
        if !is_plain_component(&self.name) {
            return Err(unsafe_field("name", &self.name));
        }
        if !is_plain_component(&self.plugin_file) {
            return Err(unsafe_field("plugin file", &self.plugin_file));
        }
        if let Some(dll) = self.required_dlls.iter().find(|d| !is_plain_component(d)) {
            return Err(unsafe_field("required DLL", dll));
        }
        Ok(())
    }

    /// Project page on GitHub, when the catalog names one.
    pub fn github_url(&self) -> Option<String> {
        if self.github_author.is_empty() || self.github_repo.is_empty() {
            return None;
        }
        Some(format!(
            "https://github.com/{}/{}",
            self.github_author, self.github_repo
        ))
    }
}

fn is_plain_component(value: &str) -> bool {
    if value.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(value).components();
    matches!(components.next(), Some(Component::Normal(c)) if c.to_str() == Some(value))
        && components.next().is_none()
}

// Catalogs write `null` for packages without dependencies or DLLs.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a catalog document: a JSON array of package objects.
pub fn parse_catalog(content: &str) -> serde_json::Result<Vec<PackageRecord>> {
    serde_json::from_str(content)
}
