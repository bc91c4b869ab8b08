//! Error conditions reported by the mod engine.
//!
//! Engine functions return `anyhow::Result`; callers that need to react to a
//! specific condition classify it with `downcast_ref::<ModError>()`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModError {
    /// The catalog document could not be parsed. The previous package list is kept.
    #[error("Failed to parse catalog for {section}: {reason}")]
    CatalogParse { section: String, reason: String },

    /// Neither the remote catalog nor a local copy could be read.
    #[error("Catalog for {section} is unavailable: {reason}")]
    CatalogUnavailable { section: String, reason: String },

    /// A payload could not be downloaded into the content cache.
    #[error("Failed to download {name} {version}: {reason}")]
    DownloadFailed {
        name: String,
        version: String,
        reason: String,
    },

    /// A cascade walked back onto a package it was already resolving.
    #[error("Dependency cycle detected: {}", chain.join(" -> "))]
    DependencyCycle { chain: Vec<String> },

    /// A catalog string that names a file or folder is not a single plain path component.
    #[error("Catalog entry '{name}' has an unsafe {field}: '{value}'")]
    UnsafeRecord {
        name: String,
        field: &'static str,
        value: String,
    },

    #[error("Package '{0}' is not in the catalog")]
    PackageNotFound(String),

    #[error("Package '{0}' is not installed")]
    NotInstalled(String),
}

impl ModError {
    pub fn download_failed(name: &str, version: &str, err: &anyhow::Error) -> Self {
        ModError::DownloadFailed {
            name: name.to_string(),
            version: version.to_string(),
            reason: format!("{:#}", err),
        }
    }
}
