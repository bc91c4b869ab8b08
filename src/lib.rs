pub mod application;
pub mod archive;
pub mod cache;
pub mod catalog;
pub mod cleanup;
pub mod commands;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod package;
pub mod runtime;
pub mod section;

/// Shared fixtures for unit tests.
#[cfg(test)]
pub mod test_utils {
    use crate::package::PackageRecord;

    /// A minimal catalog record named `name` depending on `deps`.
    pub fn record(name: &str, deps: &[&str]) -> PackageRecord {
        PackageRecord {
            name: name.to_string(),
            author: "Author".to_string(),
            description: None,
            github_author: String::new(),
            github_repo: String::new(),
            latest_version: "1.0.0".to_string(),
            latest_download_url: format!("https://example.com/{}.zip", name),
            latest_release_date: String::new(),
            initial_release_date: String::new(),
            plugin_file: format!("{}.dll", name),
            required_dlls: Vec::new(),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
        }
    }
}
