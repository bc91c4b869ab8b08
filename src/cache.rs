//! Payload store keyed by (section, package, version).
//!
//! A payload is downloaded at most once per version. Downloads land under a
//! temporary name and are renamed into place only when complete, so a file at
//! the final path is always a whole payload.

use anyhow::{Context, Result, bail};
use log::{debug, info};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::archive::payload_file_name;
use crate::cleanup::PartialFileGuard;
use crate::error::ModError;
use crate::http::HttpClient;
use crate::runtime::Runtime;
use crate::section::Section;

/// Identifies one cached payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub section: Section,
    pub name: String,
    /// Always the catalog's declared version, never one read from disk.
    pub version: String,
}

impl CacheKey {
    pub fn new(section: Section, name: &str, version: &str) -> Self {
        Self {
            section,
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

pub struct ContentCache {
    root: PathBuf,
    http: HttpClient,
    /// One lock per payload path, present only while some `ensure` holds it.
    locks: DashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>,
}

impl ContentCache {
    pub fn new(root: PathBuf, http: HttpClient) -> Self {
        Self {
            root,
            http,
            locks: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Layout: `<root>/<section>/<name>/<version>`
    pub fn entry_dir(&self, key: &CacheKey) -> PathBuf {
        self.root
            .join(key.section.id())
            .join(path_segment(&key.name))
            .join(path_segment(&key.version))
    }

    pub fn entry_path(&self, key: &CacheKey, url: &str) -> PathBuf {
        self.entry_dir(key).join(payload_file_name(url))
    }

    /// A cached payload is valid iff it exists and is not empty.
    pub fn is_cached<R: Runtime>(&self, runtime: &R, path: &Path) -> bool {
        runtime.is_file(path) && runtime.file_len(path).is_ok_and(|len| len > 0)
    }

    fn lock_for(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(self.locks.entry(path.to_path_buf()).or_default().value())
    }

    /// Drop the lock of `path` unless another caller still waits on it.
    fn release(&self, path: &Path) {
        self.locks.remove_if(path, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Return the cached payload for `key`, downloading it from `url` on a miss.
    ///
    /// Concurrent calls for the same key wait for each other; different keys
    /// proceed independently. Failures surface as [`ModError::DownloadFailed`]
    /// and leave no file behind.
    #[tracing::instrument(skip(self, runtime))]
    pub async fn ensure<R: Runtime>(&self, runtime: &R, key: &CacheKey, url: &str) -> Result<PathBuf> {
        let dir = self.entry_dir(key);
        runtime
            .create_dir_all(&dir)
            .map_err(|e| ModError::download_failed(&key.name, &key.version, &e))?;
        let path = dir.join(payload_file_name(url));

        let lock = self.lock_for(&path);
        let result = {
            let _held = lock.lock().await;
            self.fetch(runtime, key, url, &path).await
        };
        drop(lock);
        self.release(&path);
        result.map(|()| path)
    }

    async fn fetch<R: Runtime>(&self, runtime: &R, key: &CacheKey, url: &str, path: &Path) -> Result<()> {
        if self.is_cached(runtime, path) {
            debug!("Cache hit for {} {}: {:?}", key.name, key.version, path);
            return Ok(());
        }

        info!("Downloading {} {} from {}...", key.name, key.version, url);
        self.download(runtime, url, path)
            .await
            .map_err(|e| ModError::download_failed(&key.name, &key.version, &e))?;
        info!("Download complete.");
        Ok(())
    }

    async fn download<R: Runtime>(&self, runtime: &R, url: &str, path: &Path) -> Result<()> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = path.with_file_name(format!("{}.part", file_name));
        let guard = PartialFileGuard::new(runtime, temp_path.clone());

        let bytes = self
            .http
            .download_file(url, || {
                runtime
                    .create_file(&temp_path)
                    .with_context(|| format!("Failed to create temporary file at {:?}", temp_path))
            })
            .await?;
        if bytes == 0 {
            bail!("Server returned an empty payload");
        }

        runtime.rename(guard.path(), path)?;
        guard.commit();
        Ok(())
    }
}

/// Keep a catalog-provided string usable as a single path component.
fn path_segment(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.trim() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}
