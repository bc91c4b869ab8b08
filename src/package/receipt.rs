//! Install receipts: the catalog version each package was installed from.
//!
//! Receipts back up the version embedded in the artifact; they are consulted
//! only while the artifact itself is present.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Receipt {
    pub name: String,
    pub version: String,
    pub source_url: String,
}

/// Receipts of one section.
///
/// Layout: `<receipts_dir>/<name>.json`
pub struct ReceiptStore<'a, R: Runtime> {
    runtime: &'a R,
    receipts_dir: PathBuf,
}

impl<'a, R: Runtime> ReceiptStore<'a, R> {
    pub fn new(runtime: &'a R, receipts_dir: PathBuf) -> Self {
        Self {
            runtime,
            receipts_dir,
        }
    }

    pub fn receipts_dir(&self) -> &Path {
        &self.receipts_dir
    }

    pub fn receipt_path(&self, name: &str) -> PathBuf {
        self.receipts_dir.join(format!("{}.json", name))
    }

    /// Load a receipt. Returns `None` if missing or unreadable.
    pub fn load(&self, name: &str) -> Option<Receipt> {
        let path = self.receipt_path(name);
        if !self.runtime.exists(&path) {
            return None;
        }
        let content = self.runtime.read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(receipt) => Some(receipt),
            Err(e) => {
                log::warn!("Ignoring unreadable receipt {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn save(&self, receipt: &Receipt) -> Result<()> {
        self.runtime.create_dir_all(&self.receipts_dir)?;
        let path = self.receipt_path(&receipt.name);
        let content = serde_json::to_string_pretty(receipt)?;
        self.runtime
            .write(&path, content.as_bytes())
            .with_context(|| format!("Failed to save receipt to {:?}", path))
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.receipt_path(name);
        if self.runtime.exists(&path) {
            self.runtime.remove_file(&path)?;
        }
        Ok(())
    }
}
