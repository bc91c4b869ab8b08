use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// RAII guard for a file being written in place of its final name.
///
/// The file is removed when the guard drops, unless `commit` was called.
pub struct PartialFileGuard<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
    armed: bool,
}

impl<'a, R: Runtime> PartialFileGuard<'a, R> {
    pub fn new(runtime: &'a R, path: PathBuf) -> Self {
        Self {
            runtime,
            path,
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the file; the caller has moved or otherwise claimed it.
    pub fn commit(mut self) {
        self.armed = false;
    }
}

impl<R: Runtime> Drop for PartialFileGuard<'_, R> {
    fn drop(&mut self) {
        if !self.armed || !self.runtime.exists(&self.path) {
            return;
        }
        debug!("Cleaning up partial file: {:?}", self.path);
        if let Err(e) = self.runtime.remove_file(&self.path) {
            debug!("Failed to remove {:?}: {}", self.path, e);
        }
    }
}
