//! Clock and well-known directory lookups.

use std::path::PathBuf;
use std::time::SystemTime;

use super::RealRuntime;

impl RealRuntime {
    pub(crate) fn now_impl(&self) -> SystemTime {
        SystemTime::now()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn cache_dir_impl(&self) -> Option<PathBuf> {
        dirs::cache_dir()
    }
}
