use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

use crate::http::HttpClient;
use crate::runtime::Runtime;
use crate::section::{Section, SectionContext};

pub const DEFAULT_MAX_AGE_SECS: u64 = 3600;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Values collected from the command line and environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub install_root: PathBuf,
    pub cache_dir: Option<PathBuf>,
    pub section: Section,
    pub catalog_url: Option<String>,
    pub max_age: Duration,
    pub timeout: Duration,
}

impl Settings {
    pub fn new(install_root: PathBuf, section: Section) -> Self {
        Self {
            install_root,
            cache_dir: None,
            section,
            catalog_url: None,
            max_age: Duration::from_secs(DEFAULT_MAX_AGE_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Everything a [`crate::application::ModManager`] is built from.
pub struct Config<R: Runtime> {
    pub runtime: R,
    pub http: HttpClient,
    pub ctx: SectionContext,
    pub cache_root: PathBuf,
    pub max_age: Duration,
}

impl<R: Runtime> Config<R> {
    pub fn new(runtime: R, settings: Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("modman/", env!("MODMAN_VERSION")))
            .timeout(settings.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let cache_root = match settings.cache_dir {
            Some(dir) => dir,
            None => default_cache_root(&runtime)?,
        };
        debug!("Using cache directory {:?}", cache_root);

        let mut ctx = SectionContext::new(settings.section, settings.install_root);
        if let Some(url) = settings.catalog_url {
            ctx = ctx.with_catalog_url(url);
        }

        Ok(Self {
            runtime,
            http: HttpClient::new(client),
            ctx,
            cache_root,
            max_age: settings.max_age,
        })
    }
}

/// `<user cache dir>/modman`
pub fn default_cache_root<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    runtime
        .cache_dir()
        .map(|dir| dir.join("modman"))
        .context("Could not determine a cache directory; pass --cache-dir")
}
