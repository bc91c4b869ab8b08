//! Version canonicalization and comparison.
//!
//! Catalog versions are loose strings such as `v1.2.0`, `1.2` or `V2.0.1.0`.
//! They are lower-cased, stripped of a leading `v`, and compared numerically
//! component by component; missing trailing components count as zero.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid version format: '{0}'")]
pub struct VersionError(pub String);

/// A parsed dot-separated numeric version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    components: Vec<u64>,
}

impl Version {
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        let lowered = raw.trim().to_lowercase();
        let normalized = lowered.strip_prefix('v').unwrap_or(&lowered);
        if normalized.is_empty() {
            return Err(VersionError(raw.to_string()));
        }

        let components = normalized
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| VersionError(raw.to_string()))?;

        Ok(Self { components })
    }

    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Render the first `count` components, padding with zeros.
    pub fn to_string_n(&self, count: usize) -> String {
        (0..count)
            .map(|i| self.components.get(i).copied().unwrap_or(0).to_string())
            .collect::<Vec<_>>()
            .join(".")
    }

    fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(u64::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// Compare two version strings.
pub fn compare(a: &str, b: &str) -> Result<Ordering, VersionError> {
    Ok(Version::parse(a)?.cmp(&Version::parse(b)?))
}

/// True iff the catalog version is strictly newer than the installed one.
///
/// Unparsable versions fail closed: no update is reported.
pub fn is_newer(catalog_version: &str, installed_version: &str) -> bool {
    match compare(catalog_version, installed_version) {
        Ok(ordering) => ordering == Ordering::Greater,
        Err(e) => {
            log::debug!("Not reporting an update: {}", e);
            false
        }
    }
}
