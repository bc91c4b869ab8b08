//! Ordering, filtering and grouping of packages for display.
//!
//! All functions here are pure: they never touch the filesystem or change
//! install state.

use std::cmp::Ordering;

use super::{DependencyGraph, PackageRecord, PackageView};

/// A catalog record paired with its current state.
#[derive(Debug, Clone)]
pub struct ListEntry<'a> {
    pub record: &'a PackageRecord,
    pub view: PackageView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortKey {
    #[default]
    Name,
    Author,
    /// Oldest first
    #[value(name = "initial")]
    InitialRelease,
    /// Newest first
    #[value(name = "latest")]
    LatestRelease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StatusFilter {
    Installed,
    Enabled,
    Disabled,
    /// Not installed
    Available,
    /// Installed with a newer catalog version
    Updates,
}

impl StatusFilter {
    fn matches(self, view: &PackageView) -> bool {
        match self {
            StatusFilter::Installed => view.is_installed(),
            StatusFilter::Enabled => view.is_enabled(),
            StatusFilter::Disabled => view.is_installed() && !view.is_enabled(),
            StatusFilter::Available => !view.is_installed(),
            StatusFilter::Updates => view.has_update,
        }
    }
}

/// Predicates an entry must all satisfy to be listed.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    /// Glob matched case-insensitively against the package name.
    pub name: Option<glob::Pattern>,
    /// Case-insensitive substring of the author.
    pub author: Option<String>,
    pub status: Option<StatusFilter>,
}

impl Filter {
    pub fn with_name_pattern(mut self, pattern: &str) -> Result<Self, glob::PatternError> {
        self.name = Some(glob::Pattern::new(pattern)?);
        Ok(self)
    }

    pub fn matches(&self, entry: &ListEntry<'_>) -> bool {
        let options = glob::MatchOptions {
            case_sensitive: false,
            ..Default::default()
        };
        let name_ok = self
            .name
            .as_ref()
            .is_none_or(|p| p.matches_with(&entry.record.name, options));
        let author_ok = self.author.as_ref().is_none_or(|a| {
            entry
                .record
                .author
                .to_lowercase()
                .contains(&a.to_lowercase())
        });
        let status_ok = self.status.is_none_or(|s| s.matches(&entry.view));

        name_ok && author_ok && status_ok
    }
}

fn compare(a: &PackageRecord, b: &PackageRecord, key: SortKey) -> Ordering {
    let primary = match key {
        SortKey::Name => Ordering::Equal,
        SortKey::Author => a.author.cmp(&b.author),
        SortKey::InitialRelease => a.initial_release_date.cmp(&b.initial_release_date),
        SortKey::LatestRelease => b.latest_release_date.cmp(&a.latest_release_date),
    };
    primary.then_with(|| a.name.cmp(&b.name))
}

pub fn sort(entries: &mut [ListEntry<'_>], key: SortKey) {
    entries.sort_by(|a, b| compare(a.record, b.record, key));
}

pub fn filter<'a>(entries: Vec<ListEntry<'a>>, predicates: &Filter) -> Vec<ListEntry<'a>> {
    entries
        .into_iter()
        .filter(|e| predicates.matches(e))
        .collect()
}

/// Display groups, in the order they are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Frameworks,
    Installed,
    Available,
}

impl Group {
    pub fn title(&self) -> &'static str {
        match self {
            Group::Frameworks => "Frameworks",
            Group::Installed => "Installed",
            Group::Available => "Available",
        }
    }
}

/// Partition entries into non-empty groups, keeping their relative order.
pub fn group<'a>(entries: Vec<ListEntry<'a>>) -> Vec<(Group, Vec<ListEntry<'a>>)> {
    let mut frameworks = Vec::new();
    let mut installed = Vec::new();
    let mut available = Vec::new();

    for entry in entries {
        if entry.view.framework {
            frameworks.push(entry);
        } else if entry.view.is_installed() {
            installed.push(entry);
        } else {
            available.push(entry);
        }
    }

    [
        (Group::Frameworks, frameworks),
        (Group::Installed, installed),
        (Group::Available, available),
    ]
    .into_iter()
    .filter(|(_, list)| !list.is_empty())
    .collect()
}

/// Libraries other packages build on.
pub fn is_framework(graph: &DependencyGraph<'_>, package: &PackageRecord) -> bool {
    package.name == "Modding API"
        || package.name.ends_with("Framework")
        || graph.is_depended_on(package)
}
