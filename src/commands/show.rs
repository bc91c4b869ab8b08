use anyhow::Result;
use std::fmt::Write;

use crate::application::ModManager;
use crate::error::ModError;
use crate::package::{DependencyGraph, InstallState, PackageRecord, PackageView};
use crate::runtime::Runtime;

/// Show detailed information about a package
#[tracing::instrument(skip(manager))]
pub fn show<R: Runtime>(manager: &ModManager<R>, name: &str) -> Result<()> {
    let snapshot = manager.packages();
    let graph = DependencyGraph::new(&snapshot);
    let record = graph
        .find(name)
        .ok_or_else(|| ModError::PackageNotFound(name.to_string()))?;
    let view = manager.view(name)?;
    print!("{}", render_show(&graph, record, &view));
    Ok(())
}

pub fn render_show(graph: &DependencyGraph<'_>, record: &PackageRecord, view: &PackageView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Package: {}", record.name);
    let _ = writeln!(out, "Author: {}", record.author);
    if let Some(description) = record.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "Description: {}", description);
    }
    if let Some(url) = record.github_url() {
        let _ = writeln!(out, "Source: {}", url);
    }

    let state = match view.state {
        InstallState::NotInstalled => "not installed",
        InstallState::Disabled => "disabled",
        InstallState::Enabled => "enabled",
    };
    let _ = writeln!(out, "Status: {}", state);
    if view.is_installed() {
        let _ = writeln!(
            out,
            "Installed version: {}",
            view.installed_version.as_deref().unwrap_or("(unknown)")
        );
    }
    let _ = write!(out, "Latest version: {}", record.latest_version);
    if view.has_update {
        out.push_str(" (update available)");
    }
    out.push('\n');
    if !record.latest_release_date.is_empty() {
        let _ = writeln!(out, "Released: {}", record.latest_release_date);
    }
    if view.framework {
        let _ = writeln!(out, "Framework: yes");
    }

    let names = |list: Vec<&PackageRecord>| -> Vec<String> { list.into_iter().map(|p| p.name.clone()).collect() };
    write_list(&mut out, "Dependencies", &names(graph.dependencies(record)));
    write_list(&mut out, "Dependents", &names(graph.dependents(record)));
    write_list(&mut out, "Required libraries", &record.required_dlls);
    out
}

fn write_list(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{}:", title);
    for item in items {
        let _ = writeln!(out, "  {}", item);
    }
}
