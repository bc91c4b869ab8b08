use log::debug;
use std::fmt::Write;

use crate::application::ModManager;
use crate::package::listing::{self, Filter, ListEntry, SortKey};
use crate::runtime::Runtime;

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub sort: SortKey,
    pub filter: Filter,
}

/// List the section's packages, grouped for display
#[tracing::instrument(skip(manager, options))]
pub fn list<R: Runtime>(manager: &ModManager<R>, options: &ListOptions) {
    let snapshot = manager.packages();
    let entries = manager.entries(&snapshot);
    debug!("Listing {} package(s)", entries.len());
    print!("{}", render_list(entries, options));
}

pub fn render_list(entries: Vec<ListEntry<'_>>, options: &ListOptions) -> String {
    let mut entries = listing::filter(entries, &options.filter);
    if entries.is_empty() {
        return "No packages found.\n".to_string();
    }
    listing::sort(&mut entries, options.sort);

    let mut out = String::new();
    for (index, (group, members)) in listing::group(entries).into_iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{}:", group.title());
        for entry in members {
            let _ = writeln!(out, "  {}", render_row(&entry));
        }
    }
    out
}

fn render_row(entry: &ListEntry<'_>) -> String {
    let view = &entry.view;
    let mut row = format!("{:<32} {:<10} {}", view.name, view.display_version(), view.author);
    match (view.is_installed(), view.is_enabled()) {
        (true, true) => row.push_str("  [enabled]"),
        (true, false) => row.push_str("  [disabled]"),
        _ => {}
    }
    if view.has_update {
        let _ = write!(row, "  (update: {})", view.latest_version);
    }
    row
}
