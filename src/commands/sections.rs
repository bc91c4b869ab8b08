use std::fmt::Write;

use crate::section::Section;

/// List the catalogs this installer knows about
pub fn sections() {
    print!("{}", render_sections());
}

pub fn render_sections() -> String {
    let mut out = String::new();
    for section in Section::ALL {
        let _ = writeln!(out, "{:<12} {}", section.id(), section.title());
        let _ = writeln!(out, "{:<12} {}", "", section.catalog_url());
    }
    out
}
