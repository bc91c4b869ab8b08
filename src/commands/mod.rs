//! Command-line presentation: rendering and prompts on top of
//! [`crate::application::ModManager`].

mod lifecycle;
mod list;
mod sections;
mod show;

pub use lifecycle::{Action, render_outcome, run, update_all};
pub use list::{ListOptions, list, render_list};
pub use sections::{render_sections, sections};
pub use show::{render_show, show};
