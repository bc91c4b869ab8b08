//! Package records and everything derived from them.

pub mod artifact;
mod graph;
mod layout;
pub mod listing;
mod receipt;
mod record;
mod state;
pub mod version;

pub use graph::DependencyGraph;
pub use layout::InstallLayout;
pub use receipt::{Receipt, ReceiptStore};
pub use record::{PackageRecord, parse_catalog};
pub use state::{InstallState, PackageInspector, PackageView};
