use anyhow::{Result, bail};
use log::warn;

use crate::application::ModManager;
use crate::lifecycle::{Confirmer, Outcome};
use crate::runtime::Runtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Install,
    Uninstall,
    Enable,
    Disable,
    Update,
}

impl Action {
    fn progress(&self) -> &'static str {
        match self {
            Action::Install => "Installing",
            Action::Uninstall => "Uninstalling",
            Action::Enable => "Enabling",
            Action::Disable => "Disabling",
            Action::Update => "Updating",
        }
    }
}

/// Run one lifecycle operation and report what changed
#[tracing::instrument(skip(manager, confirmer))]
pub async fn run<R: Runtime, C: Confirmer + ?Sized>(
    manager: &ModManager<R>,
    action: Action,
    name: &str,
    confirmer: &C,
) -> Result<()> {
    println!("{} {}...", action.progress(), name);
    let outcome = match action {
        Action::Install => manager.install(name, confirmer).await,
        Action::Uninstall => manager.uninstall(name, confirmer).await,
        Action::Enable => manager.enable(name, confirmer).await,
        Action::Disable => manager.disable(name, confirmer).await,
        Action::Update => manager.update(name, confirmer).await,
    }?;
    print!("{}", render_outcome(&outcome));
    Ok(())
}

/// Update every installed package that has a newer catalog version.
///
/// Keeps going after a failure and reports all failures at the end.
#[tracing::instrument(skip(manager, confirmer))]
pub async fn update_all<R: Runtime, C: Confirmer + ?Sized>(manager: &ModManager<R>, confirmer: &C) -> Result<()> {
    let names = manager.updates_available();
    if names.is_empty() {
        println!("All installed packages are up to date.");
        return Ok(());
    }

    let mut failed = Vec::new();
    for name in &names {
        if let Err(e) = run(manager, Action::Update, name, confirmer).await {
            warn!("Failed to update {}: {:#}", name, e);
            eprintln!("Failed to update {}: {:#}", name, e);
            failed.push(name.as_str());
        }
    }
    if !failed.is_empty() {
        bail!("{} of {} update(s) failed: {}", failed.len(), names.len(), failed.join(", "));
    }
    Ok(())
}

pub fn render_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Declined => "Cancelled. No changes were made.\n".to_string(),
        Outcome::Applied(steps) if steps.is_empty() => "Nothing to do.\n".to_string(),
        Outcome::Applied(steps) => steps.iter().map(|s| format!("  {}\n", s)).collect(),
    }
}
