use anyhow::Result;
use log::info;

use crate::runtime::Runtime;

/// Decides whether a cascading change may go ahead.
///
/// Asked before dependencies are installed or dependents are disabled.
#[cfg_attr(test, mockall::automock)]
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str, items: &[String]) -> Result<bool>;
}

/// Asks the user on the terminal.
pub struct PromptConfirmer<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> PromptConfirmer<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }
}

impl<R: Runtime> Confirmer for PromptConfirmer<'_, R> {
    fn confirm(&self, prompt: &str, items: &[String]) -> Result<bool> {
        self.runtime.confirm(&format_prompt(prompt, items))
    }
}

/// Accepts every cascade (`--yes`).
pub struct AutoConfirmer;

impl Confirmer for AutoConfirmer {
    fn confirm(&self, prompt: &str, items: &[String]) -> Result<bool> {
        info!("{} {} (auto-confirmed)", prompt, items.join(", "));
        Ok(true)
    }
}

fn format_prompt(prompt: &str, items: &[String]) -> String {
    let mut text = String::new();
    for item in items {
        text.push_str("  - ");
        text.push_str(item);
        text.push('\n');
    }
    text.push_str(prompt);
    text
}
