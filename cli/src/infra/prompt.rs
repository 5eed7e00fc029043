//! Terminal interactivity — implements the `Interaction` port.

use anyhow::Result;
use console::Term;

use crate::application::ports::Interaction;

/// Production `Interaction` backed by the terminal.
///
/// Non-interactive when `--yes` was passed, when the `CI` or `TERMDOCK_YES`
/// environment variables are present, or when stdout is not a TTY — so
/// automated runs never block on a prompt.
pub struct TerminalInteraction {
    assume_yes: bool,
}

impl TerminalInteraction {
    #[must_use]
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Interaction for TerminalInteraction {
    fn is_interactive(&self) -> bool {
        if self.assume_yes
            || std::env::var("CI").is_ok()
            || std::env::var("TERMDOCK_YES").is_ok()
        {
            return false;
        }
        Term::stdout().is_term()
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}
