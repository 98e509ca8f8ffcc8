//! The `PROMPT_COMMAND` hook that feeds `log-recent`.

use recent_core::history::EXPECTED_PROMPT;

/// Line users add to `.bashrc` / `.bash_profile`.
pub fn hook_line() -> String {
    format!("export PROMPT_COMMAND='{EXPECTED_PROMPT}'")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptCheck {
    /// `RECENT_CUSTOM_PROMPT` is set; the user wires the hook themselves.
    Skipped,
    Installed,
    Missing,
}

pub fn check(custom_prompt: bool, prompt_command: Option<&str>) -> PromptCheck {
    if custom_prompt {
        PromptCheck::Skipped
    } else if prompt_command.is_some_and(|p| p.contains(EXPECTED_PROMPT)) {
        PromptCheck::Installed
    } else {
        PromptCheck::Missing
    }
}
