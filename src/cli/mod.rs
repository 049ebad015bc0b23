//! CLI commands for Multiplay.
//!
//! Each command wraps an [`Engine`](crate::engine::Engine) and follows the
//! same shape: an options struct, a serializable output struct, `run`, and
//! `format_output` for human, JSON or quiet output.
//!
//! - **Practice**: question, answer, drill
//! - **Profile**: status, settings, progress, reset

// Practice commands
pub mod answer;
pub mod drill;
pub mod question;

// Profile commands
pub mod progress;
pub mod reset;
pub mod settings;
pub mod status;

pub use answer::AnswerCommand;
pub use drill::DrillCommand;
pub use progress::ProgressCommand;
pub use question::QuestionCommand;
pub use reset::ResetCommand;
pub use settings::SettingsCommand;
pub use status::StatusCommand;

use serde::Serialize;

use crate::error::{exit_codes, MultiplayError};

/// Options shared by every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Process exit code for a failed command.
pub fn exit_code_for(err: &MultiplayError) -> i32 {
    match err {
        MultiplayError::NoEligibleFacts => exit_codes::NO_ELIGIBLE_FACTS,
        _ => exit_codes::ERROR,
    }
}

/// Render an output per the options, delegating the human form.
pub(crate) fn render<T: Serialize>(
    output: &T,
    options: &OutputOptions,
    human: impl FnOnce(&T) -> String,
) -> String {
    if options.quiet {
        return String::new();
    }

    if options.json {
        serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
    } else {
        human(output)
    }
}

/// Render a multiplication as `"3 × 7"`.
pub(crate) fn format_factors(factors: [u8; 2]) -> String {
    format!("{} × {}", factors[0], factors[1])
}
