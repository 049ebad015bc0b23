//! Reset command for Multiplay.
//!
//! Erases a profile's facts and settings. Refuses to run unconfirmed.
//!
//! Works on the store directly without loading the profile, so it can clear
//! records that no longer parse. The next command regenerates the table.

use serde::Serialize;

use crate::cli::{exit_code_for, render, OutputOptions};
use crate::error::exit_codes;
use crate::storage::FactStore;

/// Output format for the reset command.
#[derive(Debug, Clone, Serialize)]
pub struct ResetOutput {
    pub success: bool,
    pub profile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub exit_code: i32,
}

/// The reset command implementation.
pub struct ResetCommand<S: FactStore> {
    store: S,
    profile_id: String,
}

impl<S: FactStore> ResetCommand<S> {
    pub fn new(store: S, profile_id: impl Into<String>) -> Self {
        Self {
            store,
            profile_id: profile_id.into(),
        }
    }

    pub fn run(&self, confirmed: bool) -> ResetOutput {
        let profile = self.profile_id.clone();
        if !confirmed {
            return ResetOutput {
                success: false,
                profile,
                error: Some("refusing to reset without --yes".to_string()),
                exit_code: exit_codes::ERROR,
            };
        }

        match self.store.clear_all(&self.profile_id) {
            Ok(()) => {
                tracing::info!(profile = %self.profile_id, "Progress reset");
                ResetOutput {
                    success: true,
                    profile,
                    error: None,
                    exit_code: exit_codes::SUCCESS,
                }
            }
            Err(err) => ResetOutput {
                success: false,
                profile,
                error: Some(err.to_string()),
                exit_code: exit_code_for(&err),
            },
        }
    }

    pub fn format_output(&self, output: &ResetOutput, options: &OutputOptions) -> String {
        render(output, options, |output| match &output.error {
            None => format!("Progress for profile '{}' reset.\n", output.profile),
            Some(error) => format!("Reset failed: {}\n", error),
        })
    }
}
