//! Progress command for Multiplay.
//!
//! Runs the table progression check on demand, as a round end would.

use serde::Serialize;

use crate::cli::{exit_code_for, render, OutputOptions};
use crate::engine::Engine;
use crate::error::{exit_codes, MultiplayError};
use crate::storage::FactStore;

/// Output format for the progress command.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_table: Option<u8>,
    pub enabled_tables: Vec<u8>,
    pub mastery_rate: f64,
    /// Rate needed before the next table unlocks.
    pub threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub exit_code: i32,
}

impl ProgressOutput {
    pub fn failure(err: &MultiplayError) -> Self {
        Self {
            success: false,
            unlocked_table: None,
            enabled_tables: Vec::new(),
            mastery_rate: 0.0,
            threshold: 0.0,
            error: Some(err.to_string()),
            exit_code: exit_code_for(err),
        }
    }
}

/// The progress command implementation.
pub struct ProgressCommand<S: FactStore> {
    engine: Engine<S>,
}

impl<S: FactStore> ProgressCommand<S> {
    pub fn new(engine: Engine<S>) -> Self {
        Self { engine }
    }

    pub fn run(&mut self) -> ProgressOutput {
        let unlocked_table = match self.engine.check_and_apply_table_progression() {
            Ok(table) => table,
            Err(err) => return ProgressOutput::failure(&err),
        };
        ProgressOutput {
            success: true,
            unlocked_table,
            enabled_tables: self.engine.enabled_tables().to_vec(),
            mastery_rate: self.engine.mastery_overview().mastery_rate,
            threshold: self.engine.config().progression.auto_unlock_mastery_threshold,
            error: None,
            exit_code: exit_codes::SUCCESS,
        }
    }

    pub fn format_output(&self, output: &ProgressOutput, options: &OutputOptions) -> String {
        render(output, options, |output| {
            if let Some(error) = &output.error {
                return format!("Progress check failed: {}\n", error);
            }
            match output.unlocked_table {
                Some(table) => format!(
                    "New table unlocked: {}\nMastery rate is now {:.0}%\n",
                    table,
                    output.mastery_rate * 100.0
                ),
                None => format!(
                    "No new table yet: mastery {:.0}% (needs {:.0}%)\n",
                    output.mastery_rate * 100.0,
                    output.threshold * 100.0
                ),
            }
        })
    }
}
