//! Settings command for Multiplay.
//!
//! Reads or updates the per-profile settings. Only the fields given are
//! written.

use serde::Serialize;

use crate::cli::{exit_code_for, render, OutputOptions};
use crate::core::{Settings, MAX_FACTOR_VALUE};
use crate::engine::Engine;
use crate::error::{exit_codes, MultiplayError, Result};
use crate::storage::FactStore;

/// Requested changes. `None` leaves a setting as it is.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub enabled_tables: Option<Vec<u8>>,
    pub max_factor: Option<u8>,
    pub round_length: Option<u32>,
    pub best_streak: Option<u32>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.enabled_tables.is_none()
            && self.max_factor.is_none()
            && self.round_length.is_none()
            && self.best_streak.is_none()
    }
}

/// Output format for the settings command.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsOutput {
    pub success: bool,
    pub settings: Settings,
    /// Names of the settings written by this call.
    pub changed: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub exit_code: i32,
}

/// The settings command implementation.
pub struct SettingsCommand<S: FactStore> {
    engine: Engine<S>,
}

impl<S: FactStore> SettingsCommand<S> {
    pub fn new(engine: Engine<S>) -> Self {
        Self { engine }
    }

    /// Current settings.
    pub fn get(&self) -> SettingsOutput {
        SettingsOutput {
            success: true,
            settings: self.engine.settings().clone(),
            changed: Vec::new(),
            error: None,
            exit_code: exit_codes::SUCCESS,
        }
    }

    /// Apply `update`, then report the resulting settings.
    pub fn set(&mut self, update: &SettingsUpdate) -> SettingsOutput {
        let mut changed = Vec::new();
        match self.apply(update, &mut changed) {
            Ok(()) => SettingsOutput {
                changed,
                ..self.get()
            },
            Err(err) => SettingsOutput {
                success: false,
                settings: self.engine.settings().clone(),
                changed,
                error: Some(err.to_string()),
                exit_code: exit_code_for(&err),
            },
        }
    }

    fn apply(&mut self, update: &SettingsUpdate, changed: &mut Vec<&'static str>) -> Result<()> {
        let enabled_tables = update
            .enabled_tables
            .as_deref()
            .map(validate_tables)
            .transpose()?;
        if let Some(max_factor) = update.max_factor {
            validate_factor(max_factor)?;
        }

        // Nothing is written until every field has passed
        if let Some(tables) = enabled_tables {
            self.engine.set_enabled_tables(tables)?;
            changed.push("enabled_tables");
        }
        if let Some(max_factor) = update.max_factor {
            self.engine.set_max_factor(max_factor)?;
            changed.push("max_factor");
        }
        if let Some(round_length) = update.round_length {
            self.engine.set_round_length(round_length)?;
            changed.push("round_length");
        }
        if let Some(best_streak) = update.best_streak {
            self.engine.set_best_streak(best_streak)?;
            changed.push("best_streak");
        }
        Ok(())
    }

    pub fn format_output(&self, output: &SettingsOutput, options: &OutputOptions) -> String {
        render(output, options, Self::format_human_readable)
    }

    fn format_human_readable(output: &SettingsOutput) -> String {
        let mut out = String::new();
        if let Some(error) = &output.error {
            out.push_str(&format!("Settings update failed: {}\n", error));
        } else if !output.changed.is_empty() {
            out.push_str(&format!("Updated: {}\n", output.changed.join(", ")));
        }

        let tables: Vec<String> = output
            .settings
            .enabled_tables
            .iter()
            .map(|t| t.to_string())
            .collect();
        out.push_str(&format!(
            "enabled_tables = [{}]\nmax_factor = {}\nround_length = {}\nbest_streak = {}\n",
            tables.join(", "),
            output.settings.max_factor,
            output.settings.round_length,
            output.settings.best_streak
        ));
        out
    }
}

/// Range-check a table list and drop repeats, keeping first occurrences.
fn validate_tables(tables: &[u8]) -> Result<Vec<u8>> {
    if let Some(bad) = tables.iter().find(|&&t| t > MAX_FACTOR_VALUE) {
        return Err(MultiplayError::config(format!(
            "table {} is out of range 0..={}",
            bad, MAX_FACTOR_VALUE
        )));
    }
    let mut unique: Vec<u8> = Vec::with_capacity(tables.len());
    for &table in tables {
        if !unique.contains(&table) {
            unique.push(table);
        }
    }
    Ok(unique)
}

fn validate_factor(max_factor: u8) -> Result<()> {
    if max_factor > MAX_FACTOR_VALUE {
        return Err(MultiplayError::config(format!(
            "max factor {} is out of range 0..={}",
            max_factor, MAX_FACTOR_VALUE
        )));
    }
    Ok(())
}
