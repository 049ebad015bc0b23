//! Status command for Multiplay.
//!
//! Shows the profile's settings, mastery counts under the current filters,
//! and optionally the full 13 × 13 status grid.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::{render, OutputOptions};
use crate::core::{Fact, FactStatus, MasteryOverview, Settings, MAX_FACTOR_VALUE};
use crate::engine::Engine;
use crate::storage::FactStore;

/// Options for the status command.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusOptions {
    pub output: OutputOptions,
    /// Include the per-fact status grid.
    pub grid: bool,
}

/// One cell of the status grid.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactRow {
    pub id: String,
    pub status: FactStatus,
    pub confidence: f64,
    pub latency_avg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_practiced: Option<DateTime<Utc>>,
}

impl From<&Fact> for FactRow {
    fn from(fact: &Fact) -> Self {
        Self {
            id: fact.id.clone(),
            status: fact.status(),
            confidence: fact.confidence,
            latency_avg: fact.latency_avg,
            last_practiced: fact.last_practiced_at(),
        }
    }
}

/// Output format for the status command.
#[derive(Debug, Clone, Serialize)]
pub struct StatusOutput {
    pub profile: String,
    pub settings: Settings,
    pub overview: MasteryOverview,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facts: Option<Vec<FactRow>>,
}

/// The status command implementation.
pub struct StatusCommand<S: FactStore> {
    engine: Engine<S>,
}

impl<S: FactStore> StatusCommand<S> {
    pub fn new(engine: Engine<S>) -> Self {
        Self { engine }
    }

    pub fn run(&self, options: &StatusOptions) -> StatusOutput {
        StatusOutput {
            profile: self.engine.profile_id().to_string(),
            settings: self.engine.settings().clone(),
            overview: self.engine.mastery_overview(),
            facts: options
                .grid
                .then(|| self.engine.get_all_facts().iter().map(FactRow::from).collect()),
        }
    }

    pub fn format_output(&self, output: &StatusOutput, options: &StatusOptions) -> String {
        render(output, &options.output, Self::format_human_readable)
    }

    fn format_human_readable(output: &StatusOutput) -> String {
        let tables: Vec<String> = output
            .settings
            .enabled_tables
            .iter()
            .map(|t| t.to_string())
            .collect();
        let mut out = format!(
            "Profile: {}\nTables: {}\nMax factor: {}\nRound length: {}\nBest streak: {}\n\n",
            output.profile,
            if tables.is_empty() {
                "(none)".to_string()
            } else {
                tables.join(", ")
            },
            output.settings.max_factor,
            output.settings.round_length,
            output.settings.best_streak,
        );

        let overview = &output.overview;
        out.push_str(&format!(
            "Eligible facts: {}\n  locked:   {}\n  active:   {}\n  mastered: {}\nMastery rate: {:.0}%\n",
            overview.eligible,
            overview.locked,
            overview.active,
            overview.mastered,
            overview.mastery_rate * 100.0
        ));

        if let Some(facts) = &output.facts {
            out.push('\n');
            out.push_str(&format_grid(facts));
        }
        out
    }
}

/// Render facts as a grid: `.` locked, `o` active, `#` mastered.
fn format_grid(facts: &[FactRow]) -> String {
    let size = MAX_FACTOR_VALUE as usize + 1;
    let mut cells = vec![' '; size * size];
    for row in facts {
        let Some((a, b)) = row.id.split_once('x') else {
            continue;
        };
        let (Ok(a), Ok(b)) = (a.parse::<usize>(), b.parse::<usize>()) else {
            continue;
        };
        if a < size && b < size {
            cells[a * size + b] = grid_symbol(row.status);
        }
    }

    let mut out = String::from("    ");
    for b in 0..size {
        out.push_str(&format!("{:>3}", b));
    }
    out.push('\n');
    for a in 0..size {
        out.push_str(&format!("{:>3} ", a));
        for b in 0..size {
            out.push_str(&format!("{:>3}", cells[a * size + b]));
        }
        out.push('\n');
    }

    let legend: Vec<String> = [FactStatus::Locked, FactStatus::Active, FactStatus::Mastered]
        .iter()
        .map(|status| format!("{} {}", grid_symbol(*status), status.as_str()))
        .collect();
    out.push_str(&format!("\n{}\n", legend.join("   ")));
    out
}

fn grid_symbol(status: FactStatus) -> char {
    match status {
        FactStatus::Locked => '.',
        FactStatus::Active => 'o',
        FactStatus::Mastered => '#',
    }
}
