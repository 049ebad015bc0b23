//! Adaptive table progression.
//!
//! Once enough of the unlocked eligible facts are mastered, the next table
//! in the unlock order is proposed. Applying the unlock is the engine's job.

use tracing::debug;

use crate::config::ProgressionConfig;
use crate::core::{Fact, MasteryOverview};

/// Decides when to introduce the next multiplication table.
#[derive(Debug, Clone)]
pub struct ProgressionController {
    threshold: f64,
    unlock_order: Vec<u8>,
}

impl ProgressionController {
    pub fn new(config: &ProgressionConfig) -> Self {
        Self {
            threshold: config.auto_unlock_mastery_threshold,
            unlock_order: config.table_unlock_order.clone(),
        }
    }

    /// Return the table to unlock next, if any.
    ///
    /// `None` when the mastery rate over unlocked eligible facts is below the
    /// threshold, or when every table in the unlock order up to `max_factor`
    /// is already enabled.
    pub fn check_adaptive_table_progression(
        &self,
        facts: &[Fact],
        enabled_tables: &[u8],
        max_factor: u8,
    ) -> Option<u8> {
        let overview = MasteryOverview::compute(facts, enabled_tables, max_factor);
        if overview.mastery_rate < self.threshold {
            return None;
        }

        let next = self
            .unlock_order
            .iter()
            .copied()
            .find(|table| !enabled_tables.contains(table) && *table <= max_factor);
        debug!(
            mastery_rate = overview.mastery_rate,
            next_table = ?next,
            "Progression threshold met"
        );
        next
    }
}

impl Default for ProgressionController {
    fn default() -> Self {
        Self::new(&ProgressionConfig::default())
    }
}
