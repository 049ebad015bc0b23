//! Active set maintenance.
//!
//! Keeps the number of eligible ACTIVE facts at the configured target by
//! promoting LOCKED facts, easiest first.

use std::cmp::Ordering;

use tracing::debug;

use crate::config::PracticeConfig;
use crate::core::{Fact, FactStatus};
use crate::error::Result;

/// Promotion order for locked facts.
///
/// Facts with a factor of 0, 1 or 10 come first, then ascending product.
pub fn promotion_order(a: &Fact, b: &Fact) -> Ordering {
    b.is_easy()
        .cmp(&a.is_easy())
        .then_with(|| a.product().cmp(&b.product()))
}

/// Tops up the active set from the locked pool.
#[derive(Debug, Clone)]
pub struct ActiveSetManager {
    target_size: usize,
    initial_confidence: f64,
}

impl ActiveSetManager {
    pub fn new(config: &PracticeConfig) -> Self {
        Self {
            target_size: config.active_set_size,
            initial_confidence: config.initial_confidence,
        }
    }

    /// Promote locked eligible facts until the eligible active count reaches
    /// the target or the locked pool runs out.
    ///
    /// Returns the indices of the promoted facts so the caller can persist
    /// each one. Facts outside the filters are left alone whatever their
    /// status. Calling again with no mastery events in between promotes
    /// nothing.
    pub fn ensure_active_set_size(
        &self,
        facts: &mut [Fact],
        enabled_tables: &[u8],
        max_factor: u8,
    ) -> Result<Vec<usize>> {
        let mut active = 0usize;
        let mut locked: Vec<usize> = Vec::new();
        for (index, fact) in facts.iter().enumerate() {
            if !fact.is_eligible(enabled_tables, max_factor) {
                continue;
            }
            match fact.status() {
                FactStatus::Active => active += 1,
                FactStatus::Locked => locked.push(index),
                FactStatus::Mastered => {}
            }
        }

        if active >= self.target_size {
            return Ok(Vec::new());
        }

        locked.sort_by(|&a, &b| promotion_order(&facts[a], &facts[b]));
        locked.truncate(self.target_size - active);

        for &index in &locked {
            facts[index].activate(self.initial_confidence)?;
            debug!(fact_id = %facts[index].id, "Promoted fact to active set");
        }

        Ok(locked)
    }
}

impl Default for ActiveSetManager {
    fn default() -> Self {
        Self::new(&PracticeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::generate_initial_facts;

    const DEFAULT_TABLES: [u8; 5] = [1, 2, 3, 5, 10];

    fn eligible_active(facts: &[Fact], tables: &[u8], max_factor: u8) -> usize {
        facts
            .iter()
            .filter(|f| f.is_eligible(tables, max_factor) && f.status() == FactStatus::Active)
            .count()
    }

    #[test]
    fn test_promotion_order() {
        let easy_big = Fact::new(10, 9, 0.0);
        let hard_small = Fact::new(2, 3, 0.0);
        let easy_small = Fact::new(1, 2, 0.0);
        assert_eq!(promotion_order(&easy_big, &hard_small), Ordering::Less);
        assert_eq!(promotion_order(&easy_small, &easy_big), Ordering::Less);
        assert_eq!(promotion_order(&hard_small, &Fact::new(3, 3, 0.0)), Ordering::Less);
    }

    #[test]
    fn test_fresh_profile_fills_to_target() {
        let mut facts = generate_initial_facts(0.0);
        let manager = ActiveSetManager::default();

        let promoted = manager
            .ensure_active_set_size(&mut facts, &DEFAULT_TABLES, 10)
            .unwrap();

        assert_eq!(promoted.len(), 15);
        assert_eq!(eligible_active(&facts, &DEFAULT_TABLES, 10), 15);
        // Easy bucket first: every promoted fact has a 0, 1 or 10 factor
        assert!(promoted.iter().all(|&i| facts[i].is_easy()));
        // Smallest product goes first
        assert_eq!(facts[promoted[0]].product(), 0);
    }

    #[test]
    fn test_promotion_resets_confidence() {
        let mut facts = generate_initial_facts(0.5);
        let manager = ActiveSetManager::new(&PracticeConfig {
            initial_confidence: 0.0,
            ..PracticeConfig::default()
        });
        let promoted = manager
            .ensure_active_set_size(&mut facts, &DEFAULT_TABLES, 10)
            .unwrap();
        assert!(promoted.iter().all(|&i| facts[i].confidence == 0.0));
    }

    #[test]
    fn test_idempotent() {
        let mut facts = generate_initial_facts(0.0);
        let manager = ActiveSetManager::default();
        manager
            .ensure_active_set_size(&mut facts, &DEFAULT_TABLES, 10)
            .unwrap();
        let snapshot = facts.clone();

        let promoted = manager
            .ensure_active_set_size(&mut facts, &DEFAULT_TABLES, 10)
            .unwrap();
        assert!(promoted.is_empty());
        assert_eq!(facts, snapshot);
    }

    #[test]
    fn test_refills_after_mastery() {
        let mut facts = generate_initial_facts(0.0);
        let manager = ActiveSetManager::default();
        let promoted = manager
            .ensure_active_set_size(&mut facts, &DEFAULT_TABLES, 10)
            .unwrap();

        facts[promoted[0]].master().unwrap();
        facts[promoted[1]].master().unwrap();

        let refill = manager
            .ensure_active_set_size(&mut facts, &DEFAULT_TABLES, 10)
            .unwrap();
        assert_eq!(refill.len(), 2);
        assert_eq!(eligible_active(&facts, &DEFAULT_TABLES, 10), 15);
    }

    #[test]
    fn test_small_pool_exhausts() {
        let mut facts = generate_initial_facts(0.0);
        let manager = ActiveSetManager::default();
        // Table 2 with factors up to 2: 2x0, 2x1, 2x2, 0x2, 1x2
        let promoted = manager.ensure_active_set_size(&mut facts, &[2], 2).unwrap();
        assert_eq!(promoted.len(), 5);
        assert_eq!(eligible_active(&facts, &[2], 2), 5);
    }

    #[test]
    fn test_out_of_filter_active_facts_kept() {
        let mut facts = generate_initial_facts(0.0);
        let manager = ActiveSetManager::default();
        manager
            .ensure_active_set_size(&mut facts, &DEFAULT_TABLES, 10)
            .unwrap();

        // Narrow the filters, old actives outside them stay ACTIVE
        manager.ensure_active_set_size(&mut facts, &[7], 10).unwrap();
        let total_active = facts
            .iter()
            .filter(|f| f.status() == FactStatus::Active)
            .count();
        assert!(total_active > 15);
        assert_eq!(eligible_active(&facts, &[7], 10), 15);
    }

    #[test]
    fn test_empty_filters_promote_nothing() {
        let mut facts = generate_initial_facts(0.0);
        let promoted = ActiveSetManager::default()
            .ensure_active_set_size(&mut facts, &[], 12)
            .unwrap();
        assert!(promoted.is_empty());
    }
}
