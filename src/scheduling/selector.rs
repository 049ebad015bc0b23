//! Three-pool weighted question selection.
//!
//! Eligible ACTIVE facts are sorted by confidence. The lowest
//! `weak_pool_size` form the weak pool and the rest the learning pool.
//! A roll in `[0, 100)` picks the pool:
//!
//! - `roll < weight_weak`: weak pool
//! - `roll < weight_weak + weight_mastered`: mastered facts
//! - otherwise: learning pool
//!
//! An empty target pool falls back to any unlocked eligible fact.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::config::SelectionConfig;
use crate::core::{Fact, FactStatus, Question};
use crate::error::{MultiplayError, Result};

/// Pool a question was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Weak,
    Mastered,
    Learning,
    Fallback,
}

/// Draws the next question from the eligible facts.
#[derive(Debug, Clone)]
pub struct QuestionSelector {
    weights: SelectionConfig,
    weak_pool_size: usize,
    timeout_ms: u64,
}

impl QuestionSelector {
    pub fn new(weights: SelectionConfig, weak_pool_size: usize, timeout_ms: u64) -> Self {
        Self {
            weights,
            weak_pool_size,
            timeout_ms,
        }
    }

    /// Pick the next question.
    ///
    /// Fails with `NoEligibleFacts` when no eligible fact is unlocked.
    pub fn select_next_question<R: Rng>(
        &self,
        facts: &[Fact],
        enabled_tables: &[u8],
        max_factor: u8,
        rng: &mut R,
    ) -> Result<Question> {
        let (fact, pool) = self.choose(facts, enabled_tables, max_factor, rng)?;
        debug!(fact_id = %fact.id, ?pool, "Selected question");
        Ok(Question::from_fact(fact, self.timeout_ms))
    }

    /// Pick a fact and report which pool it came from.
    pub fn choose<'a, R: Rng>(
        &self,
        facts: &'a [Fact],
        enabled_tables: &[u8],
        max_factor: u8,
        rng: &mut R,
    ) -> Result<(&'a Fact, Pool)> {
        let mut active: Vec<&Fact> = Vec::new();
        let mut mastered: Vec<&Fact> = Vec::new();
        for fact in facts
            .iter()
            .filter(|f| f.is_eligible(enabled_tables, max_factor))
        {
            match fact.status() {
                FactStatus::Active => active.push(fact),
                FactStatus::Mastered => mastered.push(fact),
                FactStatus::Locked => {}
            }
        }

        active.sort_by(|a, b| a.confidence.total_cmp(&b.confidence));
        let split = self.weak_pool_size.min(active.len());
        let (weak, learning) = active.split_at(split);

        let roll: f64 = rng.gen_range(0.0..100.0);
        let weak_cutoff = f64::from(self.weights.weight_weak);
        let mastered_cutoff = weak_cutoff + f64::from(self.weights.weight_mastered);

        let targeted = if roll < weak_cutoff && !weak.is_empty() {
            weak.choose(rng).map(|f| (*f, Pool::Weak))
        } else if roll < mastered_cutoff && !mastered.is_empty() {
            mastered.choose(rng).map(|f| (*f, Pool::Mastered))
        } else if !learning.is_empty() {
            learning.choose(rng).map(|f| (*f, Pool::Learning))
        } else {
            None
        };
        if let Some(picked) = targeted {
            return Ok(picked);
        }

        // Status is closed over three variants, so "any unlocked eligible
        // fact" is exactly active plus mastered.
        let unlocked: Vec<&Fact> = active.iter().chain(mastered.iter()).copied().collect();
        unlocked
            .choose(rng)
            .map(|f| (*f, Pool::Fallback))
            .ok_or(MultiplayError::NoEligibleFacts)
    }
}

impl Default for QuestionSelector {
    fn default() -> Self {
        Self::new(SelectionConfig::default(), 5, 6000)
    }
}
