//! Fact entity and its mastery state machine.
//!
//! A fact is one ordered multiplication pair plus its mastery record. The
//! status only moves forward: LOCKED → ACTIVE → MASTERED.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MultiplayError, Result};

/// Largest factor value in the fact table.
pub const MAX_FACTOR_VALUE: u8 = 12;

/// Number of facts generated for a fresh profile (13 × 13).
pub const TOTAL_FACTS: usize = (MAX_FACTOR_VALUE as usize + 1) * (MAX_FACTOR_VALUE as usize + 1);

/// Factors that make a fact "easy" for promotion ordering.
pub const EASY_FACTORS: [u8; 3] = [0, 1, 10];

/// Mastery status of a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactStatus {
    /// Not yet in rotation.
    #[default]
    Locked,
    /// In the active practice set.
    Active,
    /// Fluently recalled.
    Mastered,
}

impl FactStatus {
    /// Whether moving from `self` to `to` is one of the two legal promotions.
    pub fn can_transition_to(self, to: FactStatus) -> bool {
        matches!(
            (self, to),
            (FactStatus::Locked, FactStatus::Active) | (FactStatus::Active, FactStatus::Mastered)
        )
    }

    /// Lowercase name for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            FactStatus::Locked => "locked",
            FactStatus::Active => "active",
            FactStatus::Mastered => "mastered",
        }
    }
}

/// Build the stable identifier for an ordered factor pair.
pub fn fact_id(a: u8, b: u8) -> String {
    format!("{}x{}", a, b)
}

/// One multiplication fact and its mastery record.
///
/// Field names serialize to the persisted record shape (`latencyAvg`,
/// `lastPracticed`, status as `"LOCKED"` etc.).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Fact {
    /// Identifier derived from the factor pair, e.g. `"3x7"`.
    pub id: String,
    /// Ordered factor pair, each in `0..=12`.
    pub factors: [u8; 2],
    /// Estimated probability of fluent recall, in `[0, 1]`.
    pub confidence: f64,
    /// Exponentially smoothed response time in ms; 0 until first answer.
    pub latency_avg: f64,
    /// Unix timestamp (ms) of the last answer; 0 if never practiced.
    pub last_practiced: i64,
    status: FactStatus,
}

impl Fact {
    /// Create a locked fact for the pair `(a, b)`.
    pub fn new(a: u8, b: u8, initial_confidence: f64) -> Self {
        Self {
            id: fact_id(a, b),
            factors: [a, b],
            confidence: initial_confidence,
            latency_avg: 0.0,
            last_practiced: 0,
            status: FactStatus::Locked,
        }
    }

    /// Current status.
    pub fn status(&self) -> FactStatus {
        self.status
    }

    /// The correct answer for this fact.
    pub fn product(&self) -> u32 {
        self.factors[0] as u32 * self.factors[1] as u32
    }

    /// Whether either factor is 0, 1, or 10.
    pub fn is_easy(&self) -> bool {
        EASY_FACTORS.contains(&self.factors[0]) || EASY_FACTORS.contains(&self.factors[1])
    }

    /// Whether the fact belongs to an enabled table and fits under `max_factor`.
    pub fn is_eligible(&self, enabled_tables: &[u8], max_factor: u8) -> bool {
        let [a, b] = self.factors;
        (enabled_tables.contains(&a) || enabled_tables.contains(&b))
            && a <= max_factor
            && b <= max_factor
    }

    /// Time of the last answer, if any.
    pub fn last_practiced_at(&self) -> Option<DateTime<Utc>> {
        if self.last_practiced == 0 {
            return None;
        }
        Utc.timestamp_millis_opt(self.last_practiced).single()
    }

    /// Transition: LOCKED → ACTIVE, resetting confidence.
    pub fn activate(&mut self, initial_confidence: f64) -> Result<()> {
        self.transition(FactStatus::Active)?;
        self.confidence = initial_confidence;
        Ok(())
    }

    /// Transition: ACTIVE → MASTERED.
    pub fn master(&mut self) -> Result<()> {
        self.transition(FactStatus::Mastered)
    }

    fn transition(&mut self, to: FactStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(MultiplayError::invalid_transition(&self.id, self.status, to));
        }
        self.status = to;
        Ok(())
    }

    /// Fold an answer's response time into the latency average and stamp
    /// the practice time.
    pub fn record_attempt(&mut self, time_taken_ms: u64, now: DateTime<Utc>) {
        let t = time_taken_ms as f64;
        self.latency_avg = if self.latency_avg == 0.0 {
            t
        } else {
            self.latency_avg * 0.7 + t * 0.3
        };
        self.last_practiced = now.timestamp_millis();
    }
}

/// Generate the full 13 × 13 table, every fact LOCKED.
pub fn generate_initial_facts(initial_confidence: f64) -> Vec<Fact> {
    let mut facts = Vec::with_capacity(TOTAL_FACTS);
    for i in 0..=MAX_FACTOR_VALUE {
        for j in 0..=MAX_FACTOR_VALUE {
            facts.push(Fact::new(i, j, initial_confidence));
        }
    }
    facts
}
