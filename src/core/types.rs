//! Derived values exchanged with callers, and per-profile settings.

use serde::{Deserialize, Serialize};

use crate::config::DefaultsConfig;
use crate::core::fact::{Fact, FactStatus};

/// Setting keys as stored under `"{profile}:{key}"`.
pub mod setting_keys {
    pub const ENABLED_TABLES: &str = "enabledTables";
    pub const MAX_FACTOR: &str = "maxFactor";
    pub const ROUND_LENGTH: &str = "roundLength";
    pub const BEST_STREAK: &str = "bestStreak";
    /// Answers submitted so far; drives the progression cadence.
    pub const ANSWER_COUNT: &str = "answerCount";
}

/// The next fact to ask. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub factors: [u8; 2],
    /// Timer hint for the UI.
    pub timeout_ms: u64,
}

impl Question {
    pub fn from_fact(fact: &Fact, timeout_ms: u64) -> Self {
        Self {
            id: fact.id.clone(),
            factors: fact.factors,
            timeout_ms,
        }
    }
}

/// Outcome of one submitted answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub is_correct: bool,
    pub correct_answer: u32,
    pub time_taken: u64,
    pub new_confidence: f64,
    /// Actual change applied, after clamping and tier caps.
    pub delta_confidence: f64,
    /// Whether this answer moved the fact to MASTERED.
    pub is_mastered_event: bool,
}

/// Per-profile settings.
///
/// `round_length` and `best_streak` are held for callers; the scheduling
/// core only reads `enabled_tables` and `max_factor`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub enabled_tables: Vec<u8>,
    pub max_factor: u8,
    pub round_length: u32,
    pub best_streak: u32,
}

impl Settings {
    /// Settings for a profile with nothing stored.
    pub fn from_defaults(defaults: &DefaultsConfig) -> Self {
        Self {
            enabled_tables: defaults.enabled_tables.clone(),
            max_factor: defaults.max_factor,
            round_length: defaults.round_length,
            best_streak: 0,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_defaults(&DefaultsConfig::default())
    }
}

/// Status counts over the facts eligible under the current filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MasteryOverview {
    pub eligible: usize,
    pub locked: usize,
    pub active: usize,
    pub mastered: usize,
    /// `mastered / (active + mastered)`, 0 when nothing is unlocked.
    pub mastery_rate: f64,
}

impl MasteryOverview {
    pub fn compute<'a>(
        facts: impl IntoIterator<Item = &'a Fact>,
        enabled_tables: &[u8],
        max_factor: u8,
    ) -> Self {
        let mut overview = Self::default();
        for fact in facts {
            if !fact.is_eligible(enabled_tables, max_factor) {
                continue;
            }
            overview.eligible += 1;
            match fact.status() {
                FactStatus::Locked => overview.locked += 1,
                FactStatus::Active => overview.active += 1,
                FactStatus::Mastered => overview.mastered += 1,
            }
        }
        let unlocked = overview.active + overview.mastered;
        if unlocked > 0 {
            overview.mastery_rate = overview.mastered as f64 / unlocked as f64;
        }
        overview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.enabled_tables, vec![1, 2, 3, 5, 10]);
        assert_eq!(settings.max_factor, 10);
        assert_eq!(settings.round_length, 10);
        assert_eq!(settings.best_streak, 0);
    }

    #[test]
    fn test_question_from_fact() {
        let fact = Fact::new(6, 9, 0.0);
        let question = Question::from_fact(&fact, 6000);
        assert_eq!(question.id, "6x9");
        assert_eq!(question.factors, [6, 9]);
        assert_eq!(question.timeout_ms, 6000);
    }

    #[test]
    fn test_answer_result_serializes_camel_case() {
        let result = AnswerResult {
            is_correct: true,
            correct_answer: 21,
            time_taken: 1500,
            new_confidence: 0.3,
            delta_confidence: 0.3,
            is_mastered_event: false,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isCorrect"], true);
        assert_eq!(json["correctAnswer"], 21);
        assert_eq!(json["isMasteredEvent"], false);
    }

    #[test]
    fn test_mastery_overview() {
        let mut facts = vec![
            Fact::new(2, 3, 0.0),
            Fact::new(2, 4, 0.0),
            Fact::new(2, 5, 0.0),
            Fact::new(7, 8, 0.0),
        ];
        facts[0].activate(0.0).unwrap();
        facts[1].activate(0.0).unwrap();
        facts[1].master().unwrap();
        facts[3].activate(0.0).unwrap();

        let overview = MasteryOverview::compute(&facts, &[2], 10);
        assert_eq!(overview.eligible, 3);
        assert_eq!(overview.locked, 1);
        assert_eq!(overview.active, 1);
        assert_eq!(overview.mastered, 1);
        assert!((overview.mastery_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_mastery_overview_empty() {
        let facts = vec![Fact::new(2, 3, 0.0)];
        let overview = MasteryOverview::compute(&facts, &[2], 10);
        assert_eq!(overview.mastery_rate, 0.0);
    }
}
