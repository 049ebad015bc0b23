//! Round bookkeeping for callers.
//!
//! The engine does not pace rounds. Callers feed each `AnswerResult` into a
//! `RoundTracker` and read the summary and streaks back when the round ends.

use serde::{Deserialize, Serialize};

use crate::core::types::AnswerResult;

/// Accuracy needed for two stars.
pub const TWO_STAR_ACCURACY: f64 = 0.7;

/// Accuracy needed for three stars (also requires a fast average).
pub const THREE_STAR_ACCURACY: f64 = 0.9;

/// End-of-round summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub total_questions: u32,
    pub correct_count: u32,
    pub avg_time: f64,
    pub accuracy: f64,
    /// 1 to 3.
    pub stars: u8,
}

/// Accumulates answers for one round.
#[derive(Debug, Clone)]
pub struct RoundTracker {
    round_length: u32,
    fast_threshold_ms: u64,
    total: u32,
    correct: u32,
    total_time_ms: u64,
    streak: u32,
    best_streak: u32,
    mastered: Vec<String>,
}

impl RoundTracker {
    /// Create a tracker for a round of `round_length` questions.
    pub fn new(round_length: u32, fast_threshold_ms: u64) -> Self {
        Self {
            round_length,
            fast_threshold_ms,
            total: 0,
            correct: 0,
            total_time_ms: 0,
            streak: 0,
            best_streak: 0,
            mastered: Vec::new(),
        }
    }

    /// Record one answer.
    pub fn record(&mut self, fact_id: &str, result: &AnswerResult) {
        self.total += 1;
        self.total_time_ms += result.time_taken;
        if result.is_correct {
            self.correct += 1;
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.streak = 0;
        }
        if result.is_mastered_event {
            self.mastered.push(fact_id.to_string());
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total >= self.round_length
    }

    pub fn answered(&self) -> u32 {
        self.total
    }

    pub fn current_streak(&self) -> u32 {
        self.streak
    }

    pub fn best_streak_in_round(&self) -> u32 {
        self.best_streak
    }

    /// Fact ids that reached mastery during this round.
    pub fn mastered_facts(&self) -> &[String] {
        &self.mastered
    }

    pub fn summary(&self) -> RoundSummary {
        let (accuracy, avg_time) = if self.total > 0 {
            (
                self.correct as f64 / self.total as f64,
                self.total_time_ms as f64 / self.total as f64,
            )
        } else {
            (0.0, 0.0)
        };

        let stars = if accuracy >= THREE_STAR_ACCURACY && avg_time < self.fast_threshold_ms as f64
        {
            3
        } else if accuracy >= TWO_STAR_ACCURACY {
            2
        } else {
            1
        };

        RoundSummary {
            total_questions: self.total,
            correct_count: self.correct,
            avg_time,
            accuracy,
            stars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(is_correct: bool, time_taken: u64) -> AnswerResult {
        AnswerResult {
            is_correct,
            correct_answer: 12,
            time_taken,
            new_confidence: 0.5,
            delta_confidence: 0.0,
            is_mastered_event: false,
        }
    }

    #[test]
    fn test_empty_round() {
        let tracker = RoundTracker::new(10, 3000);
        let summary = tracker.summary();
        assert_eq!(summary.total_questions, 0);
        assert_eq!(summary.accuracy, 0.0);
        assert_eq!(summary.stars, 1);
        assert!(!tracker.is_complete());
    }

    #[test]
    fn test_three_stars_requires_speed() {
        let mut fast = RoundTracker::new(2, 3000);
        fast.record("2x2", &answer(true, 1000));
        fast.record("2x3", &answer(true, 2000));
        assert!(fast.is_complete());
        assert_eq!(fast.summary().stars, 3);

        let mut slow = RoundTracker::new(2, 3000);
        slow.record("2x2", &answer(true, 5000));
        slow.record("2x3", &answer(true, 5000));
        assert_eq!(slow.summary().stars, 2);
    }

    #[test]
    fn test_one_star_low_accuracy() {
        let mut tracker = RoundTracker::new(4, 3000);
        tracker.record("a", &answer(true, 1000));
        tracker.record("b", &answer(false, 1000));
        tracker.record("c", &answer(false, 1000));
        tracker.record("d", &answer(true, 1000));
        let summary = tracker.summary();
        assert_eq!(summary.correct_count, 2);
        assert!((summary.accuracy - 0.5).abs() < 1e-9);
        assert!((summary.avg_time - 1000.0).abs() < 1e-9);
        assert_eq!(summary.stars, 1);
    }

    #[test]
    fn test_streaks() {
        let mut tracker = RoundTracker::new(10, 3000);
        for _ in 0..3 {
            tracker.record("x", &answer(true, 1000));
        }
        tracker.record("x", &answer(false, 1000));
        tracker.record("x", &answer(true, 1000));
        assert_eq!(tracker.current_streak(), 1);
        assert_eq!(tracker.best_streak_in_round(), 3);
    }

    #[test]
    fn test_mastered_facts_collected() {
        let mut tracker = RoundTracker::new(10, 3000);
        let mut result = answer(true, 1000);
        result.is_mastered_event = true;
        tracker.record("3x7", &result);
        tracker.record("3x8", &answer(true, 1000));
        assert_eq!(tracker.mastered_facts(), &["3x7".to_string()]);
    }
}
