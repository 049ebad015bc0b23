//! Tiered fluency confidence model.
//!
//! Tiers by response time for correct answers:
//! - Fast (< fast_ms): +0.30, no cap
//! - Normal (fast_ms..slow_ms): +0.20, capped at 0.85
//! - Slow (>= slow_ms): +0.10, capped at 0.70
//!
//! Incorrect answers take -0.40. Only the fast tier can reach mastery.

use serde::{Deserialize, Serialize};

use crate::config::{ConfidenceConfig, TimingConfig};

/// Which branch of the model an answer fell into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseTier {
    Fast,
    Normal,
    Slow,
    Incorrect,
}

/// Result of one confidence update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceUpdate {
    pub new_confidence: f64,
    /// Actual change, `new_confidence - current`.
    pub delta: f64,
    pub tier: ResponseTier,
}

/// Converts (confidence, correctness, response time) into a new confidence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfidenceModel {
    confidence: ConfidenceConfig,
    timing: TimingConfig,
}

impl ConfidenceModel {
    pub fn new(confidence: ConfidenceConfig, timing: TimingConfig) -> Self {
        Self { confidence, timing }
    }

    /// Classify an answer.
    pub fn tier(&self, correct: bool, time_taken_ms: u64) -> ResponseTier {
        if !correct {
            ResponseTier::Incorrect
        } else if time_taken_ms < self.timing.fast_ms {
            ResponseTier::Fast
        } else if time_taken_ms < self.timing.slow_ms {
            ResponseTier::Normal
        } else {
            ResponseTier::Slow
        }
    }

    /// Apply one answer.
    ///
    /// The sum is clamped to `[0, 1]` first, then the tier cap applies. The
    /// returned delta is the real change, so it can be smaller than the
    /// nominal boost (or zero) when clamping or capping truncates it.
    pub fn update(&self, current: f64, correct: bool, time_taken_ms: u64) -> ConfidenceUpdate {
        let tier = self.tier(correct, time_taken_ms);
        let (nominal, cap) = match tier {
            ResponseTier::Fast => (self.confidence.boost_fast, None),
            ResponseTier::Normal => (self.confidence.boost_normal, Some(self.confidence.normal_cap)),
            ResponseTier::Slow => (self.confidence.boost_slow, Some(self.confidence.slow_cap)),
            ResponseTier::Incorrect => (self.confidence.penalty_wrong, None),
        };

        let mut new_confidence = (current + nominal).clamp(0.0, 1.0);
        if let Some(cap) = cap {
            if new_confidence > cap {
                new_confidence = cap;
            }
        }

        ConfidenceUpdate {
            new_confidence,
            delta: new_confidence - current,
            tier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn model() -> ConfidenceModel {
        ConfidenceModel::default()
    }

    #[test]
    fn test_tier_boundaries() {
        let m = model();
        assert_eq!(m.tier(true, 0), ResponseTier::Fast);
        assert_eq!(m.tier(true, 2999), ResponseTier::Fast);
        assert_eq!(m.tier(true, 3000), ResponseTier::Normal);
        assert_eq!(m.tier(true, 5999), ResponseTier::Normal);
        assert_eq!(m.tier(true, 6000), ResponseTier::Slow);
        assert_eq!(m.tier(false, 1000), ResponseTier::Incorrect);
    }

    #[test]
    fn test_fast_correct_no_cap() {
        let update = model().update(0.80, true, 1500);
        assert_eq!(update.tier, ResponseTier::Fast);
        assert!((update.new_confidence - 1.0).abs() < 1e-9);
        assert!((update.delta - 0.20).abs() < 1e-9);
    }

    #[test]
    fn test_normal_correct_capped() {
        let update = model().update(0.80, true, 4000);
        assert!((update.new_confidence - 0.85).abs() < 1e-9);
        assert!((update.delta - 0.05).abs() < 1e-9);

        let update = model().update(0.30, true, 4000);
        assert!((update.new_confidence - 0.50).abs() < 1e-9);
    }

    #[test]
    fn test_slow_correct_capped() {
        let update = model().update(0.0, true, 9000);
        assert!((update.new_confidence - 0.10).abs() < 1e-9);

        let update = model().update(0.65, true, 9000);
        assert!((update.new_confidence - 0.70).abs() < 1e-9);
    }

    #[test]
    fn test_slow_answer_above_cap_pulls_down() {
        // Cap applies even if the fact was already above it
        let update = model().update(0.90, true, 9000);
        assert!((update.new_confidence - 0.70).abs() < 1e-9);
        assert!(update.delta < 0.0);
    }

    #[test]
    fn test_incorrect_penalty_clamped_at_zero() {
        let update = model().update(0.25, false, 1000);
        assert_eq!(update.tier, ResponseTier::Incorrect);
        assert_eq!(update.new_confidence, 0.0);
        assert!((update.delta + 0.25).abs() < 1e-9);

        let update = model().update(0.0, false, 1000);
        assert_eq!(update.new_confidence, 0.0);
        assert_eq!(update.delta, 0.0);
    }

    #[test]
    fn test_repeated_fast_reaches_mastery() {
        let m = model();
        let boost = ConfidenceConfig::default().boost_fast;
        let max_calls = (0.95 / boost).ceil() as usize;

        let mut confidence = 0.0;
        let mut calls = 0;
        while confidence < 0.95 {
            confidence = m.update(confidence, true, 1000).new_confidence;
            calls += 1;
            assert!(calls <= max_calls, "took more than {} calls", max_calls);
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let m = ConfidenceModel::new(
            ConfidenceConfig::default(),
            TimingConfig {
                fast_ms: 1000,
                slow_ms: 2000,
            },
        );
        assert_eq!(m.tier(true, 1500), ResponseTier::Normal);
        assert_eq!(m.tier(true, 2500), ResponseTier::Slow);
    }

    proptest! {
        #[test]
        fn prop_confidence_stays_in_unit_interval(
            current in 0.0f64..=1.0,
            correct in any::<bool>(),
            time in 0u64..20_000,
        ) {
            let update = model().update(current, correct, time);
            prop_assert!((0.0..=1.0).contains(&update.new_confidence));
            prop_assert!((update.delta - (update.new_confidence - current)).abs() < 1e-12);
        }

        #[test]
        fn prop_capped_tiers_respect_caps(current in 0.0f64..=1.0, time in 3000u64..20_000) {
            let config = ConfidenceConfig::default();
            let update = model().update(current, true, time);
            let cap = if time < 6000 { config.normal_cap } else { config.slow_cap };
            prop_assert!(update.new_confidence <= cap + 1e-12);
        }

        #[test]
        fn prop_incorrect_never_raises(current in 0.0f64..=1.0, time in 0u64..20_000) {
            let update = model().update(current, false, time);
            prop_assert!(update.delta <= 0.0);
        }
    }
}
