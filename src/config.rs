//! Configuration loading for Multiplay.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.multiplay/config.toml`)
//! 3. User config (`~/.multiplay/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! Every tunable of the scheduling core lives here. All configuration is
//! optional; the defaults reproduce the standard drill behavior.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MultiplayError, Result};

/// Main configuration struct for Multiplay.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Active set and mastery configuration.
    pub practice: PracticeConfig,
    /// Response-time tier boundaries.
    pub timing: TimingConfig,
    /// Confidence deltas and tier caps.
    pub confidence: ConfidenceConfig,
    /// Three-pool question selection weights.
    pub selection: SelectionConfig,
    /// Automatic table unlocking.
    pub progression: ProgressionConfig,
    /// Settings applied to profiles with nothing stored.
    pub defaults: DefaultsConfig,
}

/// Active set and mastery configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PracticeConfig {
    /// Target number of eligible ACTIVE facts.
    pub active_set_size: usize,
    /// Confidence assigned to facts on generation and promotion.
    pub initial_confidence: f64,
    /// Confidence at which an ACTIVE fact becomes MASTERED.
    pub mastered_threshold: f64,
    /// Number of lowest-confidence active facts in the weak pool.
    pub weak_pool_size: usize,
}

impl PracticeConfig {
    /// Check if a threshold value is usable (finite, in `[0.0, 1.0]`).
    pub fn is_valid_threshold(value: f64) -> bool {
        value.is_finite() && (0.0..=1.0).contains(&value)
    }
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            active_set_size: 15,
            initial_confidence: 0.0,
            mastered_threshold: 0.95,
            weak_pool_size: 5,
        }
    }
}

/// Response-time tier boundaries in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// Answers faster than this are fluent recall.
    pub fast_ms: u64,
    /// Answers at or beyond this are slow. Also the question timeout hint.
    pub slow_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fast_ms: 3000,
            slow_ms: 6000,
        }
    }
}

/// Confidence deltas and tier caps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub boost_fast: f64,
    pub boost_normal: f64,
    pub boost_slow: f64,
    /// Applied on any incorrect answer. Negative.
    pub penalty_wrong: f64,
    /// Ceiling reachable through normal-speed answers.
    pub normal_cap: f64,
    /// Ceiling reachable through slow answers.
    pub slow_cap: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            boost_fast: 0.30,
            boost_normal: 0.20,
            boost_slow: 0.10,
            penalty_wrong: -0.40,
            normal_cap: 0.85,
            slow_cap: 0.70,
        }
    }
}

/// Question selection weights, in percent.
///
/// The three weights are expected to sum to 100. This is not enforced;
/// `Config::load` warns when it does not hold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectionConfig {
    pub weight_weak: u32,
    pub weight_mastered: u32,
    pub weight_learning: u32,
    /// Fixed RNG seed for reproducible sessions.
    pub seed: Option<u64>,
}

impl SelectionConfig {
    /// Sum of the three pool weights.
    pub fn total_weight(&self) -> u32 {
        self.weight_weak + self.weight_mastered + self.weight_learning
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            weight_weak: 50,
            weight_mastered: 30,
            weight_learning: 20,
            seed: None,
        }
    }
}

/// Automatic table unlocking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Fraction of unlocked eligible facts that must be MASTERED.
    pub auto_unlock_mastery_threshold: f64,
    /// Pedagogical order in which tables are introduced.
    pub table_unlock_order: Vec<u8>,
    /// Run the progression check every N answers.
    pub check_interval: u64,
}

/// Minimum valid check_interval (0 would divide by zero).
pub const MIN_CHECK_INTERVAL: u64 = 1;

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            auto_unlock_mastery_threshold: 0.65,
            table_unlock_order: vec![1, 2, 3, 5, 10, 4, 11, 9, 6, 7, 8, 12, 0],
            check_interval: 5,
        }
    }
}

/// Settings applied to a profile with nothing stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DefaultsConfig {
    pub enabled_tables: Vec<u8>,
    pub max_factor: u8,
    pub round_length: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            enabled_tables: vec![1, 2, 3, 5, 10],
            max_factor: 10,
            round_length: 10,
        }
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Project config (`.multiplay/config.toml` in cwd)
    /// 3. User config (`~/.multiplay/config.toml`)
    /// 4. Defaults
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config.warn_on_inconsistencies();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();
        config.warn_on_inconsistencies();

        config
    }

    fn load_user_config() -> Option<Config> {
        let home = multiplay_home()?;
        Self::load_optional(&home.join("config.toml"))
    }

    fn load_project_config(cwd: &Path) -> Option<Config> {
        Self::load_optional(&cwd.join(".multiplay").join("config.toml"))
    }

    /// Missing files are silent; unreadable or invalid ones are reported.
    fn load_optional(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!("ignoring config {}: {}", path.display(), err);
                None
            }
        }
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| MultiplayError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| MultiplayError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // MULTIPLAY_ACTIVE_SET_SIZE
        if let Ok(val) = env::var("MULTIPLAY_ACTIVE_SET_SIZE") {
            match val.parse::<usize>() {
                Ok(n) => self.practice.active_set_size = n,
                Err(_) => eprintln!(
                    "Warning: Invalid MULTIPLAY_ACTIVE_SET_SIZE value '{}'. \
                    Expected a non-negative integer. Using '{}'.",
                    val, self.practice.active_set_size
                ),
            }
        }

        // MULTIPLAY_MASTERED_THRESHOLD
        if let Ok(val) = env::var("MULTIPLAY_MASTERED_THRESHOLD") {
            match val.parse::<f64>() {
                Ok(n) if PracticeConfig::is_valid_threshold(n) => {
                    self.practice.mastered_threshold = n
                }
                Ok(n) => eprintln!(
                    "Warning: Invalid MULTIPLAY_MASTERED_THRESHOLD value '{}'. \
                    Must be in range [0.0, 1.0]. Using '{}'.",
                    n, self.practice.mastered_threshold
                ),
                Err(_) => eprintln!(
                    "Warning: Invalid MULTIPLAY_MASTERED_THRESHOLD value '{}'. \
                    Expected a decimal number. Using '{}'.",
                    val, self.practice.mastered_threshold
                ),
            }
        }

        // MULTIPLAY_FAST_MS
        if let Ok(val) = env::var("MULTIPLAY_FAST_MS") {
            match val.parse::<u64>() {
                Ok(n) => self.timing.fast_ms = n,
                Err(_) => eprintln!(
                    "Warning: Invalid MULTIPLAY_FAST_MS value '{}'. \
                    Expected milliseconds. Using '{}'.",
                    val, self.timing.fast_ms
                ),
            }
        }

        // MULTIPLAY_SLOW_MS
        if let Ok(val) = env::var("MULTIPLAY_SLOW_MS") {
            match val.parse::<u64>() {
                Ok(n) => self.timing.slow_ms = n,
                Err(_) => eprintln!(
                    "Warning: Invalid MULTIPLAY_SLOW_MS value '{}'. \
                    Expected milliseconds. Using '{}'.",
                    val, self.timing.slow_ms
                ),
            }
        }

        // MULTIPLAY_SEED
        if let Ok(val) = env::var("MULTIPLAY_SEED") {
            match val.parse::<u64>() {
                Ok(n) => self.selection.seed = Some(n),
                Err(_) => eprintln!(
                    "Warning: Invalid MULTIPLAY_SEED value '{}'. \
                    Expected a non-negative integer. Ignoring.",
                    val
                ),
            }
        }

        // MULTIPLAY_UNLOCK_THRESHOLD
        if let Ok(val) = env::var("MULTIPLAY_UNLOCK_THRESHOLD") {
            match val.parse::<f64>() {
                Ok(n) if PracticeConfig::is_valid_threshold(n) => {
                    self.progression.auto_unlock_mastery_threshold = n
                }
                _ => eprintln!(
                    "Warning: Invalid MULTIPLAY_UNLOCK_THRESHOLD value '{}'. \
                    Must be a decimal in range [0.0, 1.0]. Using '{}'.",
                    val, self.progression.auto_unlock_mastery_threshold
                ),
            }
        }
    }

    /// Log configurations that are accepted but will behave oddly.
    fn warn_on_inconsistencies(&mut self) {
        let total = self.selection.total_weight();
        if total != 100 {
            tracing::warn!(
                "selection weights sum to {} instead of 100; pool probabilities are skewed",
                total
            );
        }
        if self.timing.fast_ms > self.timing.slow_ms {
            tracing::warn!(
                "timing.fast_ms ({}) exceeds timing.slow_ms ({}); the normal tier is unreachable",
                self.timing.fast_ms,
                self.timing.slow_ms
            );
        }
        if self.progression.check_interval < MIN_CHECK_INTERVAL {
            tracing::warn!(
                "progression.check_interval must be >= {}; using {}",
                MIN_CHECK_INTERVAL,
                MIN_CHECK_INTERVAL
            );
            self.progression.check_interval = MIN_CHECK_INTERVAL;
        }
    }

    /// Merge another config into this one.
    ///
    /// The `other` config takes precedence field by field: every value of
    /// `other` that differs from the default replaces the value in `self`.
    ///
    /// # Limitation
    ///
    /// A layer cannot set a value back to its default to override a
    /// non-default value from a lower layer.
    fn merge(mut self, other: Config) -> Self {
        let d = PracticeConfig::default();
        if other.practice.active_set_size != d.active_set_size {
            self.practice.active_set_size = other.practice.active_set_size;
        }
        if other.practice.initial_confidence != d.initial_confidence {
            self.practice.initial_confidence = other.practice.initial_confidence;
        }
        if other.practice.mastered_threshold != d.mastered_threshold {
            self.practice.mastered_threshold = other.practice.mastered_threshold;
        }
        if other.practice.weak_pool_size != d.weak_pool_size {
            self.practice.weak_pool_size = other.practice.weak_pool_size;
        }

        let d = TimingConfig::default();
        if other.timing.fast_ms != d.fast_ms {
            self.timing.fast_ms = other.timing.fast_ms;
        }
        if other.timing.slow_ms != d.slow_ms {
            self.timing.slow_ms = other.timing.slow_ms;
        }

        let d = ConfidenceConfig::default();
        if other.confidence.boost_fast != d.boost_fast {
            self.confidence.boost_fast = other.confidence.boost_fast;
        }
        if other.confidence.boost_normal != d.boost_normal {
            self.confidence.boost_normal = other.confidence.boost_normal;
        }
        if other.confidence.boost_slow != d.boost_slow {
            self.confidence.boost_slow = other.confidence.boost_slow;
        }
        if other.confidence.penalty_wrong != d.penalty_wrong {
            self.confidence.penalty_wrong = other.confidence.penalty_wrong;
        }
        if other.confidence.normal_cap != d.normal_cap {
            self.confidence.normal_cap = other.confidence.normal_cap;
        }
        if other.confidence.slow_cap != d.slow_cap {
            self.confidence.slow_cap = other.confidence.slow_cap;
        }

        let d = SelectionConfig::default();
        if other.selection.weight_weak != d.weight_weak {
            self.selection.weight_weak = other.selection.weight_weak;
        }
        if other.selection.weight_mastered != d.weight_mastered {
            self.selection.weight_mastered = other.selection.weight_mastered;
        }
        if other.selection.weight_learning != d.weight_learning {
            self.selection.weight_learning = other.selection.weight_learning;
        }
        if other.selection.seed.is_some() {
            self.selection.seed = other.selection.seed;
        }

        let d = ProgressionConfig::default();
        if other.progression.auto_unlock_mastery_threshold != d.auto_unlock_mastery_threshold {
            self.progression.auto_unlock_mastery_threshold =
                other.progression.auto_unlock_mastery_threshold;
        }
        if other.progression.table_unlock_order != d.table_unlock_order {
            self.progression.table_unlock_order = other.progression.table_unlock_order;
        }
        if other.progression.check_interval != d.check_interval {
            self.progression.check_interval = other.progression.check_interval;
        }

        let d = DefaultsConfig::default();
        if other.defaults.enabled_tables != d.enabled_tables {
            self.defaults.enabled_tables = other.defaults.enabled_tables;
        }
        if other.defaults.max_factor != d.max_factor {
            self.defaults.max_factor = other.defaults.max_factor;
        }
        if other.defaults.round_length != d.round_length {
            self.defaults.round_length = other.defaults.round_length;
        }

        self
    }
}

/// Get the Multiplay home directory.
///
/// Checks `MULTIPLAY_HOME` first, then falls back to `~/.multiplay`.
/// An empty `MULTIPLAY_HOME` is ignored.
pub fn multiplay_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("MULTIPLAY_HOME") {
        if home.is_empty() {
            tracing::warn!("MULTIPLAY_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("MULTIPLAY_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    dirs::home_dir().map(|home| home.join(".multiplay"))
}

/// Get the default data directory for the file store.
///
/// Returns `<multiplay_home>/data/`.
pub fn data_dir() -> Option<PathBuf> {
    multiplay_home().map(|h| h.join("data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.practice.active_set_size, 15);
        assert_eq!(config.practice.initial_confidence, 0.0);
        assert!((config.practice.mastered_threshold - 0.95).abs() < f64::EPSILON);
        assert_eq!(config.practice.weak_pool_size, 5);

        assert_eq!(config.timing.fast_ms, 3000);
        assert_eq!(config.timing.slow_ms, 6000);

        assert!((config.confidence.boost_fast - 0.30).abs() < f64::EPSILON);
        assert!((config.confidence.penalty_wrong + 0.40).abs() < f64::EPSILON);
        assert!((config.confidence.normal_cap - 0.85).abs() < f64::EPSILON);
        assert!((config.confidence.slow_cap - 0.70).abs() < f64::EPSILON);

        assert_eq!(config.selection.total_weight(), 100);
        assert!(config.selection.seed.is_none());

        assert!((config.progression.auto_unlock_mastery_threshold - 0.65).abs() < f64::EPSILON);
        assert_eq!(
            config.progression.table_unlock_order,
            vec![1, 2, 3, 5, 10, 4, 11, 9, 6, 7, 8, 12, 0]
        );
        assert_eq!(config.progression.check_interval, 5);

        assert_eq!(config.defaults.enabled_tables, vec![1, 2, 3, 5, 10]);
        assert_eq!(config.defaults.max_factor, 10);
        assert_eq!(config.defaults.round_length, 10);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");

        let toml_content = r#"
[practice]
active_set_size = 20

[selection]
weight_weak = 60
weight_mastered = 20
seed = 7
"#;
        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();

        assert_eq!(config.practice.active_set_size, 20);
        assert_eq!(config.selection.weight_weak, 60);
        assert_eq!(config.selection.weight_mastered, 20);
        assert_eq!(config.selection.seed, Some(7));
        // Unspecified fields keep defaults
        assert_eq!(config.selection.weight_learning, 20);
        assert_eq!(config.timing.fast_ms, 3000);
    }

    #[test]
    fn test_load_from_file_missing() {
        let result = Config::load_from_file(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(MultiplayError::Storage { .. })));
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "this is not valid toml [[[").unwrap();

        let result = Config::load_from_file(&config_path);
        assert!(matches!(result, Err(MultiplayError::Config { .. })));
    }

    #[test]
    #[serial]
    fn test_project_config_precedence() {
        let dir = TempDir::new().unwrap();
        let project_dir = dir.path().join(".multiplay");
        fs::create_dir_all(&project_dir).unwrap();
        fs::write(
            project_dir.join("config.toml"),
            "[timing]\nfast_ms = 2500\n",
        )
        .unwrap();

        let config = Config::load_from_cwd(dir.path());

        assert_eq!(config.timing.fast_ms, 2500);
        assert_eq!(config.timing.slow_ms, 6000);
    }

    #[test]
    #[serial]
    fn test_env_var_precedence() {
        let dir = TempDir::new().unwrap();
        let project_dir = dir.path().join(".multiplay");
        fs::create_dir_all(&project_dir).unwrap();
        fs::write(
            project_dir.join("config.toml"),
            "[practice]\nactive_set_size = 8\n",
        )
        .unwrap();

        env::set_var("MULTIPLAY_ACTIVE_SET_SIZE", "12");
        let config = Config::load_from_cwd(dir.path());
        assert_eq!(config.practice.active_set_size, 12);
        env::remove_var("MULTIPLAY_ACTIVE_SET_SIZE");
    }

    #[test]
    #[serial]
    fn test_env_var_overrides() {
        env::set_var("MULTIPLAY_MASTERED_THRESHOLD", "0.9");
        env::set_var("MULTIPLAY_FAST_MS", "2000");
        env::set_var("MULTIPLAY_SLOW_MS", "5000");
        env::set_var("MULTIPLAY_SEED", "42");
        env::set_var("MULTIPLAY_UNLOCK_THRESHOLD", "0.5");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert!((config.practice.mastered_threshold - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.timing.fast_ms, 2000);
        assert_eq!(config.timing.slow_ms, 5000);
        assert_eq!(config.selection.seed, Some(42));
        assert!((config.progression.auto_unlock_mastery_threshold - 0.5).abs() < f64::EPSILON);

        env::remove_var("MULTIPLAY_MASTERED_THRESHOLD");
        env::remove_var("MULTIPLAY_FAST_MS");
        env::remove_var("MULTIPLAY_SLOW_MS");
        env::remove_var("MULTIPLAY_SEED");
        env::remove_var("MULTIPLAY_UNLOCK_THRESHOLD");
    }

    #[test]
    #[serial]
    fn test_env_var_invalid_values_ignored() {
        env::set_var("MULTIPLAY_MASTERED_THRESHOLD", "1.5");
        env::set_var("MULTIPLAY_FAST_MS", "fast");
        env::set_var("MULTIPLAY_SEED", "-1");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert!((config.practice.mastered_threshold - 0.95).abs() < f64::EPSILON);
        assert_eq!(config.timing.fast_ms, 3000);
        assert!(config.selection.seed.is_none());

        env::remove_var("MULTIPLAY_MASTERED_THRESHOLD");
        env::remove_var("MULTIPLAY_FAST_MS");
        env::remove_var("MULTIPLAY_SEED");
    }

    #[test]
    fn test_merge_field_by_field() {
        let base = Config {
            practice: PracticeConfig {
                active_set_size: 20,
                ..PracticeConfig::default()
            },
            ..Config::default()
        };
        let other = Config {
            practice: PracticeConfig {
                weak_pool_size: 3,
                ..PracticeConfig::default()
            },
            progression: ProgressionConfig {
                table_unlock_order: vec![2, 4, 8],
                ..ProgressionConfig::default()
            },
            ..Config::default()
        };

        let merged = base.merge(other);

        // Base's non-default survives the other layer's default
        assert_eq!(merged.practice.active_set_size, 20);
        assert_eq!(merged.practice.weak_pool_size, 3);
        assert_eq!(merged.progression.table_unlock_order, vec![2, 4, 8]);
    }

    #[test]
    fn test_inconsistent_check_interval_clamped() {
        let mut config = Config::default();
        config.progression.check_interval = 0;
        config.warn_on_inconsistencies();
        assert_eq!(config.progression.check_interval, MIN_CHECK_INTERVAL);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[defaults]\nmax_factor = 12\n").unwrap();
        assert_eq!(config.defaults.max_factor, 12);
        assert_eq!(config.defaults.enabled_tables, vec![1, 2, 3, 5, 10]);
        assert_eq!(config.practice.active_set_size, 15);
    }

    #[test]
    fn test_full_toml_roundtrip() {
        let mut config = Config::default();
        config.selection.seed = Some(99);
        config.defaults.enabled_tables = vec![2, 4];

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    #[serial]
    fn test_multiplay_home_with_env() {
        let dir = TempDir::new().unwrap();
        env::set_var("MULTIPLAY_HOME", dir.path().to_str().unwrap());

        assert_eq!(multiplay_home().unwrap(), dir.path());
        assert_eq!(data_dir().unwrap(), dir.path().join("data"));

        env::remove_var("MULTIPLAY_HOME");
    }

    #[test]
    #[serial]
    fn test_multiplay_home_empty_env() {
        env::set_var("MULTIPLAY_HOME", "");
        if let Some(home) = multiplay_home() {
            assert!(home.ends_with(".multiplay"));
        }
        env::remove_var("MULTIPLAY_HOME");
    }
}
