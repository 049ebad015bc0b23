//! Drill engine.
//!
//! The engine owns one profile's fact table and settings, and is the only
//! thing that mutates them. Every public operation persists through the
//! [`FactStore`] before returning. Writes are per fact; a failed write is
//! returned to the caller and nothing is rolled back.

use std::collections::HashMap;

use chrono::Utc;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::core::{
    generate_initial_facts, setting_keys, AnswerResult, Fact, FactStatus, MasteryOverview,
    Question, Settings,
};
use crate::error::{FailOpen, MultiplayError, Result};
use crate::scheduling::{
    ActiveSetManager, ConfidenceModel, ProgressionController, QuestionSelector,
};
use crate::storage::FactStore;

/// Adaptive drill engine for a single profile.
///
/// Not meant to be shared: callers issue one operation at a time.
pub struct Engine<S: FactStore> {
    store: S,
    config: Config,
    profile_id: String,
    facts: Vec<Fact>,
    index: HashMap<String, usize>,
    settings: Settings,
    rng: ChaCha8Rng,
    answer_count: u64,
    confidence: ConfidenceModel,
    active_set: ActiveSetManager,
    selector: QuestionSelector,
    progression: ProgressionController,
}

impl<S: FactStore> Engine<S> {
    /// Open the engine for `profile_id`.
    ///
    /// A profile with no stored facts gets the full 169-fact table, all
    /// LOCKED, saved in one bulk write. Missing settings take the configured
    /// defaults.
    pub fn init(store: S, config: Config, profile_id: impl Into<String>) -> Result<Self> {
        let rng = match config.selection.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::seed_from_u64(rand::thread_rng().gen()),
        };

        let mut engine = Self {
            confidence: ConfidenceModel::new(config.confidence.clone(), config.timing.clone()),
            active_set: ActiveSetManager::new(&config.practice),
            selector: QuestionSelector::new(
                config.selection.clone(),
                config.practice.weak_pool_size,
                config.timing.slow_ms,
            ),
            progression: ProgressionController::new(&config.progression),
            settings: Settings::from_defaults(&config.defaults),
            store,
            config,
            profile_id: profile_id.into(),
            facts: Vec::new(),
            index: HashMap::new(),
            rng,
            answer_count: 0,
        };
        engine.load()?;
        Ok(engine)
    }

    fn load(&mut self) -> Result<()> {
        let mut facts = self.store.get_all_facts(&self.profile_id)?;
        if facts.is_empty() {
            facts = generate_initial_facts(self.config.practice.initial_confidence);
            self.store.save_facts(&self.profile_id, &facts)?;
            info!(profile = %self.profile_id, count = facts.len(), "Generated initial facts");
        }
        self.index = facts
            .iter()
            .enumerate()
            .map(|(i, fact)| (fact.id.clone(), i))
            .collect();
        self.facts = facts;

        let defaults = Settings::from_defaults(&self.config.defaults);
        self.settings = Settings {
            enabled_tables: self.read_setting(setting_keys::ENABLED_TABLES, defaults.enabled_tables)?,
            max_factor: self.read_setting(setting_keys::MAX_FACTOR, defaults.max_factor)?,
            round_length: self.read_setting(setting_keys::ROUND_LENGTH, defaults.round_length)?,
            best_streak: self.read_setting(setting_keys::BEST_STREAK, defaults.best_streak)?,
        };
        self.answer_count = self.read_setting(setting_keys::ANSWER_COUNT, 0)?;
        debug!(
            profile = %self.profile_id,
            settings = ?self.settings,
            answer_count = self.answer_count,
            "Loaded profile"
        );
        Ok(())
    }

    /// Read a stored setting. A value that no longer deserializes falls back
    /// with a warning; a store failure propagates.
    fn read_setting<T: DeserializeOwned>(&self, key: &str, fallback: T) -> Result<T> {
        match self.store.get_setting(&self.profile_id, key)? {
            Some(value) => Ok(serde_json::from_value(value)
                .map_err(MultiplayError::from)
                .fail_open_with(&format!("setting {}", key), fallback)),
            None => Ok(fallback),
        }
    }

    fn write_setting<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.store.set_setting(&self.profile_id, key, value)
    }

    /// Profile this engine is scoped to.
    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Answers submitted for this profile since it was created or reset.
    ///
    /// Persisted, so the progression cadence carries across engine instances.
    pub fn answer_count(&self) -> u64 {
        self.answer_count
    }

    /// Top up the active set and persist each promoted fact.
    ///
    /// Returns the number of facts promoted.
    pub fn ensure_active_set_size(&mut self) -> Result<usize> {
        let promoted = self.active_set.ensure_active_set_size(
            &mut self.facts,
            &self.settings.enabled_tables,
            self.settings.max_factor,
        )?;
        for &i in &promoted {
            self.store.update_fact(&self.profile_id, &self.facts[i])?;
        }
        if !promoted.is_empty() {
            debug!(count = promoted.len(), "Active set topped up");
        }
        Ok(promoted.len())
    }

    /// Next question under the current filters.
    pub fn get_next_question(&mut self) -> Result<Question> {
        self.ensure_active_set_size()?;
        self.selector.select_next_question(
            &self.facts,
            &self.settings.enabled_tables,
            self.settings.max_factor,
            &mut self.rng,
        )
    }

    /// Grade an answer, update the fact's record and persist it.
    ///
    /// Unknown ids fail with `FactNotFound` before anything changes. Every
    /// `check_interval` answers the table progression check runs.
    pub fn submit_answer(
        &mut self,
        fact_id: &str,
        answer: i64,
        time_taken_ms: u64,
    ) -> Result<AnswerResult> {
        let i = *self
            .index
            .get(fact_id)
            .ok_or_else(|| MultiplayError::fact_not_found(fact_id))?;
        let fact = &mut self.facts[i];

        let correct_answer = fact.product();
        let is_correct = answer == i64::from(correct_answer);
        let update = self
            .confidence
            .update(fact.confidence, is_correct, time_taken_ms);

        fact.confidence = update.new_confidence;
        fact.record_attempt(time_taken_ms, Utc::now());

        let mut is_mastered_event = false;
        if fact.status() == FactStatus::Active
            && update.new_confidence >= self.config.practice.mastered_threshold
        {
            fact.master()?;
            is_mastered_event = true;
            info!(fact_id = %fact.id, "Fact mastered");
        }

        self.store.update_fact(&self.profile_id, fact)?;
        debug!(
            fact_id,
            is_correct,
            time_taken_ms,
            tier = ?update.tier,
            confidence = update.new_confidence,
            "Answer recorded"
        );

        let answer_count = self.answer_count + 1;
        self.write_setting(setting_keys::ANSWER_COUNT, &answer_count)?;
        self.answer_count = answer_count;
        if self.answer_count % self.config.progression.check_interval.max(1) == 0 {
            self.check_progression()?;
        }

        Ok(AnswerResult {
            is_correct,
            correct_answer,
            time_taken: time_taken_ms,
            new_confidence: update.new_confidence,
            delta_confidence: update.delta,
            is_mastered_event,
        })
    }

    /// Refill the active set, then unlock the next table if mastery allows.
    fn check_progression(&mut self) -> Result<Option<u8>> {
        self.ensure_active_set_size()?;

        let Some(table) = self.progression.check_adaptive_table_progression(
            &self.facts,
            &self.settings.enabled_tables,
            self.settings.max_factor,
        ) else {
            return Ok(None);
        };

        let mut enabled_tables = self.settings.enabled_tables.clone();
        enabled_tables.push(table);
        self.write_setting(setting_keys::ENABLED_TABLES, &enabled_tables)?;
        self.settings.enabled_tables = enabled_tables;
        info!(table, profile = %self.profile_id, "Unlocked table");

        // Give the new table its active slots right away
        self.ensure_active_set_size()?;
        Ok(Some(table))
    }

    /// Run the progression check now, independent of the answer cadence.
    ///
    /// Returns the newly unlocked table, if any.
    pub fn check_and_apply_table_progression(&mut self) -> Result<Option<u8>> {
        self.check_progression()
    }

    /// Every fact of the profile, in factor order.
    pub fn get_all_facts(&self) -> &[Fact] {
        &self.facts
    }

    /// Look up one fact.
    pub fn fact(&self, fact_id: &str) -> Option<&Fact> {
        self.index.get(fact_id).map(|&i| &self.facts[i])
    }

    /// Status counts under the current filters.
    pub fn mastery_overview(&self) -> MasteryOverview {
        MasteryOverview::compute(
            &self.facts,
            &self.settings.enabled_tables,
            self.settings.max_factor,
        )
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn enabled_tables(&self) -> &[u8] {
        &self.settings.enabled_tables
    }

    pub fn set_enabled_tables(&mut self, tables: Vec<u8>) -> Result<()> {
        self.write_setting(setting_keys::ENABLED_TABLES, &tables)?;
        self.settings.enabled_tables = tables;
        Ok(())
    }

    pub fn max_factor(&self) -> u8 {
        self.settings.max_factor
    }

    pub fn set_max_factor(&mut self, value: u8) -> Result<()> {
        self.write_setting(setting_keys::MAX_FACTOR, &value)?;
        self.settings.max_factor = value;
        Ok(())
    }

    pub fn round_length(&self) -> u32 {
        self.settings.round_length
    }

    pub fn set_round_length(&mut self, value: u32) -> Result<()> {
        self.write_setting(setting_keys::ROUND_LENGTH, &value)?;
        self.settings.round_length = value;
        Ok(())
    }

    pub fn best_streak(&self) -> u32 {
        self.settings.best_streak
    }

    pub fn set_best_streak(&mut self, value: u32) -> Result<()> {
        self.write_setting(setting_keys::BEST_STREAK, &value)?;
        self.settings.best_streak = value;
        Ok(())
    }

    /// Erase the profile's facts and settings and start over.
    pub fn reset_progress(&mut self) -> Result<()> {
        self.store.clear_all(&self.profile_id)?;
        self.facts.clear();
        self.index.clear();
        self.settings = Settings::from_defaults(&self.config.defaults);
        self.answer_count = 0;
        info!(profile = %self.profile_id, "Progress reset");
        self.load()
    }
}
