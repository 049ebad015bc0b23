//! In-memory fact storage.
//!
//! Thread-safe implementation of the FactStore trait keyed by
//! profile-qualified ids. Used by tests and by embedders that persist
//! elsewhere.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

use crate::core::Fact;
use crate::error::Result;
use crate::storage::traits::{record_key, split_record_key};
use crate::storage::FactStore;

/// In-memory fact store.
///
/// Records are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryFactStore {
    /// Facts keyed by `"{profile}:{factId}"`, stored with unqualified ids.
    facts: RwLock<HashMap<String, Fact>>,
    /// Settings keyed by `"{profile}:{settingKey}"`.
    settings: RwLock<HashMap<String, Value>>,
    /// Number of single-fact upserts, for write accounting in tests.
    updates: RwLock<usize>,
}

impl MemoryFactStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of fact records across all profiles.
    pub fn len(&self) -> usize {
        self.facts.read().unwrap().len()
    }

    /// Check if the store holds no facts.
    pub fn is_empty(&self) -> bool {
        self.facts.read().unwrap().is_empty()
    }

    /// Number of `update_fact` calls served so far.
    pub fn update_count(&self) -> usize {
        *self.updates.read().unwrap()
    }

    fn in_profile(key: &str, profile_id: &str) -> bool {
        split_record_key(key).is_some_and(|(profile, _)| profile == profile_id)
    }
}

impl FactStore for MemoryFactStore {
    fn get_all_facts(&self, profile_id: &str) -> Result<Vec<Fact>> {
        let facts = self.facts.read().unwrap();
        let mut result: Vec<Fact> = facts
            .iter()
            .filter(|(key, _)| Self::in_profile(key, profile_id))
            .map(|(_, fact)| fact.clone())
            .collect();
        // HashMap order is arbitrary; keep loads deterministic
        result.sort_by_key(|f| f.factors);
        Ok(result)
    }

    fn save_facts(&self, profile_id: &str, facts: &[Fact]) -> Result<()> {
        let mut stored = self.facts.write().unwrap();
        for fact in facts {
            stored.insert(record_key(profile_id, &fact.id), fact.clone());
        }
        Ok(())
    }

    fn update_fact(&self, profile_id: &str, fact: &Fact) -> Result<()> {
        self.facts
            .write()
            .unwrap()
            .insert(record_key(profile_id, &fact.id), fact.clone());
        *self.updates.write().unwrap() += 1;
        Ok(())
    }

    fn get_setting(&self, profile_id: &str, key: &str) -> Result<Option<Value>> {
        let settings = self.settings.read().unwrap();
        Ok(settings.get(&record_key(profile_id, key)).cloned())
    }

    fn set_setting(&self, profile_id: &str, key: &str, value: Value) -> Result<()> {
        self.settings
            .write()
            .unwrap()
            .insert(record_key(profile_id, key), value);
        Ok(())
    }

    fn clear_all(&self, profile_id: &str) -> Result<()> {
        self.facts
            .write()
            .unwrap()
            .retain(|key, _| !Self::in_profile(key, profile_id));
        self.settings
            .write()
            .unwrap()
            .retain(|key, _| !Self::in_profile(key, profile_id));
        Ok(())
    }
}
