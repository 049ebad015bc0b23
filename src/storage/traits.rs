//! Storage traits for Multiplay.
//!
//! This module defines the `FactStore` trait, the narrow persistence
//! contract the engine consumes. Every call is scoped to a profile.

use std::sync::Arc;

use serde_json::Value;

use crate::core::Fact;
use crate::error::Result;

/// Build the profile-qualified record key, `"{profile}:{id}"`.
pub fn record_key(profile_id: &str, id: &str) -> String {
    format!("{}:{}", profile_id, id)
}

/// Split a qualified key back into `(profile, id)`.
///
/// Fact ids never contain `:`, so the first separator is the boundary.
pub fn split_record_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(':')
}

/// Trait for profile-scoped persistence backends.
///
/// Each method is a suspension point from the engine's point of view: the
/// engine's in-memory state is only consistent with the store once the call
/// returns. Failures are returned as-is to the engine's caller.
pub trait FactStore: Send + Sync {
    /// All facts stored for the profile, with unqualified ids.
    fn get_all_facts(&self, profile_id: &str) -> Result<Vec<Fact>>;

    /// Bulk upsert.
    fn save_facts(&self, profile_id: &str, facts: &[Fact]) -> Result<()>;

    /// Single upsert.
    fn update_fact(&self, profile_id: &str, fact: &Fact) -> Result<()>;

    /// Read a setting. Returns `Ok(None)` if it was never set.
    fn get_setting(&self, profile_id: &str, key: &str) -> Result<Option<Value>>;

    /// Write a setting.
    fn set_setting(&self, profile_id: &str, key: &str, value: Value) -> Result<()>;

    /// Remove every fact and setting of the profile. Other profiles are
    /// untouched.
    fn clear_all(&self, profile_id: &str) -> Result<()>;
}

/// Blanket implementation of FactStore for Arc-wrapped stores.
///
/// Lets tests keep a handle on the store they hand to an engine.
impl<T: FactStore + ?Sized> FactStore for Arc<T> {
    fn get_all_facts(&self, profile_id: &str) -> Result<Vec<Fact>> {
        (**self).get_all_facts(profile_id)
    }

    fn save_facts(&self, profile_id: &str, facts: &[Fact]) -> Result<()> {
        (**self).save_facts(profile_id, facts)
    }

    fn update_fact(&self, profile_id: &str, fact: &Fact) -> Result<()> {
        (**self).update_fact(profile_id, fact)
    }

    fn get_setting(&self, profile_id: &str, key: &str) -> Result<Option<Value>> {
        (**self).get_setting(profile_id, key)
    }

    fn set_setting(&self, profile_id: &str, key: &str, value: Value) -> Result<()> {
        (**self).set_setting(profile_id, key, value)
    }

    fn clear_all(&self, profile_id: &str) -> Result<()> {
        (**self).clear_all(profile_id)
    }
}

/// Test utilities for FactStore implementations.
#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::core::{generate_initial_facts, FactStatus};
    use serde_json::json;

    #[test]
    fn test_record_key() {
        assert_eq!(record_key("kid-1", "3x7"), "kid-1:3x7");
        assert_eq!(split_record_key("kid-1:3x7"), Some(("kid-1", "3x7")));
        assert_eq!(split_record_key("no-separator"), None);
    }

    /// Test helper to verify FactStore implementations.
    pub fn test_fact_store_contract<S: FactStore>(store: &S) {
        // Empty profile
        assert!(store.get_all_facts("alice").unwrap().is_empty());
        assert!(store.get_setting("alice", "maxFactor").unwrap().is_none());

        // Bulk save
        let facts = generate_initial_facts(0.0);
        store.save_facts("alice", &facts).unwrap();
        let loaded = store.get_all_facts("alice").unwrap();
        assert_eq!(loaded.len(), 169);
        assert!(loaded.iter().any(|f| f.id == "3x7"));

        // Single update replaces, does not duplicate
        let mut fact = facts.iter().find(|f| f.id == "3x7").unwrap().clone();
        fact.activate(0.0).unwrap();
        fact.confidence = 0.4;
        store.update_fact("alice", &fact).unwrap();
        let loaded = store.get_all_facts("alice").unwrap();
        assert_eq!(loaded.len(), 169);
        let stored = loaded.iter().find(|f| f.id == "3x7").unwrap();
        assert_eq!(stored.status(), FactStatus::Active);
        assert!((stored.confidence - 0.4).abs() < 1e-9);

        // Settings
        store
            .set_setting("alice", "enabledTables", json!([2, 4]))
            .unwrap();
        assert_eq!(
            store.get_setting("alice", "enabledTables").unwrap(),
            Some(json!([2, 4]))
        );
        store
            .set_setting("alice", "enabledTables", json!([2]))
            .unwrap();
        assert_eq!(
            store.get_setting("alice", "enabledTables").unwrap(),
            Some(json!([2]))
        );

        // Profiles are isolated
        assert!(store.get_all_facts("bob").unwrap().is_empty());
        assert!(store.get_setting("bob", "enabledTables").unwrap().is_none());
        store.save_facts("bob", &facts[..3]).unwrap();
        store.set_setting("bob", "maxFactor", json!(12)).unwrap();

        // Clearing one profile leaves the other
        store.clear_all("alice").unwrap();
        assert!(store.get_all_facts("alice").unwrap().is_empty());
        assert!(store.get_setting("alice", "enabledTables").unwrap().is_none());
        assert_eq!(store.get_all_facts("bob").unwrap().len(), 3);
        assert_eq!(
            store.get_setting("bob", "maxFactor").unwrap(),
            Some(json!(12))
        );

        // Clearing an empty profile succeeds
        store.clear_all("alice").unwrap();
    }
}
