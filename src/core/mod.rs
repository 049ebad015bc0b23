//! Core types for Multiplay.
//!
//! This module contains the fact entity and its status state machine, the
//! derived question/answer values, per-profile settings, and round
//! bookkeeping.

pub mod fact;
pub mod round;
pub mod types;

pub use fact::{
    fact_id, generate_initial_facts, Fact, FactStatus, EASY_FACTORS, MAX_FACTOR_VALUE,
    TOTAL_FACTS,
};
pub use round::{RoundSummary, RoundTracker};
pub use types::{setting_keys, AnswerResult, MasteryOverview, Question, Settings};
