//! Multiplay - adaptive multiplication-fact drills
//!
//! Multiplay schedules practice of the 169 facts `0×0` through `12×12`. A
//! tiered confidence model rewards fast correct recall, a small active set is
//! topped up easiest-first, questions are drawn from weak, mastered and
//! learning pools, and new tables unlock as mastery grows.

pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod scheduling;
pub mod storage;

pub use config::Config;
pub use core::{
    AnswerResult, Fact, FactStatus, MasteryOverview, Question, RoundSummary, RoundTracker,
    Settings,
};
pub use engine::Engine;
pub use error::{MultiplayError, Result};
pub use scheduling::{ActiveSetManager, ConfidenceModel, ProgressionController, QuestionSelector};
pub use storage::{FactStore, FileFactStore, MemoryFactStore};

// CLI commands
pub use cli::{
    AnswerCommand, DrillCommand, ProgressCommand, QuestionCommand, ResetCommand, SettingsCommand,
    StatusCommand,
};
