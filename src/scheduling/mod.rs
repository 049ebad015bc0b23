//! Scheduling core: confidence updates, active set, question selection and
//! table progression. Everything here is pure computation over a fact
//! slice; persistence belongs to the engine.

pub mod active_set;
pub mod confidence;
pub mod progression;
pub mod selector;

pub use active_set::{promotion_order, ActiveSetManager};
pub use confidence::{ConfidenceModel, ConfidenceUpdate, ResponseTier};
pub use progression::ProgressionController;
pub use selector::{Pool, QuestionSelector};
