//! Answer command for Multiplay.
//!
//! Grades one answer against a fact id and reports the confidence change.

use serde::Serialize;

use crate::cli::{exit_code_for, render, OutputOptions};
use crate::core::AnswerResult;
use crate::engine::Engine;
use crate::error::{exit_codes, MultiplayError};
use crate::storage::FactStore;

/// Output format for the answer command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutput {
    pub success: bool,
    pub fact_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnswerResult>,
    /// Table unlocked by the progression check this answer triggered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_table: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub exit_code: i32,
}

impl AnswerOutput {
    pub fn success(fact_id: &str, result: AnswerResult, unlocked_table: Option<u8>) -> Self {
        Self {
            success: true,
            fact_id: fact_id.to_string(),
            result: Some(result),
            unlocked_table,
            error: None,
            exit_code: exit_codes::SUCCESS,
        }
    }

    pub fn failure(fact_id: &str, err: &MultiplayError) -> Self {
        Self {
            success: false,
            fact_id: fact_id.to_string(),
            result: None,
            unlocked_table: None,
            error: Some(err.to_string()),
            exit_code: exit_code_for(err),
        }
    }
}

/// The answer command implementation.
pub struct AnswerCommand<S: FactStore> {
    engine: Engine<S>,
}

impl<S: FactStore> AnswerCommand<S> {
    pub fn new(engine: Engine<S>) -> Self {
        Self { engine }
    }

    /// Submit `answer` for `fact_id`, answered in `time_taken_ms`.
    pub fn run(&mut self, fact_id: &str, answer: i64, time_taken_ms: u64) -> AnswerOutput {
        let tables_before = self.engine.enabled_tables().len();
        match self.engine.submit_answer(fact_id, answer, time_taken_ms) {
            Ok(result) => {
                let unlocked = if self.engine.enabled_tables().len() > tables_before {
                    self.engine.enabled_tables().last().copied()
                } else {
                    None
                };
                AnswerOutput::success(fact_id, result, unlocked)
            }
            Err(err) => AnswerOutput::failure(fact_id, &err),
        }
    }

    pub fn format_output(&self, output: &AnswerOutput, options: &OutputOptions) -> String {
        render(output, options, Self::format_human_readable)
    }

    fn format_human_readable(output: &AnswerOutput) -> String {
        let Some(result) = &output.result else {
            return format!(
                "Answer failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        };

        let mut out = if result.is_correct {
            format!("Correct! {} = {}\n", output.fact_id, result.correct_answer)
        } else {
            format!(
                "Not quite. {} = {}\n",
                output.fact_id, result.correct_answer
            )
        };
        out.push_str(&format!(
            "Confidence: {:.2} ({:+.2})\n",
            result.new_confidence, result.delta_confidence
        ));
        if result.is_mastered_event {
            out.push_str(&format!("Mastered {}!\n", output.fact_id));
        }
        if let Some(table) = output.unlocked_table {
            out.push_str(&format!("New table unlocked: {}\n", table));
        }
        out
    }
}
