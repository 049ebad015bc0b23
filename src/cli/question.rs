//! Question command for Multiplay.
//!
//! Prints the next fact to practice. Promotions made while topping up the
//! active set are persisted.

use serde::Serialize;

use crate::cli::{exit_code_for, format_factors, render, OutputOptions};
use crate::core::Question;
use crate::engine::Engine;
use crate::error::{exit_codes, MultiplayError};
use crate::storage::FactStore;

/// Output format for the question command.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<Question>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub exit_code: i32,
}

impl QuestionOutput {
    pub fn success(question: Question) -> Self {
        Self {
            success: true,
            question: Some(question),
            error: None,
            exit_code: exit_codes::SUCCESS,
        }
    }

    pub fn failure(err: &MultiplayError) -> Self {
        Self {
            success: false,
            question: None,
            error: Some(err.to_string()),
            exit_code: exit_code_for(err),
        }
    }
}

/// The question command implementation.
pub struct QuestionCommand<S: FactStore> {
    engine: Engine<S>,
}

impl<S: FactStore> QuestionCommand<S> {
    pub fn new(engine: Engine<S>) -> Self {
        Self { engine }
    }

    pub fn run(&mut self) -> QuestionOutput {
        match self.engine.get_next_question() {
            Ok(question) => QuestionOutput::success(question),
            Err(err) => QuestionOutput::failure(&err),
        }
    }

    pub fn format_output(&self, output: &QuestionOutput, options: &OutputOptions) -> String {
        render(output, options, |output| match &output.question {
            Some(question) => format!(
                "{} = ?\n(answer with: multiplay answer {} <n> --time-ms <ms>)\n",
                format_factors(question.factors),
                question.id
            ),
            None => format!(
                "No question: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            ),
        })
    }
}
