//! Drill command for Multiplay.
//!
//! Runs one interactive round on a reader/writer pair: ask, time the reply,
//! grade, repeat. At the end of the round the table progression check runs
//! and a new best streak is saved.

use std::io::{BufRead, Write};
use std::time::Instant;

use serde::Serialize;

use crate::cli::{exit_code_for, format_factors, render, OutputOptions};
use crate::core::{RoundSummary, RoundTracker};
use crate::engine::Engine;
use crate::error::{exit_codes, MultiplayError, Result};
use crate::storage::FactStore;

/// Options for the drill command.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrillOptions {
    pub output: OutputOptions,
    /// Questions in this round; the profile's round length if unset.
    pub length: Option<u32>,
}

/// Output format for the drill command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RoundSummary>,
    pub mastered: Vec<String>,
    pub best_streak: u32,
    pub new_best_streak: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_table: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub exit_code: i32,
}

impl DrillOutput {
    pub fn failure(err: &MultiplayError) -> Self {
        Self {
            success: false,
            summary: None,
            mastered: Vec::new(),
            best_streak: 0,
            new_best_streak: false,
            unlocked_table: None,
            error: Some(err.to_string()),
            exit_code: exit_code_for(err),
        }
    }
}

/// The drill command implementation.
pub struct DrillCommand<S: FactStore> {
    engine: Engine<S>,
}

impl<S: FactStore> DrillCommand<S> {
    pub fn new(engine: Engine<S>) -> Self {
        Self { engine }
    }

    /// Run a round reading answers from `input` and writing prompts to
    /// `output`. End of input finishes the round early.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
        options: &DrillOptions,
    ) -> DrillOutput {
        match self.play(input, output, options) {
            Ok(out) => out,
            Err(err) => DrillOutput::failure(&err),
        }
    }

    fn play<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
        options: &DrillOptions,
    ) -> Result<DrillOutput> {
        let length = options.length.unwrap_or_else(|| self.engine.round_length());
        let fast_ms = self.engine.config().timing.fast_ms;
        let mut tracker = RoundTracker::new(length, fast_ms);
        let interactive = !options.output.quiet && !options.output.json;

        while !tracker.is_complete() {
            let question = self.engine.get_next_question()?;
            if interactive {
                write!(
                    output,
                    "[{}/{}] {} = ",
                    tracker.answered() + 1,
                    length,
                    format_factors(question.factors)
                )?;
                output.flush()?;
            }

            let started = Instant::now();
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let elapsed_ms = started.elapsed().as_millis() as u64;

            // Anything that is not a number counts as a wrong answer
            let answer = line.trim().parse::<i64>().unwrap_or(-1);
            let result = self.engine.submit_answer(&question.id, answer, elapsed_ms)?;
            tracker.record(&question.id, &result);

            if interactive {
                if result.is_correct {
                    match tracker.current_streak() {
                        streak if streak >= 3 => writeln!(output, "correct ({} in a row)", streak)?,
                        _ => writeln!(output, "correct")?,
                    }
                } else {
                    writeln!(output, "no, it's {}", result.correct_answer)?;
                }
                if result.is_mastered_event {
                    writeln!(output, "mastered {}!", question.id)?;
                }
            }
        }

        let unlocked_table = self.engine.check_and_apply_table_progression()?;

        let round_best = tracker.best_streak_in_round();
        let new_best_streak = round_best > self.engine.best_streak();
        if new_best_streak {
            self.engine.set_best_streak(round_best)?;
        }

        Ok(DrillOutput {
            success: true,
            summary: Some(tracker.summary()),
            mastered: tracker.mastered_facts().to_vec(),
            best_streak: self.engine.best_streak(),
            new_best_streak,
            unlocked_table,
            error: None,
            exit_code: exit_codes::SUCCESS,
        })
    }

    pub fn format_output(&self, output: &DrillOutput, options: &DrillOptions) -> String {
        render(output, &options.output, Self::format_human_readable)
    }

    fn format_human_readable(output: &DrillOutput) -> String {
        let Some(summary) = &output.summary else {
            return format!(
                "Drill failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        };

        let mut out = format!(
            "\nRound over: {}/{} correct ({:.0}%), avg {:.1}s {}\n",
            summary.correct_count,
            summary.total_questions,
            summary.accuracy * 100.0,
            summary.avg_time / 1000.0,
            "*".repeat(summary.stars as usize)
        );
        if !output.mastered.is_empty() {
            out.push_str(&format!("Mastered: {}\n", output.mastered.join(", ")));
        }
        if output.new_best_streak {
            out.push_str(&format!("New best streak: {}\n", output.best_streak));
        }
        if let Some(table) = output.unlocked_table {
            out.push_str(&format!("New table unlocked: {}\n", table));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::MemoryFactStore;
    use std::io::Cursor;
    use std::sync::Arc;

    fn engine(store: Arc<MemoryFactStore>) -> Engine<Arc<MemoryFactStore>> {
        let mut config = Config::default();
        config.selection.seed = Some(9);
        Engine::init(store, config, "kid").unwrap()
    }

    /// Tables [0] with max factor 0 leave 0x0 as the only question.
    fn zero_only_store() -> Arc<MemoryFactStore> {
        let store = Arc::new(MemoryFactStore::new());
        store
            .set_setting("kid", "enabledTables", serde_json::json!([0]))
            .unwrap();
        store
            .set_setting("kid", "maxFactor", serde_json::json!(0))
            .unwrap();
        store
    }

    #[test]
    fn test_round_stops_at_length() {
        let store = Arc::new(MemoryFactStore::new());
        let mut cmd = DrillCommand::new(engine(store));
        let mut input = Cursor::new("0\n".repeat(10));
        let mut screen = Vec::new();
        let options = DrillOptions {
            length: Some(3),
            ..DrillOptions::default()
        };

        let output = cmd.run(&mut input, &mut screen, &options);
        assert!(output.success);
        let summary = output.summary.as_ref().unwrap();
        assert_eq!(summary.total_questions, 3);
        assert_eq!(cmd.engine.answer_count(), 3);

        let screen = String::from_utf8(screen).unwrap();
        assert_eq!(screen.matches(" = ").count(), 3);
        assert!(screen.starts_with("[1/3] "));
        assert!(screen.contains("[3/3] "));
    }

    #[test]
    fn test_end_of_input_ends_round() {
        let store = Arc::new(MemoryFactStore::new());
        let mut cmd = DrillCommand::new(engine(store));
        let mut input = Cursor::new("1\n");
        let mut screen = Vec::new();

        let output = cmd.run(&mut input, &mut screen, &DrillOptions::default());
        assert!(output.success);
        assert_eq!(output.summary.unwrap().total_questions, 1);
    }

    #[test]
    fn test_mastery_and_best_streak_saved() {
        let store = zero_only_store();
        let mut cmd = DrillCommand::new(engine(Arc::clone(&store)));
        let mut input = Cursor::new("0\n0\n0\n0\n");
        let mut screen = Vec::new();
        let options = DrillOptions {
            length: Some(4),
            ..DrillOptions::default()
        };

        let output = cmd.run(&mut input, &mut screen, &options);
        assert!(output.success);
        assert_eq!(output.summary.as_ref().unwrap().correct_count, 4);
        assert_eq!(output.mastered, vec!["0x0".to_string()]);
        assert!(output.new_best_streak);
        assert_eq!(output.best_streak, 4);
        assert_eq!(
            store.get_setting("kid", "bestStreak").unwrap(),
            Some(serde_json::json!(4))
        );

        let screen = String::from_utf8(screen).unwrap();
        assert!(screen.contains("correct (3 in a row)"));
        assert!(screen.contains("correct (4 in a row)"));

        let human = cmd.format_output(&output, &options);
        assert!(human.contains("Mastered: 0x0"));
        assert!(human.contains("New best streak: 4"));
    }

    #[test]
    fn test_non_numeric_answer_is_wrong() {
        let store = Arc::new(MemoryFactStore::new());
        let mut cmd = DrillCommand::new(engine(store));
        let mut input = Cursor::new("seven\n");
        let mut screen = Vec::new();
        let options = DrillOptions {
            length: Some(1),
            ..DrillOptions::default()
        };

        let output = cmd.run(&mut input, &mut screen, &options);
        let summary = output.summary.unwrap();
        assert_eq!(summary.correct_count, 0);
        assert!(String::from_utf8(screen).unwrap().contains("no, it's"));
    }

    #[test]
    fn test_no_tables_fails() {
        let store = Arc::new(MemoryFactStore::new());
        let mut eng = engine(store);
        eng.set_enabled_tables(Vec::new()).unwrap();
        let mut cmd = DrillCommand::new(eng);
        let mut input = Cursor::new("1\n");
        let mut screen = Vec::new();

        let output = cmd.run(&mut input, &mut screen, &DrillOptions::default());
        assert!(!output.success);
        assert_eq!(output.exit_code, exit_codes::NO_ELIGIBLE_FACTS);
    }

    #[test]
    fn test_json_mode_writes_no_prompts() {
        let store = Arc::new(MemoryFactStore::new());
        let mut cmd = DrillCommand::new(engine(store));
        let mut input = Cursor::new("1\n2\n");
        let mut screen = Vec::new();
        let options = DrillOptions {
            output: OutputOptions {
                json: true,
                quiet: false,
            },
            length: Some(2),
        };

        let output = cmd.run(&mut input, &mut screen, &options);
        assert!(screen.is_empty());
        let json = cmd.format_output(&output, &options);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["summary"]["totalQuestions"], 2);
    }
}
