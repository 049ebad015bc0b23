//! Multiplay - adaptive multiplication-fact drills
//!
//! CLI entry point.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use multiplay::cli::answer::AnswerCommand;
use multiplay::cli::drill::{DrillCommand, DrillOptions};
use multiplay::cli::progress::ProgressCommand;
use multiplay::cli::question::QuestionCommand;
use multiplay::cli::reset::ResetCommand;
use multiplay::cli::settings::{SettingsCommand, SettingsUpdate};
use multiplay::cli::status::{StatusCommand, StatusOptions};
use multiplay::cli::{exit_code_for, OutputOptions};
use multiplay::config::Config;
use multiplay::engine::Engine;
use multiplay::error::{exit_codes, Result};
use multiplay::storage::FileFactStore;

// =============================================================================
// CLI Definition
// =============================================================================

/// Multiplay - adaptive multiplication-fact drills
#[derive(Parser)]
#[command(name = "multiplay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Profile to practice as
    #[arg(long, short, global = true, default_value = "default")]
    profile: String,

    /// Data directory (default: $MULTIPLAY_HOME/data or ~/.multiplay/data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the next question
    Question {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Submit an answer for a fact
    Answer {
        /// Fact id, e.g. 3x7
        fact_id: String,
        /// The answer given
        #[arg(allow_negative_numbers = true)]
        answer: i64,
        /// Response time in milliseconds
        #[arg(long)]
        time_ms: u64,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Play an interactive round
    Drill {
        /// Questions in the round (default: profile round length)
        #[arg(long, short)]
        length: Option<u32>,
        /// Output the summary as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show settings and mastery counts
    Status {
        /// Include the 13 × 13 status grid
        #[arg(long, short)]
        grid: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Read or change profile settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
        /// Output as JSON
        #[arg(long, short, global = true)]
        json: bool,
        /// Suppress output
        #[arg(long, short, global = true)]
        quiet: bool,
    },

    /// Unlock the next table if mastery allows
    Progress {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Erase all progress for the profile
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show current settings
    Get,
    /// Change one or more settings
    Set {
        /// Enabled tables, comma separated
        #[arg(long, value_delimiter = ',', num_args = 0..)]
        tables: Option<Vec<u8>>,
        /// Largest factor asked
        #[arg(long)]
        max_factor: Option<u8>,
        /// Questions per drill round
        #[arg(long)]
        round_length: Option<u32>,
        /// Best streak on record
        #[arg(long)]
        best_streak: Option<u32>,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("multiplay error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Log to stderr, filtered by `MULTIPLAY_LOG` (default: warn).
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("MULTIPLAY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Run the CLI and return the exit code.
fn run() -> std::result::Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match open_store(cli.data_dir).and_then(|store| dispatch(cli.command, &cli.profile, store)) {
        Ok(code) => Ok(code),
        Err(err) => {
            eprintln!("multiplay error: {}", err);
            if err.is_configuration_error() {
                eprintln!("check your config files or `multiplay settings`");
            }
            Ok(to_exit_code(exit_code_for(&err)))
        }
    }
}

/// Run one command against the profile's store.
///
/// Only commands that need the fact table open an engine; `reset` works on
/// the store alone so it can clear a profile that no longer loads.
fn dispatch(command: Commands, profile: &str, store: FileFactStore) -> Result<ExitCode> {
    let open = || Engine::init(store.clone(), Config::load(), profile);

    match command {
        Commands::Question { json, quiet } => {
            let mut cmd = QuestionCommand::new(open()?);
            let output = cmd.run();
            print_output(&cmd.format_output(&output, &OutputOptions { json, quiet }));
            Ok(to_exit_code(output.exit_code))
        }
        Commands::Answer {
            fact_id,
            answer,
            time_ms,
            json,
            quiet,
        } => {
            let mut cmd = AnswerCommand::new(open()?);
            let output = cmd.run(&fact_id, answer, time_ms);
            print_output(&cmd.format_output(&output, &OutputOptions { json, quiet }));
            Ok(to_exit_code(output.exit_code))
        }
        Commands::Drill {
            length,
            json,
            quiet,
        } => {
            let options = DrillOptions {
                output: OutputOptions { json, quiet },
                length,
            };
            let mut cmd = DrillCommand::new(open()?);
            let output = cmd.run(&mut io::stdin().lock(), &mut io::stdout(), &options);
            print_output(&cmd.format_output(&output, &options));
            Ok(to_exit_code(output.exit_code))
        }
        Commands::Status { grid, json, quiet } => {
            let options = StatusOptions {
                output: OutputOptions { json, quiet },
                grid,
            };
            let cmd = StatusCommand::new(open()?);
            let output = cmd.run(&options);
            print_output(&cmd.format_output(&output, &options));
            Ok(to_exit_code(exit_codes::SUCCESS))
        }
        Commands::Settings {
            action,
            json,
            quiet,
        } => {
            let mut cmd = SettingsCommand::new(open()?);
            let output = match action {
                SettingsAction::Get => cmd.get(),
                SettingsAction::Set {
                    tables,
                    max_factor,
                    round_length,
                    best_streak,
                } => cmd.set(&SettingsUpdate {
                    enabled_tables: tables,
                    max_factor,
                    round_length,
                    best_streak,
                }),
            };
            print_output(&cmd.format_output(&output, &OutputOptions { json, quiet }));
            Ok(to_exit_code(output.exit_code))
        }
        Commands::Progress { json, quiet } => {
            let mut cmd = ProgressCommand::new(open()?);
            let output = cmd.run();
            print_output(&cmd.format_output(&output, &OutputOptions { json, quiet }));
            Ok(to_exit_code(output.exit_code))
        }
        Commands::Reset { yes, json, quiet } => {
            let cmd = ResetCommand::new(store.clone(), profile);
            let output = cmd.run(yes);
            print_output(&cmd.format_output(&output, &OutputOptions { json, quiet }));
            Ok(to_exit_code(output.exit_code))
        }
    }
}

/// Open the file store, in `data_dir` or the default data directory.
fn open_store(data_dir: Option<PathBuf>) -> Result<FileFactStore> {
    match data_dir {
        Some(dir) => FileFactStore::with_dir(dir),
        None => FileFactStore::new(),
    }
}

fn print_output(formatted: &str) {
    if !formatted.is_empty() {
        print!("{}", formatted);
    }
}

/// Convert a command exit code to a process exit code.
fn to_exit_code(code: i32) -> ExitCode {
    ExitCode::from(code as u8)
}

// =============================================================================
// Tests
// =============================================================================
