//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap.
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand, ValueEnum};
use forge_shared::TaskType;
use std::path::PathBuf;

/// StudyForge CLI
#[derive(Parser, Debug)]
#[command(name = "forgectl")]
#[command(about = "StudyForge - kids AI course progress tracker", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Keep progress in memory for this run only
    #[arg(long, global = true)]
    pub memory: bool,

    /// Output JSON only
    #[arg(long, global = true)]
    pub json: bool,

    /// Language for course titles
    #[arg(long, global = true, value_enum, default_value_t = Lang::Zh)]
    pub lang: Lang,

    #[command(subcommand)]
    pub command: Commands,
}

/// UI language of the course content
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Lang {
    Zh,
    Ja,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show stars, level, streak and badges
    Status,

    /// List lessons and their status
    Lessons {
        /// Only this unit (e.g. unit-2)
        #[arg(long)]
        unit: Option<String>,
    },

    /// Start a lesson
    Start {
        /// Lesson id (e.g. lesson-3)
        lesson: String,
    },

    /// Complete a lesson and collect its rewards
    Complete {
        /// Lesson id (e.g. lesson-3)
        lesson: String,

        /// Stars earned (defaults to the lesson's reward)
        #[arg(long)]
        stars: Option<u32>,

        /// Time spent in seconds
        #[arg(long, default_value_t = 0)]
        time: u64,
    },

    /// Show today's tasks
    Tasks,

    /// Record an exercise or review
    Activity {
        /// exercise or review
        #[arg(value_parser = parse_activity)]
        kind: TaskType,
    },

    /// Record a finished quiz
    Quiz {
        /// Lesson id of the quiz
        lesson: String,

        /// Questions answered correctly
        #[arg(long)]
        correct: u32,

        /// Questions asked
        #[arg(long)]
        total: u32,
    },

    /// Show all badges and which ones are earned
    Badges,

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Print the user config file path
    Path,

    /// Choose where progress is stored (memory, sqlite)
    SetBackend { backend: String },

    /// Use a different database file
    SetDbPath { path: PathBuf },
}

/// Lessons and quizzes have their own commands
fn parse_activity(s: &str) -> Result<TaskType, String> {
    match s.parse::<TaskType>()? {
        kind @ (TaskType::Exercise | TaskType::Review) => Ok(kind),
        other => Err(format!(
            "'{}' is recorded by its own command. Valid values: exercise, review",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_complete_defaults() {
        let cli = Cli::try_parse_from(["forgectl", "complete", "lesson-2"]).unwrap();
        match cli.command {
            Commands::Complete { lesson, stars, time } => {
                assert_eq!(lesson, "lesson-2");
                assert_eq!(stars, None);
                assert_eq!(time, 0);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(!cli.json);
        assert_eq!(cli.lang, Lang::Zh);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["forgectl", "status", "--json", "--lang", "ja", "--memory"])
            .unwrap();
        assert!(cli.json);
        assert!(cli.memory);
        assert_eq!(cli.lang, Lang::Ja);
    }

    #[test]
    fn test_activity_kinds() {
        let cli = Cli::try_parse_from(["forgectl", "activity", "review"]).unwrap();
        assert!(matches!(cli.command, Commands::Activity { kind: TaskType::Review }));

        assert!(Cli::try_parse_from(["forgectl", "activity", "quiz"]).is_err());
        assert!(Cli::try_parse_from(["forgectl", "activity", "nap"]).is_err());
    }

    #[test]
    fn test_quiz_requires_counts() {
        assert!(Cli::try_parse_from(["forgectl", "quiz", "lesson-6"]).is_err());
        let cli =
            Cli::try_parse_from(["forgectl", "quiz", "lesson-6", "--correct", "4", "--total", "5"])
                .unwrap();
        assert!(matches!(cli.command, Commands::Quiz { correct: 4, total: 5, .. }));
    }
}
