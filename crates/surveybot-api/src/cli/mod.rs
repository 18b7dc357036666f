//! CLI command definitions for the `surveybot` binary.

pub mod check;
pub mod questions;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Telegram survey bot that records Likert-scale answers to a spreadsheet.
#[derive(Parser)]
#[command(name = "surveybot", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a TOML config file (missing file = defaults).
    #[arg(short, long, global = true, env = "SURVEYBOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Also export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll Telegram and run surveys until Ctrl+C.
    Run {
        /// Exit instead of falling back to the local CSV when the
        /// spreadsheet cannot be opened.
        #[arg(long)]
        require_primary: bool,
    },

    /// Print the survey questions that would be asked.
    Questions,

    /// Validate configuration, the bot token and the record store.
    Check,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

impl Cli {
    /// Log filter implied by `-v` / `--quiet` (RUST_LOG overrides it).
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "info",
            1 => "info,surveybot=debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_require_primary() {
        let cli = Cli::try_parse_from(["surveybot", "-v", "run", "--require-primary"]).unwrap();
        assert!(matches!(cli.command, Commands::Run { require_primary: true }));
        assert_eq!(cli.log_filter(), "info,surveybot=debug");
    }

    #[test]
    fn quiet_lowers_log_level() {
        let cli = Cli::try_parse_from(["surveybot", "--quiet", "questions"]).unwrap();
        assert_eq!(cli.log_filter(), "error");
        assert!(matches!(cli.command, Commands::Questions));
    }
}
