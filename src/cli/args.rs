//! CLI argument definitions
//!
//! All Clap derive structs for `quickdraw` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::LogFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Two-player reaction duel, driven from the terminal.
#[derive(Parser, Debug)]
#[command(name = "quickdraw", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "QUICKDRAW_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(long, default_value = "human", global = true, env = "QUICKDRAW_LOG_FORMAT")]
    pub log_format: LogFormat,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play a match driven by commands on stdin.
    Play(PlayArgs),

    /// Validate duel configuration files.
    Validate(ValidateArgs),

    /// Display version information.
    Version(VersionArgs),
}

/// Arguments for `play`.
#[derive(Args, Debug)]
pub struct PlayArgs {
    /// Path to YAML duel configuration file.
    #[arg(short, long, env = "QUICKDRAW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Seed for the random source (overrides the config file).
    #[arg(long, env = "QUICKDRAW_SEED")]
    pub seed: Option<u64>,

    /// Write the JSONL event stream to a file instead of stdout.
    #[arg(long, env = "QUICKDRAW_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,

    /// Expose Prometheus metrics on this port.
    #[arg(long, env = "QUICKDRAW_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Enable strict validation (warnings become errors).
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_without_config() {
        let cli = Cli::try_parse_from(["quickdraw", "play"]).unwrap();
        match cli.command {
            Commands::Play(args) => {
                assert!(args.config.is_none());
                assert!(args.seed.is_none());
            }
            other => panic!("expected play, got {other:?}"),
        }
    }

    #[test]
    fn test_play_with_seed_and_config() {
        let cli = Cli::try_parse_from([
            "quickdraw",
            "play",
            "--config",
            "duel.yaml",
            "--seed",
            "42",
        ])
        .unwrap();
        if let Commands::Play(args) = cli.command {
            assert_eq!(args.seed, Some(42));
            assert_eq!(args.config, Some(PathBuf::from("duel.yaml")));
            return;
        }
        panic!("Expected PlayArgs");
    }

    #[test]
    fn test_validate_requires_files() {
        let result = Cli::try_parse_from(["quickdraw", "validate"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_json_strict() {
        let cli =
            Cli::try_parse_from(["quickdraw", "validate", "a.yaml", "b.yaml", "-f", "json", "--strict"])
                .unwrap();
        if let Commands::Validate(args) = cli.command {
            assert_eq!(args.files.len(), 2);
            assert_eq!(args.format, OutputFormat::Json);
            assert!(args.strict);
            return;
        }
        panic!("Expected ValidateArgs");
    }

    #[test]
    fn test_help_output() {
        let result = Cli::try_parse_from(["quickdraw", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_output() {
        let result = Cli::try_parse_from(["quickdraw", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "quickdraw",
            "version",
            "-vv",
            "--color",
            "never",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_color_choice() {
        let result = Cli::try_parse_from(["quickdraw", "version", "--color", "rainbow"]);
        assert!(result.is_err());
    }
}
