//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::deps::StalenessStrategy;
use crate::settings::DEFAULT_REPO_PATH;

/// Bootstrap a local development network
///
/// Installs toolchains, clones the network, RPC server, validator CLI and
/// validator GUI repositories, patches the network config for local use and
/// starts all four subsystems.
#[derive(Parser, Debug)]
#[command(
    name = "bootstrap",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Bootstrap a local multi-process development network",
    args_conflicts_with_subcommands = true,
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  bootstrap                             \x1b[90m# Clone everything and start\x1b[0m\n   \
                  bootstrap ~/src/shardeum              \x1b[90m# Reuse an existing checkout\x1b[0m\n   \
                  bootstrap ~/src/shardeum true         \x1b[90m# Reuse it and reinstall dependencies\x1b[0m\n   \
                  bootstrap --dry-run                   \x1b[90m# Show what would happen\x1b[0m\n   \
                  bootstrap status                      \x1b[90m# Show launched processes\x1b[0m\n   \
                  bootstrap stop                        \x1b[90m# Stop everything that was launched\x1b[0m\n"
)]
pub struct Cli {
    /// Directory for clones, logs and the process record
    #[arg(long, global = true, env = "BOOTSTRAP_BASE_DIR", value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Settings file (YAML); defaults to <base-dir>/bootstrap.yaml when present
    #[arg(long, global = true, env = "BOOTSTRAP_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Stream command output instead of showing spinners
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub run: RunArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Arguments for bootstrapping the environment (the default action)
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Existing network checkout; cloned into the base directory when missing
    #[arg(value_name = "REPO_PATH", default_value = DEFAULT_REPO_PATH)]
    pub repo_path: PathBuf,

    /// Reinstall dependencies even when they look up to date
    #[arg(
        value_name = "FORCE_INSTALL",
        default_value = "false",
        action = ArgAction::Set,
        value_parser = clap::value_parser!(bool)
    )]
    pub force_install: bool,

    /// OS identifier in $OSTYPE form (linux-gnu, darwin23, ...)
    #[arg(long, env = "OSTYPE", value_name = "OS")]
    pub os_type: Option<String>,

    /// Print every step without executing commands or writing files
    #[arg(long)]
    pub dry_run: bool,

    /// How to decide whether installed dependencies are stale
    #[arg(long, value_enum, value_name = "STRATEGY")]
    pub staleness: Option<StalenessStrategy>,

    /// Seconds to wait for the RPC server to accept connections
    #[arg(long, value_name = "SECS")]
    pub readiness_timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stop every process launched by the last run
    Stop,

    /// Show launched processes and whether they are still up
    Status,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for completions command
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell type
    #[arg(long, value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["bootstrap"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.repo_path, PathBuf::from(DEFAULT_REPO_PATH));
        assert!(!cli.run.force_install);
        assert!(!cli.run.dry_run);
    }

    #[test]
    fn test_positional_arguments() {
        let cli = Cli::try_parse_from(["bootstrap", "/src/shardeum", "true"]).unwrap();
        assert_eq!(cli.run.repo_path, PathBuf::from("/src/shardeum"));
        assert!(cli.run.force_install);
    }

    #[test]
    fn test_force_install_rejects_other_literals() {
        assert!(Cli::try_parse_from(["bootstrap", "/src/shardeum", "yes"]).is_err());
        assert!(Cli::try_parse_from(["bootstrap", "/src/shardeum", "1"]).is_err());
    }

    #[test]
    fn test_explicit_false() {
        let cli = Cli::try_parse_from(["bootstrap", "/src/shardeum", "false"]).unwrap();
        assert!(!cli.run.force_install);
    }

    #[test]
    fn test_stop_subcommand() {
        let cli = Cli::try_parse_from(["bootstrap", "stop"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Stop)));
    }

    #[test]
    fn test_status_with_global_base_dir() {
        let cli = Cli::try_parse_from(["bootstrap", "status", "--base-dir", "/tmp/devnet"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Status)));
        assert_eq!(cli.base_dir, Some(PathBuf::from("/tmp/devnet")));
    }

    #[test]
    fn test_run_options() {
        let cli = Cli::try_parse_from([
            "bootstrap",
            "--dry-run",
            "--os-type",
            "darwin23",
            "--staleness",
            "fingerprint",
            "--readiness-timeout",
            "5",
        ])
        .unwrap();
        assert!(cli.run.dry_run);
        assert_eq!(cli.run.os_type.as_deref(), Some("darwin23"));
        assert_eq!(cli.run.staleness, Some(StalenessStrategy::Fingerprint));
        assert_eq!(cli.run.readiness_timeout, Some(5));
    }

    #[test]
    fn test_completions_shell() {
        let cli = Cli::try_parse_from(["bootstrap", "completions", "--shell", "zsh"]).unwrap();
        match cli.command {
            Some(Commands::Completions(args)) => assert_eq!(args.shell, clap_complete::Shell::Zsh),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
