//! devnet-bootstrap - local development network bootstrapper
//!
//! Provisions the Node and Rust toolchains, clones or reuses the network,
//! RPC server, validator CLI and validator GUI repositories, patches the
//! network config for a local run and launches all four subsystems.

use clap::Parser;
use miette::Diagnostic;

mod artifacts;
mod cli;
mod commands;
mod deps;
mod error;
mod git;
mod hash;
mod launch;
mod patch;
mod pipeline;
mod platform;
mod process;
mod readiness;
mod repository;
mod settings;
mod toolchain;
mod ui;

#[cfg(test)]
mod test_fixtures;

use cli::{Cli, Commands};
use error::BootstrapError;

fn report(error: &BootstrapError) {
    eprintln!("Error: {}", error);
    if let Some(help) = error.help() {
        eprintln!("  help: {}", help);
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        None => commands::run::run(cli.base_dir, cli.config, cli.verbose, cli.run),
        Some(Commands::Stop) => commands::stop::run(cli.base_dir, cli.config, cli.verbose),
        Some(Commands::Status) => commands::status::run(cli.base_dir, cli.config, cli.verbose),
        Some(Commands::Completions(args)) => commands::completions::run(&args),
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
}
