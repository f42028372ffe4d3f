//! Default command: bootstrap the whole environment

use std::path::PathBuf;

use console::Style;

use crate::cli::RunArgs;
use crate::error::{BootstrapError, Result};
use crate::patch::{PatchOutcome, SubstitutionStatus};
use crate::pipeline::{self, Request, Summary};
use crate::process::{CommandRunner, DryRunRunner, SystemRunner};
use crate::repository::Origin;
use crate::settings::Settings;
use crate::ui::Ui;

pub fn run(
    base_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    verbose: bool,
    args: RunArgs,
) -> Result<()> {
    let ui = Ui::new(verbose, args.dry_run);
    let mut settings = Settings::load(config.as_deref(), base_dir)?;
    if let Some(strategy) = args.staleness {
        settings.staleness = strategy;
    }
    if let Some(timeout) = args.readiness_timeout {
        settings.readiness.timeout_secs = timeout;
    }
    if settings.readiness.timeout_secs == 0 {
        return Err(BootstrapError::InvalidArgument {
            message: "readiness timeout must be at least one second".to_string(),
        });
    }
    if settings.network.node_count == 0 {
        return Err(BootstrapError::InvalidArgument {
            message: "network node count must be at least one".to_string(),
        });
    }

    let request = Request {
        repo_path: args.repo_path,
        force_install: args.force_install,
        os_type: args.os_type,
    };

    let runner: Box<dyn CommandRunner> = if args.dry_run {
        Box::new(DryRunRunner::new(ui))
    } else {
        Box::new(SystemRunner::new(ui))
    };

    let summary = pipeline::run(&request, &settings, runner.as_ref(), ui)?;
    print_summary(&summary, &settings, ui);
    Ok(())
}

fn print_summary(summary: &Summary, settings: &Settings, ui: Ui) {
    let ports = &settings.ports;
    let host = &settings.network.host;

    println!();
    let header = if ui.is_dry_run() {
        "Dry run complete, nothing was changed"
    } else {
        "Local network is up"
    };
    println!("{}", Style::new().green().bold().apply_to(header));
    ui.field(
        "network",
        &format!("{host}:{} (internal {})", ports.network_external, ports.network_internal),
    );
    ui.field("rpc server", &settings.rpc_url());
    ui.field("gui", &format!("http://{host}:{}", ports.gui));
    ui.field("archiver", &format!("{host}:{}", ports.archiver));
    ui.field("platform", &summary.platform.to_string());
    let origin = match summary.origin {
        Origin::Existing => "existing",
        Origin::PreviousClone => "earlier clone",
        Origin::Cloned => "fresh clone",
    };
    ui.field(
        "checkout",
        &format!("{} ({origin})", summary.network_dir.display()),
    );
    ui.field(
        "dependencies",
        if summary.dependencies_installed {
            if summary.force_install { "reinstalled (forced)" } else { "installed" }
        } else {
            "up to date"
        },
    );
    let config = match &summary.patch {
        PatchOutcome::Skipped { .. } => "not found, left alone".to_string(),
        PatchOutcome::Patched { .. } => format!(
            "{} applied, {} already set",
            summary.patch.count(SubstitutionStatus::Applied),
            summary.patch.count(SubstitutionStatus::AlreadyApplied)
        ),
    };
    ui.field("config", &config);
    ui.field("processes", &summary.record.processes.len().to_string());
    ui.field("logs", &settings.logs_dir().display().to_string());
    println!();
    println!("Run 'bootstrap stop' to shut everything down.");
}
