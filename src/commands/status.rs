//! Status command: show recorded processes

use std::path::PathBuf;

use console::Style;

use crate::error::Result;
use crate::process::supervisor::{self, ProcessEntry, SupervisionRecord};
use crate::process::{CommandRunner, SystemRunner};
use crate::readiness;
use crate::settings::Settings;
use crate::ui::Ui;

pub fn run(base_dir: Option<PathBuf>, config: Option<PathBuf>, verbose: bool) -> Result<()> {
    let ui = Ui::new(verbose, false);
    let settings = Settings::load(config.as_deref(), base_dir)?;

    let Some(record) = SupervisionRecord::load(&settings.base_dir)? else {
        println!("No processes recorded in {}", settings.base_dir.display());
        return Ok(());
    };

    let runner = SystemRunner::new(ui);
    for entry in &record.processes {
        println!("{}", describe(entry, &settings.network.host, &runner));
    }
    Ok(())
}

fn describe(entry: &ProcessEntry, host: &str, runner: &dyn CommandRunner) -> String {
    let up = Style::new().green();
    let down = Style::new().red();

    let process = match entry.pid {
        Some(pid) if supervisor::is_alive(pid, runner) => up.apply_to(format!("pid {pid} running")),
        Some(pid) => down.apply_to(format!("pid {pid} exited")),
        None => Style::new().dim().apply_to("self-managed".to_string()),
    };
    let port = match entry.port {
        Some(port) if readiness::port_accepts(host, port) => {
            up.apply_to(format!("port {port} open"))
        }
        Some(port) => down.apply_to(format!("port {port} closed")),
        None => Style::new().dim().apply_to("no port".to_string()),
    };

    format!(
        "{:<16} {}  {}",
        Style::new().bold().apply_to(&entry.name),
        process,
        port
    )
}
