//! Stop command: tear down everything the last run launched

use std::path::PathBuf;

use crate::error::{BootstrapError, Result};
use crate::process::SystemRunner;
use crate::process::supervisor::{self, SupervisionRecord};
use crate::settings::Settings;
use crate::ui::Ui;

pub fn run(base_dir: Option<PathBuf>, config: Option<PathBuf>, verbose: bool) -> Result<()> {
    let ui = Ui::new(verbose, false);
    let settings = Settings::load(config.as_deref(), base_dir)?;

    let Some(record) = SupervisionRecord::load(&settings.base_dir)? else {
        return Err(BootstrapError::RecordNotFound {
            path: SupervisionRecord::path(&settings.base_dir)
                .display()
                .to_string(),
        });
    };

    ui.stage("Stopping local network");
    let failures = supervisor::stop_all(&record, &SystemRunner::new(ui), ui);
    if failures > 0 {
        return Err(BootstrapError::CommandFailed {
            command: "stop".to_string(),
            reason: format!("{failures} process(es) could not be stopped"),
        });
    }

    SupervisionRecord::remove(&settings.base_dir)?;
    Ok(())
}
