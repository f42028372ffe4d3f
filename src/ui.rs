//! Terminal output for the bootstrap pipeline
//!
//! Stage headers, status lines and spinners. Everything user-facing goes
//! through [`Ui`] so `--verbose` and `--dry-run` are honored in one place.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug, Clone, Copy, Default)]
pub struct Ui {
    verbose: bool,
    dry_run: bool,
}

impl Ui {
    pub fn new(verbose: bool, dry_run: bool) -> Self {
        Self { verbose, dry_run }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn prefix(&self) -> &'static str {
        if self.dry_run { "[DRY RUN] " } else { "" }
    }

    /// Header for a pipeline stage
    pub fn stage(&self, title: &str) {
        let style = Style::new().green().bold();
        println!("{}{} {}", self.prefix(), style.apply_to("==>"), style.apply_to(title));
    }

    pub fn step(&self, message: &str) {
        println!("{}  {} {}", self.prefix(), Style::new().cyan().apply_to("•"), message);
    }

    pub fn success(&self, message: &str) {
        println!("{}  {} {}", self.prefix(), Style::new().green().apply_to("✓"), message);
    }

    pub fn warn(&self, message: &str) {
        eprintln!(
            "{}{} {}",
            self.prefix(),
            Style::new().yellow().bold().apply_to("Warning:"),
            message
        );
    }

    /// Echo a command line before it runs (verbose only)
    pub fn command(&self, command_line: &str) {
        if self.verbose {
            println!("{}    {}", self.prefix(), Style::new().dim().apply_to(format!("$ {command_line}")));
        }
    }

    /// Spinner for a long-running step. Hidden in verbose mode, where the
    /// child's own output is shown instead.
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if self.verbose || self.dry_run {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner} {msg} {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    }

    /// Two-column `name  value` line used by summaries
    pub fn field(&self, name: &str, value: &str) {
        println!("    {:<14} {}", Style::new().bold().apply_to(name), value);
    }
}
