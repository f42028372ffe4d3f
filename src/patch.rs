//! Network configuration patching
//!
//! The upstream network config ships production defaults. For a local
//! network a fixed set of literal substitutions is applied in place: node
//! counts lowered, bogon filtering off, debug mode, and louder logging.
//! Each substitution only matches the unpatched text, so re-applying the
//! patch leaves an already-patched file untouched.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{BootstrapError, Result};
use crate::ui::Ui;

/// Production node count baked into the upstream config
const UPSTREAM_NODE_COUNT: u32 = 640;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub from: String,
    pub to: String,
}

impl Substitution {
    fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// The six substitutions that turn the upstream config into a local one
pub fn local_network_patch(node_count: u32) -> Vec<Substitution> {
    let node_setting = |key: &str, count: u32| {
        format!("{key}: process.env.{key} ? parseInt(process.env.{key}) : {count}")
    };
    vec![
        Substitution::new(
            node_setting("baselineNodes", UPSTREAM_NODE_COUNT),
            node_setting("baselineNodes", node_count),
        ),
        Substitution::new(
            node_setting("minNodes", UPSTREAM_NODE_COUNT),
            node_setting("minNodes", node_count),
        ),
        Substitution::new("forceBogonFilteringOn: true", "forceBogonFilteringOn: false"),
        Substitution::new("mode: 'release'", "mode: 'debug'"),
        Substitution::new("startInFatalsLogMode: true", "startInFatalsLogMode: false"),
        Substitution::new("startInErrorLogMode: false", "startInErrorLogMode: true"),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstitutionStatus {
    Applied,
    AlreadyApplied,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Target file missing; nothing was done
    Skipped { path: PathBuf },
    Patched {
        path: PathBuf,
        statuses: Vec<SubstitutionStatus>,
    },
}

impl PatchOutcome {
    pub fn count(&self, status: SubstitutionStatus) -> usize {
        match self {
            PatchOutcome::Skipped { .. } => 0,
            PatchOutcome::Patched { statuses, .. } => {
                statuses.iter().filter(|s| **s == status).count()
            }
        }
    }
}

/// Apply substitutions to `content` in order
pub fn apply(content: &str, substitutions: &[Substitution]) -> (String, Vec<SubstitutionStatus>) {
    let mut patched = content.to_string();
    let statuses = substitutions
        .iter()
        .map(|sub| {
            if patched.contains(&sub.from) {
                patched = patched.replace(&sub.from, &sub.to);
                SubstitutionStatus::Applied
            } else if patched.contains(&sub.to) {
                SubstitutionStatus::AlreadyApplied
            } else {
                SubstitutionStatus::NotFound
            }
        })
        .collect();
    (patched, statuses)
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| BootstrapError::write_failed(path, e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| BootstrapError::write_failed(path, e))?;
    tmp.persist(path)
        .map_err(|e| BootstrapError::write_failed(path, e.error))?;
    Ok(())
}

/// Patch `path` in place.
///
/// A missing file is not an error: the patch is skipped with a warning. The
/// original is backed up next to the file for the duration of the write and
/// restored if the write fails.
pub fn patch_file(path: &Path, substitutions: &[Substitution], ui: Ui) -> Result<PatchOutcome> {
    if !path.is_file() {
        ui.warn(&format!(
            "{} not found, skipping config patch",
            path.display()
        ));
        return Ok(PatchOutcome::Skipped {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| BootstrapError::read_failed(path, e))?;
    let (patched, statuses) = apply(&content, substitutions);

    if patched != content && !ui.is_dry_run() {
        let backup = backup_path(path);
        fs::copy(path, &backup).map_err(|e| BootstrapError::write_failed(&backup, e))?;

        if let Err(e) = write_atomically(path, &patched) {
            if let Err(restore) = fs::copy(&backup, path) {
                ui.warn(&format!("failed to restore {}: {restore}", path.display()));
            }
            let _ = fs::remove_file(&backup);
            return Err(e);
        }
        fs::remove_file(&backup).map_err(|e| BootstrapError::write_failed(&backup, e))?;
    }

    let outcome = PatchOutcome::Patched {
        path: path.to_path_buf(),
        statuses,
    };
    let not_found = outcome.count(SubstitutionStatus::NotFound);
    if not_found > 0 {
        ui.warn(&format!(
            "{not_found} config setting(s) not found in {}",
            path.display()
        ));
    }
    ui.success(&format!(
        "patched {} ({} applied, {} already set)",
        path.display(),
        outcome.count(SubstitutionStatus::Applied),
        outcome.count(SubstitutionStatus::AlreadyApplied)
    ));
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::UNPATCHED_CONFIG;
    use tempfile::TempDir;

    #[test]
    fn test_all_six_substitutions_apply() {
        let (patched, statuses) = apply(UNPATCHED_CONFIG, &local_network_patch(10));

        assert_eq!(statuses, vec![SubstitutionStatus::Applied; 6]);
        assert!(patched.contains(
            "baselineNodes: process.env.baselineNodes ? parseInt(process.env.baselineNodes) : 10,"
        ));
        assert!(patched.contains("minNodes: process.env.minNodes ? parseInt(process.env.minNodes) : 10,"));
        assert!(patched.contains("forceBogonFilteringOn: false"));
        assert!(patched.contains("mode: 'debug'"));
        assert!(patched.contains("startInFatalsLogMode: false"));
        assert!(patched.contains("startInErrorLogMode: true"));
        assert!(!patched.contains(": 640"));
    }

    #[test]
    fn test_patch_is_idempotent() {
        let subs = local_network_patch(10);
        let (once, _) = apply(UNPATCHED_CONFIG, &subs);
        let (twice, statuses) = apply(&once, &subs);

        assert_eq!(once, twice);
        assert_eq!(statuses, vec![SubstitutionStatus::AlreadyApplied; 6]);
    }

    #[test]
    fn test_unrelated_content_reports_not_found() {
        let (patched, statuses) = apply("export default {}\n", &local_network_patch(10));
        assert_eq!(patched, "export default {}\n");
        assert_eq!(statuses, vec![SubstitutionStatus::NotFound; 6]);
    }

    #[test]
    fn test_patch_file_writes_and_removes_backup() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.ts");
        fs::write(&path, UNPATCHED_CONFIG).unwrap();

        let outcome = patch_file(&path, &local_network_patch(10), Ui::default()).unwrap();

        assert_eq!(outcome.count(SubstitutionStatus::Applied), 6);
        assert!(fs::read_to_string(&path).unwrap().contains("mode: 'debug'"));
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_patch_file_twice_is_stable() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.ts");
        fs::write(&path, UNPATCHED_CONFIG).unwrap();

        patch_file(&path, &local_network_patch(10), Ui::default()).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        let outcome = patch_file(&path, &local_network_patch(10), Ui::default()).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), first);
        assert_eq!(outcome.count(SubstitutionStatus::AlreadyApplied), 6);
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("src/config/index.ts");
        let outcome = patch_file(&path, &local_network_patch(10), Ui::default()).unwrap();
        assert!(matches!(outcome, PatchOutcome::Skipped { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_dry_run_leaves_file_untouched() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.ts");
        fs::write(&path, UNPATCHED_CONFIG).unwrap();

        let outcome = patch_file(&path, &local_network_patch(10), Ui::new(false, true)).unwrap();

        assert_eq!(outcome.count(SubstitutionStatus::Applied), 6);
        assert_eq!(fs::read_to_string(&path).unwrap(), UNPATCHED_CONFIG);
    }

    #[test]
    fn test_custom_node_count() {
        let (patched, _) = apply(UNPATCHED_CONFIG, &local_network_patch(4));
        assert!(patched.contains("parseInt(process.env.minNodes) : 4,"));
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("/repo/src/config/index.ts")),
            PathBuf::from("/repo/src/config/index.ts.bak")
        );
    }
}
