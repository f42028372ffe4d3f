//! BLAKE3 fingerprints for dependency manifests

use std::fs::File;
use std::path::Path;

use blake3::Hasher;

use crate::error::{BootstrapError, Result};

/// Hash prefix for BLAKE3 hashes
pub const HASH_PREFIX: &str = "blake3:";

/// Fingerprint the files `names` under `dir`.
///
/// Each present file contributes its name and content, in the given order,
/// so renaming or swapping files changes the result. Returns `None` when
/// none of them exist.
pub fn fingerprint(dir: &Path, names: &[&str]) -> Result<Option<String>> {
    let mut hasher = Hasher::new();
    let mut found = false;

    for name in names {
        let path = dir.join(name);
        if !path.is_file() {
            continue;
        }
        found = true;
        let file = File::open(&path).map_err(|e| BootstrapError::read_failed(&path, e))?;
        hasher.update(name.as_bytes());
        hasher.update(b"\0");
        hasher
            .update_reader(file)
            .map_err(|e| BootstrapError::read_failed(&path, e))?;
        hasher.update(b"\0");
    }

    Ok(found.then(|| format!("{}{}", HASH_PREFIX, hasher.finalize().to_hex())))
}
