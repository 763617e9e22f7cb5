//! Input file discovery
//!
//! When a path is not given on the command line, the first file with the
//! expected extension in the search directory is used. Candidates are sorted by
//! file name so the choice does not depend on directory order.

use anyhow::Context;
use std::path::{Path, PathBuf};

/// Extension of SAT private key files
pub const KEY_EXTENSION: &str = "key";
/// Extension of SAT certificate files
pub const CERT_EXTENSION: &str = "cer";

/// Files in `dir` whose extension matches `extension` (case-insensitive), sorted by name
pub fn find_candidates(dir: &Path, extension: &str) -> anyhow::Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut candidates = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read directory {}", dir.display()))?
            .path();
        let matches = path
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if matches && path.is_file() {
            candidates.push(path);
        }
    }

    candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(candidates)
}

/// The explicit path when given, otherwise the first matching file in `dir`
pub fn resolve_input(explicit: Option<&Path>, dir: &Path, extension: &str) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let candidates = find_candidates(dir, extension)?;
    match candidates.as_slice() {
        [] => anyhow::bail!(
            "No .{} file found in {} (use --{})",
            extension,
            dir.display(),
            extension
        ),
        [only] => Ok(only.clone()),
        [first, ..] => {
            tracing::warn!(
                count = candidates.len(),
                chosen = %first.display(),
                "Several .{} files found, using the first",
                extension
            );
            Ok(first.clone())
        }
    }
}
