//! Recursive discovery of proposal documents under a root directory.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use proposalkit_shared::{ProposalKitError, Result, ScanConfig};

/// Collect every document under `root`, sorted by path.
///
/// Files are kept when their extension matches `scan.extension`
/// (case-insensitive) and their name does not start with `scan.lock_prefix`.
#[instrument(skip(scan), fields(root = %root.display()))]
pub fn discover_documents(root: &Path, scan: &ScanConfig) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(ProposalKitError::input(root, "document root is not a directory"));
    }

    let extension = scan.extension.trim_start_matches('.').to_ascii_lowercase();
    let mut documents = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };

        if entry.file_type().is_file() && is_document(entry.path(), &extension, &scan.lock_prefix) {
            documents.push(entry.into_path());
        }
    }

    debug!(count = documents.len(), "documents discovered");
    Ok(documents)
}

/// Extension match and lock-file exclusion for a single path.
fn is_document(path: &Path, extension: &str, lock_prefix: &str) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if !lock_prefix.is_empty() && name.starts_with(lock_prefix) {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}
