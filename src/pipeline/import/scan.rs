use std::path::{Path, PathBuf};

use crate::config::ExtractionFailurePolicy;
use crate::models::{ClaimRecord, SourcedClaim, UnreadableRecord};

use super::hl7::read_claim_file;
use super::ImportError;

/// Extension of claim record files.
pub const RECORD_EXTENSION: &str = "hl7";

/// List `*.hl7` files in `dir`, sorted by file name.
pub fn scan_claim_dir(dir: &Path) -> Result<Vec<PathBuf>, ImportError> {
    if !dir.is_dir() {
        return Err(ImportError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION)
        })
        .collect();

    paths.sort();
    Ok(paths)
}

/// Load every record in `dir`.
pub fn load_claim_dir(
    dir: &Path,
    policy: ExtractionFailurePolicy,
) -> Result<Vec<ClaimRecord>, ImportError> {
    let paths = scan_claim_dir(dir)?;
    let records = load_claim_files(&paths, policy)?;
    tracing::info!(dir = %dir.display(), count = records.len(), "Loaded claim records");
    Ok(records)
}

/// Load the given record files in order.
///
/// A file that cannot be read fails the load under `AbortBatch`; under
/// `SkipClaim` it becomes a `ClaimRecord::Unreadable` in its place.
pub fn load_claim_files(
    paths: &[PathBuf],
    policy: ExtractionFailurePolicy,
) -> Result<Vec<ClaimRecord>, ImportError> {
    let mut records = Vec::with_capacity(paths.len());

    for path in paths {
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match read_claim_file(path) {
            Ok(claim) => records.push(ClaimRecord::Claim(SourcedClaim { source, claim })),
            Err(e) => match policy {
                ExtractionFailurePolicy::AbortBatch => return Err(e),
                ExtractionFailurePolicy::SkipClaim => {
                    tracing::warn!(record = %source, error = %e, "Unreadable record");
                    records.push(ClaimRecord::Unreadable(UnreadableRecord {
                        source,
                        reason: e.to_string(),
                    }));
                }
            },
        }
    }

    Ok(records)
}
