//! Clinical record ingestion: HL7 v2 files in, `ClinicalClaim`s out.

pub mod hl7;
pub mod scan;

pub use hl7::*;
pub use scan::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Claim directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Could not read record {path}: {reason}")]
    FileReadError { path: PathBuf, reason: String },
}
