//! Autocoding: entity extraction followed by billing-code mapping.
//!
//! ```text
//! claim text → EntityExtractor → CodeMapper → CodeSet
//! ```

pub mod code_map;
pub mod extractor;
pub mod autocoder;

pub use code_map::*;
pub use extractor::*;
pub use autocoder::*;

use thiserror::Error;

use crate::pipeline::oracle::OracleError;

#[derive(Error, Debug)]
pub enum CodingError {
    #[error("Entity extraction oracle failed: {0}")]
    Oracle(#[from] OracleError),

    #[error("Entity extraction returned malformed output: {0}")]
    MalformedEntities(String),

    #[error("Entity extractor unavailable: {0}")]
    ExtractorUnavailable(String),

    #[error("Code map could not be loaded: {0}")]
    CodeMap(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
