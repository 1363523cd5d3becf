//! Clients for the external model-serving oracles (entity recognition and
//! generative assessment). Everything here talks to a local Ollama instance
//! or a mock; the core only sees the `LlmClient` trait.

pub mod types;
pub mod ollama;
pub mod ollama_types;
pub mod sanitize;

pub use types::*;
pub use ollama::*;
pub use ollama_types::*;
pub use sanitize::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Ollama is not running at {0}")]
    OllamaConnection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    OllamaError { status: u16, body: String },

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Invalid oracle configuration: {0}")]
    Config(#[from] OllamaError),
}
