//! Ollama HTTP API contract, configuration error taxonomy and the
//! security validators applied before any request leaves the process.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Request / response bodies
// ──────────────────────────────────────────────

/// Generation parameters for Ollama `/api/generate`.
///
/// Risk assessment wants a bare number back, so sampling is kept cold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    /// Maximum tokens in the generated response. None = model default.
    pub num_predict: Option<i32>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.9,
            top_k: 40,
            num_predict: None,
        }
    }
}

/// Request body for Ollama `/api/generate`
#[derive(Debug, Serialize)]
pub(crate) struct OllamaGenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub system: &'a str,
    pub stream: bool,
    pub options: &'a GenerationOptions,
}

/// Response body from Ollama `/api/generate`
#[derive(Debug, Deserialize)]
pub(crate) struct OllamaGenerateResponse {
    pub response: String,
}

/// Response body from Ollama `/api/tags`
#[derive(Debug, Deserialize)]
pub(crate) struct OllamaTagsResponse {
    pub models: Vec<OllamaTagModel>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OllamaTagModel {
    pub name: String,
}

// ──────────────────────────────────────────────
// Error taxonomy
// ──────────────────────────────────────────────

/// Configuration errors caught before the client is built.
#[derive(Debug, thiserror::Error)]
pub enum OllamaError {
    #[error("Only localhost connections are allowed for clinical data")]
    NonLocalEndpoint,

    #[error("Invalid URL format: '{0}'")]
    InvalidUrl(String),

    #[error("Invalid model name: '{0}'")]
    InvalidModelName(String),

    #[error("HTTP client could not be built: {0}")]
    ClientBuild(String),
}

// ──────────────────────────────────────────────
// Security validators
// ──────────────────────────────────────────────

/// Validate that a base URL points to localhost only.
///
/// Claim text is protected health information and never leaves the machine.
/// Accepts: localhost, 127.0.0.1, [::1].
pub fn validate_base_url(url: &str) -> Result<(), OllamaError> {
    let after_scheme = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or_else(|| OllamaError::InvalidUrl(url.to_string()))?;

    let host = if after_scheme.starts_with('[') {
        after_scheme
            .split(']')
            .next()
            .unwrap_or("")
            .trim_start_matches('[')
    } else {
        after_scheme
            .split(':')
            .next()
            .unwrap_or("")
            .split('/')
            .next()
            .unwrap_or("")
    };

    match host {
        "localhost" | "127.0.0.1" | "::1" => Ok(()),
        "" => Err(OllamaError::InvalidUrl(url.to_string())),
        _ => Err(OllamaError::NonLocalEndpoint),
    }
}

static MODEL_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._-]*(/[a-zA-Z0-9][a-zA-Z0-9._-]*)?(:[a-zA-Z0-9._-]+)?$")
        .expect("static regex")
});

/// Validate a model name against the Ollama `[namespace/]model[:tag]` convention.
pub fn validate_model_name(name: &str) -> Result<(), OllamaError> {
    if MODEL_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(OllamaError::InvalidModelName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_url_accepts_loopback_hosts() {
        assert!(validate_base_url("http://localhost:11434").is_ok());
        assert!(validate_base_url("http://localhost").is_ok());
        assert!(validate_base_url("http://127.0.0.1:11434").is_ok());
        assert!(validate_base_url("http://[::1]:11434").is_ok());
        assert!(validate_base_url("https://localhost:11434").is_ok());
    }

    #[test]
    fn validate_url_rejects_remote_hosts() {
        assert!(matches!(
            validate_base_url("http://evil.com:11434"),
            Err(OllamaError::NonLocalEndpoint)
        ));
        assert!(matches!(
            validate_base_url("http://192.168.1.100:11434"),
            Err(OllamaError::NonLocalEndpoint)
        ));
    }

    #[test]
    fn validate_url_rejects_malformed() {
        assert!(matches!(validate_base_url(""), Err(OllamaError::InvalidUrl(_))));
        assert!(matches!(
            validate_base_url("localhost:11434"),
            Err(OllamaError::InvalidUrl(_))
        ));
        assert!(matches!(validate_base_url("http://"), Err(OllamaError::InvalidUrl(_))));
    }

    #[test]
    fn validate_name_accepts_common_forms() {
        assert!(validate_model_name("llama3").is_ok());
        assert!(validate_model_name("llama3.1:8b").is_ok());
        assert!(validate_model_name("medllama2:latest").is_ok());
        assert!(validate_model_name("alibayram/medgemma").is_ok());
    }

    #[test]
    fn validate_name_rejects_injection() {
        assert!(validate_model_name("").is_err());
        assert!(validate_model_name("../etc/passwd").is_err());
        assert!(validate_model_name("; rm -rf /").is_err());
        assert!(validate_model_name("a/b/c").is_err());
        assert!(validate_model_name("model name").is_err());
    }

    #[test]
    fn generate_request_omits_empty_system() {
        let options = GenerationOptions::default();
        let body = OllamaGenerateRequest {
            model: "llama3",
            prompt: "hi",
            system: "",
            stream: false,
            options: &options,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["top_k"], 40);
    }
}
