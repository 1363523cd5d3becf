use std::time::Duration;

use super::ollama_types::{
    validate_base_url, validate_model_name, GenerationOptions, OllamaError,
    OllamaGenerateRequest, OllamaGenerateResponse, OllamaTagsResponse,
};
use super::types::LlmClient;
use super::OracleError;

/// Ollama HTTP client for local LLM inference.
///
/// Every request carries the client timeout; expiry surfaces as
/// `OracleError::Timeout`, never as an indefinite block.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
    options: GenerationOptions,
}

impl OllamaClient {
    /// Create a client for a local Ollama instance.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, OracleError> {
        validate_base_url(base_url)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| OllamaError::ClientBuild(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
            options: GenerationOptions::default(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_send_error(&self, e: reqwest::Error) -> OracleError {
        if e.is_timeout() {
            OracleError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            OracleError::OllamaConnection(self.base_url.clone())
        } else {
            OracleError::HttpClient(e.to_string())
        }
    }
}

impl LlmClient for OllamaClient {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
        system: &str,
    ) -> Result<String, OracleError> {
        validate_model_name(model)?;

        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model,
            prompt,
            system,
            stream: false,
            options: &self.options,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(OracleError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response.json().map_err(|e| {
            if e.is_timeout() {
                OracleError::Timeout(self.timeout_secs)
            } else {
                OracleError::ResponseParsing(e.to_string())
            }
        })?;

        Ok(parsed.response)
    }

    fn is_model_available(&self, model: &str) -> Result<bool, OracleError> {
        let models = self.list_models()?;
        Ok(models.iter().any(|m| m.starts_with(model)))
    }

    fn list_models(&self) -> Result<Vec<String>, OracleError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(OracleError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaTagsResponse = response
            .json()
            .map_err(|e| OracleError::ResponseParsing(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}

/// Mock LLM client for testing. Returns a configurable response.
pub struct MockLlmClient {
    response: String,
    available_models: Vec<String>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            available_models: vec![format!("{}:latest", crate::config::DEFAULT_MODEL)],
        }
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.available_models = models;
        self
    }
}

impl LlmClient for MockLlmClient {
    fn generate(
        &self,
        _model: &str,
        _prompt: &str,
        _system: &str,
    ) -> Result<String, OracleError> {
        Ok(self.response.clone())
    }

    fn is_model_available(&self, model: &str) -> Result<bool, OracleError> {
        Ok(self.available_models.iter().any(|m| m.starts_with(model)))
    }

    fn list_models(&self) -> Result<Vec<String>, OracleError> {
        Ok(self.available_models.clone())
    }
}
