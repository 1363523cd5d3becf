use super::OracleError;

/// Ollama LLM client abstraction (allows mocking)
pub trait LlmClient {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
        system: &str,
    ) -> Result<String, OracleError>;

    /// True when an installed model name starts with `model`.
    fn is_model_available(&self, model: &str) -> Result<bool, OracleError>;

    fn list_models(&self) -> Result<Vec<String>, OracleError>;
}

/// Log whether `model` is installed. Returns false when it is missing or
/// the server cannot be reached; callers still run and fall back per claim.
pub fn check_model_available<C: LlmClient + ?Sized>(client: &C, model: &str) -> bool {
    match client.is_model_available(model) {
        Ok(true) => {
            tracing::info!(model, "Ollama model confirmed");
            true
        }
        Ok(false) => {
            tracing::warn!(model, "Ollama model not installed, generative scores will fall back");
            false
        }
        Err(e) => {
            tracing::warn!(model, error = %e, "Cannot reach Ollama, generative scores will fall back");
            false
        }
    }
}
