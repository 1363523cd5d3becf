//! Entity recognition oracles.
//!
//! The autocoder only reads the span text; `category` is carried for
//! logging and never drives coding.

use std::sync::Mutex;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pipeline::oracle::{sanitize_llm_output, LlmClient, OracleError};

use super::code_map::CodeMapper;
use super::CodingError;

/// One entity span returned by an extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    /// Absent and `null` both read as `None`.
    #[serde(default)]
    pub category: Option<String>,
}

impl EntitySpan {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: Some(category.into()),
        }
    }
}

/// Lazily produced entity spans, in oracle order.
pub type EntityStream<'a> = Box<dyn Iterator<Item = EntitySpan> + 'a>;

/// Named entity recognition oracle.
pub trait EntityExtractor {
    fn extract<'a>(&'a self, text: &'a str) -> Result<EntityStream<'a>, CodingError>;
}

// ═══════════════════════════════════════════
// Lexicon extractor
// ═══════════════════════════════════════════

/// Deterministic extractor that finds code-table phrases in the text.
///
/// Longer phrases are tried first so "blood test" wins over "test".
pub struct LexiconEntityExtractor {
    pattern: Option<Regex>,
}

impl LexiconEntityExtractor {
    pub fn from_mapper(mapper: &CodeMapper) -> Result<Self, CodingError> {
        let mut phrases: Vec<&str> = mapper.known_phrases().collect();
        phrases.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        phrases.dedup();

        if phrases.is_empty() {
            return Ok(Self { pattern: None });
        }

        let alternation = phrases
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))
            .map_err(|e| CodingError::ExtractorUnavailable(e.to_string()))?;

        Ok(Self {
            pattern: Some(pattern),
        })
    }
}

impl EntityExtractor for LexiconEntityExtractor {
    fn extract<'a>(&'a self, text: &'a str) -> Result<EntityStream<'a>, CodingError> {
        match &self.pattern {
            Some(pattern) => Ok(Box::new(
                pattern
                    .find_iter(text)
                    .map(|m| EntitySpan::new(m.as_str(), "LEXICON")),
            )),
            None => Ok(Box::new(std::iter::empty())),
        }
    }
}

// ═══════════════════════════════════════════
// LLM-backed extractor
// ═══════════════════════════════════════════

const NER_SYSTEM_PROMPT: &str =
    "You are a clinical named entity recognizer. Output valid JSON only.";

/// Ollama-backed extractor. The model is asked for a JSON array of
/// `{"text": ..., "category": ...}` objects.
pub struct LlmEntityExtractor<C: LlmClient> {
    client: C,
    model: String,
}

impl<C: LlmClient> LlmEntityExtractor<C> {
    pub fn new(client: C, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }

    fn build_prompt(text: &str) -> String {
        format!(
            "Extract every diagnosis, procedure, test and visit mentioned in the clinical note below.\n\
             Respond with a JSON array of objects with keys \"text\" (the exact words from the note) \
             and \"category\" (DIAGNOSIS, PROCEDURE or OTHER).\n\
             Respond with [] if there are none.\n\n\
             Note: {text}"
        )
    }
}

/// Parse a JSON array of spans out of a model response.
///
/// Tolerates code fences and prose around the array.
pub fn parse_entity_response(response: &str) -> Result<Vec<EntitySpan>, CodingError> {
    let cleaned = sanitize_llm_output(response);
    let start = cleaned.find('[');
    let end = cleaned.rfind(']');

    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &cleaned[s..=e],
        _ => {
            return Err(CodingError::MalformedEntities(format!(
                "no JSON array in response: {}",
                truncate(&cleaned, 120)
            )))
        }
    };

    let spans: Vec<EntitySpan> =
        serde_json::from_str(json).map_err(|e| CodingError::MalformedEntities(e.to_string()))?;

    Ok(spans
        .into_iter()
        .filter(|s| !s.text.trim().is_empty())
        .collect())
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

impl<C: LlmClient> EntityExtractor for LlmEntityExtractor<C> {
    fn extract<'a>(&'a self, text: &'a str) -> Result<EntityStream<'a>, CodingError> {
        if text.trim().is_empty() {
            return Ok(Box::new(std::iter::empty()));
        }

        let prompt = Self::build_prompt(text);
        let response = self
            .client
            .generate(&self.model, &prompt, NER_SYSTEM_PROMPT)?;
        let spans = parse_entity_response(&response)?;

        tracing::debug!(count = spans.len(), "Entity oracle returned spans");
        Ok(Box::new(spans.into_iter()))
    }
}

// ═══════════════════════════════════════════
// Mock extractor
// ═══════════════════════════════════════════

/// Mock extractor for testing. Returns fixed spans or a fixed failure.
pub struct MockEntityExtractor {
    spans: Vec<EntitySpan>,
    failure: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl MockEntityExtractor {
    pub fn new(texts: &[&str]) -> Self {
        Self {
            spans: texts.iter().map(|t| EntitySpan::new(*t, "MOCK")).collect(),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with an oracle connection error.
    pub fn failing(reason: &str) -> Self {
        Self {
            spans: Vec::new(),
            failure: Some(reason.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Texts this extractor was called with.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl EntityExtractor for MockEntityExtractor {
    fn extract<'a>(&'a self, text: &'a str) -> Result<EntityStream<'a>, CodingError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(text.to_string());
        }
        if let Some(reason) = &self.failure {
            return Err(OracleError::OllamaConnection(reason.clone()).into());
        }
        if text.is_empty() {
            return Ok(Box::new(std::iter::empty()));
        }
        Ok(Box::new(self.spans.iter().cloned()))
    }
}
