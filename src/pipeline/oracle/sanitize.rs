//! Post-LLM output sanitization.
//!
//! Strips model artifacts (thinking tags, unused tokens) before any
//! response is parsed.

use std::sync::LazyLock;

use regex::Regex;

static UNUSED_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<unused\d+>").expect("valid regex"));

static THINK_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));

/// Strip model-specific artifacts from raw LLM output.
///
/// Handles:
/// 1. Gemma thinking prefixes (`<unusedN>thought\n...`)
/// 2. `<think>...</think>` reasoning blocks
/// 3. Stray `<unusedN>` tokens
/// 4. Leading/trailing whitespace
pub fn sanitize_llm_output(raw: &str) -> String {
    let mut text = raw.to_string();

    if let Some(idx) = text.find("<unused") {
        if let Some(thought_offset) = text[idx..].find("thought\n") {
            text = text[idx + thought_offset + 8..].to_string();
        }
    }

    text = THINK_BLOCK_RE.replace_all(&text, "").to_string();
    text = UNUSED_TOKEN_RE.replace_all(&text, "").to_string();

    text.trim().to_string()
}
