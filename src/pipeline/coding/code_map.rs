//! Phrase → billing code lookup and diagnosis/procedure classification.
//!
//! Matching is by substring on lowercased text: extractor spans are noisy
//! ("type 2 diabetes", "fasting blood test") and rarely equal a table phrase.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::{CodeClass, CodedEntity};

use super::CodingError;

/// Code assigned when no table phrase occurs in the entity text.
pub const UNMAPPED_CODE: &str = "Unmapped";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMapEntry {
    pub phrase: String,
    pub code: String,
}

/// Static coding tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMapTable {
    /// Checked in order; the first contained phrase wins.
    pub codes: Vec<CodeMapEntry>,
    pub diagnosis_vocabulary: Vec<String>,
    pub procedure_vocabulary: Vec<String>,
}

impl Default for CodeMapTable {
    fn default() -> Self {
        let entry = |phrase: &str, code: &str| CodeMapEntry {
            phrase: phrase.into(),
            code: code.into(),
        };
        Self {
            codes: vec![
                entry("diabetes", "E11.9"),
                entry("blood test", "82947"),
                entry("office visit", "99213"),
            ],
            diagnosis_vocabulary: vec!["diabetes".into()],
            procedure_vocabulary: vec!["test".into(), "visit".into()],
        }
    }
}

/// Maps entity text to a coded entity. Immutable after construction.
#[derive(Debug, Clone)]
pub struct CodeMapper {
    table: CodeMapTable,
}

impl Default for CodeMapper {
    fn default() -> Self {
        Self::new(CodeMapTable::default())
    }
}

impl CodeMapper {
    /// Build a mapper; table phrases are lowercased once here.
    pub fn new(mut table: CodeMapTable) -> Self {
        for entry in &mut table.codes {
            entry.phrase = entry.phrase.trim().to_lowercase();
        }
        for phrase in table
            .diagnosis_vocabulary
            .iter_mut()
            .chain(table.procedure_vocabulary.iter_mut())
        {
            *phrase = phrase.trim().to_lowercase();
        }
        table.codes.retain(|e| !e.phrase.is_empty());
        table.diagnosis_vocabulary.retain(|p| !p.is_empty());
        table.procedure_vocabulary.retain(|p| !p.is_empty());
        Self { table }
    }

    /// Load tables from a JSON file shaped like `CodeMapTable`.
    pub fn from_json_file(path: &Path) -> Result<Self, CodingError> {
        let raw = std::fs::read_to_string(path)?;
        let table: CodeMapTable = serde_json::from_str(&raw)
            .map_err(|e| CodingError::CodeMap(format!("{}: {e}", path.display())))?;
        Ok(Self::new(table))
    }

    pub fn table(&self) -> &CodeMapTable {
        &self.table
    }

    /// Every phrase the mapper reacts to (code table and both vocabularies).
    pub fn known_phrases(&self) -> impl Iterator<Item = &str> {
        self.table
            .codes
            .iter()
            .map(|e| e.phrase.as_str())
            .chain(self.table.diagnosis_vocabulary.iter().map(String::as_str))
            .chain(self.table.procedure_vocabulary.iter().map(String::as_str))
    }

    /// Code for already-lowercased text, or `UNMAPPED_CODE`.
    pub fn lookup_code(&self, text: &str) -> &str {
        self.table
            .codes
            .iter()
            .find(|e| text.contains(e.phrase.as_str()))
            .map(|e| e.code.as_str())
            .unwrap_or(UNMAPPED_CODE)
    }

    /// Diagnosis vocabulary wins over procedure vocabulary.
    pub fn classify(&self, text: &str) -> CodeClass {
        let contains_any = |vocab: &[String]| vocab.iter().any(|p| text.contains(p.as_str()));

        if contains_any(&self.table.diagnosis_vocabulary) {
            CodeClass::Diagnosis
        } else if contains_any(&self.table.procedure_vocabulary) {
            CodeClass::Procedure
        } else {
            CodeClass::Unmapped
        }
    }

    /// Map one entity span.
    pub fn map(&self, entity_text: &str) -> CodedEntity {
        let text = entity_text.trim().to_lowercase();
        let class = self.classify(&text);
        let code = self.lookup_code(&text).to_string();
        CodedEntity {
            raw_text: text,
            class,
            code,
        }
    }
}
