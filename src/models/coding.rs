use serde::{Deserialize, Serialize};

use super::enums::CodeClass;

/// One extracted entity after code mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodedEntity {
    /// Lowercased entity text as seen by the mapper.
    pub raw_text: String,
    pub class: CodeClass,
    /// Billing code, or the unmapped sentinel.
    pub code: String,
}

/// Diagnosis and procedure codes assigned to one claim.
///
/// Order follows extraction order. Repeated mentions are kept: a code that
/// appears twice weighs twice in the downstream features.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSet {
    pub diagnosis_codes: Vec<String>,
    pub procedure_codes: Vec<String>,
}

impl CodeSet {
    pub fn is_empty(&self) -> bool {
        self.diagnosis_codes.is_empty() && self.procedure_codes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnosis_codes.len() + self.procedure_codes.len()
    }

    /// Route a coded entity into the matching list. Unmapped entities are dropped.
    pub fn push(&mut self, entity: CodedEntity) {
        match entity.class {
            CodeClass::Diagnosis => self.diagnosis_codes.push(entity.code),
            CodeClass::Procedure => self.procedure_codes.push(entity.code),
            CodeClass::Unmapped => {}
        }
    }

    /// Rendering shared by the classifier features, the oracle prompt and the ledger.
    pub fn render(&self) -> String {
        format!(
            "ICD: [{}] CPT: [{}]",
            self.diagnosis_codes.join(", "),
            self.procedure_codes.join(", ")
        )
    }
}

impl std::fmt::Display for CodeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}
