use crate::models::{CodeClass, CodeSet, CodedEntity};

use super::code_map::CodeMapper;
use super::extractor::EntityExtractor;
use super::CodingError;

/// Clinical text → code set.
///
/// Extraction failures are returned to the caller untouched; the batch
/// decides whether one failed claim stops the run.
pub struct Autocoder {
    extractor: Box<dyn EntityExtractor>,
    mapper: CodeMapper,
}

impl Autocoder {
    pub fn new(extractor: Box<dyn EntityExtractor>, mapper: CodeMapper) -> Self {
        Self { extractor, mapper }
    }

    /// Every extracted entity with its mapping, unmapped ones included.
    pub fn code_entities(&self, claim_text: &str) -> Result<Vec<CodedEntity>, CodingError> {
        let spans = self.extractor.extract(claim_text)?;
        Ok(spans.map(|span| self.mapper.map(&span.text)).collect())
    }

    /// Diagnosis and procedure codes in extraction order.
    pub fn autocode(&self, claim_text: &str) -> Result<CodeSet, CodingError> {
        let mut codes = CodeSet::default();
        let mut skipped = 0usize;

        for entity in self.code_entities(claim_text)? {
            if entity.class == CodeClass::Unmapped {
                skipped += 1;
                continue;
            }
            codes.push(entity);
        }

        tracing::debug!(
            diagnosis = codes.diagnosis_codes.len(),
            procedure = codes.procedure_codes.len(),
            skipped,
            "Autocoded claim"
        );
        Ok(codes)
    }
}
