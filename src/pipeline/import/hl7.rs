//! Minimal HL7 v2 reader for claim ingestion.
//!
//! Only the fields the pipeline consumes are read:
//! - PV1-11: free-text visit note
//! - PV1-16: claim amount
//! - OBX-5: observation value (every OBX segment)
//!
//! Absent segments and fields become `None` here, once. `Hl7Record::to_claim`
//! is the only place defaults are applied.

use std::path::Path;

use crate::config::DEFAULT_CLAIM_VALUE;
use crate::models::ClinicalClaim;

use super::ImportError;

/// Note used when a PV1 segment has no PV1-11.
pub const DEFAULT_VISIT_NOTE: &str = "Routine visit";

/// Note used when an OBX segment has no OBX-5.
pub const DEFAULT_OBSERVATION_NOTE: &str = "No details";

const PV1_VISIT_NOTE: usize = 11;
const PV1_CLAIM_AMOUNT: usize = 16;
const OBX_VALUE: usize = 5;

/// PV1 (patient visit) fields of interest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitSegment {
    pub note: Option<String>,
    pub claim_amount: Option<f64>,
}

/// One OBX (observation) segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationSegment {
    pub value: Option<String>,
}

/// Parsed view of an HL7 message with explicit optional fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hl7Record {
    pub visit: Option<VisitSegment>,
    pub observations: Vec<ObservationSegment>,
}

impl Hl7Record {
    /// Resolve defaults and build the claim.
    ///
    /// Missing text yields an empty claim text; a missing or unparsable
    /// amount yields `DEFAULT_CLAIM_VALUE`.
    pub fn to_claim(&self) -> ClinicalClaim {
        let mut notes: Vec<&str> = Vec::new();

        if let Some(visit) = &self.visit {
            notes.push(visit.note.as_deref().unwrap_or(DEFAULT_VISIT_NOTE));
        }
        for obx in &self.observations {
            notes.push(obx.value.as_deref().unwrap_or(DEFAULT_OBSERVATION_NOTE));
        }

        let claim_value = self
            .visit
            .as_ref()
            .and_then(|v| v.claim_amount)
            .unwrap_or(DEFAULT_CLAIM_VALUE);

        ClinicalClaim::new(notes.join(" "), claim_value)
    }
}

/// Encoding characters declared in MSH-1 / MSH-2.
#[derive(Debug, Clone, Copy)]
struct Delimiters {
    field: char,
    component: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            field: '|',
            component: '^',
        }
    }
}

impl Delimiters {
    fn from_msh(line: &str) -> Self {
        let mut chars = line.chars().skip(3);
        let field = chars.next().unwrap_or('|');
        let component = chars.next().unwrap_or('^');
        Self { field, component }
    }
}

/// Parse an HL7 v2 message. Never fails: unknown or malformed segments
/// are ignored and missing fields become `None`.
pub fn parse_hl7(text: &str) -> Hl7Record {
    let mut record = Hl7Record::default();
    let mut delims = Delimiters::default();

    for line in text.split(['\r', '\n']).map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("MSH") {
            delims = Delimiters::from_msh(line);
            continue;
        }

        let fields: Vec<&str> = line.split(delims.field).collect();
        match fields[0] {
            "PV1" => {
                let note = field_text(&fields, PV1_VISIT_NOTE, delims);
                let claim_amount = field_text(&fields, PV1_CLAIM_AMOUNT, delims)
                    .and_then(|raw| parse_amount(&raw));
                record.visit = Some(VisitSegment { note, claim_amount });
            }
            "OBX" => record.observations.push(ObservationSegment {
                value: field_text(&fields, OBX_VALUE, delims),
            }),
            _ => {}
        }
    }

    record
}

/// Read and parse one record file.
pub fn read_claim_file(path: &Path) -> Result<ClinicalClaim, ImportError> {
    let bytes = std::fs::read(path).map_err(|e| ImportError::FileReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let text = String::from_utf8_lossy(&bytes);
    let record = parse_hl7(&text);

    match record.visit.as_ref().and_then(|v| v.claim_amount) {
        None => tracing::debug!(
            path = %path.display(),
            default = DEFAULT_CLAIM_VALUE,
            "No claim amount in PV1-16, using default"
        ),
        Some(amount) if amount < 0.0 => tracing::warn!(
            path = %path.display(),
            amount,
            "Negative claim amount in PV1-16"
        ),
        Some(_) => {}
    }

    Ok(record.to_claim())
}

/// Field `index` with components joined by spaces; empty fields are `None`.
fn field_text(fields: &[&str], index: usize, delims: Delimiters) -> Option<String> {
    let raw = fields.get(index)?;
    let text = raw
        .split(delims.component)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    let first = raw.split_whitespace().next()?;
    first
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
