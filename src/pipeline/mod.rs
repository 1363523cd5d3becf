pub mod oracle; // Ollama client, mocks, output sanitising
pub mod import; // HL7 v2 records → ClinicalClaim
pub mod coding; // Entity extraction + code mapping
pub mod risk; // Statistical + generative ensemble scoring
pub mod settlement; // Threshold decision, paid ledger, portfolio
pub mod batch; // Per-claim orchestration + rejection feedback
