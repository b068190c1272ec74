//! AI-assisted document parsing: sends OCR text to the external model with a
//! strict JSON-schema prompt and returns a structured scan. The orchestrator
//! pattern-matches the outcome — populated scan, empty scan, or error — and
//! picks the next extraction tier.

pub mod parser;
pub mod prompt;
pub mod types;

pub use parser::parse_scan_response;
pub use prompt::LAB_PARSER_PROMPT;
pub use types::{DocumentScan, ScannedAnalyte};

use crate::pipeline::ai::{AiError, ChatClient};

/// Maximum OCR text length sent to the service, to bound request size.
const MAX_INPUT_CHARS: usize = 40_000;

/// Parse a lab document's OCR text with the external model.
///
/// Empty input yields an empty scan without a service call. Transport
/// failures and non-conforming responses surface as errors; the caller
/// degrades to the rule-based tier in both cases.
pub fn scan_document(client: &dyn ChatClient, ocr_text: &str) -> Result<DocumentScan, AiError> {
    if ocr_text.trim().is_empty() {
        return Ok(DocumentScan::default());
    }

    let truncated: String = ocr_text.chars().take(MAX_INPUT_CHARS).collect();
    let response = client.complete(LAB_PARSER_PROMPT, &truncated, 0.0)?;
    parse_scan_response(&response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ai::MockChatClient;

    #[test]
    fn empty_input_yields_empty_scan_without_calling_service() {
        // A failing client proves the service is never reached.
        let client = MockChatClient::failing();
        let scan = scan_document(&client, "   \n  ").unwrap();
        assert!(scan.analytes.is_empty());
        assert!(scan.lab_name.is_none());
    }

    #[test]
    fn service_failure_propagates() {
        let client = MockChatClient::failing();
        assert!(scan_document(&client, "Glucose 95").is_err());
    }

    #[test]
    fn populated_response_round_trips() {
        let client = MockChatClient::new(
            r#"{
                "lab_name": "Nano Labs Diagnostics",
                "report_date": "2025-11-05",
                "analytes": [
                    {"name": "glucose", "value": 95, "unit": "mg/dL",
                     "ref_min": 70, "ref_max": 100, "method": null,
                     "measured_at": null, "raw_line": "Glucose 95 mg/dL (70-100)"}
                ],
                "uncertainties": ["reference range for HDL unreadable"]
            }"#,
        );
        let scan = scan_document(&client, "Glucose 95 mg/dL (70-100)").unwrap();
        assert_eq!(scan.lab_name.as_deref(), Some("Nano Labs Diagnostics"));
        assert_eq!(scan.analytes.len(), 1);
        assert_eq!(scan.uncertainties.len(), 1);
    }
}
