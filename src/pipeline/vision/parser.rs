use serde::Deserialize;

use super::types::{DocumentScan, ScannedAnalyte};
use crate::pipeline::ai::{extract_json_block, AiError};

/// Parse the model's response into a structured scan.
///
/// Individual analytes and uncertainty notes that fail to deserialize are
/// dropped rather than failing the whole scan; a response that is not a JSON
/// object at all is an error and sends the orchestrator to the next tier.
pub fn parse_scan_response(response: &str) -> Result<DocumentScan, AiError> {
    #[derive(Deserialize)]
    struct RawScan {
        lab_name: Option<String>,
        report_date: Option<String>,
        analytes: Option<Vec<serde_json::Value>>,
        uncertainties: Option<Vec<serde_json::Value>>,
    }

    let raw: RawScan = serde_json::from_str(extract_json_block(response))
        .map_err(|e| AiError::JsonParsing(e.to_string()))?;

    Ok(DocumentScan {
        lab_name: raw.lab_name,
        report_date: raw.report_date,
        analytes: parse_array_lenient::<ScannedAnalyte>(raw.analytes.as_deref()),
        uncertainties: parse_array_lenient::<String>(raw.uncertainties.as_deref()),
    })
}

/// Parse an array leniently — skip items that fail to deserialize.
fn parse_array_lenient<T: for<'de> Deserialize<'de>>(items: Option<&[serde_json::Value]>) -> Vec<T> {
    match items {
        None => vec![],
        Some(arr) => arr
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_object() {
        let scan = parse_scan_response(
            r#"{"lab_name": "Central Lab", "report_date": null, "analytes": [], "uncertainties": []}"#,
        )
        .unwrap();
        assert_eq!(scan.lab_name.as_deref(), Some("Central Lab"));
        assert!(scan.report_date.is_none());
    }

    #[test]
    fn parses_fenced_json() {
        let response = "Here you go:\n```json\n{\"lab_name\": \"Central Lab\"}\n```\nDone.";
        let scan = parse_scan_response(response).unwrap();
        assert_eq!(scan.lab_name.as_deref(), Some("Central Lab"));
    }

    #[test]
    fn malformed_items_are_dropped_not_fatal() {
        let scan = parse_scan_response(
            r#"{"analytes": [
                {"name": "glucose", "value": 95},
                "not an object",
                {"name": "hdl", "value": "45"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(scan.analytes.len(), 2);
        assert_eq!(scan.analytes[0].name.as_deref(), Some("glucose"));
    }

    #[test]
    fn non_json_response_is_an_error() {
        assert!(parse_scan_response("I could not read the document.").is_err());
        assert!(parse_scan_response("").is_err());
    }

    #[test]
    fn empty_object_parses_to_empty_scan() {
        let scan = parse_scan_response("{}").unwrap();
        assert!(scan.analytes.is_empty());
        assert!(scan.uncertainties.is_empty());
    }
}
