use chrono::{DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::date::parse_report_date;
use super::fallback::generate_fallback_readings;
use super::pdf::extract_text_lossy;
use super::rules::extract_readings;
use super::types::{AnalyteReading, ExtractionPayload};
use crate::pipeline::ai::ChatClient;
use crate::pipeline::catalog::AnalyteCatalog;
use crate::pipeline::vision::{scan_document, DocumentScan};

/// Stored extraction text is capped to bound row size.
const MAX_RAW_TEXT_CHARS: usize = 10_000;
/// Bytes sampled from the head of the upload to seed the synthetic fallback.
const SIGNATURE_BYTES: usize = 128;

pub const DEFAULT_LAB_NAME: &str = "Nano Labs Diagnostics";

/// Sequences the extraction tiers for one uploaded document:
/// text extraction → AI parser (preferred) → rule-based parser → synthetic
/// fallback. The returned payload always carries at least one reading and a
/// timezone-aware report date; no tier failure escapes this type.
pub struct DocumentParser<'a> {
    pub catalog: &'a AnalyteCatalog,
    pub vision: Option<&'a dyn ChatClient>,
    pub tz: FixedOffset,
}

impl DocumentParser<'_> {
    pub fn parse(&self, bytes: &[u8], filename: &str) -> ExtractionPayload {
        let text = extract_text_lossy(bytes);
        let signature =
            String::from_utf8_lossy(&bytes[..bytes.len().min(SIGNATURE_BYTES)]).to_string();
        let seed = if signature.is_empty() {
            filename.to_string()
        } else {
            signature
        };
        let parsed_at = Utc::now().with_timezone(&self.tz);

        // Preferred tier: AI document parser. An empty scan or a failed call
        // both fall through to the rule-based chain.
        if let Some(client) = self.vision {
            match scan_document(client, &text) {
                Ok(scan) if !scan.analytes.is_empty() => {
                    return self.payload_from_scan(scan, &text, &seed, parsed_at);
                }
                Ok(_) => {
                    tracing::debug!("AI parser returned no analytes; using rule-based extraction")
                }
                Err(e) => {
                    tracing::warn!(error = %e, "AI document parsing failed; using rule-based extraction")
                }
            }
        }

        // Rule-based chain, with the synthetic generator as backstop.
        let report_date = parse_report_date(&text)
            .map(|naive| localize(naive, self.tz))
            .unwrap_or(parsed_at);
        let mut analytes = extract_readings(&text, self.catalog, report_date);
        if analytes.is_empty() {
            analytes = generate_fallback_readings(&seed, report_date, self.catalog);
        }

        let summary = if text.is_empty() {
            format!("Stub parser processed {filename}")
        } else {
            format!("Parsed {} analytes from uploaded PDF", analytes.len())
        };

        ExtractionPayload {
            report_date,
            lab_name: scan_lab_name(&text).unwrap_or_else(|| DEFAULT_LAB_NAME.to_string()),
            analytes,
            summary,
            uncertainties: vec![],
            raw_text: truncate_chars(&text, MAX_RAW_TEXT_CHARS),
        }
    }

    /// Build the payload from a populated AI scan: normalize the report date,
    /// coerce every analyte value to a number (dropping those that cannot
    /// be), and regenerate synthetically if that empties the list.
    fn payload_from_scan(
        &self,
        scan: DocumentScan,
        text: &str,
        seed: &str,
        parsed_at: DateTime<FixedOffset>,
    ) -> ExtractionPayload {
        let mut report_date =
            normalize_timestamp(scan.report_date.as_deref(), parsed_at, self.tz);

        let mut analytes: Vec<AnalyteReading> = scan
            .analytes
            .into_iter()
            .filter_map(|item| {
                let value = coerce_number(&item.value)?;
                Some(AnalyteReading {
                    name: item.name.unwrap_or_else(|| "unknown".to_string()),
                    value,
                    unit: item.unit,
                    ref_min: item.ref_min,
                    ref_max: item.ref_max,
                    method: item.method,
                    measured_at: normalize_timestamp(
                        item.measured_at.as_deref(),
                        report_date,
                        self.tz,
                    ),
                    raw_line: item.raw_line,
                })
            })
            .collect();

        if analytes.is_empty() {
            // Every scanned value failed numeric coercion.
            tracing::warn!("AI scan had no usable values; generating synthetic readings");
            analytes = generate_fallback_readings(seed, parsed_at, self.catalog);
            report_date = parsed_at;
        }

        let lab_name = scan
            .lab_name
            .filter(|name| !name.trim().is_empty())
            .or_else(|| scan_lab_name(text))
            .unwrap_or_else(|| DEFAULT_LAB_NAME.to_string());

        ExtractionPayload {
            report_date,
            lab_name,
            summary: format!("AI parser extracted {} analytes.", analytes.len()),
            analytes,
            uncertainties: scan.uncertainties,
            raw_text: truncate_chars(text, MAX_RAW_TEXT_CHARS),
        }
    }
}

/// First line mentioning a lab, as-written, for the report's org name.
fn scan_lab_name(text: &str) -> Option<String> {
    text.lines()
        .find(|line| line.to_lowercase().contains("lab"))
        .map(|line| line.trim().to_string())
}

/// Interpret a naive timestamp in the configured reference timezone.
pub fn localize(naive: NaiveDateTime, tz: FixedOffset) -> DateTime<FixedOffset> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
        // Fixed offsets have no gaps; kept for totality.
        LocalResult::None => DateTime::from_naive_utc_and_offset(naive, tz),
    }
}

/// Normalize an optional ISO-8601 string to a timezone-aware timestamp.
/// Aware inputs keep their offset; naive inputs are interpreted in the
/// reference timezone; absent or unparseable inputs take the fallback.
fn normalize_timestamp(
    value: Option<&str>,
    fallback: DateTime<FixedOffset>,
    tz: FixedOffset,
) -> DateTime<FixedOffset> {
    let Some(raw) = value.map(str::trim).filter(|s| !s.is_empty()) else {
        return fallback;
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt;
    }
    if let Some(naive) = parse_naive_datetime(raw) {
        return localize(naive, tz);
    }
    fallback
}

fn parse_naive_datetime(raw: &str) -> Option<NaiveDateTime> {
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn coerce_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ai::MockChatClient;
    use chrono::{Datelike, Timelike};

    fn tz() -> FixedOffset {
        // UTC-6, the reference timezone the reports are issued in.
        FixedOffset::west_opt(6 * 3600).unwrap()
    }

    fn parser<'a>(
        catalog: &'a AnalyteCatalog,
        vision: Option<&'a dyn ChatClient>,
    ) -> DocumentParser<'a> {
        DocumentParser {
            catalog,
            vision,
            tz: tz(),
        }
    }

    #[test]
    fn non_pdf_bytes_still_produce_readings() {
        let catalog = AnalyteCatalog::bundled();
        let payload = parser(&catalog, None).parse(b"not a pdf at all", "garbage.pdf");
        assert!(!payload.analytes.is_empty());
        assert_eq!(payload.lab_name, DEFAULT_LAB_NAME);
        assert!(payload.summary.contains("Stub parser processed garbage.pdf"));
    }

    #[test]
    fn empty_bytes_seed_fallback_from_filename() {
        let catalog = AnalyteCatalog::bundled();
        let first = parser(&catalog, None).parse(b"", "empty.pdf");
        let second = parser(&catalog, None).parse(b"", "empty.pdf");
        assert_eq!(first.analytes.len(), catalog.len());
        // Same filename seed → identical synthetic values, run to run.
        for (a, b) in first.analytes.iter().zip(&second.analytes) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.value, b.value);
        }
    }

    #[test]
    fn ai_failure_degrades_to_rule_based_extraction() {
        let catalog = AnalyteCatalog::bundled();
        let client = MockChatClient::failing();
        let pdf = super::super::pdf::make_test_pdf(&[
            "Report Date: 2025-11-05",
            "Glucose 95 mg/dL (70-100)",
        ]);
        let payload = parser(&catalog, Some(&client)).parse(&pdf, "labs.pdf");
        assert!(payload.analytes.iter().any(|r| r.name == "glucose"));
        assert_eq!(payload.report_date.date_naive().year(), 2025);
    }

    #[test]
    fn ai_failure_on_unreadable_bytes_still_produces_readings() {
        let catalog = AnalyteCatalog::bundled();
        let client = MockChatClient::failing();
        let payload = parser(&catalog, Some(&client)).parse(b"still not a pdf", "x.pdf");
        assert!(!payload.analytes.is_empty());
    }

    #[test]
    fn ai_scan_with_unparseable_values_falls_back_to_synthetic() {
        let catalog = AnalyteCatalog::bundled();
        let scan = crate::pipeline::vision::parse_scan_response(
            r#"{"analytes": [{"name": "glucose", "value": "unreadable"}]}"#,
        )
        .unwrap();
        let p = parser(&catalog, None);
        let parsed_at = Utc::now().with_timezone(&tz());
        let payload = p.payload_from_scan(scan, "", "seed", parsed_at);
        assert_eq!(payload.analytes.len(), catalog.len());
        assert_eq!(payload.report_date, parsed_at);
        assert!(payload.summary.starts_with("AI parser extracted"));
    }

    #[test]
    fn ai_scan_values_coerce_and_bad_ones_drop() {
        let catalog = AnalyteCatalog::bundled();
        let scan = crate::pipeline::vision::parse_scan_response(
            r#"{
                "lab_name": "Central Clinical Laboratory",
                "report_date": "2025-11-05",
                "analytes": [
                    {"name": "glucose", "value": 95, "unit": "mg/dL", "ref_min": 70, "ref_max": 100},
                    {"name": "hdl", "value": "45.5"},
                    {"name": "ldl", "value": null}
                ],
                "uncertainties": ["LDL value unreadable"]
            }"#,
        )
        .unwrap();
        let p = parser(&catalog, None);
        let parsed_at = Utc::now().with_timezone(&tz());
        let payload = p.payload_from_scan(scan, "", "seed", parsed_at);

        assert_eq!(payload.analytes.len(), 2);
        assert_eq!(payload.analytes[0].value, 95.0);
        assert_eq!(payload.analytes[1].value, 45.5);
        assert_eq!(payload.lab_name, "Central Clinical Laboratory");
        assert_eq!(payload.uncertainties, vec!["LDL value unreadable"]);
        // Date-only report date lands at local midnight in the reference tz.
        assert_eq!(payload.report_date.year(), 2025);
        assert_eq!(payload.report_date.month(), 11);
        assert_eq!(payload.report_date.day(), 5);
        assert_eq!(payload.report_date.hour(), 0);
        assert_eq!(payload.report_date.offset(), &tz());
        // Analytes without their own timestamp inherit the report date.
        assert_eq!(payload.analytes[0].measured_at, payload.report_date);
    }

    #[test]
    fn civil_date_preserved_regardless_of_host_timezone() {
        let naive = NaiveDate::from_ymd_opt(2025, 11, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        for offset_hours in [-11, -6, 0, 5, 13] {
            let tz = FixedOffset::east_opt(offset_hours * 3600).unwrap();
            let localized = localize(naive, tz);
            assert_eq!(localized.date_naive(), naive.date());
        }
    }

    #[test]
    fn aware_timestamps_keep_their_offset() {
        let fallback = Utc::now().with_timezone(&tz());
        let dt = normalize_timestamp(Some("2025-11-05T08:30:00+02:00"), fallback, tz());
        assert_eq!(dt.to_rfc3339(), "2025-11-05T08:30:00+02:00");
    }

    #[test]
    fn unparseable_timestamp_takes_fallback() {
        let fallback = Utc::now().with_timezone(&tz());
        assert_eq!(normalize_timestamp(Some("soon"), fallback, tz()), fallback);
        assert_eq!(normalize_timestamp(None, fallback, tz()), fallback);
        assert_eq!(normalize_timestamp(Some("  "), fallback, tz()), fallback);
    }

    #[test]
    fn coerce_number_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_number(&serde_json::json!(95)), Some(95.0));
        assert_eq!(coerce_number(&serde_json::json!("45.5")), Some(45.5));
        assert_eq!(coerce_number(&serde_json::json!(" 12 ")), Some(12.0));
        assert_eq!(coerce_number(&serde_json::json!(null)), None);
        assert_eq!(coerce_number(&serde_json::json!("n/a")), None);
        assert_eq!(coerce_number(&serde_json::json!([1])), None);
    }

    #[test]
    fn lab_name_scanned_from_text_when_ai_omits_it() {
        let catalog = AnalyteCatalog::bundled();
        let scan = crate::pipeline::vision::parse_scan_response(
            r#"{"lab_name": "  ", "analytes": [{"name": "glucose", "value": 95}]}"#,
        )
        .unwrap();
        let p = parser(&catalog, None);
        let parsed_at = Utc::now().with_timezone(&tz());
        let payload = p.payload_from_scan(
            scan,
            "ACME Laboratory Services\nGlucose 95",
            "seed",
            parsed_at,
        );
        assert_eq!(payload.lab_name, "ACME Laboratory Services");
    }
}
