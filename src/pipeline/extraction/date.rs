use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

/// Date formats tried in fixed order. Day-first is deliberately tried before
/// month-first, so an ambiguous "01/02/2025" resolves to the day-first
/// reading. This is a configured policy, not locale detection.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Lines carrying these markers describe birth dates and must never be
/// mistaken for the report date.
const EXCLUDED_DATE_HINTS: &[&str] = &["dob", "date of birth", "birth", "nacimiento"];

static DATE_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{1,2}\.\d{1,2}\.\d{2,4})")
        .unwrap()
});

/// Extract the report issuance date from document text.
///
/// Scans line by line, first match wins. Labeled lines ("Report Date: …",
/// "Fecha de reporte: …", lines starting with "date") are parsed from the
/// substring after the last colon; other lines are parsed from the first
/// date-shaped substring they contain. Returns None when no line yields a
/// date — the caller supplies a fallback.
pub fn parse_report_date(text: &str) -> Option<NaiveDateTime> {
    for line in text.lines() {
        let lower = line.to_lowercase();
        if EXCLUDED_DATE_HINTS.iter().any(|hint| lower.contains(hint)) {
            continue;
        }
        if lower.contains("report date")
            || lower.contains("fecha de reporte")
            || lower.starts_with("date")
        {
            let candidate = line.rsplit(':').next().unwrap_or(line).trim();
            if let Some(parsed) = try_formats(candidate) {
                return Some(parsed);
            }
        }
        if let Some(hit) = DATE_HINT.find(line) {
            if let Some(parsed) = try_formats(hit.as_str()) {
                return Some(parsed);
            }
        }
    }
    None
}

fn try_formats(candidate: &str) -> Option<NaiveDateTime> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn parses_labeled_iso_date() {
        let parsed = parse_report_date("Some header\nReport Date: 2025-11-05").unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2025, 11, 5).unwrap());
    }

    #[test]
    fn parses_labeled_slash_date() {
        let parsed = parse_report_date("Some header\nReport Date: 11/05/2025").unwrap();
        assert_eq!(parsed.year(), 2025);
    }

    #[test]
    fn day_first_wins_for_ambiguous_dates() {
        let parsed = parse_report_date("Report Date: 01/02/2025").unwrap();
        // 1 February, not 2 January
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    }

    #[test]
    fn spanish_label_recognized() {
        let parsed = parse_report_date("Fecha de reporte: 05.11.2025").unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2025, 11, 5).unwrap());
    }

    #[test]
    fn birth_date_lines_are_never_returned() {
        let text = "DOB: 01/01/1980\nFecha de nacimiento: 02/02/1985\nReport Date: 2025-11-05";
        let parsed = parse_report_date(text).unwrap();
        assert_eq!(parsed.year(), 2025);
    }

    #[test]
    fn unlabeled_date_shaped_substring_is_used() {
        let parsed = parse_report_date("Collected on 05/11/2025 at main campus").unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2025, 11, 5).unwrap());
    }

    #[test]
    fn no_date_returns_none() {
        assert!(parse_report_date("").is_none());
        assert!(parse_report_date("Glucose 95 mg/dL").is_none());
        assert!(parse_report_date("DOB: 2000-01-01").is_none());
    }

    #[test]
    fn first_matching_line_wins() {
        let text = "Report Date: 2025-03-01\nDate: 2024-01-01";
        let parsed = parse_report_date(text).unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }
}
