use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;

use super::types::AnalyteReading;
use crate::pipeline::catalog::AnalyteCatalog;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());
static UNIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(mg/dL|g/dL|mmol/L|%)").unwrap());

/// Scan document text for known analyte aliases and adjacent numeric tokens.
///
/// Heuristic, not a guarantee: candidates are not deduplicated — a line
/// matching several aliases, or an analyte appearing on several lines, yields
/// one reading per match. Per matching line the first number is the value;
/// with three or more numbers the second and third override the default
/// reference range, with exactly two only the upper bound is overridden.
pub fn extract_readings(
    text: &str,
    catalog: &AnalyteCatalog,
    measured_at: DateTime<FixedOffset>,
) -> Vec<AnalyteReading> {
    let mut matched = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let normalized = line.to_lowercase();
        for spec in catalog.entries() {
            if !spec
                .aliases
                .iter()
                .any(|alias| normalized.contains(alias.as_str()))
            {
                continue;
            }
            let numbers = parse_number_sequence(line);
            if numbers.is_empty() {
                continue;
            }

            let unit = UNIT
                .find(line)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| spec.unit.clone());
            let value = numbers[0];
            let (mut ref_min, mut ref_max) = (spec.ref_min, spec.ref_max);
            if numbers.len() >= 3 {
                ref_min = numbers[1];
                ref_max = numbers[2];
            } else if numbers.len() == 2 {
                ref_max = numbers[1];
            }

            matched.push(AnalyteReading {
                name: spec.name.clone(),
                value,
                unit: Some(unit),
                ref_min: Some(ref_min),
                ref_max: Some(ref_max),
                method: None,
                measured_at,
                raw_line: Some(line.to_string()),
            });
        }
    }

    matched
}

/// All signed integer or decimal tokens in a line, in appearance order.
pub fn parse_number_sequence(line: &str) -> Vec<f64> {
    NUMBER
        .find_iter(line)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}
