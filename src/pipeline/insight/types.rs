use serde::{Deserialize, Serialize};

/// Urgency classification of a report's findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Triage {
    Routine,
    Priority,
    Urgent,
}

/// Fully-populated interpretation of one report. Substituted wholesale with
/// the default payload when generation is impossible, never partially merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightPayload {
    pub key_results: Vec<KeyResult>,
    pub explanation: String,
    pub recommended_tests: Vec<RecommendedTest>,
    pub actions: Vec<ActionItem>,
    pub triage: Triage,
    pub uncertainties: Vec<String>,
    pub disclaimer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyResult {
    pub analyte: String,
    /// String or number, per the response schema.
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub ref_range: Option<String>,
    /// One of low|normal|high|critical|not_available.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedTest {
    pub test: String,
    #[serde(default)]
    pub why: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub action: String,
    #[serde(default)]
    pub why: String,
    /// "lifestyle" or "medical_followup".
    #[serde(rename = "type", default)]
    pub kind: String,
}

pub const DISCLAIMER: &str =
    "La información presentada no reemplaza la valoración de un profesional de la salud.";

/// The fixed payload returned when a report has no results at all.
pub fn default_payload() -> InsightPayload {
    InsightPayload {
        key_results: vec![],
        explanation: "No se generaron hallazgos adicionales para este reporte.".into(),
        recommended_tests: vec![],
        actions: vec![],
        triage: Triage::Routine,
        uncertainties: vec![],
        disclaimer: DISCLAIMER.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triage_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Triage::Priority).unwrap(), "\"priority\"");
        assert_eq!(
            serde_json::from_str::<Triage>("\"urgent\"").unwrap(),
            Triage::Urgent
        );
    }

    #[test]
    fn default_payload_is_routine_and_empty() {
        let payload = default_payload();
        assert_eq!(payload.triage, Triage::Routine);
        assert!(payload.key_results.is_empty());
        assert!(payload.recommended_tests.is_empty());
        assert!(payload.actions.is_empty());
        assert!(!payload.disclaimer.is_empty());
    }

    #[test]
    fn action_item_serializes_kind_as_type() {
        let action = ActionItem {
            action: "Descansa".into(),
            why: "Porque sí".into(),
            kind: "lifestyle".into(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "lifestyle");
    }
}
