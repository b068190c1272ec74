use serde::{Deserialize, Serialize};

use super::prompt::INSIGHTS_PROMPT;
use super::types::{
    default_payload, ActionItem, InsightPayload, KeyResult, RecommendedTest, Triage, DISCLAIMER,
};
use crate::models::enums::ResultFlag;
use crate::pipeline::ai::{extract_json_block, AiError, ChatClient};

/// Confidence attached to deterministically computed key results.
const FALLBACK_CONFIDENCE: f64 = 0.4;

/// Numeric view of one persisted result, handed to insight generation.
#[derive(Debug, Clone, Serialize)]
pub struct ResultPayload {
    pub analyte: String,
    pub value: f64,
    pub unit: Option<String>,
    pub ref_min: Option<f64>,
    pub ref_max: Option<f64>,
    pub flag: ResultFlag,
    pub measured_at: String,
}

/// Produce the insight payload for a report's results.
///
/// Zero results yield the fixed default payload; without a configured AI
/// client the deterministic summary is computed; with one, any failure of
/// the service call or its response silently degrades to that same summary.
pub fn generate_insights(
    client: Option<&dyn ChatClient>,
    results: &[ResultPayload],
) -> InsightPayload {
    if results.is_empty() {
        return default_payload();
    }
    let Some(client) = client else {
        return fallback_insights(results);
    };
    match ai_insights(client, results) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "AI insight generation failed; using deterministic summary");
            fallback_insights(results)
        }
    }
}

/// Deterministic interpretation: highlight out-of-range results (or the
/// first three when everything is in range) and raise triage to priority
/// when anything is abnormal.
fn fallback_insights(results: &[ResultPayload]) -> InsightPayload {
    let flagged: Vec<&ResultPayload> = results
        .iter()
        .filter(|r| matches!(r.flag, ResultFlag::High | ResultFlag::Low))
        .collect();
    let highlights: Vec<&ResultPayload> = if flagged.is_empty() {
        results.iter().take(3).collect()
    } else {
        flagged.clone()
    };

    let mut explanation =
        "Se analizaron los valores disponibles y se resaltan aquellos fuera del rango de referencia."
            .to_string();
    let mut recommended_tests = Vec::new();
    let mut actions = Vec::new();
    let mut triage = Triage::Routine;

    if !flagged.is_empty() {
        explanation = "Se detectaron valores fuera del rango de referencia; considera consultar a tu médico para orientación personalizada.".into();
        triage = Triage::Priority;
        for item in &flagged {
            recommended_tests.push(RecommendedTest {
                test: item.analyte.clone(),
                why: "Verificar la tendencia del analito.".into(),
            });
            actions.push(ActionItem {
                action: format!(
                    "Comenta el resultado de {} con tu profesional de salud",
                    item.analyte
                ),
                why: "Es importante confirmar si se requieren estudios adicionales.".into(),
                kind: "medical_followup".into(),
            });
        }
    }

    InsightPayload {
        key_results: highlights.iter().map(|r| format_key_result(r)).collect(),
        explanation,
        recommended_tests,
        actions,
        triage,
        uncertainties: vec![],
        disclaimer: DISCLAIMER.into(),
    }
}

fn format_key_result(result: &ResultPayload) -> KeyResult {
    let ref_range = match (result.ref_min, result.ref_max) {
        (Some(min), Some(max)) => {
            let unit = result.unit.as_deref().unwrap_or("");
            Some(format!("{min} - {max} {unit}").trim_end().to_string())
        }
        _ => None,
    };
    let reason = match result.flag {
        ResultFlag::Normal => "Valor dentro del rango esperado.",
        ResultFlag::NotAvailable => "Sin intervalo de referencia registrado.",
        _ => "Valor fuera del intervalo de referencia registrado.",
    };

    KeyResult {
        analyte: result.analyte.clone(),
        value: serde_json::json!(result.value),
        unit: result.unit.clone(),
        ref_range,
        status: result.flag.as_str().to_string(),
        reason: reason.into(),
        confidence: FALLBACK_CONFIDENCE,
    }
}

fn ai_insights(
    client: &dyn ChatClient,
    results: &[ResultPayload],
) -> Result<InsightPayload, AiError> {
    let user = serde_json::json!({ "results": results }).to_string();
    let response = client.complete(INSIGHTS_PROMPT, &user, 0.4)?;
    parse_insight_response(&response)
}

/// Shape-validate the model's response. Malformed list items are dropped;
/// missing scalar fields take schema defaults; a response that is not a
/// JSON object is an error (and triggers the deterministic fallback).
fn parse_insight_response(response: &str) -> Result<InsightPayload, AiError> {
    #[derive(Deserialize)]
    struct RawInsight {
        #[serde(default)]
        key_results: Vec<serde_json::Value>,
        #[serde(default)]
        explanation: String,
        #[serde(default)]
        recommended_tests: Vec<serde_json::Value>,
        #[serde(default)]
        actions: Vec<serde_json::Value>,
        triage: Option<String>,
        #[serde(default)]
        uncertainties: Vec<serde_json::Value>,
        disclaimer: Option<String>,
    }

    let raw: RawInsight = serde_json::from_str(extract_json_block(response))
        .map_err(|e| AiError::JsonParsing(e.to_string()))?;

    let triage = match raw.triage.as_deref() {
        Some("priority") => Triage::Priority,
        Some("urgent") => Triage::Urgent,
        _ => Triage::Routine,
    };

    Ok(InsightPayload {
        key_results: parse_array_lenient::<KeyResult>(&raw.key_results),
        explanation: raw.explanation,
        recommended_tests: parse_array_lenient::<RecommendedTest>(&raw.recommended_tests),
        actions: parse_array_lenient::<ActionItem>(&raw.actions),
        triage,
        uncertainties: raw
            .uncertainties
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        disclaimer: raw.disclaimer.unwrap_or_else(|| DISCLAIMER.into()),
    })
}

fn parse_array_lenient<T: for<'de> Deserialize<'de>>(items: &[serde_json::Value]) -> Vec<T> {
    items
        .iter()
        .filter_map(|v| serde_json::from_value(v.clone()).ok())
        .collect()
}
