//! `GET /api/trends` — per-analyte time series for charting.

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::can_access_patient;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db::repository::{get_patient, list_trend_points, TrendScope};

/// Default analyte keys with display labels.
const DEFAULT_TRENDS: &[(&str, &str)] = &[
    ("glucose", "Glucosa"),
    ("hemoglobin", "Hemoglobina"),
    ("cholesterol_total", "Colesterol total"),
    ("hdl", "HDL"),
    ("ldl", "LDL"),
    ("triglycerides", "Triglicéridos"),
];

#[derive(Deserialize)]
pub struct TrendsQuery {
    /// Comma-separated analyte names; defaults to the standard panel.
    pub analytes: Option<String>,
    pub patient_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct TrendsResponse {
    pub analytes: Vec<TrendSeries>,
}

#[derive(Serialize)]
pub struct TrendSeries {
    pub key: String,
    pub label: String,
    pub unit: Option<String>,
    pub points: Vec<TrendPointView>,
}

#[derive(Serialize)]
pub struct TrendPointView {
    pub value: f64,
    pub unit: String,
    pub ref_min: Option<f64>,
    pub ref_max: Option<f64>,
    pub flag: String,
    pub measured_at: String,
    pub report_id: String,
    pub report_issued_at: String,
}

pub async fn series(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TrendsQuery>,
) -> Result<Json<TrendsResponse>, ApiError> {
    let names: Vec<String> = match &query.analytes {
        None => DEFAULT_TRENDS.iter().map(|(k, _)| k.to_string()).collect(),
        Some(param) => param
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    };
    if names.is_empty() {
        return Ok(Json(TrendsResponse { analytes: vec![] }));
    }

    let conn = ctx.open_db()?;
    let scope = match query.patient_id {
        Some(patient_id) => {
            let patient = get_patient(&conn, &patient_id)?
                .ok_or_else(|| ApiError::NotFound("Patient not found".into()))?;
            if !can_access_patient(&auth, &patient) {
                return Err(ApiError::Forbidden(
                    "You cannot access this patient's data.".into(),
                ));
            }
            TrendScope::Patient(patient_id)
        }
        None => TrendScope::User(auth.user_id),
    };

    let points = list_trend_points(&conn, &names, &scope)?;

    // Group into one series per analyte, keeping point order from the query.
    let mut series: BTreeMap<String, TrendSeries> = BTreeMap::new();
    for point in points {
        let entry = series
            .entry(point.analyte_name.clone())
            .or_insert_with(|| TrendSeries {
                key: point.analyte_name.clone(),
                label: label_for(&point.analyte_name),
                unit: None,
                points: vec![],
            });
        if entry.unit.is_none() {
            let unit = if point.unit.is_empty() {
                point.analyte_unit.clone()
            } else {
                point.unit.clone()
            };
            entry.unit = Some(unit).filter(|u| !u.is_empty());
        }
        entry.points.push(TrendPointView {
            value: point.value,
            unit: point.unit,
            ref_min: point.ref_min,
            ref_max: point.ref_max,
            flag: point.flag,
            measured_at: point.measured_at,
            report_id: point.report_id,
            report_issued_at: point.report_issued_at,
        });
    }

    Ok(Json(TrendsResponse {
        analytes: series.into_values().filter(|s| !s.points.is_empty()).collect(),
    }))
}

fn label_for(key: &str) -> String {
    DEFAULT_TRENDS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| {
            // Title-case the key: "uric_acid" → "Uric Acid".
            key.split('_')
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
}
