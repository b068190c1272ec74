//! Patient profile endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::can_access_patient;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db::repository::{get_patient, insert_patient, list_patients, list_patients_for_user};
use crate::models::enums::{Role, Sex};
use crate::models::Patient;

#[derive(Deserialize)]
pub struct PatientsQuery {
    pub mine: Option<String>,
}

#[derive(Deserialize)]
pub struct CreatePatientRequest {
    pub name: String,
    /// "M", "F", or "O".
    pub sex: String,
    /// ISO date, e.g. "1990-04-12".
    pub birth_date: String,
}

fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some("true") | Some("1") | Some("yes"))
}

/// `GET /api/patients` — own profiles, or all of them for clinical roles.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<PatientsQuery>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let conn = ctx.open_db()?;
    let patients = if is_truthy(query.mine.as_deref()) || !auth.role.is_clinical() {
        list_patients_for_user(&conn, &auth.user_id)?
    } else {
        list_patients(&conn)?
    };
    Ok(Json(patients))
}

/// `POST /api/patients` — patient accounts create profiles linked to
/// themselves; clinical roles create unlinked profiles.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required.".into()));
    }
    let sex: Sex = req
        .sex
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown sex: {}", req.sex)))?;
    let birth_date = NaiveDate::parse_from_str(&req.birth_date, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest("birth_date must be YYYY-MM-DD.".into()))?;

    let patient = Patient {
        id: Uuid::new_v4(),
        user_id: (auth.role == Role::Patient).then_some(auth.user_id),
        name,
        sex,
        birth_date,
        created_at: Utc::now(),
    };

    let conn = ctx.open_db()?;
    insert_patient(&conn, &patient)?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `GET /api/patients/:id` — owner-or-clinical.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.open_db()?;
    let patient = get_patient(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Patient not found".into()))?;
    if !can_access_patient(&auth, &patient) {
        return Err(ApiError::Forbidden(
            "You cannot access this patient's data.".into(),
        ));
    }
    Ok(Json(patient))
}
