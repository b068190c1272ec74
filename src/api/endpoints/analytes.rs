//! Analyte catalog endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db::repository::{get_analyte_by_name, insert_analyte, list_analytes};
use crate::models::Analyte;

#[derive(Deserialize)]
pub struct CreateAnalyteRequest {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub description: String,
}

/// `GET /api/analytes`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(_auth): Extension<AuthContext>,
) -> Result<Json<Vec<Analyte>>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(list_analytes(&conn)?))
}

/// `POST /api/analytes` — clinical roles only.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateAnalyteRequest>,
) -> Result<(StatusCode, Json<Analyte>), ApiError> {
    if !auth.role.is_clinical() {
        return Err(ApiError::Forbidden(
            "Only medical staff can add analytes.".into(),
        ));
    }
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required.".into()));
    }

    let conn = ctx.open_db()?;
    if get_analyte_by_name(&conn, &name)?.is_some() {
        return Err(ApiError::BadRequest("Analyte already exists.".into()));
    }
    let analyte = Analyte {
        id: Uuid::new_v4(),
        name,
        unit: req.unit,
        description: req.description,
    };
    insert_analyte(&conn, &analyte)?;
    Ok((StatusCode::CREATED, Json(analyte)))
}
