//! Report endpoints. `POST /api/reports/upload` drives the whole ingestion
//! pipeline: parse → persist report → materialize results → generate
//! insights; the response carries the serialized report with nested results
//! and the insight payload.

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::can_access_patient;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db::repository::{
    delete_report, first_patient_for_user, get_patient, get_report, insert_report, list_analytes,
    list_reports, list_reports_for_patient, list_reports_for_user, list_results_for_report,
    update_report_insights,
};
use crate::models::{Report, ResultValue};
use crate::pipeline::insight::generate_insights;
use crate::pipeline::{materialize_results, to_result_payloads, DocumentParser, MaterializedResult};

#[derive(Deserialize)]
pub struct ReportsQuery {
    pub mine: Option<String>,
    pub patient_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct ResultView {
    pub id: Uuid,
    pub analyte: String,
    pub value: f64,
    pub unit: String,
    pub ref_min: Option<f64>,
    pub ref_max: Option<f64>,
    pub flag: String,
    pub measured_at: String,
}

#[derive(Serialize)]
pub struct ReportView {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub org_name: String,
    pub issued_at: String,
    pub pdf_path: Option<String>,
    pub parsed_fields: serde_json::Value,
    pub insights: serde_json::Value,
    pub analysis_generated_at: Option<String>,
    pub created_at: String,
    pub results: Vec<ResultView>,
}

/// `POST /api/reports/upload` — multipart PDF upload for the caller's own
/// patient profile. The only errors that surface are the two validation
/// cases (non-PDF content type, missing patient profile); every pipeline
/// degradation still yields a 201 with at least one result.
pub async fn upload(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ReportView>), ApiError> {
    let mut upload: Option<(Vec<u8>, String, String)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("pdf") {
            let filename = field.file_name().unwrap_or("upload.pdf").to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;
            upload = Some((bytes.to_vec(), filename, content_type));
        }
    }

    let (bytes, filename, content_type) =
        upload.ok_or_else(|| ApiError::BadRequest("Missing 'pdf' file field.".into()))?;
    if !content_type.to_lowercase().contains("pdf") {
        return Err(ApiError::BadRequest("Uploaded file must be a PDF.".into()));
    }

    // The pipeline is synchronous (blocking HTTP + SQLite); run it off the
    // async executor.
    let view = tokio::task::spawn_blocking(move || {
        process_upload(&ctx, auth.user_id, &bytes, &filename, &content_type)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Synchronous upload flow, one request-scoped pipeline execution.
pub(crate) fn process_upload(
    ctx: &ApiContext,
    user_id: Uuid,
    bytes: &[u8],
    filename: &str,
    content_type: &str,
) -> Result<ReportView, ApiError> {
    let conn = ctx.open_db()?;
    let patient = first_patient_for_user(&conn, &user_id)?.ok_or_else(|| {
        ApiError::BadRequest("Please create a patient profile before uploading reports.".into())
    })?;

    let parser = DocumentParser {
        catalog: &ctx.catalog,
        vision: ctx.ai_client(),
        tz: ctx.config.report_tz,
    };
    let payload = parser.parse(bytes, filename);

    let report_id = Uuid::new_v4();
    let pdf_path = store_pdf(ctx, &patient.id, &report_id, bytes);

    let report = Report {
        id: report_id,
        patient_id: patient.id,
        org_name: payload.lab_name.clone(),
        issued_at: payload.report_date,
        pdf_path,
        raw_json: serde_json::json!({
            "filename": filename,
            "size": bytes.len(),
            "content_type": content_type,
            "raw_text": payload.raw_text,
        }),
        parsed_fields: serde_json::to_value(&payload)
            .map_err(|e| ApiError::Internal(e.to_string()))?,
        insights: serde_json::json!({}),
        analysis_generated_at: None,
        created_at: Utc::now(),
    };
    insert_report(&conn, &report)?;

    let persisted = materialize_results(&conn, &report, &payload.analytes)?;

    let insights = generate_insights(ctx.ai_client(), &to_result_payloads(&persisted));
    let insights_json =
        serde_json::to_value(&insights).map_err(|e| ApiError::Internal(e.to_string()))?;
    let generated_at = Utc::now().with_timezone(&ctx.config.report_tz);
    update_report_insights(&conn, &report.id, &insights_json, generated_at)?;

    tracing::info!(
        report_id = %report.id,
        patient_id = %patient.id,
        results = persisted.len(),
        summary = %payload.summary,
        "report ingested"
    );

    Ok(materialized_view(report, insights_json, generated_at, &persisted))
}

/// Write the original PDF under the data directory. Storage failure degrades
/// to a report without a stored file rather than failing the upload.
fn store_pdf(ctx: &ApiContext, patient_id: &Uuid, report_id: &Uuid, bytes: &[u8]) -> Option<String> {
    let dir = ctx.config.reports_dir().join(patient_id.to_string());
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(error = %e, "could not create report storage directory");
        return None;
    }
    let relative = format!("reports/{patient_id}/{report_id}.pdf");
    match std::fs::write(dir.join(format!("{report_id}.pdf")), bytes) {
        Ok(()) => Some(relative),
        Err(e) => {
            tracing::warn!(error = %e, "could not store uploaded PDF");
            None
        }
    }
}

fn materialized_view(
    mut report: Report,
    insights: serde_json::Value,
    generated_at: chrono::DateTime<chrono::FixedOffset>,
    persisted: &[MaterializedResult],
) -> ReportView {
    report.insights = insights;
    report.analysis_generated_at = Some(generated_at);
    let results = persisted
        .iter()
        .map(|m| result_view(&m.analyte_name, &m.result))
        .collect();
    view_with_results(report, results)
}

fn result_view(analyte_name: &str, result: &ResultValue) -> ResultView {
    ResultView {
        id: result.id,
        analyte: analyte_name.to_string(),
        value: result.value,
        unit: result.unit.clone(),
        ref_min: result.ref_min,
        ref_max: result.ref_max,
        flag: result.flag.as_str().to_string(),
        measured_at: result.measured_at.to_rfc3339(),
    }
}

fn view_with_results(report: Report, results: Vec<ResultView>) -> ReportView {
    ReportView {
        id: report.id,
        patient_id: report.patient_id,
        org_name: report.org_name,
        issued_at: report.issued_at.to_rfc3339(),
        pdf_path: report.pdf_path,
        parsed_fields: report.parsed_fields,
        insights: report.insights,
        analysis_generated_at: report.analysis_generated_at.map(|dt| dt.to_rfc3339()),
        created_at: report.created_at.to_rfc3339(),
        results,
    }
}

/// Load a stored report with its named results.
fn load_view(
    conn: &rusqlite::Connection,
    report: Report,
) -> Result<ReportView, ApiError> {
    let results = list_results_for_report(conn, &report.id)?;
    let names: HashMap<Uuid, String> = list_analytes(conn)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();
    let results = results
        .iter()
        .map(|r| {
            let name = names
                .get(&r.analyte_id)
                .cloned()
                .unwrap_or_else(|| "unknown".to_string());
            result_view(&name, r)
        })
        .collect();
    Ok(view_with_results(report, results))
}

/// `GET /api/reports` — `mine` and `patient_id` filters, role-scoped.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ReportsQuery>,
) -> Result<Json<Vec<ReportView>>, ApiError> {
    let conn = ctx.open_db()?;
    let mine = matches!(query.mine.as_deref(), Some("true") | Some("1") | Some("yes"));

    let reports = if mine || !auth.role.is_clinical() {
        let mut reports = list_reports_for_user(&conn, &auth.user_id)?;
        if let Some(patient_id) = query.patient_id {
            reports.retain(|r| r.patient_id == patient_id);
        }
        reports
    } else if let Some(patient_id) = query.patient_id {
        list_reports_for_patient(&conn, &patient_id)?
    } else {
        list_reports(&conn)?
    };

    reports
        .into_iter()
        .map(|report| load_view(&conn, report))
        .collect::<Result<Vec<_>, _>>()
        .map(Json)
}

/// `GET /api/reports/:id` — owner-or-clinical.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportView>, ApiError> {
    let conn = ctx.open_db()?;
    let report = authorized_report(&conn, &auth, &id)?;
    load_view(&conn, report).map(Json)
}

/// `DELETE /api/reports/:id` — owner-or-clinical; removes the stored PDF too.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.open_db()?;
    let report = authorized_report(&conn, &auth, &id)?;

    if let Some(rel) = &report.pdf_path {
        if let Err(e) = std::fs::remove_file(ctx.config.data_dir.join(rel)) {
            tracing::warn!(error = %e, "could not remove stored PDF");
        }
    }
    delete_report(&conn, &report.id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/reports/:id/download` — the stored PDF, inline.
pub async fn download(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let conn = ctx.open_db()?;
    let report = authorized_report(&conn, &auth, &id)?;

    let rel = report
        .pdf_path
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("Archivo no disponible.".into()))?;
    let bytes = std::fs::read(ctx.config.data_dir.join(rel))
        .map_err(|_| ApiError::NotFound("Archivo no disponible.".into()))?;

    let filename = rel.rsplit('/').next().unwrap_or("report.pdf");
    Response::builder()
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{filename}\""),
        )
        .body(Body::from(bytes))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

fn authorized_report(
    conn: &rusqlite::Connection,
    auth: &AuthContext,
    id: &Uuid,
) -> Result<Report, ApiError> {
    let report =
        get_report(conn, id)?.ok_or_else(|| ApiError::NotFound("Report not found".into()))?;
    let patient = get_patient(conn, &report.patient_id)?
        .ok_or_else(|| ApiError::NotFound("Patient not found".into()))?;
    if !can_access_patient(auth, &patient) {
        return Err(ApiError::Forbidden("You cannot access this report.".into()));
    }
    Ok(report)
}
