//! Alert listing, role-scoped.

use axum::extract::State;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db::repository::{list_alerts, list_alerts_for_user};
use crate::models::Alert;

/// `GET /api/alerts` — clinical roles see everything; patients see alerts
/// attached to their own profiles or reports.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Alert>>, ApiError> {
    let conn = ctx.open_db()?;
    let alerts = if auth.role.is_clinical() {
        list_alerts(&conn)?
    } else {
        list_alerts_for_user(&conn, &auth.user_id)?
    };
    Ok(Json(alerts))
}
