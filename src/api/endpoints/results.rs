//! Raw result listing, role-scoped.

use axum::extract::State;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db::repository::{list_results, list_results_for_user};
use crate::models::ResultValue;

/// `GET /api/results` — clinical roles see everything; patients see results
/// from their own reports only.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<ResultValue>>, ApiError> {
    let conn = ctx.open_db()?;
    let results = if auth.role.is_clinical() {
        list_results(&conn)?
    } else {
        list_results_for_user(&conn, &auth.user_id)?
    };
    Ok(Json(results))
}
