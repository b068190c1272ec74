//! API router. Composable `Router` mounted under `/api/`.
//!
//! All routes require bearer-token auth except register, login, and health.
//! Middleware uses `Extension<ApiContext>` (injected as the outermost
//! layer); endpoint handlers use `State<ApiContext>`.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Maximum upload request size (16 MB).
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub fn api_router(ctx: ApiContext) -> Router {
    let protected = Router::new()
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route("/patients/:id", get(endpoints::patients::detail))
        .route("/reports", get(endpoints::reports::list))
        .route(
            "/reports/upload",
            post(endpoints::reports::upload)
                .layer::<_, std::convert::Infallible>(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
                .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/reports/:id",
            get(endpoints::reports::detail).delete(endpoints::reports::remove),
        )
        .route("/reports/:id/download", get(endpoints::reports::download))
        .route(
            "/analytes",
            get(endpoints::analytes::list).post(endpoints::analytes::create),
        )
        .route("/results", get(endpoints::results::list))
        .route("/trends", get(endpoints::trends::series))
        .route("/alerts", get(endpoints::alerts::list))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext.
        .layer(axum::Extension(ctx.clone()));

    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/register", post(endpoints::auth::register))
        .route("/auth/login", post(endpoints::auth::login))
        .with_state(ctx.clone())
        .layer(axum::Extension(ctx));

    Router::new().nest("/api", protected).nest("/api", unprotected)
}
