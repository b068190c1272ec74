//! HTTP server bootstrap.

use std::io;

use tower_http::cors::CorsLayer;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

/// Bind and serve the API until the process is stopped.
///
/// Opens the database once up front so schema problems fail at startup
/// rather than at the first request.
pub async fn serve(ctx: ApiContext) -> io::Result<()> {
    std::fs::create_dir_all(&ctx.config.data_dir)?;
    ctx.open_db()
        .map_err(|e| io::Error::other(format!("database initialization failed: {e}")))?;

    let app = api_router(ctx.clone()).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(ctx.config.bind_addr).await?;
    tracing::info!(
        addr = %ctx.config.bind_addr,
        ai_configured = ctx.ai_client().is_some(),
        "NanoLabs API listening"
    );
    axum::serve(listener, app).await
}
