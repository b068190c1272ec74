use nanolabs::api::server;
use nanolabs::api::types::ApiContext;
use nanolabs::config::{self, Config};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("NanoLabs starting v{}", config::APP_VERSION);

    let config = Config::from_env();
    // The blocking AI client must be constructed before the runtime starts.
    let ctx = ApiContext::new(config);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "failed to start async runtime");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(server::serve(ctx)) {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}
