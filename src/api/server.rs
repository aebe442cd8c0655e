use std::any::Any;
use std::sync::Arc;

use axum::{Router, extract::Request, middleware, response::IntoResponse, response::Response};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer, decompression::RequestDecompressionLayer, trace::TraceLayer,
};
use tracing::{error, info, info_span};
use uuid::Uuid;

use super::{
    error::ApiError,
    headers::{ResponseHeaders, apply_policy},
    services::dispatch,
    state::AppState,
};
use crate::config::Config;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Build the proxy router. Every request goes through [`dispatch`]; the route table
/// decides the handler.
pub fn router(state: AppState) -> Router {
    let headers = Arc::clone(&state.headers);
    with_layers(Router::new().fallback(dispatch).with_state(state), headers)
}

fn with_layers(router: Router, headers: Arc<ResponseHeaders>) -> Router {
    router
        // A panicking handler still answers with a 500 envelope
        .layer(CatchPanicLayer::custom(panic_response))
        // CORS and cache directives on every response, including panics
        .layer(middleware::from_fn_with_state(headers, apply_policy))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            info_span!(
                "request",
                request_id = %Uuid::now_v7(),
                method = %request.method(),
                path = request.uri().path(),
            )
        }))
        // Automatically decompress gzip request bodies
        .layer(RequestDecompressionLayer::new())
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };

    error!(%detail, "Handler panicked");
    ApiError::Internal(detail).into_response()
}

/// Serve until Ctrl+C or SIGTERM, then wait for pending cache writes
pub async fn run(config: Config) -> Result<(), AnyError> {
    let address = config.server.bind_addr;
    let state = AppState::from_config(config)?;
    let upstream = Arc::clone(&state.upstream);

    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, mode = ?upstream.mode(), "canoegate listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(
        pending = upstream.pending_writes(),
        "Draining background cache writes"
    );
    upstream.drain_background().await;

    let metrics = upstream.metrics().snapshot();
    info!(?metrics, "Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
