use axum::http::StatusCode;
use axum::response::Response;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::error::error_response;

const DEFAULT_FILTER: &str = "info,mvc_core=debug,tower_http=debug";

/// Initialise the global `tracing` subscriber with a `fmt` layer.
///
/// Respects `RUST_LOG`, falling back to `info,mvc_core=debug,tower_http=debug`
/// so registered routes show up by default. Calling it a second time is a
/// no-op.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// HTTP request/response tracing with `tower_http`'s default classification.
pub fn default_trace() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

/// Turns a panicking handler into a JSON 500 response.
pub fn catch_panic_layer() -> CatchPanicLayer<fn(Box<dyn std::any::Any + Send>) -> Response> {
    CatchPanicLayer::custom(panic_handler as fn(_) -> _)
}

fn panic_handler(err: Box<dyn std::any::Any + Send>) -> Response {
    let detail = err
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| err.downcast_ref::<String>().cloned());
    tracing::error!(
        panic = detail.as_deref().unwrap_or("<non-string payload>"),
        "handler panicked"
    );
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
