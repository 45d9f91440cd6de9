//! Demo HTTP service wired to a [`Logger`]
//!
//! Handlers log with request context; an access-log middleware logs every
//! response with the `x-request-id` assigned by `tower-http`.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use super::context::{InboundRequest, RequestIdResponse};
use super::extract::RequestTrace;
use crate::domain::models::{field, Field};
use crate::domain::ports::TraceContext;
use crate::infrastructure::logging::Logger;

/// State shared with every handler
#[derive(Clone, Debug)]
pub struct AppState {
    /// Logger used by handlers and the access log
    pub logger: Logger,
}

/// Build the demo router
///
/// Layer order (outermost first): access log, request-id assignment,
/// request-id propagation onto the response.
pub fn router(logger: Logger) -> Router {
    let state = AppState { logger };

    Router::new()
        .route("/hello", get(hello))
        .route("/work", get(work))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(middleware::from_fn_with_state(state.clone(), access_log))
        .with_state(state)
}

async fn hello(State(state): State<AppState>, headers: HeaderMap) -> &'static str {
    let ctx = InboundRequest::new(&headers);
    state.logger.info(Some(&ctx), "hello requested", &[]);
    "hello\n"
}

async fn work(State(state): State<AppState>, trace: RequestTrace) -> String {
    state
        .logger
        .debug(Some(&trace), "work started", &[field("step", "begin")]);
    format!("{}\n", trace.trace_id())
}

async fn health(State(state): State<AppState>) -> &'static str {
    state.logger.debug(None, "health check", &[]);
    "ok\n"
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn access_log(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let ctx = RequestIdResponse::new(&response);
    let fields = [
        field("method", method),
        field("path", path),
        field("status", status.as_u16()),
        Field::duration("latency", started.elapsed()),
    ];
    if status.is_server_error() {
        state.logger.error(Some(&ctx), "request failed", &fields);
    } else {
        state.logger.info(Some(&ctx), "request completed", &fields);
    }

    response
}

/// Serve the demo router on `listener` until Ctrl-C
pub async fn serve(listener: TcpListener, logger: Logger) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    logger.info(None, "listening", &[field("addr", addr.to_string())]);

    axum::serve(listener, router(logger.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    logger.info(None, "server stopped", &[]);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("failed to listen for ctrl-c: {e}");
    }
}
