//! HTTP integration
//!
//! Adapters that pull a trace id out of `http` requests and responses,
//! an `axum` extractor, and a small demo service.

pub mod context;
pub mod extract;
pub mod routes;

pub use context::{
    HeaderContext, InboundRequest, RequestIdResponse, REQUEST_ID_HEADER, TRACE_ID_HEADER,
};
pub use extract::RequestTrace;
pub use routes::{router, serve, AppState};
