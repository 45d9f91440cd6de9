//! Axum extractor capturing the trace id of the current request

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use http::request::Parts;
use tower_http::request_id::RequestId;

use super::context::{REQUEST_ID_HEADER, TRACE_ID_HEADER};
use crate::domain::ports::{HeaderLookup, TraceContext};

/// Trace id captured from a request, usable as a handler argument
///
/// Looks at the `trace_id` header, then `x-request-id`, then the
/// [`RequestId`] extension set by `tower-http`. Never rejects: a request
/// without any of them yields a context whose trace id is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTrace {
    trace_id: Option<String>,
}

impl RequestTrace {
    /// Capture the trace id from request parts
    pub fn from_parts(parts: &Parts) -> Self {
        let trace_id = parts
            .header(TRACE_ID_HEADER)
            .or_else(|| parts.header(REQUEST_ID_HEADER))
            .map(|v| v.into_owned())
            .or_else(|| parts.extensions.get::<RequestId>().map(|id| id.trace_id()));
        Self { trace_id }
    }

    /// The captured identifier, if the request carried one
    pub fn as_str(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }
}

impl TraceContext for RequestTrace {
    fn trace_id(&self) -> String {
        self.trace_id.clone().unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for RequestTrace
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, Request};

    fn parts(builder: http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_prefers_trace_id_header() {
        let parts = parts(
            Request::builder()
                .header("trace_id", "abc123")
                .header("x-request-id", "xyz789"),
        );
        assert_eq!(RequestTrace::from_parts(&parts).as_str(), Some("abc123"));
    }

    #[test]
    fn test_falls_back_to_request_id_header() {
        let parts = parts(Request::builder().header("x-request-id", "xyz789"));
        assert_eq!(RequestTrace::from_parts(&parts).trace_id(), "xyz789");
    }

    #[test]
    fn test_falls_back_to_request_id_extension() {
        let mut parts = parts(Request::builder());
        parts
            .extensions
            .insert(RequestId::new(HeaderValue::from_static("ext-1")));
        assert_eq!(RequestTrace::from_parts(&parts).trace_id(), "ext-1");
    }

    #[test]
    fn test_absent_everywhere() {
        let parts = parts(Request::builder());
        let trace = RequestTrace::from_parts(&parts);
        assert_eq!(trace.as_str(), None);
        assert_eq!(trace.trace_id(), "");
    }
}
