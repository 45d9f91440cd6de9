//! Trace-context adapters for `http`-based web frameworks
//!
//! Two header conventions are supported:
//! - [`InboundRequest`]: the caller sends a custom `trace_id` request header
//! - [`RequestIdResponse`]: a request-id middleware (such as `tower-http`'s
//!   `PropagateRequestIdLayer`) stamps `x-request-id` on the response
//!
//! [`HeaderContext`] covers any other header name.

use std::borrow::Cow;

use http::{request, response, HeaderMap, Request, Response};
use tower_http::request_id::RequestId;

use crate::domain::ports::{HeaderLookup, TraceContext};

/// Custom request header carrying the trace id
pub const TRACE_ID_HEADER: &str = "trace_id";

/// Conventional request-id header
pub const REQUEST_ID_HEADER: &str = "x-request-id";

impl HeaderLookup for HeaderMap {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|v| String::from_utf8_lossy(v.as_bytes()))
    }
}

impl<B> HeaderLookup for Request<B> {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.headers().header(name)
    }
}

impl<B> HeaderLookup for Response<B> {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.headers().header(name)
    }
}

impl HeaderLookup for request::Parts {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.headers.header(name)
    }
}

impl HeaderLookup for response::Parts {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.headers.header(name)
    }
}

/// Reads the trace id from an arbitrary header
#[derive(Clone, Copy)]
pub struct HeaderContext<'a> {
    source: &'a dyn HeaderLookup,
    header: &'a str,
}

impl<'a> HeaderContext<'a> {
    /// Read `header` from `source`
    pub fn new(source: &'a dyn HeaderLookup, header: &'a str) -> Self {
        Self { source, header }
    }
}

impl TraceContext for HeaderContext<'_> {
    fn trace_id(&self) -> String {
        self.source
            .header(self.header)
            .map(Cow::into_owned)
            .unwrap_or_default()
    }
}

/// Inbound request carrying a `trace_id` header
#[derive(Clone, Copy)]
pub struct InboundRequest<'a>(HeaderContext<'a>);

impl<'a> InboundRequest<'a> {
    /// Wrap a request, its parts or its header map
    pub fn new(request: &'a dyn HeaderLookup) -> Self {
        Self(HeaderContext::new(request, TRACE_ID_HEADER))
    }
}

impl TraceContext for InboundRequest<'_> {
    fn trace_id(&self) -> String {
        self.0.trace_id()
    }
}

/// Response stamped with an `x-request-id` header
#[derive(Clone, Copy)]
pub struct RequestIdResponse<'a>(HeaderContext<'a>);

impl<'a> RequestIdResponse<'a> {
    /// Wrap a response, its parts or its header map
    pub fn new(response: &'a dyn HeaderLookup) -> Self {
        Self(HeaderContext::new(response, REQUEST_ID_HEADER))
    }
}

impl TraceContext for RequestIdResponse<'_> {
    fn trace_id(&self) -> String {
        self.0.trace_id()
    }
}

/// The request id that `tower-http`'s `SetRequestIdLayer` stores in request extensions
impl TraceContext for RequestId {
    fn trace_id(&self) -> String {
        String::from_utf8_lossy(self.header_value().as_bytes()).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderName, HeaderValue};

    #[test]
    fn test_inbound_request_reads_trace_id_header() {
        let request = Request::builder()
            .uri("/login")
            .header("trace_id", "abc123")
            .body(())
            .unwrap();
        assert_eq!(InboundRequest::new(&request).trace_id(), "abc123");

        let (parts, ()) = request.into_parts();
        assert_eq!(InboundRequest::new(&parts).trace_id(), "abc123");
        assert_eq!(InboundRequest::new(&parts.headers).trace_id(), "abc123");
    }

    #[test]
    fn test_response_reads_request_id_header() {
        let response = Response::builder()
            .header("x-request-id", "xyz789")
            .body(())
            .unwrap();
        assert_eq!(RequestIdResponse::new(&response).trace_id(), "xyz789");
    }

    #[test]
    fn test_missing_header_yields_empty_string() {
        let request = Request::builder().body(()).unwrap();
        assert_eq!(InboundRequest::new(&request).trace_id(), "");

        let response = Response::builder().body(()).unwrap();
        assert_eq!(RequestIdResponse::new(&response).trace_id(), "");
    }

    #[test]
    fn test_header_names_are_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(b"X-Request-Id").unwrap(),
            HeaderValue::from_static("upper"),
        );
        assert_eq!(RequestIdResponse::new(&headers).trace_id(), "upper");
    }

    #[test]
    fn test_non_utf8_header_is_decoded_lossily() {
        let mut headers = HeaderMap::new();
        headers.insert(
            TRACE_ID_HEADER,
            HeaderValue::from_bytes(b"id-\xff").unwrap(),
        );
        assert_eq!(InboundRequest::new(&headers).trace_id(), "id-\u{fffd}");
    }

    #[test]
    fn test_custom_header_context() {
        let mut headers = HeaderMap::new();
        headers.insert("x-correlation-id", HeaderValue::from_static("corr-1"));
        assert_eq!(HeaderContext::new(&headers, "x-correlation-id").trace_id(), "corr-1");
    }

    #[test]
    fn test_tower_request_id_extension() {
        let id = RequestId::new(HeaderValue::from_static("tower-1"));
        assert_eq!(id.trace_id(), "tower-1");
    }
}
