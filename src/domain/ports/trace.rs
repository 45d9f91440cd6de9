use std::borrow::Cow;

/// Minimal header-reading capability shared by every web framework adapter
///
/// Implementations exist for the `http` crate's header map, request and
/// response types (and therefore for `axum`, `hyper` and `tower-http`).
pub trait HeaderLookup {
    /// Value of the header `name`, if present
    ///
    /// Non-UTF-8 values are decoded lossily rather than dropped.
    fn header(&self, name: &str) -> Option<Cow<'_, str>>;
}

impl<T: HeaderLookup + ?Sized> HeaderLookup for &T {
    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        (**self).header(name)
    }
}

/// A request context that can yield a trace-correlation identifier
///
/// The logger only reads what the upstream request carries: no format is
/// enforced and nothing is generated. A context whose header is missing
/// yields an empty string, not an error.
pub trait TraceContext {
    /// The trace-correlation identifier, or `""` when the header is absent
    fn trace_id(&self) -> String;
}

impl TraceContext for str {
    fn trace_id(&self) -> String {
        self.to_string()
    }
}

impl TraceContext for String {
    fn trace_id(&self) -> String {
        self.clone()
    }
}

impl<T: TraceContext + ?Sized> TraceContext for &T {
    fn trace_id(&self) -> String {
        (**self).trace_id()
    }
}
