//! Outbound W3C trace context.
//!
//! Requests built through [`TracedClientExt`] carry `traceparent` (and
//! `tracestate` when present) taken from the active span, so backend spans
//! nest under the portal request that caused them.

use opentelemetry::trace::{SpanContext, TraceContextExt};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// `version-trace_id-span_id-flags`, version fixed at `00`.
pub fn traceparent_value(span_context: &SpanContext) -> String {
    format!(
        "00-{}-{}-{:02x}",
        span_context.trace_id(),
        span_context.span_id(),
        span_context.trace_flags().to_u8()
    )
}

/// Trace headers for the current span. Empty when no sampled OpenTelemetry
/// context is active.
pub fn trace_headers() -> HeaderMap {
    let context = Span::current().context();
    let span = context.span();
    let span_context = span.span_context();

    let mut headers = HeaderMap::new();
    if !span_context.is_valid() {
        return headers;
    }

    if let Ok(value) = HeaderValue::from_str(&traceparent_value(span_context)) {
        headers.insert(TRACEPARENT_HEADER, value);
    }

    let state = span_context.trace_state().header();
    if !state.is_empty()
        && let Ok(value) = HeaderValue::from_str(&state)
    {
        headers.insert(TRACESTATE_HEADER, value);
    }

    headers
}

/// Correlation id of an incoming request, if the caller sent one.
pub fn extract_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// A reqwest request whose trace headers are resolved at send time, inside
/// whatever span the caller is in then.
pub struct TracedRequest {
    inner: RequestBuilder,
}

impl TracedRequest {
    pub fn new(inner: RequestBuilder) -> Self {
        Self { inner }
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.inner = self.inner.header(key, value);
        self
    }

    pub fn multipart(mut self, form: reqwest::multipart::Form) -> Self {
        self.inner = self.inner.multipart(form);
        self
    }

    pub async fn send(self) -> Result<Response, reqwest::Error> {
        self.inner.headers(trace_headers()).send().await
    }
}

pub trait TracedClientExt {
    fn traced_get(&self, url: &str) -> TracedRequest;
    fn traced_post(&self, url: &str) -> TracedRequest;
    fn traced_delete(&self, url: &str) -> TracedRequest;
}

impl TracedClientExt for Client {
    fn traced_get(&self, url: &str) -> TracedRequest {
        TracedRequest::new(self.get(url))
    }

    fn traced_post(&self, url: &str) -> TracedRequest {
        TracedRequest::new(self.post(url))
    }

    fn traced_delete(&self, url: &str) -> TracedRequest {
        TracedRequest::new(self.delete(url))
    }
}
