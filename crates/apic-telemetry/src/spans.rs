//! Span helpers for request dispatch and response correlation

use crate::attributes::*;

/// Attributes for tracing an outbound request
#[derive(Debug, Clone)]
pub struct RequestSpanAttributes {
    pub request_id: String,
    pub operation_id: String,
    pub method: String,
    pub url: String,
}

/// Attributes for tracing an inbound response
#[derive(Debug, Clone)]
pub struct ResponseSpanAttributes {
    pub request_id: String,
    pub status: u16,
    pub is_error: bool,
    pub loading_time_ms: f64,
    /// The response did not match the current request and was dropped
    pub stale: bool,
}

/// Record a span for a request handed to the transport.
pub fn trace_request_dispatch(attrs: RequestSpanAttributes) {
    let span = tracing::info_span!(
        "dispatch_request",
        { HTTP_REQUEST_METHOD } = %attrs.method,
        { URL_FULL } = %attrs.url,
        { APIC_REQUEST_ID } = %attrs.request_id,
        { APIC_OPERATION_ID } = %attrs.operation_id,
    );

    // Enter and immediately exit the span (it's recorded)
    let _guard = span.enter();
}

/// Record a span for a response received from the transport.
pub fn trace_response(attrs: ResponseSpanAttributes) {
    let span = tracing::info_span!(
        "receive_response",
        { APIC_REQUEST_ID } = %attrs.request_id,
        { HTTP_RESPONSE_STATUS_CODE } = attrs.status,
        { APIC_RESPONSE_IS_ERROR } = attrs.is_error,
        { APIC_RESPONSE_LOADING_TIME } = attrs.loading_time_ms,
        { APIC_RESPONSE_STALE } = attrs.stale,
    );

    let _guard = span.enter();
}

/// Helper to safely serialize to JSON string
pub fn safe_serialize<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<not serializable>".to_string())
}
