//! # Request console telemetry
//!
//! Structured logging and OpenTelemetry tracing for request dispatch and
//! response correlation.
//!
//! Span attribute names follow the OpenTelemetry HTTP semantic conventions
//! where one exists.

mod spans;
mod tracer;

pub use spans::{
    RequestSpanAttributes, ResponseSpanAttributes, safe_serialize, trace_request_dispatch,
    trace_response,
};
pub use tracer::{init_telemetry, register_span_processor, tracer_provider};

/// Span attribute constants.
pub mod attributes {
    // HTTP semantic conventions
    pub const HTTP_REQUEST_METHOD: &str = "http.request.method";
    pub const HTTP_RESPONSE_STATUS_CODE: &str = "http.response.status_code";
    pub const URL_FULL: &str = "url.full";

    // Console attributes
    pub const APIC_REQUEST_ID: &str = "apic.request.id";
    pub const APIC_OPERATION_ID: &str = "apic.operation.id";
    pub const APIC_RESPONSE_IS_ERROR: &str = "apic.response.is_error";
    pub const APIC_RESPONSE_LOADING_TIME: &str = "apic.response.loading_time_ms";
    pub const APIC_RESPONSE_STALE: &str = "apic.response.stale";

    // System name constant
    pub const SYSTEM_NAME: &str = "apic";
}
