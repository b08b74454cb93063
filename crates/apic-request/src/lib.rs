//! # Request building and URL synchronization
//!
//! The stateful core of the request console:
//!
//! - [`ValueCache`]: per-owner and process-wide stores for entered values
//! - [`url`]: URL composition, query encoding, reverse parsing and validation
//! - [`ParameterModelBuilder`]: path, query and header parameters for a selection
//! - [`RequestState`]: the state machine tying selection, edits and dispatch together
//! - [`RequestSerializer`]: the final transport-agnostic request object
//! - [`transport_channel`]: typed channels to an external transport, with
//!   [`RequestInterceptor`]s applied before dispatch
//!
//! ## Example
//!
//! ```rust,no_run
//! use apic_core::ConsoleConfig;
//! use apic_model::OpenApiParser;
//! use apic_request::{RequestState, transport_channel};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = OpenApiParser::from_file("openapi.yaml")?.parse()?;
//!
//! let (handle, mut endpoint) = transport_channel();
//! let mut state = RequestState::new(ConsoleConfig::default());
//! state.connect(handle);
//! state.set_model(Arc::new(model));
//! state.select_operation(Some("listPeople"));
//!
//! let request = state.execute()?;
//! println!("{} {}", request.method, request.url);
//! # let _ = &mut endpoint;
//! # Ok(())
//! # }
//! ```

mod body;
mod cache;
pub mod headers;
mod interceptor;
mod params;
mod serializer;
mod state;
mod transport;
pub mod url;
mod value;

pub use body::{BodyEditor, BodyValue, FORM_URLENCODED, FormField, MULTIPART_FORM};
pub use cache::ValueCache;
pub use interceptor::{
    HeadersInterceptor, InterceptOutcome, ProxyInterceptor, RequestInterceptor,
    interceptors_from_config,
};
pub use params::{OperationParameter, ParameterModelBuilder, ParameterSet, ParameterSource};
pub use serializer::{RequestObject, RequestSerializer, SerializeInput};
pub use state::{Phase, RequestDraft, RequestState, ServerSelection, ServerType};
pub use transport::{TransportEndpoint, TransportHandle, TransportMessage, transport_channel};
pub use crate::url::{BackfillStatus, QueryMap, UriOptions, UrlBackfill, UrlValidity};
pub use value::ParamValue;

use apic_core::ConsoleConfig;

/// Install logging and tracing under the configured service name.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_telemetry(config: &ConsoleConfig) {
    apic_telemetry::init_telemetry(&config.observability.service_name);
}
