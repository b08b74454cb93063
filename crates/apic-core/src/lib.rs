//! Core types for the API request console
//!
//! This crate provides the shared error taxonomy, the host configuration
//! surface and the signal payloads exchanged with an external transport.

pub mod config;
pub mod error;
pub mod event;

// Re-exports
pub use config::{
    ConsoleConfig, HeaderEntry, ModelOverrides, ObservabilityConfig, ProxyConfig, RequestOptions,
    TransportConfig,
};
pub use error::{Error, Result};
pub use event::{
    AbortSignal, ApiRequest, ApiResponse, FormPart, NavigationEvent, Payload,
    RequestAuthorization, ResponseData, TransportRequest,
};
