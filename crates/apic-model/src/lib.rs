//! # API model for the request console
//!
//! Read-only descriptors of an API description: operations, endpoints,
//! servers and parameter declarations, reachable through the [`ApiModel`]
//! trait.
//!
//! ## Features
//!
//! - In-memory [`ApiDocument`] implementation of [`ApiModel`]
//! - Parse OpenAPI v3.0+ specifications (JSON and YAML) into an `ApiDocument`
//! - Server variables, endpoint and operation parameters, payload examples
//! - Credential configurations for declared security schemes
//!
//! ## Example
//!
//! ```no_run
//! use apic_model::OpenApiParser;
//!
//! let doc = OpenApiParser::from_file("./api/openapi.yaml")?.parse()?;
//! println!("Loaded {} operations", doc.len());
//! # Ok::<(), apic_model::ModelError>(())
//! ```

mod auth;
mod error;
mod model;
mod parser;
mod types;

pub use auth::{AuthConfig, AuthLocation};
pub use error::{ModelError, Result};
pub use model::{ApiDocument, ApiModel};
pub use parser::OpenApiParser;
pub use types::{
    ApiServer, Binding, Endpoint, Operation, ParamSchema, ParameterDecl, PayloadDecl,
    SchemaKind, SecurityRequirement, template_variables, value_to_text,
};
