//! The API model collaborator.
//!
//! The request console reads operations, endpoints and servers through the
//! [`ApiModel`] trait. [`ApiDocument`] is the in-memory implementation built
//! by the OpenAPI loader or assembled by hand.

use crate::types::{ApiServer, Endpoint, Operation};

/// Read-only access to a parsed API description.
pub trait ApiModel: Send + Sync {
    fn operation(&self, id: &str) -> Option<&Operation>;

    fn endpoint(&self, id: &str) -> Option<&Endpoint>;

    /// Servers declared at the API root
    fn servers(&self) -> &[ApiServer];

    /// Protocols declared at the API root
    fn protocols(&self) -> &[String];

    fn version(&self) -> Option<&str>;

    fn endpoint_for_operation(&self, operation_id: &str) -> Option<&Endpoint> {
        self.operation(operation_id)
            .and_then(|op| self.endpoint(&op.endpoint_id))
    }

    /// Candidate servers for a selection.
    ///
    /// Operation servers win over endpoint servers, which win over root servers.
    fn servers_for(&self, operation_id: Option<&str>) -> Vec<ApiServer> {
        if let Some(id) = operation_id {
            if let Some(op) = self.operation(id)
                && !op.servers.is_empty()
            {
                return op.servers.clone();
            }
            if let Some(endpoint) = self.endpoint_for_operation(id)
                && !endpoint.servers.is_empty()
            {
                return endpoint.servers.clone();
            }
        }
        self.servers().to_vec()
    }
}

/// In-memory API model.
#[derive(Debug, Clone, Default)]
pub struct ApiDocument {
    pub title: Option<String>,
    pub version: Option<String>,
    pub protocols: Vec<String>,
    pub servers: Vec<ApiServer>,
    pub endpoints: Vec<Endpoint>,
    pub operations: Vec<Operation>,
}

impl ApiDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(mut self, server: ApiServer) -> Self {
        self.servers.push(server);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Add an endpoint together with its operations.
    ///
    /// Operation `endpoint_id`s are rewritten to point at the endpoint.
    pub fn with_endpoint(mut self, mut endpoint: Endpoint, operations: Vec<Operation>) -> Self {
        for mut op in operations {
            op.endpoint_id = endpoint.id.clone();
            if !endpoint.operations.contains(&op.id) {
                endpoint.operations.push(op.id.clone());
            }
            self.operations.push(op);
        }
        self.endpoints.push(endpoint);
        self
    }

    /// Ids of all operations in declaration order.
    pub fn operation_ids(&self) -> Vec<&str> {
        self.operations.iter().map(|op| op.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl ApiModel for ApiDocument {
    fn operation(&self, id: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.id == id)
    }

    fn endpoint(&self, id: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.id == id)
    }

    fn servers(&self) -> &[ApiServer] {
        &self.servers
    }

    fn protocols(&self) -> &[String] {
        &self.protocols
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}
