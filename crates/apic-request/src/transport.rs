//! Typed channel pair between the request state and an external transport.
//!
//! The state side sends requests and abort signals and drains responses
//! without blocking. The host side receives messages, performs the I/O and
//! responds with a correlated [`ApiResponse`].

use crate::interceptor::{InterceptOutcome, RequestInterceptor};
use apic_core::{AbortSignal, ApiRequest, ApiResponse, Error, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Message sent to the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportMessage {
    Request(ApiRequest),
    Abort(AbortSignal),
}

/// Create a connected handle/endpoint pair.
pub fn transport_channel() -> (TransportHandle, TransportEndpoint) {
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (response_tx, response_rx) = mpsc::unbounded_channel();
    (
        TransportHandle {
            requests: request_tx,
            responses: response_rx,
            interceptors: Vec::new(),
        },
        TransportEndpoint {
            requests: request_rx,
            responses: response_tx,
        },
    )
}

/// State-side half of the channel.
pub struct TransportHandle {
    requests: mpsc::UnboundedSender<TransportMessage>,
    responses: mpsc::UnboundedReceiver<ApiResponse>,
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl TransportHandle {
    pub fn with_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn with_interceptors(
        mut self,
        interceptors: impl IntoIterator<Item = Arc<dyn RequestInterceptor>>,
    ) -> Self {
        self.interceptors.extend(interceptors);
        self
    }

    /// Run interceptors in order and hand the request to the transport.
    ///
    /// Returns the request as it was sent.
    pub fn dispatch(&self, mut request: ApiRequest) -> Result<ApiRequest> {
        for interceptor in &self.interceptors {
            if interceptor.intercept(&mut request) == InterceptOutcome::Cancel {
                debug!("Request {} cancelled by {}", request.id, interceptor.name());
                return Err(Error::RequestCancelled(request.id));
            }
        }

        self.requests
            .send(TransportMessage::Request(request.clone()))
            .map_err(|_| Error::transport_error("transport endpoint was dropped"))?;
        Ok(request)
    }

    /// Notify the transport. Delivery is best-effort.
    pub fn abort(&self, signal: AbortSignal) {
        if self.requests.send(TransportMessage::Abort(signal)).is_err() {
            warn!("Abort signal not delivered: transport endpoint was dropped");
        }
    }

    /// Next pending response, if any.
    pub fn try_recv(&mut self) -> Option<ApiResponse> {
        self.responses.try_recv().ok()
    }
}

/// Host-side half of the channel.
pub struct TransportEndpoint {
    requests: mpsc::UnboundedReceiver<TransportMessage>,
    responses: mpsc::UnboundedSender<ApiResponse>,
}

impl TransportEndpoint {
    /// Wait for the next message; `None` once the handle is dropped.
    pub async fn recv(&mut self) -> Option<TransportMessage> {
        self.requests.recv().await
    }

    pub fn try_recv(&mut self) -> Option<TransportMessage> {
        self.requests.try_recv().ok()
    }

    pub fn respond(&self, response: ApiResponse) -> Result<()> {
        self.responses
            .send(response)
            .map_err(|_| Error::transport_error("request state was dropped"))
    }
}
