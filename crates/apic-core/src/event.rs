//! Signal payloads exchanged with the external transport.
//!
//! The console never performs network I/O. It emits an [`ApiRequest`] (and,
//! when cancelled, an [`AbortSignal`]) and later receives an [`ApiResponse`]
//! correlated by request id. All payloads are JSON-serializable with
//! camelCase field names so hosts can forward them as-is.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Outbound request signal, emitted once per `execute()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    pub id: String,
    pub method: String,
    pub url: String,
    /// Newline-delimited `name: value` header block.
    pub headers: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<Vec<RequestAuthorization>>,

    #[serde(default)]
    pub with_credentials: bool,

    /// Request timeout in milliseconds, when the host configured one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// Request body as produced by the body editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Raw text or a form-urlencoded string
    Text(String),
    /// Multipart form data
    Multipart(Vec<FormPart>),
}

impl Payload {
    /// Text view of the payload, if it is not multipart.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Multipart(_) => None,
        }
    }
}

/// A single multipart form entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPart {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Authorization method attached to a request.
///
/// `enabled` is false when credentials were already merged into the headers
/// or the query string, so downstream consumers must not apply them again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAuthorization {
    #[serde(rename = "type")]
    pub kind: String,
    pub enabled: bool,
    pub valid: bool,
    pub settings: serde_json::Value,
}

/// Outbound abort signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortSignal {
    pub id: String,
    pub url: String,
}

/// The request as it was actually transported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportRequest {
    pub url: String,
    pub method: String,
    pub headers: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    /// Epoch milliseconds
    pub start_time: i64,
    /// Epoch milliseconds
    pub end_time: i64,
}

impl TransportRequest {
    /// Snapshot an outbound request, stamping start and end with the current time.
    pub fn from_request(request: &ApiRequest) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            url: request.url.clone(),
            method: request.method.clone(),
            headers: request.headers.clone(),
            payload: request.payload.clone(),
            start_time: now,
            end_time: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    pub status: u16,
    pub status_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    pub headers: String,
}

/// Inbound response signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub id: String,
    pub is_error: bool,
    pub request: TransportRequest,
    pub response: ResponseData,
    /// Milliseconds between dispatch and completion
    pub loading_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    /// Build a successful response for `request`.
    pub fn success(request: &ApiRequest, response: ResponseData, loading_time: f64) -> Self {
        Self {
            id: request.id.clone(),
            is_error: false,
            request: TransportRequest::from_request(request),
            response,
            loading_time,
            error: None,
        }
    }

    /// Build a transport failure for `request`.
    pub fn failure(request: &ApiRequest, error: impl Into<String>, loading_time: f64) -> Self {
        Self {
            id: request.id.clone(),
            is_error: true,
            request: TransportRequest::from_request(request),
            response: ResponseData {
                status: 0,
                status_text: String::new(),
                payload: None,
                headers: String::new(),
            },
            loading_time,
            error: Some(error.into()),
        }
    }
}

/// Inbound navigation signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEvent {
    #[serde(default)]
    pub selected: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

impl NavigationEvent {
    pub fn method(selected: impl Into<String>) -> Self {
        Self {
            selected: Some(selected.into()),
            kind: "method".to_string(),
        }
    }

    /// True when the navigation targets an operation.
    pub fn is_method(&self) -> bool {
        self.kind == "method"
    }
}
