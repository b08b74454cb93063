//! Request serialization.

use crate::body::BodyEditor;
use crate::headers::{headers_to_string, set_header_pair};
use crate::url::apply_url_parameters;
use crate::value::ParamValue;
use apic_core::{ApiRequest, Payload, RequestAuthorization, TransportConfig};
use apic_model::AuthConfig;
use serde::{Deserialize, Serialize};

/// Methods whose requests never carry a body.
const BODYLESS_METHODS: [&str; 2] = ["GET", "HEAD"];

/// The transport-agnostic request produced from the current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestObject {
    pub method: String,
    pub url: String,
    pub headers: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<Vec<RequestAuthorization>>,
}

impl RequestObject {
    /// Turn into an outbound request signal.
    pub fn into_request(self, id: impl Into<String>, transport: &TransportConfig) -> ApiRequest {
        ApiRequest {
            id: id.into(),
            method: self.method,
            url: self.url,
            headers: self.headers,
            payload: self.payload,
            auth: self.auth,
            with_credentials: transport.with_credentials,
            timeout: transport.timeout(),
        }
    }
}

/// Everything the serializer reads from the request state.
#[derive(Debug, Clone, Copy)]
pub struct SerializeInput<'a> {
    pub method: &'a str,
    pub url: &'a str,
    /// Enabled header parameters, in declaration order
    pub headers: &'a [(String, String)],
    pub body: &'a BodyEditor,
    /// Selected credentials, when the operation declares security
    pub auth: Option<&'a AuthConfig>,
    pub apply_authorization: bool,
}

pub struct RequestSerializer;

impl RequestSerializer {
    pub fn serialize(input: SerializeInput<'_>) -> RequestObject {
        let method = input.method.to_uppercase();
        let has_body = !BODYLESS_METHODS.contains(&method.as_str());

        let mut headers = input.headers.to_vec();
        let mut url = input.url.to_string();

        if has_body
            && !input.body.is_multipart()
            && let Some(media_type) = input.body.media_type()
            && !headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        {
            headers.push(("content-type".to_string(), media_type.to_string()));
        }

        let auth = input
            .auth
            .filter(|auth| !matches!(auth, AuthConfig::None))
            .map(|auth| {
                let valid = auth.is_valid();
                let mut enabled = true;
                if input.apply_authorization && valid {
                    let mut query = Vec::new();
                    let mut auth_headers = Vec::new();
                    auth.apply_to(&mut auth_headers, &mut query);
                    for (name, value) in auth_headers {
                        set_header_pair(&mut headers, &name, &value);
                    }
                    let query: Vec<(String, Option<ParamValue>)> = query
                        .into_iter()
                        .map(|(name, value)| (name, Some(ParamValue::Single(value))))
                        .collect();
                    url = apply_url_parameters(&url, &query, true);
                    enabled = false;
                }
                vec![RequestAuthorization {
                    kind: auth.label().to_string(),
                    enabled,
                    valid,
                    settings: serde_json::to_value(auth).unwrap_or_default(),
                }]
            });

        let payload = if has_body {
            input.body.serialize()
        } else {
            None
        };

        RequestObject {
            method,
            url,
            headers: headers_to_string(&headers),
            payload,
            auth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apic_model::PayloadDecl;

    fn input<'a>(method: &'a str, headers: &'a [(String, String)], body: &'a BodyEditor) -> SerializeInput<'a> {
        SerializeInput {
            method,
            url: "http://production.domain.com/people",
            headers,
            body,
            auth: None,
            apply_authorization: false,
        }
    }

    #[test]
    fn test_get_has_no_payload() {
        let body = BodyEditor::for_payloads(&[PayloadDecl::new("application/json")]);
        let request = RequestSerializer::serialize(input("get", &[], &body));

        assert_eq!(request.method, "GET");
        assert_eq!(request.url, "http://production.domain.com/people");
        assert_eq!(request.payload, None);
        assert_eq!(request.headers, "");
    }

    #[test]
    fn test_post_injects_content_type() {
        let mut body = BodyEditor::for_payloads(&[PayloadDecl::new("application/json")]);
        body.set_raw("{\"a\":1}");
        let request = RequestSerializer::serialize(input("post", &[], &body));

        assert!(request.headers.contains("content-type: application/json"));
        assert_eq!(request.payload, Some(Payload::Text("{\"a\":1}".to_string())));
    }

    #[test]
    fn test_explicit_content_type_is_kept() {
        let body = BodyEditor::for_payloads(&[PayloadDecl::new("application/json")]);
        let headers = vec![("Content-Type".to_string(), "text/plain".to_string())];
        let request = RequestSerializer::serialize(input("PUT", &headers, &body));

        assert_eq!(request.headers, "Content-Type: text/plain");
    }

    #[test]
    fn test_multipart_has_no_content_type() {
        let body = BodyEditor::for_payloads(&[PayloadDecl::new("multipart/form-data")]);
        let request = RequestSerializer::serialize(input("POST", &[], &body));
        assert!(!request.headers.contains("content-type"));
    }

    #[test]
    fn test_auth_entry() {
        let body = BodyEditor::new();
        let auth = AuthConfig::bearer("");
        let mut request_input = input("GET", &[], &body);
        request_input.auth = Some(&auth);
        let request = RequestSerializer::serialize(request_input);

        let entries = request.auth.unwrap_or_default();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, "Bearer");
        assert!(entries[0].enabled);
        assert!(!entries[0].valid);
    }

    #[test]
    fn test_apply_authorization_merges_credentials() {
        let body = BodyEditor::new();
        let auth = AuthConfig::api_key_query("api_key", "s3cret");
        let headers = vec![("accept".to_string(), "*/*".to_string())];
        let mut request_input = input("GET", &headers, &body);
        request_input.auth = Some(&auth);
        request_input.apply_authorization = true;
        let request = RequestSerializer::serialize(request_input);

        assert_eq!(request.url, "http://production.domain.com/people?api_key=s3cret");
        let entries = request.auth.unwrap_or_default();
        assert!(!entries[0].enabled);

        let auth = AuthConfig::bearer("tok");
        request_input.auth = Some(&auth);
        let request = RequestSerializer::serialize(request_input);
        assert_eq!(request.headers, "accept: */*\nauthorization: Bearer tok");
    }

    #[test]
    fn test_into_request_carries_transport_options() {
        let body = BodyEditor::new();
        let transport = TransportConfig {
            with_credentials: true,
            timeout_ms: 3000,
        };
        let request = RequestSerializer::serialize(input("GET", &[], &body)).into_request("req-1", &transport);

        assert_eq!(request.id, "req-1");
        assert!(request.with_credentials);
        assert_eq!(request.timeout, Some(3000));
    }
}
