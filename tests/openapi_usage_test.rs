//! Integration test for driving the request console from an OpenAPI document.
//!
//! This test demonstrates how to:
//! 1. Load an OpenAPI specification
//! 2. Select operations and servers, edit parameters and credentials
//! 3. Dispatch through a transport channel served by a host task
//! 4. Correlate the response back into the request state

use apic_core::{ApiResponse, ConsoleConfig, Payload, ResponseData};
use apic_model::{ApiModel, AuthConfig, OpenApiParser};
use apic_request::{
    RequestState, ServerType, TransportMessage, UrlValidity, ValueCache, interceptors_from_config,
    transport_channel,
};
use std::sync::Arc;
use tracing::info;

const SPEC: &str = r#"
openapi: 3.0.0
info:
  title: Files API
  version: v2
servers:
  - url: https://{customerId}.saas-app.com:{port}/{version}
    variables:
      customerId:
        default: demo
      port:
        enum: ["443", "8443"]
        default: "443"
  - url: https://files.example.com
components:
  securitySchemes:
    ApiKeyAuth:
      type: apiKey
      in: header
      name: X-API-Key
paths:
  /files:
    get:
      operationId: listFiles
      parameters:
        - name: limit
          in: query
          schema:
            type: integer
            default: 20
      responses:
        '200':
          description: Success
    post:
      operationId: uploadFile
      security:
        - ApiKeyAuth: []
      requestBody:
        content:
          application/json:
            schema:
              type: object
            example:
              name: report.pdf
      responses:
        '201':
          description: Created
  /files/{fileId}:
    parameters:
      - name: fileId
        in: path
        required: true
        schema:
          type: string
    get:
      operationId: getFile
      responses:
        '200':
          description: Success
"#;

fn load_state(config: ConsoleConfig) -> RequestState {
    let model = OpenApiParser::from_str(SPEC).unwrap().parse().unwrap();
    assert_eq!(model.len(), 3);
    assert_eq!(model.version(), Some("v2"));

    let mut state = RequestState::with_cache(config, ValueCache::new());
    state.set_model(Arc::new(model));
    state
}

#[test]
fn test_server_variables_from_openapi() {
    let mut state = load_state(ConsoleConfig::default());
    state.select_operation(Some("listFiles"));

    assert_eq!(state.servers_count(), 2);
    let names: Vec<_> = state
        .parameters()
        .path
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, vec!["customerId", "port"]);
    assert_eq!(state.url(), "https://demo.saas-app.com:443/v2/files?limit=20");
    assert_eq!(state.validity(), UrlValidity::Valid);

    state.select_server("https://files.example.com", ServerType::Server);
    assert!(state.parameters().path.is_empty());
    assert_eq!(state.url(), "https://files.example.com/files?limit=20");
}

#[test]
fn test_path_parameter_from_openapi() {
    let mut state = load_state(ConsoleConfig::default());
    state.select_server("https://files.example.com", ServerType::Server);
    state.select_operation(Some("getFile"));

    assert_eq!(state.url(), "https://files.example.com/files/{fileId}");
    assert_eq!(state.validity(), UrlValidity::Pending);

    state.set_parameter_value("/files/{fileId}/parameter/path/fileId", "abc");
    assert_eq!(state.url(), "https://files.example.com/files/abc");
}

#[test]
fn test_credentials_applied_to_request() {
    let mut config = ConsoleConfig::default();
    config.request.apply_authorization = true;
    let mut state = load_state(config);
    state.select_operation(Some("uploadFile"));

    assert!(!state.auth_valid());
    assert!(state.set_credentials(AuthConfig::api_key_header("X-API-Key", "secret")));
    assert!(state.auth_valid());

    let request = state.serialize().unwrap();
    assert!(request.headers.contains("X-API-Key: secret"));
    assert!(request.headers.contains("content-type: application/json"));
    let auth = request.auth.unwrap_or_default();
    assert_eq!(auth[0].kind, "Api Key");
    assert!(!auth[0].enabled);

    let payload = request.payload.as_ref().and_then(Payload::as_text).unwrap_or_default();
    let body: serde_json::Value = serde_json::from_str(payload).unwrap();
    assert_eq!(body["name"], "report.pdf");
}

#[tokio::test]
async fn test_request_flow_through_host_transport() {
    let config = ConsoleConfig::from_toml_str(
        r#"
        [request]
        handle_navigation_events = true

        [[append_headers]]
        name = "x-client"
        value = "apic-test"

        [observability]
        service_name = "apic-openapi-test"
        "#,
    )
    .unwrap();
    assert_eq!(config.observability.service_name, "apic-openapi-test");
    apic_request::init_telemetry(&config);
    assert!(apic_telemetry::tracer_provider().is_some());

    let mut state = load_state(config.clone());
    let (handle, mut endpoint) = transport_channel();
    state.connect(handle.with_interceptors(interceptors_from_config(&config)));

    // Host transport: answers every request
    let host = tokio::spawn(async move {
        let mut served = 0;
        while let Some(message) = endpoint.recv().await {
            match message {
                TransportMessage::Request(request) => {
                    info!("Serving {} {}", request.method, request.url);
                    let response = ApiResponse::success(
                        &request,
                        ResponseData {
                            status: 200,
                            status_text: "OK".to_string(),
                            payload: Some(r#"{"items":[]}"#.to_string()),
                            headers: String::new(),
                        },
                        3.5,
                    );
                    served += 1;
                    if endpoint.respond(response).is_err() {
                        break;
                    }
                }
                TransportMessage::Abort(signal) => info!("Aborted {}", signal.id),
            }
        }
        served
    });

    state.handle_navigation(&apic_core::NavigationEvent::method("listFiles"));
    let sent = state.execute().unwrap();
    assert_eq!(sent.headers, "x-client: apic-test");

    let mut applied = 0;
    for _ in 0..100 {
        applied = state.poll_responses();
        if applied > 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(applied, 1);

    let response = state.last_response().unwrap();
    assert_eq!(response.id, sent.id);
    assert_eq!(response.response.status, 200);
    assert_eq!(state.last_request().map(|r| r.id.as_str()), Some(sent.id.as_str()));

    drop(state);
    assert_eq!(host.await.unwrap(), 1);
}
