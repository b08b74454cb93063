//! Common test fixtures

use apic_core::{ApiRequest, ApiResponse, ResponseData};
use apic_model::{
    ApiDocument, ApiServer, Binding, Endpoint, Operation, ParamSchema, ParameterDecl, PayloadDecl,
    SchemaKind,
};

/// Route `tracing` output to the test harness. Repeated calls are ignored.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An API with four root servers and one endpoint bound to a single server.
///
/// Operations:
/// - `listPeople`: GET /people with an array `tag` query parameter
/// - `createPerson`: POST /people with a JSON body
/// - `listArchive`: GET /archive, served only by `http://archive.domain.com`
pub fn people_api() -> ApiDocument {
    let mut list = Operation::new("listPeople", "GET", "");
    list.parameters.push(
        ParameterDecl::new("listPeople/parameter/query/tag", "tag", Binding::Query)
            .with_schema(ParamSchema::new("tag", SchemaKind::Array)),
    );
    list.parameters.push(ParameterDecl::new(
        "listPeople/parameter/header/x-trace",
        "x-trace",
        Binding::Header,
    ));

    let mut create = Operation::new("createPerson", "POST", "");
    create.payloads.push(PayloadDecl::new("application/json"));

    let mut archive = Endpoint::new("/archive");
    archive
        .servers
        .push(ApiServer::new("http://archive.domain.com"));

    ApiDocument::new()
        .with_server(ApiServer::new("http://production.domain.com"))
        .with_server(ApiServer::new("http://staging.domain.com"))
        .with_server(ApiServer::new("http://qa.domain.com"))
        .with_server(ApiServer::new("http://dev.domain.com"))
        .with_endpoint(Endpoint::new("/people"), vec![list, create])
        .with_endpoint(archive, vec![Operation::new("listArchive", "GET", "")])
}

/// A 200 response correlated with `request`.
pub fn ok_response(request: &ApiRequest, payload: &str) -> ApiResponse {
    ApiResponse::success(
        request,
        ResponseData {
            status: 200,
            status_text: "OK".to_string(),
            payload: Some(payload.to_string()),
            headers: "content-type: application/json".to_string(),
        },
        12.0,
    )
}
