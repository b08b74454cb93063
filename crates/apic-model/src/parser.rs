//! OpenAPI specification loader.
//!
//! This module parses OpenAPI v3.0+ specifications into an [`ApiDocument`].
//! Schemas and security schemes are read through their JSON form so that
//! references into `components` can be resolved uniformly.

use crate::error::{ModelError, Result};
use crate::model::ApiDocument;
use crate::types::{
    ApiServer, Binding, Endpoint, Operation, ParamSchema, ParameterDecl, PayloadDecl,
    SchemaKind, SecurityRequirement, value_to_text,
};
use openapiv3::{OpenAPI, Parameter, ParameterSchemaOrContent, ReferenceOr, Schema, Server};
use serde_json::Value;
use tracing::{debug, warn};

/// Parser for OpenAPI specifications.
pub struct OpenApiParser {
    spec: OpenAPI,
}

impl OpenApiParser {
    /// Load and parse an OpenAPI spec from a file.
    ///
    /// Supports both JSON and YAML formats.
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let spec = if path.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        Ok(Self { spec })
    }

    /// Download and parse an OpenAPI spec from a URL.
    pub async fn from_url(url: &str) -> Result<Self> {
        let response = reqwest::get(url).await?;
        let content = response.text().await?;

        let spec = serde_json::from_str(&content).or_else(|_| serde_yaml::from_str(&content))?;

        Ok(Self { spec })
    }

    /// Parse an OpenAPI spec from a string.
    ///
    /// Automatically detects JSON or YAML format.
    pub fn from_str(content: &str) -> Result<Self> {
        let spec = serde_json::from_str(content)
            .or_else(|_| serde_yaml::from_str(content))
            .map_err(|e| ModelError::ParseError(e.to_string()))?;

        Ok(Self { spec })
    }

    /// Build the in-memory model.
    pub fn parse(&self) -> Result<ApiDocument> {
        let mut doc = ApiDocument::new();
        doc.title = Some(self.spec.info.title.clone());
        doc.version = Some(self.spec.info.version.clone()).filter(|v| !v.is_empty());
        doc.servers = self.spec.servers.iter().map(parse_server).collect();
        doc.protocols = protocols_of(&doc.servers);

        debug!("Root servers: {}", doc.servers.len());

        for (path, path_item_ref) in &self.spec.paths.paths {
            let path_item = match path_item_ref {
                ReferenceOr::Item(item) => item,
                ReferenceOr::Reference { .. } => {
                    warn!("Path references not yet supported: {}", path);
                    continue;
                }
            };

            let mut endpoint = Endpoint::new(path);
            endpoint.name = path_item.summary.clone();
            endpoint.servers = path_item.servers.iter().map(parse_server).collect();
            for param_ref in &path_item.parameters {
                if let Some(decl) = self.parse_parameter(param_ref, &endpoint.id) {
                    endpoint.parameters.push(decl);
                }
            }

            let methods = [
                ("get", &path_item.get),
                ("post", &path_item.post),
                ("put", &path_item.put),
                ("delete", &path_item.delete),
                ("patch", &path_item.patch),
                ("head", &path_item.head),
                ("options", &path_item.options),
                ("trace", &path_item.trace),
            ];

            let operations = methods
                .into_iter()
                .filter_map(|(method, op)| op.as_ref().map(|op| self.parse_operation(op, path, method)))
                .collect();

            doc = doc.with_endpoint(endpoint, operations);
        }

        if doc.endpoints.is_empty() {
            warn!("API description declares no paths");
        }

        debug!("Parsed {} operations", doc.len());
        Ok(doc)
    }

    fn parse_operation(&self, operation: &openapiv3::Operation, path: &str, method: &str) -> Operation {
        let id = operation
            .operation_id
            .clone()
            .unwrap_or_else(|| generate_operation_id(path, method));

        let mut parsed = Operation::new(id, method.to_uppercase(), path);
        parsed.name = operation.summary.clone();
        parsed.description = operation.description.clone();
        parsed.servers = operation.servers.iter().map(parse_server).collect();

        for param_ref in &operation.parameters {
            if let Some(decl) = self.parse_parameter(param_ref, &parsed.id) {
                parsed.parameters.push(decl);
            }
        }

        if let Some(body_ref) = &operation.request_body {
            parsed.payloads = self.parse_payloads(body_ref);
        }

        parsed.security = self.parse_security(operation);
        parsed
    }

    fn parse_parameter(
        &self,
        param_ref: &ReferenceOr<Parameter>,
        owner_id: &str,
    ) -> Option<ParameterDecl> {
        let param = match param_ref {
            ReferenceOr::Item(p) => p,
            ReferenceOr::Reference { reference } => {
                let resolved = component_name(reference, "parameters").and_then(|name| {
                    self.spec
                        .components
                        .as_ref()
                        .and_then(|c| c.parameters.get(name))
                });
                match resolved {
                    Some(ReferenceOr::Item(p)) => p,
                    _ => {
                        warn!("Unresolvable parameter reference: {}", reference);
                        return None;
                    }
                }
            }
        };

        let (data, binding) = match param {
            Parameter::Query { parameter_data, .. } => (parameter_data, Binding::Query),
            Parameter::Header { parameter_data, .. } => (parameter_data, Binding::Header),
            Parameter::Path { parameter_data, .. } => (parameter_data, Binding::Path),
            Parameter::Cookie { parameter_data, .. } => (parameter_data, Binding::Cookie),
        };

        let id = format!("{owner_id}/parameter/{binding}/{}", data.name);

        let schema_json = match &data.format {
            ParameterSchemaOrContent::Schema(schema_ref) => self.schema_json(schema_ref),
            ParameterSchemaOrContent::Content(content) => content
                .values()
                .next()
                .and_then(|media| media.schema.as_ref())
                .and_then(|schema_ref| self.schema_json(schema_ref)),
        };

        let mut schema = schema_json
            .map(|json| self.schema_from_json(format!("{id}/schema"), &json))
            .unwrap_or_else(|| ParamSchema::new(format!("{id}/schema"), SchemaKind::String));
        if let Some(example) = &data.example {
            schema.examples.insert(0, example.clone());
        }

        let mut decl = ParameterDecl::new(id, data.name.clone(), binding)
            .required(data.required)
            .with_schema(schema);
        decl.description = data.description.clone();
        Some(decl)
    }

    fn parse_payloads(&self, body_ref: &ReferenceOr<openapiv3::RequestBody>) -> Vec<PayloadDecl> {
        let body = match body_ref {
            ReferenceOr::Item(body) => body,
            ReferenceOr::Reference { reference } => {
                let resolved = component_name(reference, "requestBodies").and_then(|name| {
                    self.spec
                        .components
                        .as_ref()
                        .and_then(|c| c.request_bodies.get(name))
                });
                match resolved {
                    Some(ReferenceOr::Item(body)) => body,
                    _ => {
                        warn!("Unresolvable request body reference: {}", reference);
                        return Vec::new();
                    }
                }
            }
        };

        body.content
            .iter()
            .map(|(media_type, media)| {
                let example = media.example.as_ref().or_else(|| {
                    media.examples.values().find_map(|ex| match ex {
                        ReferenceOr::Item(ex) => ex.value.as_ref(),
                        ReferenceOr::Reference { .. } => None,
                    })
                });

                PayloadDecl {
                    media_type: media_type.clone(),
                    schema: media.schema.as_ref().and_then(|s| self.schema_json(s)),
                    example: example.map(example_text),
                }
            })
            .collect()
    }

    fn parse_security(&self, operation: &openapiv3::Operation) -> Vec<SecurityRequirement> {
        let requirements = operation.security.as_ref().or(self.spec.security.as_ref());
        let Some(requirements) = requirements else {
            return Vec::new();
        };

        requirements
            .iter()
            .flat_map(|req| req.iter())
            .map(|(name, scopes)| {
                let settings = self
                    .spec
                    .components
                    .as_ref()
                    .and_then(|c| c.security_schemes.get(name))
                    .and_then(|scheme| match scheme {
                        ReferenceOr::Item(scheme) => serde_json::to_value(scheme).ok(),
                        ReferenceOr::Reference { .. } => None,
                    })
                    .unwrap_or(Value::Null);

                let scheme_type = settings
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();

                SecurityRequirement {
                    scheme_name: name.clone(),
                    scheme_type,
                    settings,
                    scopes: scopes.clone(),
                }
            })
            .collect()
    }

    fn schema_json(&self, schema_ref: &ReferenceOr<Schema>) -> Option<Value> {
        match schema_ref {
            ReferenceOr::Item(schema) => serde_json::to_value(schema).ok(),
            ReferenceOr::Reference { reference } => self.resolve_schema_reference(reference),
        }
    }

    fn resolve_schema_reference(&self, reference: &str) -> Option<Value> {
        let name = component_name(reference, "schemas")?;
        match self.spec.components.as_ref()?.schemas.get(name)? {
            ReferenceOr::Item(schema) => serde_json::to_value(schema).ok(),
            ReferenceOr::Reference { .. } => {
                warn!("Nested schema references not yet supported: {}", reference);
                None
            }
        }
    }

    fn schema_from_json(&self, id: String, json: &Value) -> ParamSchema {
        let kind = json
            .get("type")
            .and_then(Value::as_str)
            .map(SchemaKind::from_type_name)
            .unwrap_or_default();

        let mut schema = ParamSchema::new(id.clone(), kind);
        schema.format = json.get("format").and_then(Value::as_str).map(str::to_string);
        schema.default = json.get("default").cloned();
        if let Some(example) = json.get("example") {
            schema.examples.push(example.clone());
        }
        if let Some(Value::Array(values)) = json.get("enum") {
            schema.enum_values = values.iter().filter(|v| !v.is_null()).cloned().collect();
        }

        if kind == SchemaKind::Array
            && let Some(items) = json.get("items")
        {
            let items = match items.get("$ref").and_then(Value::as_str) {
                Some(reference) => self.resolve_schema_reference(reference),
                None => Some(items.clone()),
            };
            schema.items = items.map(|items| Box::new(self.schema_from_json(format!("{id}/items"), &items)));
        }

        schema
    }
}

fn parse_server(server: &Server) -> ApiServer {
    let mut api_server = ApiServer::new(server.url.clone());
    api_server.description = server.description.clone();

    if let Some(variables) = &server.variables {
        for (name, variable) in variables {
            let id = format!("{}/variable/{name}", api_server.id);
            let mut schema = ParamSchema::new(format!("{id}/schema"), SchemaKind::String)
                .with_default(Value::String(variable.default.clone()));
            schema.enum_values = variable
                .enumeration
                .iter()
                .cloned()
                .map(Value::String)
                .collect();

            let mut decl = ParameterDecl::new(id, name.clone(), Binding::Path).with_schema(schema);
            decl.description = variable.description.clone();
            api_server.variables.push(decl);
        }
    }

    api_server
}

/// Unique URL schemes of the given servers, in order.
fn protocols_of(servers: &[ApiServer]) -> Vec<String> {
    let mut protocols: Vec<String> = Vec::new();
    for server in servers {
        if let Some((scheme, _)) = server.url.split_once("://")
            && !scheme.contains('{')
            && !protocols.iter().any(|p| p.eq_ignore_ascii_case(scheme))
        {
            protocols.push(scheme.to_lowercase());
        }
    }
    protocols
}

/// `#/components/<kind>/<name>` -> `<name>`
fn component_name<'a>(reference: &'a str, kind: &str) -> Option<&'a str> {
    reference
        .strip_prefix("#/components/")?
        .strip_prefix(kind)?
        .strip_prefix('/')
}

fn example_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other)
            .ok()
            .or_else(|| value_to_text(other))
            .unwrap_or_default(),
    }
}

/// Generate an operation id like `get_users` from the method and path.
fn generate_operation_id(path: &str, method: &str) -> String {
    let path_parts: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && !s.starts_with('{'))
        .collect();

    let path_str = if path_parts.is_empty() {
        "root".to_string()
    } else {
        path_parts.join("_")
    };

    format!("{}_{}", method, path_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ApiModel;

    const SPEC: &str = r#"
openapi: 3.0.0
info:
  title: People API
  version: v2
servers:
  - url: https://{customerId}.saas-app.com:{port}/v2
    variables:
      customerId:
        default: demo
      port:
        enum: ["443", "8443"]
        default: "443"
  - url: http://production.domain.com
paths:
  /people/{personId}:
    parameters:
      - $ref: '#/components/parameters/PersonId'
    get:
      operationId: getPerson
      parameters:
        - name: fields
          in: query
          schema:
            type: array
            items:
              type: string
            default: [name, age]
        - name: x-trace
          in: header
          schema:
            type: string
            example: abc
      security:
        - apiKey: []
      responses:
        '200':
          description: OK
    put:
      requestBody:
        content:
          application/json:
            example: {"name": "Pawel"}
      responses:
        '200':
          description: OK
components:
  parameters:
    PersonId:
      name: personId
      in: path
      required: true
      schema:
        type: string
  securitySchemes:
    apiKey:
      type: apiKey
      in: header
      name: x-api-key
"#;

    #[test]
    fn test_parse_servers_and_variables() {
        let doc = OpenApiParser::from_str(SPEC).unwrap().parse().unwrap();
        assert_eq!(doc.version.as_deref(), Some("v2"));
        assert_eq!(doc.servers.len(), 2);
        assert_eq!(doc.protocols, vec!["https".to_string(), "http".to_string()]);

        let vars = &doc.servers[0].variables;
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].name, "customerId");
        assert_eq!(vars[1].schema.as_ref().unwrap().enum_values.len(), 2);
        assert_eq!(vars[1].schema.as_ref().unwrap().seed_values(), vec!["443".to_string()]);
    }

    #[test]
    fn test_parse_endpoint_and_operation_parameters() {
        let doc = OpenApiParser::from_str(SPEC).unwrap().parse().unwrap();
        let endpoint = doc.endpoint("/people/{personId}").unwrap();
        assert_eq!(endpoint.parameters.len(), 1);
        assert_eq!(endpoint.parameters[0].binding, Binding::Path);
        assert_eq!(
            endpoint.parameters[0].id,
            "/people/{personId}/parameter/path/personId"
        );

        let op = doc.operation("getPerson").unwrap();
        assert_eq!(op.method, "GET");
        assert_eq!(op.parameters.len(), 2);
        let fields = op.parameters[0].schema.as_ref().unwrap();
        assert!(fields.is_array());
        assert_eq!(fields.items.as_ref().unwrap().kind, SchemaKind::String);
        assert_eq!(fields.seed_values(), vec!["name".to_string(), "age".to_string()]);
        assert_eq!(
            op.parameters[1].schema.as_ref().unwrap().seed_values(),
            vec!["abc".to_string()]
        );
    }

    #[test]
    fn test_parse_security_and_payloads() {
        let doc = OpenApiParser::from_str(SPEC).unwrap().parse().unwrap();
        let op = doc.operation("getPerson").unwrap();
        assert_eq!(op.security.len(), 1);
        assert_eq!(op.security[0].scheme_type, "apiKey");
        assert_eq!(op.security[0].settings["name"], "x-api-key");

        let put = doc.operation("put_people").unwrap();
        assert_eq!(put.payloads.len(), 1);
        assert_eq!(put.payloads[0].media_type, "application/json");
        assert!(put.payloads[0].example.as_deref().unwrap().contains("Pawel"));
    }

    #[test]
    fn test_invalid_spec_is_a_parse_error() {
        let result = OpenApiParser::from_str("not: [valid");
        assert!(matches!(result, Err(ModelError::ParseError(_))));
    }

    #[test]
    fn test_generate_operation_id() {
        assert_eq!(generate_operation_id("/users/{id}", "get"), "get_users");
        assert_eq!(generate_operation_id("/", "post"), "post_root");
    }

    #[test]
    fn test_component_name() {
        assert_eq!(
            component_name("#/components/schemas/Person", "schemas"),
            Some("Person")
        );
        assert_eq!(component_name("#/components/schemas/Person", "parameters"), None);
    }
}
