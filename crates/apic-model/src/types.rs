//! Data structures describing an API model.
//!
//! These are read-only descriptors. The request console never mutates them;
//! a new selection simply looks up a different `Operation`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Location where a parameter appears in the request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Binding {
    /// Path parameter (e.g., /users/{id})
    Path,
    /// Query parameter (e.g., ?search=value)
    Query,
    /// Header parameter (e.g., X-Custom-Header)
    Header,
    /// Cookie parameter
    Cookie,
}

impl std::fmt::Display for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::Path => write!(f, "path"),
            Binding::Query => write!(f, "query"),
            Binding::Header => write!(f, "header"),
            Binding::Cookie => write!(f, "cookie"),
        }
    }
}

/// Input shape of a parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl SchemaKind {
    /// Map a JSON schema `type` keyword.
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "number" => SchemaKind::Number,
            "integer" => SchemaKind::Integer,
            "boolean" => SchemaKind::Boolean,
            "array" => SchemaKind::Array,
            "object" => SchemaKind::Object,
            _ => SchemaKind::String,
        }
    }
}

/// Schema of a single parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSchema {
    pub id: String,
    pub kind: SchemaKind,
    pub format: Option<String>,
    pub default: Option<Value>,
    pub examples: Vec<Value>,
    /// Allowed values; non-empty for enum inputs
    pub enum_values: Vec<Value>,
    /// Item schema for arrays
    pub items: Option<Box<ParamSchema>>,
}

impl ParamSchema {
    pub fn new(id: impl Into<String>, kind: SchemaKind) -> Self {
        Self {
            id: id.into(),
            kind,
            ..Default::default()
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_example(mut self, value: Value) -> Self {
        self.examples.push(value);
        self
    }

    pub fn is_array(&self) -> bool {
        self.kind == SchemaKind::Array
    }

    pub fn is_enum(&self) -> bool {
        !self.enum_values.is_empty()
    }

    /// Values used to seed an input: the declared default, else the first example.
    ///
    /// Arrays expand into one entry per element.
    pub fn seed_values(&self) -> Vec<String> {
        let source = self.default.as_ref().or_else(|| self.examples.first());
        match source {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().filter_map(value_to_text).collect(),
            Some(other) => value_to_text(other).into_iter().collect(),
        }
    }
}

/// Render a JSON scalar the way a form input shows it.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A declared parameter (path, query, header or server variable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDecl {
    /// Stable identity of the declaration
    pub id: String,
    pub name: String,
    pub binding: Binding,
    pub required: bool,
    pub schema: Option<ParamSchema>,
    pub description: Option<String>,
}

impl ParameterDecl {
    pub fn new(id: impl Into<String>, name: impl Into<String>, binding: Binding) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            binding,
            required: binding == Binding::Path,
            schema: None,
            description: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required || self.binding == Binding::Path;
        self
    }

    pub fn with_schema(mut self, schema: ParamSchema) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// A declared base URI template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiServer {
    pub id: String,
    /// Base URI template, e.g. `https://{customerId}.saas-app.com:{port}/v2`
    pub url: String,
    pub description: Option<String>,
    /// Variables declared for the template, in declaration order
    pub variables: Vec<ParameterDecl>,
    /// Protocols supported by this server; empty means the API's protocols
    pub protocols: Vec<String>,
}

impl ApiServer {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: format!("server/{url}"),
            url,
            description: None,
            variables: Vec::new(),
            protocols: Vec::new(),
        }
    }

    pub fn with_variable(mut self, variable: ParameterDecl) -> Self {
        self.variables.push(variable);
        self
    }

    /// Names of `{name}` tokens in the URL template, in order of appearance.
    pub fn template_variables(&self) -> Vec<String> {
        template_variables(&self.url)
    }
}

/// Names of every `{name}` token in a URI template, in order of appearance.
pub fn template_variables(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                if !name.is_empty() && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    names
}

/// A request body media type declared by an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadDecl {
    pub media_type: String,
    pub schema: Option<Value>,
    /// Example body rendered as text
    pub example: Option<String>,
}

impl PayloadDecl {
    pub fn new(media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            schema: None,
            example: None,
        }
    }
}

/// Security requirement for an operation, joined with its scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityRequirement {
    /// Security scheme name (from components.securitySchemes)
    pub scheme_name: String,
    /// Scheme type, e.g. `apiKey`, `http`, `oauth2`
    pub scheme_type: String,
    /// Scheme details such as `in`/`name` for API keys or `scheme` for HTTP
    pub settings: Value,
    /// Required scopes (for OAuth2)
    pub scopes: Vec<String>,
}

/// The parent resource of operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: String,
    /// Path template (e.g., "/users/{id}")
    pub path: String,
    pub name: Option<String>,
    /// Endpoint-level parameters
    pub parameters: Vec<ParameterDecl>,
    /// Server overrides for this endpoint
    pub servers: Vec<ApiServer>,
    /// Ids of the operations under this endpoint
    pub operations: Vec<String>,
}

impl Endpoint {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            id: path.clone(),
            path,
            name: None,
            parameters: Vec::new(),
            servers: Vec::new(),
            operations: Vec::new(),
        }
    }
}

/// One HTTP method on one API path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    /// HTTP method as declared (GET, POST, PUT, DELETE, etc.)
    pub method: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub endpoint_id: String,
    /// Operation-level parameters (query, header and extra path)
    pub parameters: Vec<ParameterDecl>,
    pub payloads: Vec<PayloadDecl>,
    pub security: Vec<SecurityRequirement>,
    /// Server overrides for this operation
    pub servers: Vec<ApiServer>,
}

impl Operation {
    pub fn new(
        id: impl Into<String>,
        method: impl Into<String>,
        endpoint_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            name: None,
            description: None,
            endpoint_id: endpoint_id.into(),
            parameters: Vec::new(),
            payloads: Vec::new(),
            security: Vec::new(),
            servers: Vec::new(),
        }
    }
}
