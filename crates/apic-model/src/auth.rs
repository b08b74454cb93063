//! Credential configurations for declared security schemes.
//!
//! Supported methods:
//! - API Key (in header or query parameter)
//! - Bearer Token (Authorization: Bearer <token>)
//! - Basic Auth (Authorization: Basic <base64>)
//!
//! OAuth flows are not handled here; the host acquires tokens and supplies
//! them as a bearer credential.

use crate::types::SecurityRequirement;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Authentication configuration for API requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication
    #[default]
    None,

    /// API Key authentication
    ApiKey {
        /// Location of the API key
        location: AuthLocation,
        /// Name of the header or query parameter
        name: String,
        /// The API key value
        key: String,
    },

    /// Bearer token authentication (Authorization: Bearer <token>)
    Bearer {
        /// The bearer token
        token: String,
    },

    /// HTTP Basic authentication (Authorization: Basic <base64>)
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
    },
}

/// Location where authentication credentials are provided.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthLocation {
    /// In HTTP header
    Header,
    /// In URL query parameter
    Query,
}

impl AuthConfig {
    /// Create API key authentication in header.
    ///
    /// # Example
    ///
    /// ```
    /// use apic_model::AuthConfig;
    ///
    /// let auth = AuthConfig::api_key_header("X-API-Key", "my-secret-key");
    /// ```
    pub fn api_key_header(header_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self::ApiKey {
            location: AuthLocation::Header,
            name: header_name.into(),
            key: key.into(),
        }
    }

    /// Create API key authentication in query parameter.
    pub fn api_key_query(param_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self::ApiKey {
            location: AuthLocation::Query,
            name: param_name.into(),
            key: key.into(),
        }
    }

    /// Create bearer token authentication.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Create basic authentication.
    ///
    /// # Example
    ///
    /// ```
    /// use apic_model::AuthConfig;
    ///
    /// let auth = AuthConfig::basic("username", "password");
    /// assert!(auth.is_valid());
    /// ```
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Empty credentials matching a declared security scheme.
    ///
    /// Unknown scheme types (OAuth, OpenID Connect) map to a bearer token.
    pub fn for_requirement(requirement: &SecurityRequirement) -> Self {
        let setting = |key: &str| {
            requirement
                .settings
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        match requirement.scheme_type.as_str() {
            "apiKey" => {
                let location = if setting("in") == "query" {
                    AuthLocation::Query
                } else {
                    AuthLocation::Header
                };
                Self::ApiKey {
                    location,
                    name: setting("name"),
                    key: String::new(),
                }
            }
            "http" if setting("scheme").eq_ignore_ascii_case("basic") => Self::basic("", ""),
            _ => Self::bearer(""),
        }
    }

    /// Human readable method label carried as the authorization `type`.
    pub fn label(&self) -> &'static str {
        match self {
            AuthConfig::None => "None",
            AuthConfig::ApiKey { .. } => "Api Key",
            AuthConfig::Bearer { .. } => "Bearer",
            AuthConfig::Basic { .. } => "Basic Authentication",
        }
    }

    /// Whether all required credentials are present.
    pub fn is_valid(&self) -> bool {
        match self {
            AuthConfig::None => true,
            AuthConfig::ApiKey { name, key, .. } => !name.is_empty() && !key.is_empty(),
            AuthConfig::Bearer { token } => !token.is_empty(),
            AuthConfig::Basic { username, .. } => !username.is_empty(),
        }
    }

    /// Merge the credentials into header and query lists.
    ///
    /// Existing entries with the same name are replaced.
    pub fn apply_to(&self, headers: &mut Vec<(String, String)>, query: &mut Vec<(String, String)>) {
        match self {
            AuthConfig::None => {}
            AuthConfig::ApiKey {
                location,
                name,
                key,
            } => match location {
                AuthLocation::Header => replace_entry(headers, name, key.clone(), true),
                AuthLocation::Query => replace_entry(query, name, key.clone(), false),
            },
            AuthConfig::Bearer { token } => {
                replace_entry(headers, "authorization", format!("Bearer {token}"), true)
            }
            AuthConfig::Basic { username, password } => {
                let encoded = STANDARD.encode(format!("{username}:{password}"));
                replace_entry(headers, "authorization", format!("Basic {encoded}"), true)
            }
        }
    }
}

fn replace_entry(list: &mut Vec<(String, String)>, name: &str, value: String, ignore_case: bool) {
    let matches = |existing: &str| {
        if ignore_case {
            existing.eq_ignore_ascii_case(name)
        } else {
            existing == name
        }
    };
    list.retain(|(existing, _)| !matches(existing));
    list.push((name.to_string(), value));
}
