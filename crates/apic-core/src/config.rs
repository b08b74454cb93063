//! Configuration management for the request console
//!
//! Loads configuration with priority:
//! 1. apic.toml (or specified config file)
//! 2. Environment variables referenced as `${VAR_NAME}`
//! 3. Defaults

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Host configuration surface
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub request: RequestOptions,

    #[serde(default)]
    pub overrides: ModelOverrides,

    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Headers appended to every outbound request, replacing same-named ones
    #[serde(default)]
    pub append_headers: Vec<HeaderEntry>,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Feature toggles of the request panel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Users may add their own query and header parameters
    pub allow_custom: bool,
    /// Optional parameters can be hidden from the rendered list
    pub allow_hide_optional: bool,
    /// Non-path parameters get an enable toggle
    pub allow_disable_params: bool,
    pub no_url_editor: bool,
    pub url_as_label: bool,
    pub no_server_selector: bool,
    /// A free-form base URI counts as an extra server candidate
    pub allow_custom_base_uri: bool,
    /// Keep cached values when the API model changes
    pub persist_cache: bool,
    /// Use the process-wide value cache instead of the per-instance one
    pub global_cache: bool,
    /// Merge credentials into headers/query before dispatch
    pub apply_authorization: bool,
    pub handle_navigation_events: bool,
}

/// Overrides for partial-model scenarios
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOverrides {
    /// Explicit base URI; always wins over declared servers
    pub base_uri: Option<String>,
    /// Server URI template used when the model declares none
    pub server: Option<String>,
    pub protocols: Vec<String>,
    pub api_version: Option<String>,
}

/// Proxy wrapper applied to outbound requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub url: Option<String>,
    /// Percent-encode the original URL before appending it to the proxy
    pub encode_url: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub with_credentials: bool,
    /// Zero means no timeout
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
        }
    }
}

impl TransportConfig {
    /// Timeout to attach to outbound requests, if any
    pub fn timeout(&self) -> Option<u64> {
        (self.timeout_ms > 0).then_some(self.timeout_ms)
    }
}

impl ConsoleConfig {
    /// Load configuration from apic.toml in the current directory or a parent
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            Self::find_config_file()?
        };

        tracing::debug!("Loading configuration from: {:?}", config_path);

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))
    }

    /// Parse configuration from TOML text and resolve `${VAR}` references
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config: ConsoleConfig = toml::from_str(contents)?;
        config.resolve_env_vars();
        Ok(config)
    }

    /// Find apic.toml by searching current directory and parents
    fn find_config_file() -> Result<PathBuf> {
        let mut current = env::current_dir()?;

        loop {
            let config_path = current.join("apic.toml");
            if config_path.exists() {
                return Ok(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        Err(anyhow!("apic.toml not found in the current directory or its parents"))
    }

    fn resolve_env_vars(&mut self) {
        if let Some(ref uri) = self.overrides.base_uri {
            self.overrides.base_uri = Self::resolve_env_var(uri);
        }

        if let Some(ref url) = self.proxy.url {
            self.proxy.url = Self::resolve_env_var(url);
        }

        for header in &mut self.append_headers {
            if let Some(resolved) = Self::resolve_env_var(&header.value) {
                header.value = resolved;
            } else {
                tracing::warn!(
                    "Environment reference for header '{}' is not set",
                    header.name
                );
            }
        }
    }

    /// Resolve a single ${VAR_NAME} reference
    fn resolve_env_var(value: &str) -> Option<String> {
        if value.starts_with("${") && value.ends_with('}') {
            let var_name = &value[2..value.len() - 1];
            env::var(var_name).ok()
        } else {
            Some(value.to_string())
        }
    }
}

fn default_service_name() -> String {
    "apic".to_string()
}
