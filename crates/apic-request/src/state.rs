//! Request state machine.
//!
//! [`RequestState`] owns everything one request panel shows: the selected
//! operation and server, the parameter model, the body editor, the computed
//! URL and the in-flight request. It reacts to selection changes, field
//! edits and direct URL edits, and keeps the URL and the parameters in sync.
//!
//! The state never performs I/O. `execute()` hands an [`ApiRequest`] to the
//! transport channel (or returns it to the caller) and responses are fed
//! back through [`RequestState::handle_response`].

use crate::body::BodyEditor;
use crate::cache::ValueCache;
use crate::params::{OperationParameter, ParameterModelBuilder, ParameterSet, ParameterSource};
use crate::serializer::{RequestObject, RequestSerializer, SerializeInput};
use crate::transport::TransportHandle;
use crate::url::{
    BackfillStatus, UriOptions, UrlBackfill, UrlValidity, apply_url_parameters,
    apply_url_variables, compute_endpoint_uri, reverse_parse, validate_url,
};
use crate::value::ParamValue;
use apic_core::{
    AbortSignal, ApiRequest, ApiResponse, ConsoleConfig, Error, NavigationEvent, Payload, Result,
};
use apic_model::{ApiModel, ApiServer, AuthConfig, Binding, Endpoint, Operation};
use apic_telemetry::{
    RequestSpanAttributes, ResponseSpanAttributes, trace_request_dispatch, trace_response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Coarse phase of the request panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// No operation selected
    Idle,
    Modeled,
    /// The user is typing in the URL field
    EditingUrl,
    /// A request is in flight
    Sending,
}

/// Kind of the selected server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    /// A server declared in the API model
    Server,
    /// A base URI typed by the user
    Custom,
    /// A server supplied by the host
    Slot,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSelection {
    pub server_value: Option<String>,
    pub server_type: Option<ServerType>,
}

/// Snapshot of the editable request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDraft {
    pub url: String,
    pub http_method: Option<String>,
    pub headers: String,
    pub payload: Option<Payload>,
    pub security: Option<usize>,
    pub loading_request: bool,
    pub request_id: Option<String>,
}

pub struct RequestState {
    config: ConsoleConfig,
    owner_id: String,
    cache: ValueCache,
    builder: ParameterModelBuilder,

    model: Option<Arc<dyn ApiModel>>,
    selected: Option<String>,
    operation: Option<Operation>,
    endpoint: Option<Endpoint>,
    servers: Vec<ApiServer>,
    slot_servers: Vec<String>,
    selection: ServerSelection,

    params: ParameterSet,
    show_optional: bool,
    body: BodyEditor,
    security: Option<usize>,
    credentials: Vec<AuthConfig>,

    url: String,
    editing_url: bool,
    validity: UrlValidity,

    loading_request: bool,
    request_id: Option<String>,
    transport: Option<TransportHandle>,
    last_request: Option<ApiRequest>,
    last_response: Option<ApiResponse>,
}

impl RequestState {
    /// New state backed by the process-wide value cache.
    pub fn new(config: ConsoleConfig) -> Self {
        Self::with_cache(config, ValueCache::shared())
    }

    pub fn with_cache(config: ConsoleConfig, cache: ValueCache) -> Self {
        let owner_id = format!("apic-{}", uuid::Uuid::new_v4());
        cache.register_local(&owner_id);

        let builder = ParameterModelBuilder::new(
            owner_id.clone(),
            cache.clone(),
            config.request.global_cache,
        )
        .with_api_version(config.overrides.api_version.clone());

        Self {
            config,
            owner_id,
            cache,
            builder,
            model: None,
            selected: None,
            operation: None,
            endpoint: None,
            servers: Vec::new(),
            slot_servers: Vec::new(),
            selection: ServerSelection::default(),
            params: ParameterSet::default(),
            show_optional: false,
            body: BodyEditor::new(),
            security: None,
            credentials: Vec::new(),
            url: String::new(),
            editing_url: false,
            validity: UrlValidity::Invalid,
            loading_request: false,
            request_id: None,
            transport: None,
            last_request: None,
            last_response: None,
        }
    }

    /// Attach the transport channel used by `execute()` and `abort()`.
    pub fn connect(&mut self, transport: TransportHandle) {
        self.transport = Some(transport);
    }

    /// Replace the API model and re-apply the current selection.
    ///
    /// Values cached for this panel are dropped unless `persist_cache` is set.
    pub fn set_model(&mut self, model: Arc<dyn ApiModel>) {
        if self.model.is_some() && !self.config.request.persist_cache {
            debug!("API model changed, clearing value cache of {}", self.owner_id);
            self.cache.clear_local(&self.owner_id);
        }

        let version = self
            .config
            .overrides
            .api_version
            .clone()
            .or_else(|| model.version().map(String::from));
        self.builder = self.builder.clone().with_api_version(version);
        self.model = Some(model);

        let selected = self.selected.clone();
        self.select_operation(selected.as_deref());
    }

    /// Select an operation by id; `None` or an empty id clears the selection.
    pub fn select_operation(&mut self, operation_id: Option<&str>) {
        self.clear_response();
        self.loading_request = false;
        self.request_id = None;
        self.editing_url = false;

        let id = operation_id.filter(|id| !id.is_empty());
        self.selected = id.map(String::from);

        let found = match (&self.model, id) {
            (Some(model), Some(id)) => model.operation(id).cloned().map(|op| {
                let endpoint = model.endpoint_for_operation(id).cloned();
                (op, endpoint, model.servers_for(Some(id)))
            }),
            _ => None,
        };

        let Some((operation, endpoint, servers)) = found else {
            if let Some(id) = id {
                debug!("Operation {} is not in the API model", id);
            }
            self.clear_draft();
            return;
        };

        self.servers = servers;
        if !self.selection_is_valid() {
            self.selection = match self.servers.first() {
                Some(server) => ServerSelection {
                    server_value: Some(server.url.clone()),
                    server_type: Some(ServerType::Server),
                },
                None => ServerSelection::default(),
            };
        }

        let server = self.selected_server();
        self.params = self
            .builder
            .build(&operation, endpoint.as_ref(), server.as_ref());
        self.body = BodyEditor::for_payloads(&operation.payloads);
        self.credentials = operation.security.iter().map(AuthConfig::for_requirement).collect();
        self.security = (!self.credentials.is_empty()).then_some(0);

        info!(
            operation = %operation.id,
            method = %operation.method,
            servers = self.servers.len(),
            "Selected operation"
        );
        self.operation = Some(operation);
        self.endpoint = endpoint;
        self.recompute_url();
    }

    fn clear_draft(&mut self) {
        self.operation = None;
        self.endpoint = None;
        self.servers = self
            .model
            .as_ref()
            .map(|model| model.servers().to_vec())
            .unwrap_or_default();
        self.params = ParameterSet::default();
        self.body = BodyEditor::new();
        self.security = None;
        self.credentials.clear();
        self.url.clear();
        self.validity = UrlValidity::Invalid;
    }

    fn selection_is_valid(&self) -> bool {
        let Some(value) = self.selection.server_value.as_deref() else {
            return false;
        };
        match self.selection.server_type {
            Some(ServerType::Server) => self.servers.iter().any(|s| s.url == value),
            Some(ServerType::Custom) => self.config.request.allow_custom_base_uri,
            Some(ServerType::Slot) => self.slot_servers.iter().any(|s| s == value),
            None => false,
        }
    }

    /// The server the URL is built from. A configured server override wins
    /// over the selection.
    fn selected_server(&self) -> Option<ApiServer> {
        let overridden = self.config.overrides.server.as_deref();
        if let Some(server) = overridden.filter(|s| !s.is_empty()) {
            return Some(ApiServer::new(server));
        }
        let value = self
            .selection
            .server_value
            .as_deref()
            .filter(|v| !v.is_empty())?;
        match self.selection.server_type? {
            ServerType::Server => self.servers.iter().find(|s| s.url == value).cloned(),
            ServerType::Custom | ServerType::Slot => Some(ApiServer::new(value)),
        }
    }

    /// Declared servers plus the custom base URI and host-provided servers.
    pub fn servers_count(&self) -> usize {
        self.servers.len()
            + self.slot_servers.len()
            + usize::from(self.config.request.allow_custom_base_uri)
    }

    pub fn server_selector_hidden(&self) -> bool {
        self.config.request.no_server_selector || self.servers_count() <= 1
    }

    /// Servers supplied by the host in addition to the declared ones.
    ///
    /// A selected slot that is no longer listed falls back to the first
    /// declared server.
    pub fn set_slot_servers(&mut self, servers: Vec<String>) {
        self.slot_servers = servers;
        if self.selection.server_type != Some(ServerType::Slot) || self.selection_is_valid() {
            return;
        }
        debug!("Selected slot server was removed");
        match self.servers.first().map(|s| s.url.clone()) {
            Some(url) => self.select_server(url, ServerType::Server),
            None => {
                self.selection = ServerSelection::default();
                if self.operation.is_some() {
                    self.params.replace_server_parameters(Vec::new());
                    self.recompute_url();
                }
            }
        }
    }

    pub fn select_server(&mut self, value: impl Into<String>, server_type: ServerType) {
        let value = value.into();
        debug!("Selected {:?} server {}", server_type, value);
        self.selection = ServerSelection {
            server_value: Some(value),
            server_type: Some(server_type),
        };

        if self.operation.is_none() {
            return;
        }
        let server = self.selected_server();
        let server_params = self.builder.server_parameters(server.as_ref());
        self.params.replace_server_parameters(server_params);
        self.recompute_url();
    }

    fn uri_options(&self) -> UriOptions {
        let overrides = &self.config.overrides;
        let server = self.selected_server();

        let protocols = if !overrides.protocols.is_empty() {
            overrides.protocols.clone()
        } else if let Some(server) = server.as_ref().filter(|s| !s.protocols.is_empty()) {
            server.protocols.clone()
        } else {
            self.model
                .as_ref()
                .map(|model| model.protocols().to_vec())
                .unwrap_or_default()
        };

        UriOptions {
            base_uri: overrides.base_uri.clone(),
            server: server
                .as_ref()
                .map(|s| s.url.clone())
                .or_else(|| self.selection.server_value.clone()),
            protocols,
            version: overrides.api_version.clone().or_else(|| {
                let declared = server
                    .as_ref()
                    .is_some_and(|s| s.variables.iter().any(|v| v.name == "version"));
                if declared {
                    return None;
                }
                self.model.as_ref().and_then(|m| m.version().map(String::from))
            }),
        }
    }

    /// The URL with every variable still a `{token}` and no query string.
    pub fn url_template(&self) -> String {
        let path = self.endpoint.as_ref().map_or("", |e| e.path.as_str());
        compute_endpoint_uri(&self.uri_options(), path)
    }

    fn recompute_url(&mut self) {
        if self.editing_url {
            debug!("URL is being edited, skipping recomputation");
            return;
        }
        let url = apply_url_variables(&self.url_template(), &self.params.path_variables(), true);
        self.url = apply_url_parameters(&url, &self.params.query_params(), true);
        self.validate();
    }

    /// Update a parameter value and remember it.
    ///
    /// Returns false when no parameter has this id.
    pub fn set_parameter_value(&mut self, param_id: &str, value: impl Into<ParamValue>) -> bool {
        let Some(param) = self.params.find_mut(param_id) else {
            return false;
        };
        param.value = value.into();
        self.builder.store(param);
        self.recompute_url();
        true
    }

    /// Update one element of an array parameter, growing it as needed.
    pub fn set_parameter_item(&mut self, param_id: &str, index: usize, value: &str) -> bool {
        let Some(param) = self.params.find_mut(param_id) else {
            return false;
        };
        let mut values = match std::mem::take(&mut param.value) {
            ParamValue::Multiple(values) => values,
            ParamValue::Single(single) if single.is_empty() => Vec::new(),
            ParamValue::Single(single) => vec![single],
        };
        if values.len() <= index {
            values.resize(index + 1, String::new());
        }
        values[index] = value.to_string();
        param.value = ParamValue::Multiple(values);
        self.builder.store(param);
        self.recompute_url();
        true
    }

    /// Remove one element of an array parameter.
    pub fn remove_parameter_item(&mut self, param_id: &str, index: usize) -> bool {
        let Some(param) = self.params.find_mut(param_id) else {
            return false;
        };
        let ParamValue::Multiple(values) = &mut param.value else {
            return false;
        };
        if index >= values.len() {
            return false;
        }
        values.remove(index);
        self.builder.store(param);
        self.recompute_url();
        true
    }

    /// Toggle a non-path parameter when disabling is allowed.
    pub fn set_parameter_enabled(&mut self, param_id: &str, enabled: bool) -> bool {
        if !self.config.request.allow_disable_params {
            return false;
        }
        match self.params.find_mut(param_id) {
            Some(param) if param.binding != Binding::Path => param.enabled = enabled,
            _ => return false,
        }
        self.recompute_url();
        true
    }

    /// Add an empty user parameter to the query or header group.
    pub fn add_custom_parameter(&mut self, binding: Binding) -> Option<String> {
        if !self.config.request.allow_custom
            || self.operation.is_none()
            || !matches!(binding, Binding::Query | Binding::Header)
        {
            return None;
        }
        let param = self.builder.custom_parameter(binding);
        let id = param.param_id.clone();
        self.params.push(param);
        Some(id)
    }

    pub fn set_custom_parameter_name(&mut self, param_id: &str, name: impl Into<String>) -> bool {
        match self.params.find_mut(param_id) {
            Some(param) if param.source == ParameterSource::Custom => param.name = name.into(),
            _ => return false,
        }
        self.recompute_url();
        true
    }

    pub fn remove_custom_parameter(&mut self, param_id: &str) -> bool {
        if self
            .params
            .find(param_id)
            .is_none_or(|p| p.source != ParameterSource::Custom)
        {
            return false;
        }
        self.params.remove(param_id);
        self.builder.forget(param_id);
        self.recompute_url();
        true
    }

    pub fn show_optional(&mut self, show: bool) {
        self.show_optional = show;
    }

    /// Parameters to render, honoring `allow_hide_optional`.
    pub fn visible_parameters(&self) -> Vec<&OperationParameter> {
        if self.config.request.allow_hide_optional {
            self.params.visible(self.show_optional)
        } else {
            self.params.iter().collect()
        }
    }

    /// Take typed URL text as the authoritative URL.
    ///
    /// Parameters are not touched until [`commit_url`](Self::commit_url).
    pub fn edit_url(&mut self, text: impl Into<String>) -> bool {
        if self.config.request.no_url_editor {
            return false;
        }
        self.editing_url = true;
        self.url = text.into();
        self.validate();
        true
    }

    /// Finish a URL edit and push the typed values back into the parameters.
    ///
    /// The typed text stays the current URL even when its path does not
    /// match the endpoint template.
    pub fn commit_url(&mut self) -> UrlBackfill {
        self.editing_url = false;
        let backfill = reverse_parse(&self.url, &self.url_template());
        if backfill.status == BackfillStatus::Failed {
            return backfill;
        }

        for (name, value) in &backfill.path {
            if let Some(param) = self
                .params
                .path
                .iter_mut()
                .find(|p| &p.name == name)
            {
                param.value = ParamValue::Single(value.clone());
                self.builder.store(param);
            }
        }

        let allow_disable = self.config.request.allow_disable_params;
        for param in self.params.query.iter_mut().filter(|p| !p.name.is_empty()) {
            let typed = backfill.query.get(&param.name);
            let value = match typed {
                Some(value) => {
                    if allow_disable {
                        param.enabled = true;
                    }
                    value.clone()
                }
                None if param.is_active() && param.is_array() => ParamValue::Multiple(Vec::new()),
                None if param.is_active() => ParamValue::default(),
                None => continue,
            };
            param.value = match value {
                ParamValue::Single(single) if param.is_array() => ParamValue::Multiple(vec![single]),
                other => other,
            };
            self.builder.store(param);
        }

        let unknown: Vec<(String, ParamValue)> = backfill
            .query
            .iter()
            .filter(|(name, _)| !self.params.query.iter().any(|p| p.name == *name))
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        for (name, value) in unknown {
            if !self.config.request.allow_custom {
                debug!("Ignoring undeclared query parameter {}", name);
                continue;
            }
            let mut param = self.builder.custom_parameter(Binding::Query);
            param.name = name;
            param.value = value;
            self.builder.store(&param);
            self.params.push(param);
        }

        debug!(status = ?backfill.status, "Committed URL edit");
        self.validate();
        backfill
    }

    /// Re-check the current URL. Returns the result it also stores.
    pub fn validate(&mut self) -> UrlValidity {
        self.validity = validate_url(&self.url);
        self.validity
    }

    pub fn is_invalid(&self) -> bool {
        self.validity.is_invalid()
    }

    pub fn body(&self) -> &BodyEditor {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut BodyEditor {
        &mut self.body
    }

    /// Select one of the operation's security requirements by index.
    pub fn select_security(&mut self, index: usize) -> bool {
        if index >= self.credentials.len() {
            return false;
        }
        self.security = Some(index);
        true
    }

    /// Credentials for the selected security requirement.
    pub fn set_credentials(&mut self, credentials: AuthConfig) -> bool {
        match self.security.and_then(|i| self.credentials.get_mut(i)) {
            Some(slot) => {
                *slot = credentials;
                true
            }
            None => false,
        }
    }

    pub fn credentials(&self) -> Option<&AuthConfig> {
        self.security.and_then(|i| self.credentials.get(i))
    }

    /// Whether the selected credentials are complete. True without security.
    pub fn auth_valid(&self) -> bool {
        self.credentials().is_none_or(AuthConfig::is_valid)
    }

    /// Assemble the request object from the current state.
    pub fn serialize(&self) -> Result<RequestObject> {
        let operation = self.operation.as_ref().ok_or(Error::NoOperationSelected)?;
        let headers = self.params.header_pairs();
        Ok(RequestSerializer::serialize(SerializeInput {
            method: &operation.method,
            url: &self.url,
            headers: &headers,
            body: &self.body,
            auth: self.credentials(),
            apply_authorization: self.config.request.apply_authorization,
        }))
    }

    /// Serialize and dispatch a new request.
    ///
    /// Without a connected transport the request is only returned; the host
    /// sends it and reports back through [`handle_response`](Self::handle_response).
    pub fn execute(&mut self) -> Result<ApiRequest> {
        if self.operation.is_none() {
            return Err(Error::NoOperationSelected);
        }
        if self.editing_url {
            self.commit_url();
        }

        let id = uuid::Uuid::new_v4().to_string();
        let request = self.serialize()?.into_request(id.clone(), &self.config.transport);

        trace_request_dispatch(RequestSpanAttributes {
            request_id: id.clone(),
            operation_id: self.selected.clone().unwrap_or_default(),
            method: request.method.clone(),
            url: request.url.clone(),
        });

        let request = match &self.transport {
            Some(transport) => transport.dispatch(request)?,
            None => request,
        };

        info!(request_id = %id, url = %request.url, "Dispatched request");
        self.loading_request = true;
        self.request_id = Some(id);
        self.last_request = Some(request.clone());
        Ok(request)
    }

    /// Cancel the current request. Returns the emitted signal, if any.
    pub fn abort(&mut self) -> Option<AbortSignal> {
        let Some(id) = self.request_id.take() else {
            debug!("Abort requested with no request in flight");
            return None;
        };
        self.loading_request = false;

        let signal = AbortSignal {
            id,
            url: self.url.clone(),
        };
        if let Some(transport) = &self.transport {
            transport.abort(signal.clone());
        }
        info!(request_id = %signal.id, "Aborted request");
        Some(signal)
    }

    /// Apply a transport response. Responses for other requests are dropped.
    pub fn handle_response(&mut self, response: ApiResponse) -> bool {
        let current = self.request_id.as_deref() == Some(response.id.as_str());

        trace_response(ResponseSpanAttributes {
            request_id: response.id.clone(),
            status: response.response.status,
            is_error: response.is_error,
            loading_time_ms: response.loading_time,
            stale: !current,
        });

        if !current {
            debug!("Dropping stale response {}", response.id);
            return false;
        }

        self.loading_request = false;
        self.request_id = None;
        self.last_response = Some(response);
        true
    }

    /// Drain pending responses from the transport. Returns how many applied.
    pub fn poll_responses(&mut self) -> usize {
        let mut applied = 0;
        while let Some(response) = self.transport.as_mut().and_then(TransportHandle::try_recv) {
            if self.handle_response(response) {
                applied += 1;
            }
        }
        applied
    }

    /// React to a navigation signal when navigation handling is on.
    pub fn handle_navigation(&mut self, event: &NavigationEvent) -> bool {
        if !self.config.request.handle_navigation_events {
            return false;
        }
        if event.is_method() {
            self.select_operation(event.selected.as_deref());
        } else {
            self.select_operation(None);
        }
        true
    }

    pub fn clear_response(&mut self) {
        self.last_request = None;
        self.last_response = None;
    }

    pub fn phase(&self) -> Phase {
        if self.operation.is_none() {
            Phase::Idle
        } else if self.loading_request {
            Phase::Sending
        } else if self.editing_url {
            Phase::EditingUrl
        } else {
            Phase::Modeled
        }
    }

    pub fn draft(&self) -> RequestDraft {
        let request = self.serialize().ok();
        RequestDraft {
            url: self.url.clone(),
            http_method: self.operation.as_ref().map(|op| op.method.to_uppercase()),
            headers: request.as_ref().map(|r| r.headers.clone()).unwrap_or_default(),
            payload: request.and_then(|r| r.payload),
            security: self.security,
            loading_request: self.loading_request,
            request_id: self.request_id.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn validity(&self) -> UrlValidity {
        self.validity
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn selected_operation(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn operation(&self) -> Option<&Operation> {
        self.operation.as_ref()
    }

    pub fn servers(&self) -> &[ApiServer] {
        &self.servers
    }

    pub fn server_selection(&self) -> &ServerSelection {
        &self.selection
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    pub fn is_loading(&self) -> bool {
        self.loading_request
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn last_request(&self) -> Option<&ApiRequest> {
        self.last_request.as_ref()
    }

    pub fn last_response(&self) -> Option<&ApiResponse> {
        self.last_response.as_ref()
    }
}

impl Drop for RequestState {
    fn drop(&mut self) {
        self.cache.unregister_local(&self.owner_id);
    }
}
