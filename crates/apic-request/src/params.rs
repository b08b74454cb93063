//! Parameter model builder.
//!
//! Derives the ordered path, query and header parameters for the selected
//! operation and server, seeding values from the [`ValueCache`] and falling
//! back to schema defaults and examples.

use crate::cache::ValueCache;
use crate::value::ParamValue;
use apic_model::{ApiServer, Binding, Endpoint, Operation, ParamSchema, ParameterDecl, template_variables};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Where a parameter was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterSource {
    Server,
    Endpoint,
    Operation,
    /// Added by the user
    Custom,
}

/// A renderable parameter with its current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationParameter {
    pub param_id: String,
    pub name: String,
    pub binding: Binding,
    pub source: ParameterSource,
    pub schema: Option<ParamSchema>,
    pub schema_id: Option<String>,
    pub required: bool,
    /// Disabled parameters keep their value but are left out of the request
    pub enabled: bool,
    pub value: ParamValue,
    pub description: Option<String>,
}

impl OperationParameter {
    fn from_decl(decl: &ParameterDecl, source: ParameterSource) -> Self {
        Self {
            param_id: decl.id.clone(),
            name: decl.name.clone(),
            binding: decl.binding,
            source,
            schema: decl.schema.clone(),
            schema_id: decl.schema.as_ref().map(|s| s.id.clone()),
            required: decl.required || decl.binding == Binding::Path,
            enabled: true,
            value: ParamValue::default(),
            description: decl.description.clone(),
        }
    }

    pub fn is_array(&self) -> bool {
        self.schema.as_ref().is_some_and(ParamSchema::is_array)
    }

    /// Path parameters are always enabled.
    pub fn is_active(&self) -> bool {
        self.enabled || self.binding == Binding::Path
    }
}

/// Parameters of the current selection, grouped by binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    /// Server variables first, then endpoint and operation path parameters
    pub path: Vec<OperationParameter>,
    pub query: Vec<OperationParameter>,
    pub header: Vec<OperationParameter>,
}

impl ParameterSet {
    pub fn is_empty(&self) -> bool {
        self.path.is_empty() && self.query.is_empty() && self.header.is_empty()
    }

    pub fn group(&self, binding: Binding) -> &[OperationParameter] {
        match binding {
            Binding::Path => &self.path,
            Binding::Query => &self.query,
            Binding::Header => &self.header,
            Binding::Cookie => &[],
        }
    }

    fn group_mut(&mut self, binding: Binding) -> Option<&mut Vec<OperationParameter>> {
        match binding {
            Binding::Path => Some(&mut self.path),
            Binding::Query => Some(&mut self.query),
            Binding::Header => Some(&mut self.header),
            Binding::Cookie => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationParameter> {
        self.path.iter().chain(&self.query).chain(&self.header)
    }

    pub fn find(&self, param_id: &str) -> Option<&OperationParameter> {
        self.iter().find(|p| p.param_id == param_id)
    }

    pub fn find_mut(&mut self, param_id: &str) -> Option<&mut OperationParameter> {
        self.path
            .iter_mut()
            .chain(self.query.iter_mut())
            .chain(self.header.iter_mut())
            .find(|p| p.param_id == param_id)
    }

    /// Append a parameter at the end of its binding's group.
    pub fn push(&mut self, param: OperationParameter) {
        if let Some(group) = self.group_mut(param.binding) {
            group.push(param);
        }
    }

    pub fn remove(&mut self, param_id: &str) -> Option<OperationParameter> {
        for group in [&mut self.path, &mut self.query, &mut self.header] {
            if let Some(pos) = group.iter().position(|p| p.param_id == param_id) {
                return Some(group.remove(pos));
            }
        }
        None
    }

    /// Values for `{name}` substitution. Unset variables are left out.
    pub fn path_variables(&self) -> HashMap<String, String> {
        self.path
            .iter()
            .filter_map(|p| p.value.first().map(|v| (p.name.clone(), v.to_string())))
            .collect()
    }

    /// Enabled query parameters in order; empty values map to `None`.
    pub fn query_params(&self) -> Vec<(String, Option<ParamValue>)> {
        self.query
            .iter()
            .filter(|p| p.is_active() && !p.name.is_empty())
            .map(|p| (p.name.clone(), p.value.non_empty()))
            .collect()
    }

    /// Enabled headers with a value, in declaration order.
    ///
    /// Array values are joined with a comma.
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.header
            .iter()
            .filter(|p| p.is_active() && !p.name.is_empty())
            .filter_map(|p| {
                p.value
                    .non_empty()
                    .map(|value| (p.name.clone(), value.values().join(",")))
            })
            .collect()
    }

    /// Parameters shown when optional ones may be hidden.
    pub fn visible(&self, show_optional: bool) -> Vec<&OperationParameter> {
        self.iter()
            .filter(|p| show_optional || p.required || p.source == ParameterSource::Custom)
            .collect()
    }

    /// Swap the server variable entries for a new server's variables.
    pub fn replace_server_parameters(&mut self, server_params: Vec<OperationParameter>) {
        self.path.retain(|p| p.source != ParameterSource::Server);
        self.path.splice(0..0, server_params);
    }
}

/// Builds [`ParameterSet`]s for one owner.
#[derive(Clone)]
pub struct ParameterModelBuilder {
    owner_id: String,
    cache: ValueCache,
    use_global: bool,
    api_version: Option<String>,
}

impl ParameterModelBuilder {
    pub fn new(owner_id: impl Into<String>, cache: ValueCache, use_global: bool) -> Self {
        Self {
            owner_id: owner_id.into(),
            cache,
            use_global,
            api_version: None,
        }
    }

    /// An undeclared `{version}` server variable is resolved from this value
    /// instead of being rendered as a parameter.
    pub fn with_api_version(mut self, version: Option<String>) -> Self {
        self.api_version = version;
        self
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn build(
        &self,
        operation: &Operation,
        endpoint: Option<&Endpoint>,
        server: Option<&ApiServer>,
    ) -> ParameterSet {
        let mut merged: Vec<OperationParameter> = Vec::new();

        let endpoint_decls = endpoint.map(|e| e.parameters.as_slice()).unwrap_or_default();
        let declared = endpoint_decls
            .iter()
            .map(|d| (d, ParameterSource::Endpoint))
            .chain(operation.parameters.iter().map(|d| (d, ParameterSource::Operation)));

        for (decl, source) in declared {
            if decl.binding == Binding::Cookie {
                debug!("Skipping cookie parameter {}", decl.name);
                continue;
            }
            let param = OperationParameter::from_decl(decl, source);
            match merged
                .iter_mut()
                .find(|p| p.binding == param.binding && p.name == param.name)
            {
                Some(existing) => *existing = param,
                None => merged.push(param),
            }
        }

        // Path tokens without a declaration still need an input
        if let Some(endpoint) = endpoint {
            for name in template_variables(&endpoint.path) {
                let known = merged
                    .iter()
                    .any(|p| p.binding == Binding::Path && p.name == name);
                if !known {
                    let decl = ParameterDecl::new(
                        format!("{}/parameter/path/{}", endpoint.id, name),
                        name,
                        Binding::Path,
                    );
                    merged.push(OperationParameter::from_decl(&decl, ParameterSource::Endpoint));
                }
            }
        }

        let mut set = ParameterSet {
            path: self.server_parameters(server),
            ..ParameterSet::default()
        };
        for mut param in merged {
            param.value = self.seed(&param);
            set.push(param);
        }

        debug!(
            operation = %operation.id,
            path = set.path.len(),
            query = set.query.len(),
            header = set.header.len(),
            "Built parameter model"
        );
        set
    }

    /// Path-like parameters for the server's template variables.
    pub fn server_parameters(&self, server: Option<&ApiServer>) -> Vec<OperationParameter> {
        let Some(server) = server else {
            return Vec::new();
        };

        let mut params: Vec<OperationParameter> = Vec::new();
        let names = server.template_variables();
        for name in &names {
            let declared = server.variables.iter().find(|v| &v.name == name);
            if name == "version" && declared.is_none() && self.api_version.is_some() {
                continue;
            }
            let decl = declared
                .cloned()
                .unwrap_or_else(|| {
                    ParameterDecl::new(
                        format!("{}/variable/{}", server.id, name),
                        name.clone(),
                        Binding::Path,
                    )
                });
            let mut param = OperationParameter::from_decl(&decl, ParameterSource::Server);
            param.binding = Binding::Path;
            param.required = true;
            param.value = self.seed(&param);
            params.push(param);
        }
        params
    }

    /// A new, empty user-defined parameter.
    pub fn custom_parameter(&self, binding: Binding) -> OperationParameter {
        OperationParameter {
            param_id: format!("custom-{}", uuid::Uuid::new_v4()),
            name: String::new(),
            binding,
            source: ParameterSource::Custom,
            schema: None,
            schema_id: None,
            required: false,
            enabled: true,
            value: ParamValue::default(),
            description: None,
        }
    }

    /// Remember a parameter's current value.
    pub fn store(&self, param: &OperationParameter) {
        self.cache
            .store(&self.owner_id, &param.param_id, param.value.clone(), self.use_global);
    }

    pub fn forget(&self, param_id: &str) {
        self.cache
            .remove(&self.owner_id, param_id, self.use_global, None);
    }

    /// Cached value, else the schema's default or first example, else empty.
    fn seed(&self, param: &OperationParameter) -> ParamValue {
        if let Some(cached) = self
            .cache
            .get(&self.owner_id, &param.param_id, self.use_global)
        {
            return cached;
        }

        let seeds = param
            .schema
            .as_ref()
            .map(ParamSchema::seed_values)
            .unwrap_or_default();
        if param.is_array() {
            ParamValue::Multiple(seeds)
        } else {
            seeds.into_iter().next().map(ParamValue::Single).unwrap_or_default()
        }
    }
}
