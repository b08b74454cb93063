//! URL composition.
//!
//! Stateless helpers that turn a base URI, an endpoint path template,
//! path variable values and query parameters into a request URL, and the
//! reverse: pulling path and query values back out of a typed URL.

use crate::value::ParamValue;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

static TEMPLATE_TOKEN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\{([^{}]+)\}").ok());

/// Inputs for base URI computation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriOptions {
    /// Explicit base URI; always wins when non-empty
    pub base_uri: Option<String>,
    /// Selected server's base URI template
    pub server: Option<String>,
    pub protocols: Vec<String>,
    /// Substituted for `{version}` in the server template
    pub version: Option<String>,
}

/// Compute the API base URI.
///
/// An explicit `base_uri` is returned verbatim. Otherwise the server template
/// is used, prefixed with the first protocol when it carries no scheme.
pub fn compute_api_base_uri(options: &UriOptions) -> String {
    if let Some(base) = options.base_uri.as_deref().filter(|base| !base.is_empty()) {
        return base.to_string();
    }

    let Some(server) = options.server.as_deref().filter(|server| !server.is_empty()) else {
        return String::new();
    };

    let mut uri = server.to_string();
    if let Some(version) = options.version.as_deref().filter(|v| !v.is_empty()) {
        uri = uri.replace("{version}", version);
    }
    if !uri.contains("://")
        && let Some(protocol) = options.protocols.first()
    {
        uri = format!("{}://{}", protocol.to_lowercase(), uri);
    }
    if uri.ends_with('/') {
        uri.pop();
    }
    uri
}

/// Compute the base URI joined with the endpoint path template.
pub fn compute_endpoint_uri(options: &UriOptions, path: &str) -> String {
    join_path(&compute_api_base_uri(options), path)
}

/// Join a base and a path without doubling or dropping the separator.
pub fn join_path(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    if base.is_empty() {
        return path.to_string();
    }
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Replace `{name}` tokens with variable values.
///
/// Tokens with no matching variable are kept as literal text so that unset
/// path parameters stay visible in the URL.
pub fn apply_url_variables(url: &str, variables: &HashMap<String, String>, encode: bool) -> String {
    let Some(token) = TEMPLATE_TOKEN.as_ref() else {
        return url.to_string();
    };
    token
        .replace_all(url, |caps: &regex::Captures<'_>| {
            match variables.get(&caps[1]) {
                Some(value) if encode => urlencoding::encode(value).into_owned(),
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Append query parameters to a URL, in order.
///
/// Array values produce one `name=value` pair per element. Parameters
/// without a value are omitted.
pub fn apply_url_parameters(
    url: &str,
    params: &[(String, Option<ParamValue>)],
    encode: bool,
) -> String {
    let encode_part = |part: &str| {
        if encode {
            encode_query_string(part, false)
        } else {
            part.to_string()
        }
    };

    let pairs: Vec<String> = params
        .iter()
        .filter_map(|(name, value)| value.as_ref().map(|value| (name, value)))
        .flat_map(|(name, value)| {
            value
                .values()
                .into_iter()
                .map(|v| format!("{}={}", encode_part(name), encode_part(v)))
                .collect::<Vec<_>>()
        })
        .collect();

    if pairs.is_empty() {
        return url.to_string();
    }

    let separator = match url.find('?') {
        None => "?",
        Some(_) if url.ends_with('?') || url.ends_with('&') => "",
        Some(_) => "&",
    };
    format!("{}{}{}", url, separator, pairs.join("&"))
}

/// Percent-encode a query name or value.
///
/// Spaces become `%20` unless `replace_plus` is set, in which case they
/// become `+`.
pub fn encode_query_string(value: &str, replace_plus: bool) -> String {
    let encoded = urlencoding::encode(value);
    if replace_plus {
        encoded.replace("%20", "+")
    } else {
        encoded.into_owned()
    }
}

/// Decode a query name or value; malformed input is returned unchanged.
pub fn decode_query_string(value: &str, replace_plus: bool) -> String {
    let value = if replace_plus {
        value.replace('+', " ")
    } else {
        value.to_string()
    };
    match urlencoding::decode(&value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => value,
    }
}

/// Ordered query parameter map. Repeated names accumulate into arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMap {
    entries: Vec<(String, ParamValue)>,
}

impl QueryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, turning a repeated name into an array.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => match existing {
                ParamValue::Single(first) => {
                    let first = std::mem::take(first);
                    *existing = ParamValue::Multiple(vec![first, value]);
                }
                ParamValue::Multiple(values) => values.push(value),
            },
            None => self.entries.push((name, ParamValue::Single(value))),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Parse one `name=value` fragment into `map`.
pub fn apply_query_param_string_to_object(param: &str, map: &mut QueryMap) {
    if param.is_empty() {
        return;
    }
    let (name, value) = param.split_once('=').unwrap_or((param, ""));
    let name = decode_query_string(name, true);
    if name.is_empty() {
        return;
    }
    map.append(name, decode_query_string(value, true));
}

/// Parse a query string, with or without the leading `?`.
pub fn parse_query_string(query: &str) -> QueryMap {
    let mut map = QueryMap::new();
    for part in query.trim_start_matches('?').split('&') {
        apply_query_param_string_to_object(part, &mut map);
    }
    map
}

/// Split a URL into the part before the query and the query string.
///
/// The fragment, if any, is dropped.
pub fn split_url(url: &str) -> (&str, &str) {
    let url = url.split_once('#').map_or(url, |(before, _)| before);
    url.split_once('?').unwrap_or((url, ""))
}

/// Outcome of reverse-parsing a typed URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackfillStatus {
    /// Path variables and query parameters were both extracted
    Success,
    /// The path did not match the template; only the query was extracted
    Partial,
    /// Nothing could be extracted
    Failed,
}

/// Values extracted from a typed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBackfill {
    pub status: BackfillStatus,
    /// Path variable values, positionally matched to template tokens
    pub path: Vec<(String, String)>,
    pub query: QueryMap,
}

impl UrlBackfill {
    fn failed() -> Self {
        Self {
            status: BackfillStatus::Failed,
            path: Vec::new(),
            query: QueryMap::new(),
        }
    }

    pub fn path_value(&self, name: &str) -> Option<&str> {
        self.path
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Reverse-parse `url` against a URL template such as
/// `https://{host}/files/{fileId}`.
///
/// Query parameters are always extracted. Path variables are extracted only
/// when the path structurally matches the template.
pub fn reverse_parse(url: &str, template: &str) -> UrlBackfill {
    let url = url.trim();
    if url.is_empty() {
        return UrlBackfill::failed();
    }

    let (path_part, query) = split_url(url);
    let query = parse_query_string(query);
    let (template_path, _) = split_url(template);

    match template_matcher(template_path) {
        Some((matcher, names)) => match matcher.captures(path_part) {
            Some(caps) => {
                let path = names
                    .into_iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let raw = caps.get(i + 1).map_or("", |m| m.as_str());
                        (name, decode_query_string(raw, false))
                    })
                    .collect();
                UrlBackfill {
                    status: BackfillStatus::Success,
                    path,
                    query,
                }
            }
            None => {
                debug!("Typed URL does not match template {}", template_path);
                UrlBackfill {
                    status: BackfillStatus::Partial,
                    path: Vec::new(),
                    query,
                }
            }
        },
        None => UrlBackfill {
            status: BackfillStatus::Partial,
            path: Vec::new(),
            query,
        },
    }
}

/// Anchored regex with one capture group per template token.
fn template_matcher(template: &str) -> Option<(Regex, Vec<String>)> {
    let token = TEMPLATE_TOKEN.as_ref()?;
    let mut pattern = String::from("^");
    let mut names = Vec::new();
    let mut last = 0;
    for caps in token.captures_iter(template) {
        let whole = caps.get(0)?;
        pattern.push_str(&regex::escape(&template[last..whole.start()]));
        pattern.push_str("([^/?#]*)");
        names.push(caps[1].to_string());
        last = whole.end();
    }
    pattern.push_str(&regex::escape(template[last..].trim_end_matches('/')));
    pattern.push_str("/?$");
    Regex::new(&pattern).ok().map(|re| (re, names))
}

/// URL validation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlValidity {
    Valid,
    /// Structurally valid, but template variables are still unresolved
    Pending,
    Invalid,
}

impl UrlValidity {
    pub fn is_invalid(self) -> bool {
        self == UrlValidity::Invalid
    }
}

/// Check that a URL is absolute with a host, allowing `{var}` markers.
pub fn validate_url(url: &str) -> UrlValidity {
    let url = url.trim();
    if url.is_empty() || !braces_balanced(url) {
        return UrlValidity::Invalid;
    }

    let has_tokens = url.contains('{');
    let candidate = match TEMPLATE_TOKEN.as_ref() {
        Some(token) if has_tokens => token.replace_all(url, "0").into_owned(),
        _ => url.to_string(),
    };

    match ::url::Url::parse(&candidate) {
        Ok(parsed) if parsed.has_host() => {
            if has_tokens {
                UrlValidity::Pending
            } else {
                UrlValidity::Valid
            }
        }
        _ => UrlValidity::Invalid,
    }
}

fn braces_balanced(url: &str) -> bool {
    let mut open = false;
    for c in url.chars() {
        match c {
            '{' if open => return false,
            '{' => open = true,
            '}' if !open => return false,
            '}' => open = false,
            _ => {}
        }
    }
    !open
}
