//! Host wrappers applied to outbound requests before transport.

use crate::headers::set_header;
use apic_core::{ApiRequest, ConsoleConfig, HeaderEntry};
use std::sync::Arc;
use tracing::debug;

/// What happens to a request after an interceptor ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptOutcome {
    Continue,
    /// Drop the request; it never reaches the transport
    Cancel,
}

/// A layer that observes or rewrites outbound requests.
pub trait RequestInterceptor: Send + Sync {
    fn name(&self) -> &str;

    fn intercept(&self, request: &mut ApiRequest) -> InterceptOutcome;
}

/// Routes requests through a proxy by prefixing the proxy URL.
#[derive(Debug, Clone)]
pub struct ProxyInterceptor {
    url: String,
    encode_url: bool,
}

impl ProxyInterceptor {
    pub fn new(url: impl Into<String>, encode_url: bool) -> Self {
        Self {
            url: url.into(),
            encode_url,
        }
    }
}

impl RequestInterceptor for ProxyInterceptor {
    fn name(&self) -> &str {
        "proxy"
    }

    fn intercept(&self, request: &mut ApiRequest) -> InterceptOutcome {
        let target = if self.encode_url {
            urlencoding::encode(&request.url).into_owned()
        } else {
            request.url.clone()
        };
        request.url = format!("{}{}", self.url, target);
        debug!("Proxied request {} to {}", request.id, request.url);
        InterceptOutcome::Continue
    }
}

/// Sets configured headers, replacing same-named ones.
#[derive(Debug, Clone)]
pub struct HeadersInterceptor {
    headers: Vec<HeaderEntry>,
}

impl HeadersInterceptor {
    pub fn new(headers: Vec<HeaderEntry>) -> Self {
        Self { headers }
    }
}

impl RequestInterceptor for HeadersInterceptor {
    fn name(&self) -> &str {
        "append-headers"
    }

    fn intercept(&self, request: &mut ApiRequest) -> InterceptOutcome {
        for header in &self.headers {
            request.headers = set_header(&request.headers, &header.name, &header.value);
        }
        InterceptOutcome::Continue
    }
}

/// Interceptors described by the `[proxy]` and `[[append_headers]]` sections.
///
/// Headers are applied before the proxy rewrites the URL.
pub fn interceptors_from_config(config: &ConsoleConfig) -> Vec<Arc<dyn RequestInterceptor>> {
    let mut interceptors: Vec<Arc<dyn RequestInterceptor>> = Vec::new();
    if !config.append_headers.is_empty() {
        interceptors.push(Arc::new(HeadersInterceptor::new(config.append_headers.clone())));
    }
    if let Some(url) = config.proxy.url.as_deref().filter(|url| !url.is_empty()) {
        interceptors.push(Arc::new(ProxyInterceptor::new(url, config.proxy.encode_url)));
    }
    interceptors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str, headers: &str) -> ApiRequest {
        ApiRequest {
            id: "req-1".to_string(),
            method: "GET".to_string(),
            url: url.to_string(),
            headers: headers.to_string(),
            payload: None,
            auth: None,
            with_credentials: false,
            timeout: None,
        }
    }

    #[test]
    fn test_proxy_without_encoding() {
        let mut req = request("https://domain.com", "");
        let proxy = ProxyInterceptor::new("https://proxy.example/", false);
        assert_eq!(proxy.intercept(&mut req), InterceptOutcome::Continue);
        assert_eq!(req.url, "https://proxy.example/https://domain.com");
    }

    #[test]
    fn test_proxy_with_encoding() {
        let mut req = request("https://domain.com", "");
        ProxyInterceptor::new("https://proxy.example/", true).intercept(&mut req);
        assert_eq!(req.url, "https://proxy.example/https%3A%2F%2Fdomain.com");
    }

    #[test]
    fn test_headers_override() {
        let mut req = request("https://domain.com", "accept: */*\nx-token: old");
        HeadersInterceptor::new(vec![HeaderEntry {
            name: "x-token".to_string(),
            value: "v".to_string(),
        }])
        .intercept(&mut req);

        assert_eq!(req.headers, "accept: */*\nx-token: v");
        assert_eq!(req.headers.matches("x-token").count(), 1);
    }

    #[test]
    fn test_from_config() {
        let config = ConsoleConfig::from_toml_str(
            r#"
            [proxy]
            url = "https://proxy.example/"

            [[append_headers]]
            name = "x-token"
            value = "v"
            "#,
        )
        .unwrap();

        let names: Vec<_> = interceptors_from_config(&config)
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        assert_eq!(names, vec!["append-headers", "proxy"]);

        assert!(interceptors_from_config(&ConsoleConfig::default()).is_empty());
    }
}
