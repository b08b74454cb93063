// Integration tests for the request console
// These tests drive RequestState end to end against an in-memory model

mod common;

use apic_core::{ConsoleConfig, HeaderEntry, Payload};
use apic_model::Binding;
use apic_request::{
    HeadersInterceptor, ParamValue, ProxyInterceptor, RequestInterceptor, RequestState,
    ServerType, ValueCache, transport_channel,
    url::{UriOptions, compute_api_base_uri},
};
use common::{init_logging, ok_response, people_api};
use std::sync::Arc;

fn state(config: ConsoleConfig, cache: ValueCache) -> RequestState {
    init_logging();
    let mut state = RequestState::with_cache(config, cache);
    state.set_model(Arc::new(people_api()));
    state
}

#[test]
fn test_get_people_serialization() -> anyhow::Result<()> {
    let mut state = state(ConsoleConfig::default(), ValueCache::new());
    state.select_operation(Some("listPeople"));

    let request = state.serialize()?;
    assert_eq!(request.method, "GET");
    assert_eq!(request.url, "http://production.domain.com/people");
    assert_eq!(request.payload, None);
    Ok(())
}

#[test]
fn test_post_json_serialization() -> anyhow::Result<()> {
    let mut state = state(ConsoleConfig::default(), ValueCache::new());
    state.select_operation(Some("createPerson"));
    state.body_mut().set_raw(r#"{"a":1}"#);

    let request = state.serialize()?;
    assert!(request.headers.contains("content-type: application/json"));
    assert_eq!(request.payload, Some(Payload::Text(r#"{"a":1}"#.to_string())));
    Ok(())
}

#[test]
fn test_server_count_follows_endpoint_binding() {
    let mut state = state(ConsoleConfig::default(), ValueCache::new());

    state.select_operation(Some("listPeople"));
    assert_eq!(state.servers_count(), 4);
    assert!(!state.server_selector_hidden());

    state.select_operation(Some("listArchive"));
    assert_eq!(state.servers_count(), 1);
    assert!(state.server_selector_hidden());
    assert_eq!(state.url(), "http://archive.domain.com/archive");
}

#[test]
fn test_server_selection_preserved_when_valid() {
    let mut state = state(ConsoleConfig::default(), ValueCache::new());
    state.select_operation(Some("listPeople"));
    state.select_server("http://qa.domain.com", ServerType::Server);
    assert_eq!(state.url(), "http://qa.domain.com/people");

    // Still a candidate for the next operation
    state.select_operation(Some("createPerson"));
    assert_eq!(state.url(), "http://qa.domain.com/people");

    // Not a candidate: first server of the endpoint is picked
    state.select_operation(Some("listArchive"));
    assert_eq!(
        state.server_selection().server_value.as_deref(),
        Some("http://archive.domain.com")
    );
}

#[test]
fn test_array_query_repeats() {
    let mut state = state(ConsoleConfig::default(), ValueCache::new());
    state.select_operation(Some("listPeople"));
    state.set_parameter_value(
        "listPeople/parameter/query/tag",
        vec!["a".to_string(), "b".to_string(), "c".to_string()],
    );

    assert_eq!(
        state.url(),
        "http://production.domain.com/people?tag=a&tag=b&tag=c"
    );
    assert_eq!(state.url().matches("tag=").count(), 3);
}

#[test]
fn test_typed_url_round_trip() {
    let mut state = state(ConsoleConfig::default(), ValueCache::new());
    state.select_operation(Some("listPeople"));
    state.set_parameter_value(
        "listPeople/parameter/query/tag",
        vec!["a b".to_string(), "c&d".to_string()],
    );
    let composed = state.url().to_string();

    state.set_parameter_value("listPeople/parameter/query/tag", Vec::<String>::new());
    state.edit_url(composed.clone());
    state.commit_url();

    assert_eq!(state.url(), composed);
    assert_eq!(
        state
            .parameters()
            .find("listPeople/parameter/query/tag")
            .map(|p| p.value.clone()),
        Some(ParamValue::Multiple(vec!["a b".to_string(), "c&d".to_string()]))
    );
}

#[test]
fn test_cache_isolation_between_panels() {
    let cache = ValueCache::new();
    let mut first = state(ConsoleConfig::default(), cache.clone());
    let mut second = state(ConsoleConfig::default(), cache.clone());
    first.select_operation(Some("listPeople"));
    second.select_operation(Some("listPeople"));

    first.set_parameter_value("listPeople/parameter/header/x-trace", "one");
    second.select_operation(Some("listPeople"));
    assert_eq!(
        second
            .parameters()
            .find("listPeople/parameter/header/x-trace")
            .map(|p| p.value.clone()),
        Some(ParamValue::default())
    );
}

#[test]
fn test_global_cache_is_shared_between_panels() {
    let mut config = ConsoleConfig::default();
    config.request.global_cache = true;

    let cache = ValueCache::new();
    let mut first = state(config.clone(), cache.clone());
    let mut second = state(config, cache.clone());
    first.select_operation(Some("listPeople"));

    first.set_parameter_value("listPeople/parameter/header/x-trace", "one");
    second.select_operation(Some("listPeople"));
    assert_eq!(
        second
            .parameters()
            .find("listPeople/parameter/header/x-trace")
            .map(|p| p.value.clone()),
        Some(ParamValue::single("one"))
    );
}

#[test]
fn test_dropping_a_panel_releases_its_cache() {
    let cache = ValueCache::new();
    let owner = {
        let mut panel = state(ConsoleConfig::default(), cache.clone());
        panel.select_operation(Some("listPeople"));
        panel.set_parameter_value("listPeople/parameter/header/x-trace", "one");
        assert!(cache.has(panel.owner_id(), "listPeople/parameter/header/x-trace", false));
        panel.owner_id().to_string()
    };
    assert!(!cache.has(&owner, "listPeople/parameter/header/x-trace", false));
}

#[test]
fn test_base_uri_override_wins() {
    let mut config = ConsoleConfig::default();
    config.overrides.base_uri = Some("https://override.domain.com/v1".to_string());
    let mut state = state(config, ValueCache::new());
    state.select_operation(Some("listArchive"));
    assert_eq!(state.url(), "https://override.domain.com/v1/archive");

    let options = UriOptions {
        base_uri: Some("https://a.com".to_string()),
        server: Some("b.com".to_string()),
        protocols: vec!["http".to_string()],
        version: None,
    };
    assert_eq!(compute_api_base_uri(&options), "https://a.com");
}

#[test]
fn test_custom_header_parameter() {
    let mut config = ConsoleConfig::default();
    config.request.allow_custom = true;
    let mut state = state(config, ValueCache::new());
    state.select_operation(Some("listPeople"));

    let id = state.add_custom_parameter(Binding::Header).unwrap();
    state.set_custom_parameter_name(&id, "x-custom");
    state.set_parameter_value(&id, "42");

    let request = state.serialize().unwrap();
    assert_eq!(request.headers, "x-custom: 42");
}

#[tokio::test]
async fn test_proxy_and_headers_wrap_outbound_request() {
    let mut state = state(ConsoleConfig::default(), ValueCache::new());
    state.select_operation(Some("listPeople"));
    assert!(!state.set_parameter_value("listPeople/parameter/header/x-token", "ignored"));

    let (handle, mut endpoint) = transport_channel();
    let headers: Arc<dyn RequestInterceptor> = Arc::new(HeadersInterceptor::new(vec![
        HeaderEntry {
            name: "x-token".to_string(),
            value: "v".to_string(),
        },
    ]));
    let proxy: Arc<dyn RequestInterceptor> =
        Arc::new(ProxyInterceptor::new("https://proxy.example/", true));
    state.connect(handle.with_interceptor(headers).with_interceptor(proxy));

    let sent = state.execute().unwrap();
    assert_eq!(
        sent.url,
        "https://proxy.example/http%3A%2F%2Fproduction.domain.com%2Fpeople"
    );
    assert_eq!(sent.headers, "x-token: v");

    let Some(apic_request::TransportMessage::Request(received)) = endpoint.recv().await else {
        panic!("expected a request message");
    };
    assert_eq!(received.id, sent.id);

    endpoint.respond(ok_response(&received, "[]")).unwrap();
    assert_eq!(state.poll_responses(), 1);
    assert!(!state.is_loading());
    assert_eq!(
        state
            .last_response()
            .and_then(|r| r.response.payload.as_deref()),
        Some("[]")
    );
}

#[tokio::test]
async fn test_stale_response_after_reexecute() {
    let mut state = state(ConsoleConfig::default(), ValueCache::new());
    state.select_operation(Some("listPeople"));

    let (handle, mut endpoint) = transport_channel();
    state.connect(handle);

    let first = state.execute().unwrap();
    let second = state.execute().unwrap();
    assert_ne!(first.id, second.id);

    endpoint.respond(ok_response(&first, "old")).unwrap();
    assert_eq!(state.poll_responses(), 0);
    assert!(state.is_loading());

    endpoint.respond(ok_response(&second, "new")).unwrap();
    assert_eq!(state.poll_responses(), 1);
    assert!(!state.is_loading());

    let abort = state.abort();
    assert!(abort.is_none());
}
