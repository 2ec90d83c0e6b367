//! Tests for the HTTP executor module

use super::*;
use crate::config::{BackoffType, ClientConfig};
use crate::error::Error;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(uri: &str) -> ClientConfig {
    ClientConfig::builder().host(uri).no_rate_limit().build()
}

#[tokio::test]
async fn test_executor_get_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"id": 1}],
            "total": 1
        })))
        .mount(&mock_server)
        .await;

    let executor = HttpExecutor::new(&test_config(&mock_server.uri())).unwrap();
    let url = format!("{}/v3/search", mock_server.uri());
    let body = executor.execute(&HttpRequest::get(url)).await.unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["total"], 1);
}

#[tokio::test]
async fn test_executor_query_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/search"))
        .and(query_param("q", "asthma"))
        .and(query_param("size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&mock_server)
        .await;

    let executor = HttpExecutor::new(&test_config(&mock_server.uri())).unwrap();
    let url = format!("{}/v3/search", mock_server.uri());
    let request = HttpRequest::get(url).query(vec![
        ("q".to_string(), "asthma".to_string()),
        ("size".to_string(), "10".to_string()),
    ]);

    executor.execute(&request).await.unwrap();
}

#[tokio::test]
async fn test_executor_post_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/filter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": []
        })))
        .mount(&mock_server)
        .await;

    let executor = HttpExecutor::new(&test_config(&mock_server.uri())).unwrap();
    let url = format!("{}/v3/filter", mock_server.uri());
    let request = HttpRequest::post(url, serde_json::json!({"target": ["a", "b"]}));

    let body = executor.execute(&request).await.unwrap();
    assert!(body.contains("data"));
}

#[tokio::test]
async fn test_executor_default_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/ping"))
        .and(header("X-Client", "test"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&mock_server)
        .await;

    let config = ClientConfig::builder()
        .host(mock_server.uri())
        .header("X-Client", "test")
        .no_rate_limit()
        .build();
    let executor = HttpExecutor::new(&config).unwrap();
    let url = format!("{}/v3/ping", mock_server.uri());

    let body = executor.execute(&HttpRequest::get(url)).await.unwrap();
    assert_eq!(body, "pong");
}

#[tokio::test]
async fn test_executor_user_agent_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/ping"))
        .and(header("User-Agent", "probe/9.9"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&mock_server)
        .await;

    let config = ClientConfig::builder()
        .host(mock_server.uri())
        .user_agent("probe/9.9")
        .no_rate_limit()
        .build();
    let executor = HttpExecutor::new(&config).unwrap();
    let url = format!("{}/v3/ping", mock_server.uri());

    executor.execute(&HttpRequest::get(url)).await.unwrap();
}

#[tokio::test]
async fn test_executor_retry_on_500() {
    let mock_server = MockServer::start().await;

    // First two calls return 500, third succeeds
    Mock::given(method("GET"))
        .and(path("/v3/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"ok\":true}"))
        .mount(&mock_server)
        .await;

    let config = ClientConfig::builder()
        .host(mock_server.uri())
        .max_retries(3)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
        .no_rate_limit()
        .build();
    let executor = HttpExecutor::new(&config).unwrap();
    let url = format!("{}/v3/flaky", mock_server.uri());

    let body = executor.execute(&HttpRequest::get(url)).await.unwrap();
    assert!(body.contains("ok"));
}

#[tokio::test]
async fn test_executor_404_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(&mock_server)
        .await;

    let executor = HttpExecutor::new(&test_config(&mock_server.uri())).unwrap();
    let url = format!("{}/v3/missing", mock_server.uri());

    let result = executor.execute(&HttpRequest::get(url)).await;
    assert!(matches!(
        result.unwrap_err(),
        Error::HttpStatus { status: 404, .. }
    ));
}

#[tokio::test]
async fn test_executor_retries_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/always-fail"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .mount(&mock_server)
        .await;

    let config = ClientConfig::builder()
        .host(mock_server.uri())
        .max_retries(2)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
        .no_rate_limit()
        .build();
    let executor = HttpExecutor::new(&config).unwrap();
    let url = format!("{}/v3/always-fail", mock_server.uri());

    let result = executor.execute(&HttpRequest::get(url)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_executor_caches_get_bodies() {
    let mock_server = MockServer::start().await;

    // The server only tolerates a single hit; the second read must come from
    // the cache.
    Mock::given(method("GET"))
        .and(path("/v3/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"total\":1}"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let executor = HttpExecutor::new(&test_config(&mock_server.uri())).unwrap();
    let url = format!("{}/v3/search", mock_server.uri());

    let first = executor.execute(&HttpRequest::get(&url)).await.unwrap();
    let second = executor.execute(&HttpRequest::get(&url)).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(executor.cached_responses(), 1);
}

#[tokio::test]
async fn test_executor_cache_bypass() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v3/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"total\":1}"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let executor = HttpExecutor::new(&test_config(&mock_server.uri())).unwrap();
    let url = format!("{}/v3/search", mock_server.uri());

    executor
        .execute(&HttpRequest::get(&url).bypass_cache(true))
        .await
        .unwrap();
    executor
        .execute(&HttpRequest::get(&url).bypass_cache(true))
        .await
        .unwrap();
    assert_eq!(executor.cached_responses(), 0);
}

#[tokio::test]
async fn test_executor_does_not_cache_post() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/filter"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let executor = HttpExecutor::new(&test_config(&mock_server.uri())).unwrap();
    let url = format!("{}/v3/filter", mock_server.uri());

    for _ in 0..2 {
        executor
            .execute(&HttpRequest::post(&url, serde_json::json!({})))
            .await
            .unwrap();
    }
    assert_eq!(executor.cached_responses(), 0);
}

#[test]
fn test_calculate_backoff_constant() {
    let config = ClientConfig::builder()
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(100),
            Duration::from_secs(10),
        )
        .no_rate_limit()
        .build();
    let executor = HttpExecutor::new(&config).unwrap();

    assert_eq!(executor.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(executor.calculate_backoff(5), Duration::from_millis(100));
}

#[test]
fn test_calculate_backoff_linear() {
    let config = ClientConfig::builder()
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(100),
            Duration::from_secs(10),
        )
        .no_rate_limit()
        .build();
    let executor = HttpExecutor::new(&config).unwrap();

    assert_eq!(executor.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(executor.calculate_backoff(1), Duration::from_millis(200));
    assert_eq!(executor.calculate_backoff(2), Duration::from_millis(300));
}

#[test]
fn test_calculate_backoff_exponential_respects_max() {
    let config = ClientConfig::builder()
        .backoff(
            BackoffType::Exponential,
            Duration::from_millis(100),
            Duration::from_millis(500),
        )
        .no_rate_limit()
        .build();
    let executor = HttpExecutor::new(&config).unwrap();

    assert_eq!(executor.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(executor.calculate_backoff(1), Duration::from_millis(200));
    assert_eq!(executor.calculate_backoff(10), Duration::from_millis(500));
}

#[test]
fn test_executor_debug() {
    let executor = HttpExecutor::new(&ClientConfig::default()).unwrap();
    let debug_str = format!("{executor:?}");
    assert!(debug_str.contains("HttpExecutor"));
    assert!(executor.has_rate_limiter());
}
