//! Integration tests for the OMDb client and write-through against a mock server

use std::sync::Arc;

use cinerate::app::App;
use cinerate::cache::{MemoryBlobStore, MovieCache, CACHE_TTL_MS};
use cinerate::clock::ManualClock;
use cinerate::config::Settings;
use cinerate::data::{LookupError, MetadataSource, OmdbClient};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const START: i64 = 1_700_000_000_000;

fn client_for(server: &MockServer) -> OmdbClient {
    OmdbClient::with_base_url(format!("{}/", server.uri()))
}

#[tokio::test]
async fn test_lookup_sends_key_and_title_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("apikey", "abcd1234"))
        .and(query_param("t", "The Zone of Interest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Title": "The Zone of Interest",
            "imdbRating": "7.4",
            "Response": "True"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = client_for(&server)
        .lookup("The Zone of Interest", "abcd1234")
        .await
        .expect("Lookup should succeed");

    assert_eq!(payload["imdbRating"], "7.4");
}

#[tokio::test]
async fn test_not_found_is_a_successful_lookup() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Response": "False",
            "Error": "Movie not found!"
        })))
        .mount(&server)
        .await;

    let payload = client_for(&server).lookup("Nope", "abcd1234").await.unwrap();

    assert_eq!(payload["Response"], "False");
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = client_for(&server).lookup("Dune", "abcd1234").await;

    assert!(matches!(result, Err(LookupError::Status(503))));
}

#[tokio::test]
async fn test_garbage_body_is_a_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client_for(&server).lookup("Dune", "abcd1234").await;

    assert!(matches!(result, Err(LookupError::Parse(_))));
}

#[tokio::test]
async fn test_unreachable_server_is_an_http_error() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    drop(server);

    let result = client.lookup("Dune", "abcd1234").await;

    assert!(matches!(result, Err(LookupError::Http(_))));
}

#[tokio::test]
async fn test_app_caches_api_answer_and_skips_second_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("t", "Oppenheimer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Title": "Oppenheimer",
            "imdbID": "tt15398776",
            "imdbRating": "8.3",
            "Response": "True"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryBlobStore::new());
    let clock = Arc::new(ManualClock::new(START));
    let app = App::with_parts(
        Settings::default(),
        Some("abcd1234".to_string()),
        storage.clone(),
        clock.clone(),
        Arc::new(client_for(&server)),
    );

    let first = app.lookup("Oppenheimer (2023)").await;
    clock.advance(CACHE_TTL_MS - 1);
    let second = app.lookup("oppenheimer").await;

    assert_eq!(first.payload, second.payload);
    assert!(MovieCache::load(storage.as_ref()).get("oppenheimer").is_some());
}

#[tokio::test]
async fn test_app_does_not_cache_failed_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryBlobStore::new());
    let app = App::with_parts(
        Settings::default(),
        Some("abcd1234".to_string()),
        storage.clone(),
        Arc::new(ManualClock::new(START)),
        Arc::new(client_for(&server)),
    );

    assert!(app.lookup("Dune").await.payload.is_none());
    assert!(app.lookup("Dune").await.payload.is_none());
    assert_eq!(app.cache_stats().await.total, 0);
    assert!(storage.contents().is_none());
}
