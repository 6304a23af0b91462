//! HTTP-level tests for the registry client against a mock registry.

use regprune_core::CancellationToken;
use regprune_registry::{
    DeleteOutcome, MediaType, MetadataResolver, RegistryApi, RegistryAuth, RegistryClient,
    RegistryConfig, CONTENT_DIGEST_HEADER,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MANIFEST_DIGEST: &str =
    "sha256:6c3c624b58dbbcd3c0dd82b4c53f04194d1247c6eebdaab7c610cf7d66709b3b";
const CONFIG_DIGEST: &str =
    "sha256:b5b2b2c507a0944348e0303114d8d93aaaa081732b86451d9bce1f432a537bc7";

fn client_for(server: &MockServer) -> RegistryClient {
    RegistryClient::new(RegistryConfig::new(server.uri())).expect("client")
}

fn manifest_body() -> serde_json::Value {
    json!({
        "schemaVersion": 2,
        "mediaType": MediaType::DOCKER_MANIFEST_V2,
        "config": {
            "mediaType": MediaType::DOCKER_CONFIG,
            "size": 1469,
            "digest": CONFIG_DIGEST
        },
        "layers": []
    })
}

#[tokio::test]
async fn test_list_repositories_follows_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/_catalog"))
        .and(query_param("last", "b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"repositories": ["c"]})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/_catalog"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Link", r#"</v2/_catalog?last=b&n=2>; rel="next""#)
                .set_body_json(json!({"repositories": ["a", "b"]})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let repositories = client_for(&server).list_repositories().await.unwrap();
    assert_eq!(repositories, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_list_repositories_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/_catalog"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client_for(&server).list_repositories().await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_list_tags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/team/app/tags/list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"name": "team/app", "tags": ["v1", "v2"]})),
        )
        .mount(&server)
        .await;

    let tags = client_for(&server).list_tags("team/app").await;
    assert_eq!(tags, vec!["v1", "v2"]);
}

#[tokio::test]
async fn test_list_tags_null_and_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/empty/tags/list"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"name": "empty", "tags": null})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/gone/tags/list"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.list_tags("empty").await.is_empty());
    assert!(client.list_tags("gone").await.is_empty());
}

#[tokio::test]
async fn test_fetch_manifest_sends_accept_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/app/manifests/v1"))
        .and(header("Accept", MediaType::DOCKER_MANIFEST_V2))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(CONTENT_DIGEST_HEADER, MANIFEST_DIGEST)
                .set_body_json(manifest_body()),
        )
        .mount(&server)
        .await;

    let manifest = client_for(&server)
        .fetch_manifest("app", "v1")
        .await
        .unwrap();
    assert_eq!(manifest.content_digest, MANIFEST_DIGEST);
    assert_eq!(manifest.config_digest, CONFIG_DIGEST);
}

#[tokio::test]
async fn test_fetch_manifest_without_digest_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/app/manifests/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest_body()))
        .mount(&server)
        .await;

    assert!(client_for(&server).fetch_manifest("app", "v1").await.is_none());
}

#[tokio::test]
async fn test_fetch_manifest_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/app/manifests/v9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(client_for(&server).fetch_manifest("app", "v9").await.is_none());
}

#[tokio::test]
async fn test_fetch_blob() {
    let server = MockServer::start().await;
    let blob_path = format!("/v2/app/blobs/{CONFIG_DIGEST}");
    Mock::given(method("GET"))
        .and(path(blob_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"{}".to_vec()))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.fetch_blob("app", CONFIG_DIGEST).await, Some(b"{}".to_vec()));
    assert!(client.fetch_blob("app", "sha256:missing").await.is_none());
}

#[tokio::test]
async fn test_delete_manifest_outcomes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v2/app/manifests/sha256:accepted"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/app/manifests/sha256:ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/app/manifests/sha256:disabled"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(
        client.delete_manifest("app", "sha256:accepted").await,
        DeleteOutcome::Accepted
    );
    assert_eq!(
        client.delete_manifest("app", "sha256:ok").await,
        DeleteOutcome::Rejected { status: 200 }
    );
    assert_eq!(
        client.delete_manifest("app", "sha256:disabled").await,
        DeleteOutcome::Rejected { status: 405 }
    );
}

#[tokio::test]
async fn test_basic_auth_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/app/tags/list"))
        .and(header("Authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tags": ["v1"]})))
        .mount(&server)
        .await;

    let config = RegistryConfig::new(server.uri()).with_auth(RegistryAuth::basic("user", "pass"));
    let client = RegistryClient::new(config).unwrap();
    assert_eq!(client.list_tags("app").await, vec!["v1"]);
}

#[tokio::test]
async fn test_resolver_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/app/manifests/v1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(CONTENT_DIGEST_HEADER, MANIFEST_DIGEST)
                .set_body_json(manifest_body()),
        )
        .mount(&server)
        .await;
    let blob_path = format!("/v2/app/blobs/{CONFIG_DIGEST}");
    Mock::given(method("GET"))
        .and(path(blob_path.as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"created": "2023-11-14T09:30:12.123456789Z"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let records = MetadataResolver::new(&client)
        .resolve_all(
            "app",
            &["v1".to_string(), "v2".to_string()],
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].tag, "v1");
    assert_eq!(records[0].manifest_digest, MANIFEST_DIGEST);
    assert_eq!(
        records[0].created.to_rfc3339(),
        "2023-11-14T09:30:12.123456789+00:00"
    );
}
