//! Integration tests for the bunny.net zone provider
//!
//! Tests the provider against wiremock servers standing in for the
//! bunny.net API.

use dns01_core::traits::{NewRecord, RecordType, ZoneProviderFactory};
use dns01_core::Error;
use dns01_provider_bunny::BunnyProviderFactory;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACCESS_KEY: &str = "test-access-key";

fn factory(server: &MockServer) -> BunnyProviderFactory {
    BunnyProviderFactory::new()
        .unwrap()
        .with_base_url(server.uri())
}

fn zone_json() -> serde_json::Value {
    json!({
        "Id": 4242,
        "Domain": "example.com",
        "Records": [
            {"Id": 11, "Type": 3, "Name": "_acme-challenge", "Value": "tokenA", "Ttl": 180},
            {"Id": 12, "Type": 3, "Name": "_acme-challenge", "Value": "tokenB", "Ttl": 180},
            {"Id": 13, "Type": 0, "Name": "", "Value": "192.0.2.10", "Ttl": 300}
        ]
    })
}

// ============================================================================
// Zone reads
// ============================================================================

#[tokio::test]
async fn test_get_zone_sends_access_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dnszone/4242"))
        .and(header("AccessKey", ACCESS_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(zone_json()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = factory(&server).connect(ACCESS_KEY).unwrap();
    let zone = provider.get_zone(4242).await.unwrap();

    assert_eq!(zone.id, 4242);
    assert_eq!(zone.domain, "example.com");
    assert_eq!(zone.records.len(), 3);
    assert_eq!(zone.records[1].id, 12);
    assert_eq!(zone.records[1].record_type, RecordType::TXT);
    assert_eq!(zone.records[1].value, "tokenB");
}

#[tokio::test]
async fn test_get_zone_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dnszone/4242"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"ErrorKey": "unauthorized", "Message": "The access key is invalid"})),
        )
        .mount(&server)
        .await;

    let provider = factory(&server).connect("wrong-key").unwrap();
    let err = provider.get_zone(4242).await.unwrap_err();

    assert!(matches!(err, Error::Provider { .. }));
    let message = err.to_string();
    assert!(message.contains("Authentication failed"), "got: {}", message);
    assert!(message.contains("The access key is invalid"), "got: {}", message);
    assert!(!message.contains("wrong-key"), "access key leaked: {}", message);
}

#[tokio::test]
async fn test_get_zone_not_found_keeps_provider_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dnszone/99"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"ErrorKey": "dnszone.not_found", "Message": "The requested DNS zone was not found"})),
        )
        .mount(&server)
        .await;

    let provider = factory(&server).connect(ACCESS_KEY).unwrap();
    let err = provider.get_zone(99).await.unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Zone 99 not found"), "got: {}", message);
    assert!(message.contains("The requested DNS zone was not found"));
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dnszone/4242"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let provider = factory(&server).connect(ACCESS_KEY).unwrap();
    let err = provider.get_zone(4242).await.unwrap_err();

    assert!(err.is_retryable());
    assert!(err.to_string().contains("503"));
    assert!(err.to_string().contains("upstream unavailable"));
}

#[tokio::test]
async fn test_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let provider = factory(&server).connect(ACCESS_KEY).unwrap();
    let err = provider.get_zone(4242).await.unwrap_err();

    assert!(err.to_string().contains("Rate limit exceeded"));
}

#[tokio::test]
async fn test_malformed_zone_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dnszone/4242"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let provider = factory(&server).connect(ACCESS_KEY).unwrap();
    let err = provider.get_zone(4242).await.unwrap_err();

    assert!(err.to_string().contains("Failed to parse response"));
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
async fn test_add_record_puts_txt_body() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/dnszone/4242/records"))
        .and(header("AccessKey", ACCESS_KEY))
        .and(body_json(json!({
            "Type": 3,
            "Name": "_acme-challenge",
            "Value": "tokenC",
            "Ttl": 180
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "Id": 14, "Type": 3, "Name": "_acme-challenge", "Value": "tokenC", "Ttl": 180
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = factory(&server).connect(ACCESS_KEY).unwrap();
    let created = provider
        .add_record(4242, NewRecord::txt("_acme-challenge", "tokenC", 180))
        .await
        .unwrap();

    assert_eq!(created.id, 14);
    assert_eq!(created.value, "tokenC");
}

#[tokio::test]
async fn test_add_record_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/dnszone/4242/records"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"ErrorKey": "validation_error", "Message": "Invalid record value"})),
        )
        .mount(&server)
        .await;

    let provider = factory(&server).connect(ACCESS_KEY).unwrap();
    let err = provider
        .add_record(4242, NewRecord::txt("_acme-challenge", "", 180))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Add record failed: 400"), "got: {}", message);
    assert!(message.contains("Invalid record value"));
}

#[tokio::test]
async fn test_delete_record() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/dnszone/4242/records/11"))
        .and(header("AccessKey", ACCESS_KEY))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let provider = factory(&server).connect(ACCESS_KEY).unwrap();
    provider.delete_record(4242, 11).await.unwrap();
}

#[tokio::test]
async fn test_delete_missing_record_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/dnszone/4242/records/77"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let provider = factory(&server).connect(ACCESS_KEY).unwrap();
    let err = provider.delete_record(4242, 77).await.unwrap_err();

    assert!(err.to_string().contains("Record 77 in zone 4242 not found"));
}

// ============================================================================
// Dry-run
// ============================================================================

#[tokio::test]
async fn test_dry_run_skips_mutations() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dnszone/4242"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zone_json()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let provider = factory(&server).with_dry_run(true).connect(ACCESS_KEY).unwrap();

    provider.get_zone(4242).await.unwrap();
    let created = provider
        .add_record(4242, NewRecord::txt("_acme-challenge", "tokenC", 180))
        .await
        .unwrap();
    provider.delete_record(4242, 11).await.unwrap();

    assert_eq!(created.id, 0);
    assert_eq!(created.value, "tokenC");
}
