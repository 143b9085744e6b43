/// Integration tests for the sync connector with a mocked external API
/// Exercises both callout flows end to end against the in-memory store
use rust_profile_sync::errors::AppError;
use rust_profile_sync::models::Person;
use rust_profile_sync::store::{MemoryPersonStore, PersonStore};
use rust_profile_sync::sync::{SyncConnector, SyncOutcome};
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to build a connector wired to the mock server and a fresh store
fn connector_with(base_url: String) -> (SyncConnector, Arc<MemoryPersonStore>) {
    let store = Arc::new(MemoryPersonStore::new());
    let connector = SyncConnector::new(base_url, None, store.clone())
        .expect("connector construction should not fail");
    (connector, store)
}

fn sample_profile(id: u64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "phone": "5551234",
        "birthDate": "1990-12-10",
        "address": {
            "address": "12 Analytical Way",
            "city": "London",
            "postalCode": "E1 6AN",
            "state": "LDN",
            "country": "UK"
        }
    })
}

#[tokio::test]
async fn pull_200_upserts_person_by_external_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_profile(5)))
        .mount(&mock_server)
        .await;

    let (connector, store) = connector_with(mock_server.uri());

    let outcome = connector.pull_and_upsert("5").await.unwrap();
    assert_eq!(outcome, SyncOutcome::Applied);

    let stored = store.get_by_external_id("5").await.unwrap().unwrap();
    assert_eq!(stored.first_name.as_deref(), Some("Ada"));
    assert_eq!(stored.last_name.as_deref(), Some("Lovelace"));
    assert_eq!(stored.email.as_deref(), Some("ada@example.com"));
    assert_eq!(stored.mailing_city.as_deref(), Some("London"));
    assert!(stored.last_synced_at.is_none());
}

#[tokio::test]
async fn pull_twice_with_unchanged_payload_is_idempotent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_profile(5)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let (connector, store) = connector_with(mock_server.uri());

    connector.pull_and_upsert("5").await.unwrap();
    let after_first = store.dump().await;

    connector.pull_and_upsert("5").await.unwrap();
    let after_second = store.dump().await;

    // No duplicate row, no field drift
    assert_eq!(after_first.len(), 1);
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn pull_updates_existing_record_in_place() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_profile(5)))
        .mount(&mock_server)
        .await;

    let (connector, store) = connector_with(mock_server.uri());

    // Pre-existing record holding the same external id with stale fields
    let mut existing = Person::blank();
    existing.external_id = Some("5".to_string());
    existing.first_name = Some("Stale".to_string());
    let existing_id = existing.id;
    store.insert(existing).await;

    connector.pull_and_upsert("5").await.unwrap();

    let records = store.dump().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, existing_id);
    assert_eq!(records[0].first_name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn pull_non_200_is_recoverable_and_leaves_store_untouched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/9"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let (connector, store) = connector_with(mock_server.uri());

    let mut seeded = Person::blank();
    seeded.external_id = Some("9".to_string());
    seeded.first_name = Some("Kept".to_string());
    store.insert(seeded).await;
    let before = store.dump().await;

    let outcome = connector.pull_and_upsert("9").await.unwrap();
    assert_eq!(outcome, SyncOutcome::RemoteRejected { status: 500 });
    assert_eq!(store.dump().await, before);
}

#[tokio::test]
async fn pull_missing_address_fails_without_store_mutation() {
    let mock_server = MockServer::start().await;

    let mut profile = sample_profile(5);
    profile.as_object_mut().unwrap().remove("address");

    Mock::given(method("GET"))
        .and(path("/users/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile))
        .mount(&mock_server)
        .await;

    let (connector, store) = connector_with(mock_server.uri());

    let err = connector.pull_and_upsert("5").await.unwrap_err();
    assert!(matches!(err, AppError::MalformedPayload(_)));
    assert!(store.dump().await.is_empty());
}

#[tokio::test]
async fn pull_non_object_body_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([1, 2])))
        .mount(&mock_server)
        .await;

    let (connector, store) = connector_with(mock_server.uri());

    let err = connector.pull_and_upsert("5").await.unwrap_err();
    assert!(matches!(err, AppError::MalformedPayload(_)));
    assert!(store.dump().await.is_empty());
}

#[tokio::test]
async fn pull_with_no_response_is_a_transport_failure() {
    // Nothing listens on the discard port
    let (connector, store) = connector_with("http://127.0.0.1:9".to_string());

    let err = connector.pull_and_upsert("5").await.unwrap_err();
    assert!(matches!(err, AppError::TransportFailure(_)));
    assert!(store.dump().await.is_empty());
}

#[tokio::test]
async fn push_2xx_stamps_only_the_last_synced_timestamp() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/add"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&mock_server)
        .await;

    let (connector, store) = connector_with(mock_server.uri());

    let mut person = Person::blank();
    person.external_id = Some("150".to_string());
    person.first_name = Some("Grace".to_string());
    person.email = Some("grace@example.com".to_string());
    let id = person.id;
    store.insert(person.clone()).await;

    let outcome = connector.push_and_stamp(id).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Applied);

    let stored = store.get_by_id(id).await.unwrap();
    assert!(stored.last_synced_at.is_some());

    // Snapshot diff: clearing the stamp must give back the original record
    let mut normalized = stored.clone();
    normalized.last_synced_at = None;
    assert_eq!(normalized, person);
}

#[tokio::test]
async fn push_non_2xx_mutates_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/add"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad payload"))
        .mount(&mock_server)
        .await;

    let (connector, store) = connector_with(mock_server.uri());

    let mut person = Person::blank();
    person.external_id = Some("150".to_string());
    let id = person.id;
    store.insert(person).await;
    let before = store.dump().await;

    let outcome = connector.push_and_stamp(id).await.unwrap();
    assert_eq!(outcome, SyncOutcome::RemoteRejected { status: 400 });
    assert_eq!(store.dump().await, before);
}

#[tokio::test]
async fn push_of_unknown_record_is_not_found_and_makes_no_request() {
    let mock_server = MockServer::start().await;
    let (connector, _store) = connector_with(mock_server.uri());

    let err = connector.push_and_stamp(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn push_sends_the_outbound_payload_shape() {
    let mock_server = MockServer::start().await;
    let (connector, store) = connector_with(mock_server.uri());

    let mut person = Person::blank();
    person.external_id = Some("150".to_string());
    person.first_name = Some("Grace".to_string());
    person.email = Some("grace@example.com".to_string());
    // last_name and phone stay unset: they must serialize as explicit null
    let id = person.id;
    store.insert(person).await;

    Mock::given(method("POST"))
        .and(path("/users/add"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(serde_json::json!({
            "salesforceId": id.to_string(),
            "firstName": "Grace",
            "lastName": null,
            "email": "grace@example.com",
            "phone": null,
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = connector.push_and_stamp(id).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Applied);
}
