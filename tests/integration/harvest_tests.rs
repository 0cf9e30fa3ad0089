//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the remote API and in-memory
//! sinks in place of Kafka and Redis, and run the full harvest cycle.

use feed_harvester::config::{parse_config, Config};
use feed_harvester::crawler::harvest;
use feed_harvester::output::{MemoryKeyValueSink, MemoryLogSink, Publisher};
use feed_harvester::ResourceKind;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Creates a test configuration pointing at the given base URL
fn create_test_config(base_url: &str, last_page: u32) -> Config {
    let toml = format!(
        r#"
[source]
base-url = "{}"
app-id = "test-app"
request-timeout-secs = 1
page-size = 10

[pages]
first = 1
last = {}

[retry]
max-attempts = 3
initial-delay-ms = 10
max-delay-ms = 20
max-total-wait-ms = 100
jitter = false
"#,
        base_url, last_page
    );
    parse_config(&toml, None).expect("test config should be valid")
}

fn memory_publisher() -> (Arc<MemoryLogSink>, Arc<MemoryKeyValueSink>, Publisher) {
    let log = Arc::new(MemoryLogSink::new());
    let store = Arc::new(MemoryKeyValueSink::new());
    let publisher = Publisher::new(log.clone(), store.clone());
    (log, store, publisher)
}

fn owner_json(email: &str) -> Value {
    json!({
        "title": "ms",
        "firstName": "Sara",
        "lastName": "Andersen",
        "email": email,
        "gender": "female"
    })
}

/// Serves one list page of the given kind, sized by the `limit` query
struct ListResponder {
    kind: ResourceKind,
}

impl Respond for ListResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let query = |name: &str| {
            request
                .url
                .query_pairs()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.parse::<u32>().ok())
                .unwrap_or(0)
        };
        let page = query("page");
        let limit = query("limit");

        let data: Vec<Value> = (0..limit)
            .map(|i| match self.kind {
                ResourceKind::Person => json!({ "id": format!("u-{}-{}", page, i) }),
                ResourceKind::Post => json!({
                    "owner": owner_json(&format!("post-{}-{}@example.com", page, i)),
                    "text": "hello",
                    "likes": i,
                    "tags": ["dog", "beach"],
                    "publishDate": "2020-05-24T14:53:17.598Z"
                }),
                ResourceKind::Comment => json!({
                    "id": format!("c-{}-{}", page, i),
                    "message": "nice",
                    "owner": owner_json("commenter@example.com")
                }),
            })
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
    }
}

/// Serves `/user/{id}`, answering with a broken body for ids ending in `fail_suffix`
struct DetailResponder {
    fail_suffix: Option<&'static str>,
}

impl Respond for DetailResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let id = request.url.path().rsplit('/').next().unwrap_or_default().to_string();

        if let Some(suffix) = self.fail_suffix {
            if id.ends_with(suffix) {
                return ResponseTemplate::new(200).set_body_string("not json");
            }
        }

        ResponseTemplate::new(200).set_body_json(owner_json(&format!("{}@example.com", id)))
    }
}

async fn mount_api(server: &MockServer, fail_suffix: Option<&'static str>) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/user/[^/]+$"))
        .respond_with(DetailResponder { fail_suffix })
        .mount(server)
        .await;

    for kind in ResourceKind::ALL {
        Mock::given(method("GET"))
            .and(path(format!("/{}", kind.endpoint())))
            .respond_with(ListResponder { kind })
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_full_harvest_publishes_every_record() {
    let mock_server = MockServer::start().await;
    mount_api(&mock_server, None).await;

    let config = create_test_config(&mock_server.uri(), 10);
    let (log, store, publisher) = memory_publisher();

    let summary = harvest(&config, publisher).await.expect("harvest should run");

    assert_eq!(summary.total_units(), 30);
    assert!(!summary.has_failures());
    assert_eq!(log.len(), 300);
    assert_eq!(store.writes().len(), 300);

    for kind in ResourceKind::ALL {
        let totals = summary.kind(kind);
        assert_eq!(totals.units_succeeded, 10);
        assert_eq!(totals.records_fetched, 100);
    }

    // People are stored under their email with the full detail record
    let person: Value =
        serde_json::from_str(&store.get("u-3-4@example.com").expect("person stored")).unwrap();
    assert_eq!(person["firstName"], "Sara");
    assert_eq!(person["email"], "u-3-4@example.com");

    // Comments are keyed by their own id
    assert!(store.get("c-7-0").is_some());

    // Every log message is a versioned envelope
    for message in log.messages() {
        let envelope: Value = serde_json::from_slice(&message.value).unwrap();
        assert_eq!(envelope["schema"], "feed-harvester.record");
        assert_eq!(envelope["version"], 1);
        assert_eq!(envelope["key"].as_str().unwrap().as_bytes(), &message.key[..]);
    }
}

#[tokio::test]
async fn test_requests_carry_configured_headers() {
    let mock_server = MockServer::start().await;

    // Only requests with both headers get a usable body
    Mock::given(method("GET"))
        .and(path("/post"))
        .and(header("app-id", "test-app"))
        .and(header("user-agent", "Mozilla/5.0"))
        .respond_with(ListResponder {
            kind: ResourceKind::Post,
        })
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 2);
    let (_log, _store, publisher) = memory_publisher();

    let summary = harvest(&config, publisher).await.unwrap();

    assert_eq!(summary.kind(ResourceKind::Post).units_succeeded, 2);
}

#[tokio::test]
async fn test_failing_source_still_completes() {
    // Nothing is mounted: every request gets an empty 404, which does not decode
    let mock_server = MockServer::start().await;

    let config = create_test_config(&mock_server.uri(), 5);
    let (log, store, publisher) = memory_publisher();

    let summary = harvest(&config, publisher).await.unwrap();

    assert_eq!(summary.total_units(), 15);
    assert_eq!(summary.overall().units_failed, 15);
    assert!(summary.is_complete_failure());
    assert!(log.is_empty());
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn test_unreachable_source_exhausts_retries() {
    // Port 1 refuses connections; every attempt fails at the transport level
    let config = create_test_config("http://127.0.0.1:1", 1);
    let (log, _store, publisher) = memory_publisher();

    let summary = harvest(&config, publisher).await.unwrap();

    assert_eq!(summary.total_units(), 3);
    assert!(summary.is_complete_failure());
    assert!(log.is_empty());
    for outcome in &summary.outcomes {
        assert!(outcome.is_failed());
    }
}

#[tokio::test]
async fn test_failed_details_make_people_partial() {
    let mock_server = MockServer::start().await;
    mount_api(&mock_server, Some("-3")).await;

    let config = create_test_config(&mock_server.uri(), 2);
    let (_log, store, publisher) = memory_publisher();

    let summary = harvest(&config, publisher).await.unwrap();

    let people = summary.kind(ResourceKind::Person);
    assert_eq!(people.units_partial, 2);
    assert_eq!(people.details_missing, 2);
    assert_eq!(people.records_fetched, 18);
    assert!(store.get("u-1-3@example.com").is_none());
    assert!(store.get("u-1-4@example.com").is_some());

    assert_eq!(summary.kind(ResourceKind::Post).units_succeeded, 2);
    assert!(summary.has_failures());
    assert!(!summary.is_complete_failure());
}

#[tokio::test]
async fn test_decode_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/comment"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"data\": oops"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 1);
    let (_log, _store, publisher) = memory_publisher();

    let summary = harvest(&config, publisher).await.unwrap();

    assert_eq!(summary.kind(ResourceKind::Comment).units_failed, 1);
}

#[tokio::test]
async fn test_error_status_with_valid_body_is_used() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/post"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "data": [{ "owner": owner_json("late@example.com"), "text": "still here" }]
        })))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 1);
    let (log, store, publisher) = memory_publisher();

    let summary = harvest(&config, publisher).await.unwrap();

    assert_eq!(summary.kind(ResourceKind::Post).units_succeeded, 1);
    assert_eq!(log.len(), 1);
    assert!(store.get("late@example.com").is_some());
}

#[tokio::test]
async fn test_timed_out_request_is_retried() {
    let mock_server = MockServer::start().await;

    // The first request outlives the 1s client timeout; the retry gets a fast answer
    Mock::given(method("GET"))
        .and(path("/comment"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [] }))
                .set_delay(Duration::from_secs(3)),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/comment"))
        .respond_with(ListResponder {
            kind: ResourceKind::Comment,
        })
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 1);
    let (_log, store, publisher) = memory_publisher();

    let summary = harvest(&config, publisher).await.unwrap();

    assert_eq!(summary.kind(ResourceKind::Comment).units_succeeded, 1);
    assert!(store.get("c-1-9").is_some());
}

#[tokio::test]
async fn test_people_with_unreadable_details_count_as_failed() {
    let mock_server = MockServer::start().await;

    // People lists resolve, every detail body is broken, everything else is a 404
    Mock::given(method("GET"))
        .and(path_regex(r"^/user/[^/]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ListResponder {
            kind: ResourceKind::Person,
        })
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 2);
    let (log, store, publisher) = memory_publisher();

    let summary = harvest(&config, publisher).await.unwrap();

    assert_eq!(summary.overall().records_fetched, 0);
    assert_eq!(summary.kind(ResourceKind::Person).units_failed, 2);
    assert_eq!(summary.overall().units_partial, 0);
    assert!(summary.is_complete_failure());
    assert!(log.is_empty());
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn test_posts_without_owner_email_are_not_published() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/post"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "owner": { "id": "60d0fe4f5311236168a109ca", "firstName": "Sara" }, "text": "one" },
                { "owner": { "id": "60d0fe4f5311236168a109cb", "firstName": "Edita" }, "text": "two" },
                { "owner": owner_json("known@example.com"), "text": "three" }
            ]
        })))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 1);
    let (log, store, publisher) = memory_publisher();

    let summary = harvest(&config, publisher).await.unwrap();

    let posts = summary.kind(ResourceKind::Post);
    assert_eq!(posts.records_fetched, 3);
    assert_eq!(posts.publish.log_written, 1);
    assert_eq!(posts.publish.log_failed, 2);
    assert_eq!(posts.publish.kv_failed, 2);

    let log_keys: Vec<_> = log.messages().into_iter().map(|m| m.key).collect();
    assert_eq!(log_keys, vec![b"known@example.com".to_vec()]);
    let kv_keys: Vec<_> = store.writes().into_iter().map(|(k, _)| k).collect();
    assert_eq!(kv_keys, vec!["known@example.com".to_string()]);
}
