mod common;

use common::fetcher;
use deck_engine::{fetch_all, FailureKind};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn records(range: std::ops::Range<u64>) -> Value {
    Value::Array(range.map(|id| json!({"id": id})).collect())
}

fn page(body: Value, next: Option<String>) -> ResponseTemplate {
    let template = ResponseTemplate::new(200).set_body_json(body);
    match next {
        Some(next) => template.insert_header("link", format!("<{next}>; rel=\"next\"").as_str()),
        None => template,
    }
}

#[tokio::test]
async fn follows_next_links_until_exhausted() {
    let server = MockServer::start().await;
    let listing = format!("{}/api/v1/courses/3/modules", server.uri());

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/3/modules"))
        .and(query_param("per_page", "100"))
        .respond_with(page(records(0..100), Some(format!("{listing}?page=2"))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses/3/modules"))
        .and(query_param("page", "2"))
        .respond_with(page(records(100..200), Some(format!("{listing}?page=3"))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses/3/modules"))
        .and(query_param("page", "3"))
        .respond_with(page(records(200..300), None))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher();
    let all = fetch_all(&fetcher, &listing, &[("per_page", "100".to_string())])
        .await
        .unwrap();

    let ids: Vec<u64> = all
        .iter()
        .filter_map(|record| record.get("id").and_then(Value::as_u64))
        .collect();
    assert_eq!(ids, (0..300).collect::<Vec<u64>>());
}

#[tokio::test]
async fn failure_on_a_later_page_discards_everything() {
    let server = MockServer::start().await;
    let listing = format!("{}/api/v1/courses/3/modules", server.uri());

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/3/modules"))
        .and(query_param("per_page", "10"))
        .respond_with(page(records(0..10), Some(format!("{listing}?page=2"))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses/3/modules"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let fetcher = fetcher();
    let err = fetch_all(&fetcher, &listing, &[("per_page", "10".to_string())])
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Unauthorized);
}

#[tokio::test]
async fn non_list_page_contributes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .respond_with(page(json!({"errors": []}), None))
        .mount(&server)
        .await;

    let fetcher = fetcher();
    let all = fetch_all(&fetcher, &format!("{}/api/v1/courses", server.uri()), &[])
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn next_link_back_to_a_visited_page_stops() {
    let server = MockServer::start().await;
    let listing = format!("{}/api/v1/courses", server.uri());
    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .respond_with(page(records(0..2), Some(listing.clone())))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher();
    let all = fetch_all(&fetcher, &listing, &[]).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn next_links_with_commas_are_followed() {
    let server = MockServer::start().await;
    let listing = format!("{}/api/v1/courses/3/modules", server.uri());

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/3/modules"))
        .and(query_param("per_page", "2"))
        .respond_with(page(
            records(0..2),
            Some(format!("{listing}?include[]=items,content_details&page=2")),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses/3/modules"))
        .and(query_param("page", "2"))
        .respond_with(page(records(2..4), None))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher();
    let all = fetch_all(&fetcher, &listing, &[("per_page", "2".to_string())])
        .await
        .unwrap();
    assert_eq!(all.len(), 4);
}
