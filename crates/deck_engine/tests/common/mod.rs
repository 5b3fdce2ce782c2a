#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use deck_core::ProgressEvent;
use deck_engine::{CanvasApi, FetchSettings, ProgressSink, ReqwestFetcher};
use serde_json::Value;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-token-0123456789";

pub fn fetcher() -> ReqwestFetcher {
    engine_logging::initialize_for_tests();
    ReqwestFetcher::new(&FetchSettings::default(), TOKEN).expect("client builds")
}

pub fn base_url(server: &MockServer) -> Url {
    Url::parse(&server.uri()).expect("mock server uri")
}

pub fn api<'a>(fetcher: &'a ReqwestFetcher, base: &Url) -> CanvasApi<'a> {
    CanvasApi::new(fetcher, base, 100)
}

/// Serves `body` as JSON for authenticated GETs of `route`.
pub async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Serves raw bytes for `route`, asserting on drop that it was hit `times` times.
pub async fn mount_download(server: &MockServer, route: &str, bytes: &[u8], times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(bytes.to_vec(), "application/vnd.ms-powerpoint"),
        )
        .expect(times)
        .mount(server)
        .await;
}

#[derive(Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}
