use deck_core::{Course, CourseId, FileId, Module, ModuleId, ModuleItem, RawFile};
use engine_logging::engine_warn;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::fetch::{Fetcher, NoProgress};
use crate::paginate::fetch_all;
use crate::FetchError;

/// Typed access to the REST endpoints under `<base>/api/v1`.
pub struct CanvasApi<'a> {
    fetcher: &'a dyn Fetcher,
    api_root: Url,
    page_size: u32,
}

impl<'a> CanvasApi<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, base_url: &Url, page_size: u32) -> Self {
        let mut api_root = base_url.clone();
        if let Ok(mut segments) = api_root.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "v1"]);
        }
        Self {
            fetcher,
            api_root,
            page_size,
        }
    }

    pub fn fetcher(&self) -> &'a dyn Fetcher {
        self.fetcher
    }

    pub fn endpoint(&self, segments: &[&str]) -> String {
        let mut url = self.api_root.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.into()
    }

    /// Courses with an active enrollment. Records without `id` or `name` are dropped.
    pub async fn courses(&self) -> Result<Vec<Course>, FetchError> {
        let records = fetch_all(
            self.fetcher,
            &self.endpoint(&["courses"]),
            &[
                ("per_page", self.page_size.to_string()),
                ("enrollment_state", "active".to_string()),
            ],
        )
        .await?;
        Ok(decode_records(records, "course"))
    }

    /// Single course lookup, used to verify access before traversal.
    pub async fn course(&self, course_id: CourseId) -> Result<Course, FetchError> {
        let url = self.endpoint(&["courses", &course_id.to_string()]);
        let value = self.get_json(&url).await?;
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string();
        Ok(Course {
            id: course_id,
            name,
        })
    }

    pub async fn modules(&self, course_id: CourseId) -> Result<Vec<Module>, FetchError> {
        let url = self.endpoint(&["courses", &course_id.to_string(), "modules"]);
        let records = fetch_all(self.fetcher, &url, &self.page_params()).await?;
        Ok(decode_records(records, "module"))
    }

    pub async fn module_items(
        &self,
        course_id: CourseId,
        module_id: ModuleId,
    ) -> Result<Vec<ModuleItem>, FetchError> {
        let url = self.endpoint(&[
            "courses",
            &course_id.to_string(),
            "modules",
            &module_id.to_string(),
            "items",
        ]);
        let records = fetch_all(self.fetcher, &url, &self.page_params()).await?;
        Ok(decode_records(records, "module item"))
    }

    /// HTML body behind a page-content URL. A missing or null `body` is empty.
    pub async fn page_body(&self, page_url: &str) -> Result<String, FetchError> {
        let value = self.get_json(page_url).await?;
        Ok(value
            .get("body")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    /// File JSON behind an item's file-content URL.
    pub async fn file_at(&self, content_url: &str) -> Result<RawFile, FetchError> {
        let value = self.get_json(content_url).await?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    pub async fn file(&self, course_id: CourseId, file_id: FileId) -> Result<RawFile, FetchError> {
        let url = self.endpoint(&[
            "courses",
            &course_id.to_string(),
            "files",
            &file_id.to_string(),
        ]);
        self.file_at(&url).await
    }

    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let output = self.fetcher.fetch(url, &NoProgress).await?;
        match serde_json::from_slice(&output.bytes) {
            Ok(value) => Ok(value),
            Err(err) => {
                engine_warn!("Response from {} is not valid JSON: {}", url, err);
                Ok(Value::Null)
            }
        }
    }

    fn page_params(&self) -> [(&'static str, String); 1] {
        [("per_page", self.page_size.to_string())]
    }
}

fn decode_records<T: DeserializeOwned>(records: Vec<Value>, what: &str) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value(record) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                engine_warn!("Skipping malformed {} record: {}", what, err);
                None
            }
        })
        .collect()
}
