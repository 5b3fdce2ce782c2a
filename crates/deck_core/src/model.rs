use serde::Deserialize;

pub type CourseId = u64;
pub type ModuleId = u64;
pub type FileId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
}

/// One ordered content container within a course. Defines one output subfolder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ItemKind {
    File,
    Page,
    #[default]
    #[serde(other)]
    Other,
}

/// An entry within a module. `url` is the file-content URL for `File` items and
/// the page-content URL for `Page` items.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModuleItem {
    #[serde(default)]
    pub id: u64,
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
    #[serde(default = "unknown_title")]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
}

fn unknown_title() -> String {
    "unknown".to_string()
}

/// Authoritative description of a retrievable file. `download_url` is the dedup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub id: FileId,
    pub display_name: String,
    pub filename: Option<String>,
    pub download_url: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedFile {
    pub metadata: FileMetadata,
    pub bytes: Vec<u8>,
}

/// File JSON as returned by both the file-content URL of a module item and the
/// `/courses/{id}/files/{file_id}` lookup. Every field is optional so that shape
/// drift degrades to placeholders instead of errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFile {
    #[serde(default)]
    pub id: Option<FileId>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "content-type", alias = "content_type")]
    pub content_type: Option<String>,
}

pub const PLACEHOLDER_NAME: &str = "unknown";

impl RawFile {
    /// Builds metadata, falling back to `fallback_name` (then a placeholder) when
    /// neither `display_name` nor `filename` is present. Returns `None` when the
    /// record carries no download URL.
    pub fn into_metadata(self, fallback_name: Option<&str>) -> Option<FileMetadata> {
        let download_url = self.url.filter(|url| !url.trim().is_empty())?;
        let display_name = self
            .display_name
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| self.filename.clone().filter(|name| !name.is_empty()))
            .or_else(|| fallback_name.map(str::to_string))
            .unwrap_or_else(|| PLACEHOLDER_NAME.to_string());
        Some(FileMetadata {
            id: self.id.unwrap_or_default(),
            display_name,
            filename: self.filename,
            download_url,
            content_type: self.content_type,
        })
    }
}
