use deck_core::{is_presentation, CourseId, FileId, FileMetadata, ModuleItem};
use engine_logging::{engine_debug, engine_warn};

use crate::canvas::CanvasApi;

/// Outcome of a metadata lookup. Only `Presentation` is ever retrieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Presentation(FileMetadata),
    NotPresentation(FileMetadata),
    Unresolved,
}

impl Resolution {
    fn classify(metadata: Option<FileMetadata>) -> Self {
        match metadata {
            Some(meta) if is_presentation(&meta.display_name) => Resolution::Presentation(meta),
            Some(meta) => {
                engine_debug!("Ignoring {}: not a presentation", meta.display_name);
                Resolution::NotPresentation(meta)
            }
            None => Resolution::Unresolved,
        }
    }
}

/// Resolves a file id found in page HTML via `/courses/{id}/files/{file_id}`.
/// Every failure, whatever its status, degrades to `Unresolved`.
pub async fn resolve_linked_file(
    api: &CanvasApi<'_>,
    course_id: CourseId,
    file_id: FileId,
) -> Resolution {
    let metadata = match api.file(course_id, file_id).await {
        Ok(raw) => {
            let meta = raw.into_metadata(None);
            if meta.is_none() {
                engine_warn!("File {} has no download url", file_id);
            }
            meta.map(|mut meta| {
                if meta.id == 0 {
                    meta.id = file_id;
                }
                meta
            })
        }
        Err(err) => {
            engine_warn!("Could not get file info for id {}: {}", file_id, err);
            None
        }
    };
    Resolution::classify(metadata)
}

/// Resolves a `File` module item through its own file-content URL, which
/// reveals the signed download URL. The item title names the file when the
/// response carries no name.
pub async fn resolve_item_file(api: &CanvasApi<'_>, item: &ModuleItem) -> Resolution {
    let Some(content_url) = item.url.as_deref() else {
        engine_warn!("File item {:?} has no content url", item.title);
        return Resolution::Unresolved;
    };
    let metadata = match api.file_at(content_url).await {
        Ok(raw) => {
            let meta = raw.into_metadata(Some(&item.title));
            if meta.is_none() {
                engine_warn!("File item {:?} has no download url", item.title);
            }
            meta
        }
        Err(err) => {
            engine_warn!("Could not resolve file item {:?}: {}", item.title, err);
            None
        }
    };
    Resolution::classify(metadata)
}
