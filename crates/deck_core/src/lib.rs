//! Deck core: pure domain model, naming rules and run bookkeeping.
mod config;
mod dedup;
mod file_id;
mod filename;
mod model;
mod organize;
mod progress;

pub use config::{
    normalize_base_url, parse_course_id, CollisionPolicy, ConfigError, Connection,
    HarvestConfig, HarvestRequest, ModuleSelection, OutputMode, MIN_TOKEN_LEN,
};
pub use dedup::Deduplicator;
pub use file_id::resolve_file_id;
pub use filename::{is_presentation, sanitize, split_extension, PRESENTATION_EXTENSIONS};
pub use model::{
    Course, CourseId, FileId, FileMetadata, ItemKind, Module, ModuleId, ModuleItem, RawFile,
    RetrievedFile, PLACEHOLDER_NAME,
};
pub use organize::{OutputOrganizer, OutputPath, Placement};
pub use progress::{ProgressEvent, ProgressView, RunProgress, SkipReason};
