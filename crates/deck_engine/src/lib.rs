//! Deck engine: LMS traversal, file resolution, retrieval and output.
mod canvas;
mod fetch;
mod harvest;
mod links;
mod output;
mod paginate;
mod persist;
mod resolve;
mod retrieve;
mod session;
mod traversal;
mod types;

pub use canvas::CanvasApi;
pub use fetch::{FetchSettings, Fetcher, NoProgress, ProgressSink, ReqwestFetcher};
pub use harvest::harvest;
pub use links::extract_candidate_links;
pub use output::{open_sink, ArchiveSink, DirectorySink, OutputError, OutputSink, STAGING_DIR};
pub use paginate::fetch_all;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use resolve::{resolve_item_file, resolve_linked_file, Resolution};
pub use retrieve::retrieve;
pub use session::{run, Session};
pub use traversal::{ModuleTraversal, RunContext};
pub use types::{
    FailureKind, FetchError, FetchMetadata, FetchOutput, HarvestError, HarvestSummary,
    OutputArtifact,
};
