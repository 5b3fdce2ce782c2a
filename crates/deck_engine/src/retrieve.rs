use deck_core::{FileMetadata, ProgressEvent};
use engine_logging::engine_info;

use crate::fetch::{Fetcher, ProgressSink};
use crate::HarvestError;

/// Streams the bytes behind a resolved download URL.
///
/// Failures are returned as [`HarvestError::Retrieval`]; the caller treats them
/// as fatal for the run.
pub async fn retrieve(
    fetcher: &dyn Fetcher,
    metadata: &FileMetadata,
    sink: &dyn ProgressSink,
) -> Result<Vec<u8>, HarvestError> {
    sink.emit(ProgressEvent::DownloadStarted {
        name: metadata.display_name.clone(),
    });
    let output = fetcher
        .fetch(&metadata.download_url, sink)
        .await
        .map_err(|source| HarvestError::Retrieval {
            name: metadata.display_name.clone(),
            source,
        })?;
    engine_info!(
        "Downloaded {} ({} bytes)",
        metadata.display_name,
        output.metadata.byte_len
    );
    Ok(output.bytes)
}
