use deck_core::{HarvestRequest, OutputOrganizer, OutputPath, ProgressEvent};
use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::canvas::CanvasApi;
use crate::fetch::ProgressSink;
use crate::output::OutputSink;
use crate::traversal::{ModuleTraversal, RunContext};
use crate::{HarvestError, HarvestSummary};

/// Runs one complete discovery-and-retrieval pass for `request`.
///
/// Course verification, module listing and item listing failures abort the run,
/// as does any byte retrieval failure. Page bodies and single-file metadata that
/// cannot be fetched are skipped. Every retrieved file is handed to `sink` before
/// the next download starts; under `numbered` it is staged and only gets its
/// final name once the full set is known. Files already handed over stay in the
/// sink when the run aborts.
pub async fn harvest(
    api: &CanvasApi<'_>,
    request: &HarvestRequest,
    sink: &mut dyn OutputSink,
    progress: &dyn ProgressSink,
) -> Result<HarvestSummary, HarvestError> {
    engine_info!("Verifying access to course {}", request.course_id);
    let course = api.course(request.course_id).await?;
    engine_info!("Found course: {}", course.name);
    progress.emit(ProgressEvent::CourseResolved {
        course: course.clone(),
    });

    let mut ctx = RunContext::new();
    let mut traversal =
        ModuleTraversal::start(api, request.course_id, &request.modules, progress).await?;
    let modules_visited = traversal.module_count();
    let mut organizer: OutputOrganizer<usize> = OutputOrganizer::new(request.collision);
    let mut handed_over = 0usize;
    let mut stored = 0usize;

    while let Some((module, file)) = traversal.next(&mut ctx).await? {
        let key = handed_over;
        handed_over += 1;
        let name = file.metadata.display_name;
        match organizer.admit(&module, &name, key) {
            Some(placement) => {
                sink.write(&placement.path, &file.bytes)?;
                stored_event(&placement.path, file.bytes.len() as u64, progress);
                stored += 1;
            }
            None => {
                engine_debug!("Staging {} until numbering is known", name);
                sink.stage(key, &name, file.bytes)?;
            }
        }
    }
    for placement in organizer.finish() {
        let bytes = sink.commit(placement.payload, &placement.path)?;
        stored_event(&placement.path, bytes, progress);
        stored += 1;
    }

    let artifact = sink.finish()?;
    if stored != ctx.distinct_urls() {
        engine_warn!(
            "Stored {} file(s) but retrieved {} distinct url(s)",
            stored,
            ctx.distinct_urls()
        );
    }
    engine_info!(
        "Complete: {} presentation(s) from {} module(s); {} duplicate(s), {} filtered, {} unresolved",
        stored,
        modules_visited,
        ctx.duplicates_skipped,
        ctx.filtered_out,
        ctx.unresolved
    );
    progress.emit(ProgressEvent::Finished { files: stored });

    Ok(HarvestSummary {
        course,
        modules_visited,
        files_retrieved: stored,
        references_seen: ctx.references_seen,
        duplicates_skipped: ctx.duplicates_skipped,
        filtered_out: ctx.filtered_out,
        unresolved: ctx.unresolved,
        artifact,
    })
}

fn stored_event(path: &OutputPath, bytes: u64, progress: &dyn ProgressSink) {
    engine_info!("Stored {} ({} bytes)", path, bytes);
    progress.emit(ProgressEvent::FileStored {
        path: path.to_string(),
        bytes,
    });
}
