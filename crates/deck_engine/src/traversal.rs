use std::collections::VecDeque;

use deck_core::{
    resolve_file_id, CourseId, Deduplicator, FileId, FileMetadata, ItemKind, Module,
    ModuleItem, ModuleSelection, ProgressEvent, RetrievedFile, SkipReason,
};
use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::canvas::CanvasApi;
use crate::fetch::ProgressSink;
use crate::links::extract_candidate_links;
use crate::resolve::{resolve_item_file, resolve_linked_file, Resolution};
use crate::retrieve::retrieve;
use crate::HarvestError;

/// State owned by one run and threaded through the traversal.
#[derive(Debug, Default)]
pub struct RunContext {
    dedup: Deduplicator,
    pub references_seen: usize,
    pub duplicates_skipped: usize,
    pub filtered_out: usize,
    pub unresolved: usize,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distinct_urls(&self) -> usize {
        self.dedup.len()
    }
}

#[derive(Debug)]
enum PendingFile {
    /// `File` item resolved through its own content URL.
    Item(ModuleItem),
    /// File id taken from a link inside a page body.
    Linked(FileId),
}

impl PendingFile {
    fn label(&self) -> String {
        match self {
            PendingFile::Item(item) => item.title.clone(),
            PendingFile::Linked(id) => format!("file {id}"),
        }
    }
}

/// Lazy walk over the selected modules of a course yielding each retrievable
/// presentation once, paired with the module that first referenced it.
///
/// Order is module order, then item order, then link order within a page body.
pub struct ModuleTraversal<'a> {
    api: &'a CanvasApi<'a>,
    course_id: CourseId,
    progress: &'a dyn ProgressSink,
    modules: VecDeque<Module>,
    total_modules: usize,
    current: Option<Module>,
    items: VecDeque<ModuleItem>,
    pending: VecDeque<PendingFile>,
}

impl<'a> ModuleTraversal<'a> {
    /// Lists the course modules and keeps the selected ones in API order.
    pub async fn start(
        api: &'a CanvasApi<'a>,
        course_id: CourseId,
        selection: &ModuleSelection,
        progress: &'a dyn ProgressSink,
    ) -> Result<Self, HarvestError> {
        let modules = api.modules(course_id).await?;
        if let ModuleSelection::Only(ids) = selection {
            for id in ids {
                if !modules.iter().any(|module| module.id == *id) {
                    engine_warn!("Selected module {} is not part of course {}", id, course_id);
                }
            }
        }
        let modules: VecDeque<Module> = modules
            .into_iter()
            .filter(|module| selection.contains(module.id))
            .collect();
        engine_info!(
            "Course {}: {} module(s) selected",
            course_id,
            modules.len()
        );

        Ok(Self {
            api,
            course_id,
            progress,
            total_modules: modules.len(),
            modules,
            current: None,
            items: VecDeque::new(),
            pending: VecDeque::new(),
        })
    }

    pub fn module_count(&self) -> usize {
        self.total_modules
    }

    /// Advances to the next file that passes the presentation filter and the
    /// dedup check, retrieving its bytes. `Ok(None)` once every module is done.
    pub async fn next(
        &mut self,
        ctx: &mut RunContext,
    ) -> Result<Option<(Module, RetrievedFile)>, HarvestError> {
        loop {
            if let Some(pending) = self.pending.pop_front() {
                let Some(module) = self.current.clone() else {
                    continue;
                };
                let label = pending.label();
                let resolution = match pending {
                    PendingFile::Item(item) => resolve_item_file(self.api, &item).await,
                    PendingFile::Linked(file_id) => {
                        resolve_linked_file(self.api, self.course_id, file_id).await
                    }
                };
                let Some(metadata) = self.admit(resolution, &label, ctx) else {
                    continue;
                };
                let bytes = retrieve(self.api.fetcher(), &metadata, self.progress).await?;
                return Ok(Some((module, RetrievedFile { metadata, bytes })));
            }

            if let Some(item) = self.items.pop_front() {
                self.expand(item).await;
                continue;
            }

            if let Some(module) = self.modules.pop_front() {
                let index = self.total_modules - self.modules.len() - 1;
                engine_info!("Processing module: {}", module.name);
                self.progress.emit(ProgressEvent::ModuleStarted {
                    index,
                    total: self.total_modules,
                    module: module.clone(),
                });
                let items = self.api.module_items(self.course_id, module.id).await?;
                self.items = items.into();
                self.current = Some(module);
                continue;
            }

            return Ok(None);
        }
    }

    async fn expand(&mut self, item: ModuleItem) {
        match item.kind {
            ItemKind::File => self.pending.push_back(PendingFile::Item(item)),
            ItemKind::Page => {
                let body = self.page_body(&item).await;
                let links = extract_candidate_links(&body);
                for link in &links {
                    match resolve_file_id(link) {
                        Some(file_id) => self.pending.push_back(PendingFile::Linked(file_id)),
                        None => engine_debug!("Discarding link without file id: {}", link),
                    }
                }
                engine_debug!(
                    "Page {:?}: {} candidate link(s)",
                    item.title,
                    links.len()
                );
                self.progress.emit(ProgressEvent::PageScanned {
                    title: item.title,
                    candidates: links.len(),
                });
            }
            ItemKind::Other => engine_debug!("Skipping item {:?}", item.title),
        }
    }

    /// Any failure yields an empty body so the page contributes no candidates.
    async fn page_body(&self, item: &ModuleItem) -> String {
        let Some(url) = item.url.as_deref() else {
            return String::new();
        };
        match self.api.page_body(url).await {
            Ok(body) => body,
            Err(err) => {
                engine_warn!("Could not fetch page content for {:?}: {}", item.title, err);
                String::new()
            }
        }
    }

    fn admit(
        &self,
        resolution: Resolution,
        label: &str,
        ctx: &mut RunContext,
    ) -> Option<FileMetadata> {
        match resolution {
            Resolution::Presentation(metadata) => {
                ctx.references_seen += 1;
                if ctx.dedup.should_retrieve(&metadata.download_url) {
                    return Some(metadata);
                }
                ctx.duplicates_skipped += 1;
                engine_debug!("Already retrieved {}", metadata.display_name);
                self.skip(metadata.display_name, SkipReason::Duplicate);
            }
            Resolution::NotPresentation(metadata) => {
                ctx.filtered_out += 1;
                self.skip(metadata.display_name, SkipReason::NotPresentation);
            }
            Resolution::Unresolved => {
                ctx.unresolved += 1;
                self.skip(label.to_string(), SkipReason::Unresolved);
            }
        }
        None
    }

    fn skip(&self, name: String, reason: SkipReason) {
        self.progress
            .emit(ProgressEvent::FileSkipped { name, reason });
    }
}
