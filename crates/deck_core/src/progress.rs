use std::fmt;

use crate::{Course, Module};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Resolved name does not carry a presentation extension.
    NotPresentation,
    /// Download URL was already retrieved earlier in the run.
    Duplicate,
    /// Metadata lookup failed or returned no download URL.
    Unresolved,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotPresentation => write!(f, "not a presentation"),
            SkipReason::Duplicate => write!(f, "already retrieved"),
            SkipReason::Unresolved => write!(f, "metadata unavailable"),
        }
    }
}

/// Events reported while a run progresses, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    CourseResolved {
        course: Course,
    },
    ModuleStarted {
        index: usize,
        total: usize,
        module: Module,
    },
    /// A page body was fetched (or degraded to empty) and scanned for links.
    PageScanned {
        title: String,
        candidates: usize,
    },
    FileSkipped {
        name: String,
        reason: SkipReason,
    },
    DownloadStarted {
        name: String,
    },
    BytesReceived {
        bytes: u64,
    },
    FileStored {
        path: String,
        bytes: u64,
    },
    Finished {
        files: usize,
    },
}

/// Snapshot that front ends render.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressView {
    pub course_name: Option<String>,
    pub current_module: Option<String>,
    pub modules_started: usize,
    pub modules_total: usize,
    pub files_stored: usize,
    pub files_skipped: usize,
    pub current_download: Option<String>,
    pub current_bytes: u64,
    pub finished: bool,
}

impl ProgressView {
    /// Share of modules completed, in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        if self.finished {
            return 1.0;
        }
        if self.modules_total == 0 {
            return 0.0;
        }
        let completed = self.modules_started.saturating_sub(1);
        completed as f32 / self.modules_total as f32
    }
}

/// Pure reducer over [`ProgressEvent`]s.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunProgress {
    view: ProgressView,
    dirty: bool,
}

impl RunProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &ProgressEvent) {
        let view = &mut self.view;
        match event {
            ProgressEvent::CourseResolved { course } => {
                view.course_name = Some(course.name.clone());
            }
            ProgressEvent::ModuleStarted {
                index,
                total,
                module,
            } => {
                view.modules_started = index + 1;
                view.modules_total = *total;
                view.current_module = Some(module.name.clone());
            }
            ProgressEvent::PageScanned { .. } => return,
            ProgressEvent::FileSkipped { .. } => {
                view.files_skipped += 1;
            }
            ProgressEvent::DownloadStarted { name } => {
                view.current_download = Some(name.clone());
                view.current_bytes = 0;
            }
            ProgressEvent::BytesReceived { bytes } => {
                view.current_bytes = *bytes;
            }
            ProgressEvent::FileStored { .. } => {
                view.files_stored += 1;
                view.current_download = None;
                view.current_bytes = 0;
            }
            ProgressEvent::Finished { files } => {
                view.files_stored = *files;
                view.current_module = None;
                view.current_download = None;
                view.finished = true;
            }
        }
        self.dirty = true;
    }

    pub fn view(&self) -> &ProgressView {
        &self.view
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
