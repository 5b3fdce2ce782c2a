use std::sync::Mutex;

use deck_core::{ProgressEvent, RunProgress, SkipReason};
use deck_engine::ProgressSink;

/// Prints one line per noteworthy event. Byte counts only update the view.
pub(crate) struct TerminalProgress {
    state: Mutex<RunProgress>,
    show_duplicates: bool,
}

impl TerminalProgress {
    pub fn new(show_duplicates: bool) -> Self {
        Self {
            state: Mutex::new(RunProgress::new()),
            show_duplicates,
        }
    }

    fn line(&self, progress: &RunProgress, event: &ProgressEvent) -> Option<String> {
        let view = progress.view();
        match event {
            ProgressEvent::CourseResolved { course } => {
                Some(format!("Course: {} ({})", course.name, course.id))
            }
            ProgressEvent::ModuleStarted { module, .. } => Some(format!(
                "[{}/{} {:>3.0}%] {}",
                view.modules_started,
                view.modules_total,
                view.fraction() * 100.0,
                module.name
            )),
            ProgressEvent::FileSkipped { name, reason } => match reason {
                SkipReason::Duplicate if !self.show_duplicates => None,
                SkipReason::NotPresentation => None,
                _ => Some(format!("    skipped {name}: {reason}")),
            },
            ProgressEvent::FileStored { path, bytes } => {
                Some(format!("    saved {path} ({})", human_bytes(*bytes)))
            }
            ProgressEvent::Finished { files } => Some(format!(
                "Finished: {files} file(s) stored, {} skipped",
                view.files_skipped
            )),
            _ => None,
        }
    }
}

impl ProgressSink for TerminalProgress {
    fn emit(&self, event: ProgressEvent) {
        let Ok(mut progress) = self.state.lock() else {
            return;
        };
        progress.apply(&event);
        if !progress.consume_dirty() {
            return;
        }
        if let Some(line) = self.line(&progress, &event) {
            println!("{line}");
        }
    }
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{Course, Module};
    use pretty_assertions::assert_eq;

    fn render(progress: &TerminalProgress, event: ProgressEvent) -> Option<String> {
        let mut state = progress.state.lock().unwrap();
        state.apply(&event);
        progress.line(&state, &event)
    }

    #[test]
    fn module_lines_carry_position_and_share() {
        let progress = TerminalProgress::new(false);
        render(
            &progress,
            ProgressEvent::CourseResolved {
                course: Course {
                    id: 9,
                    name: "Biology".to_string(),
                },
            },
        );
        let module = Module {
            id: 2,
            name: "Week 2".to_string(),
            position: Some(2),
        };
        let line = render(
            &progress,
            ProgressEvent::ModuleStarted {
                index: 1,
                total: 4,
                module,
            },
        );
        assert_eq!(line.as_deref(), Some("[2/4  25%] Week 2"));
    }

    #[test]
    fn duplicates_are_quiet_unless_requested() {
        let duplicate = || ProgressEvent::FileSkipped {
            name: "deck.pptx".to_string(),
            reason: SkipReason::Duplicate,
        };
        assert_eq!(render(&TerminalProgress::new(false), duplicate()), None);
        assert!(render(&TerminalProgress::new(true), duplicate()).is_some());
    }

    #[test]
    fn byte_sizes_are_humanized() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(2048), "2.0 KiB");
        assert_eq!(human_bytes(5 * 1024 * 1024 + 512 * 1024), "5.5 MiB");
    }
}
