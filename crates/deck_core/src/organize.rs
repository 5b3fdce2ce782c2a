use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::filename::{sanitize, split_extension};
use crate::{CollisionPolicy, Module, ModuleId};

/// Destination of one file relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputPath {
    pub folder: Option<String>,
    pub file_name: String,
}

impl OutputPath {
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.folder
            .as_deref()
            .into_iter()
            .chain(std::iter::once(self.file_name.as_str()))
    }
}

/// Renders the `/`-joined form used for archive entries and log lines.
impl fmt::Display for OutputPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.folder {
            Some(folder) => write!(f, "{folder}/{}", self.file_name),
            None => write!(f, "{}", self.file_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement<T> {
    pub path: OutputPath,
    pub payload: T,
}

#[derive(Debug)]
struct Deferred<T> {
    module_label: String,
    file_name: String,
    payload: T,
}

/// Assigns output paths under one [`CollisionPolicy`].
///
/// `rename` and `prefix` place each file as soon as it is admitted, inside a
/// per-module folder. `numbered` needs the complete set, so admitted files are
/// held back and placed flat by [`OutputOrganizer::finish`].
#[derive(Debug)]
pub struct OutputOrganizer<T> {
    policy: CollisionPolicy,
    labels: HashMap<ModuleId, String>,
    taken: HashSet<OutputPath>,
    deferred: Vec<Deferred<T>>,
}

impl<T> OutputOrganizer<T> {
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            labels: HashMap::new(),
            taken: HashSet::new(),
            deferred: Vec::new(),
        }
    }

    /// Returns the placement right away, or `None` when the policy defers it.
    pub fn admit(&mut self, module: &Module, file_name: &str, payload: T) -> Option<Placement<T>> {
        // First reference fixes the label; later renames of the module are ignored.
        let label = self
            .labels
            .entry(module.id)
            .or_insert_with(|| safe_component(sanitize(&module.name)))
            .clone();
        let name = safe_component(sanitize(file_name));

        match self.policy {
            CollisionPolicy::Rename => {
                let (stem, ext) = split_extension(&name);
                let path = self.claim(folder_for(&label), stem, ext);
                Some(Placement { path, payload })
            }
            CollisionPolicy::Prefix => {
                let (stem, ext) = split_extension(&name);
                let stem = format!("{label} - {stem}");
                let path = self.claim(folder_for(&label), &stem, ext);
                Some(Placement { path, payload })
            }
            CollisionPolicy::Numbered => {
                self.deferred.push(Deferred {
                    module_label: label,
                    file_name: name,
                    payload,
                });
                None
            }
        }
    }

    /// Places everything that was deferred. Empty for `rename` and `prefix`.
    pub fn finish(self) -> Vec<Placement<T>> {
        let mut deferred = self.deferred;
        deferred.sort_by(|a, b| {
            (a.module_label.as_str(), a.file_name.as_str())
                .cmp(&(b.module_label.as_str(), b.file_name.as_str()))
        });
        let width = deferred.len().to_string().len().max(2);

        deferred
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| {
                let (stem, ext) = split_extension(&entry.file_name);
                let file_name = format!(
                    "{number:0width$} - {module} - {stem}{ext}",
                    number = idx + 1,
                    module = entry.module_label,
                );
                Placement {
                    path: OutputPath {
                        folder: None,
                        file_name,
                    },
                    payload: entry.payload,
                }
            })
            .collect()
    }

    fn claim(&mut self, folder: Option<String>, stem: &str, ext: &str) -> OutputPath {
        let mut path = OutputPath {
            folder,
            file_name: format!("{stem}{ext}"),
        };
        let mut counter = 2;
        while self.taken.contains(&path) {
            path.file_name = format!("{stem} ({counter}){ext}");
            counter += 1;
        }
        self.taken.insert(path.clone());
        path
    }
}

/// `.` and `..` would address the parent or the folder itself.
fn safe_component(name: String) -> String {
    if name == "." || name == ".." {
        "_".to_string()
    } else {
        name
    }
}

fn folder_for(label: &str) -> Option<String> {
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}
