use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::PathBuf;

use deck_core::{sanitize, OutputMode, OutputPath};
use engine_logging::engine_warn;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::persist::{ensure_output_dir, AtomicFileWriter, PersistError};
use crate::OutputArtifact;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("refusing unsafe output path {0:?}")]
    UnsafePath(String),
    #[error("output already finished")]
    Finished,
    #[error("no staged file for key {0}")]
    NotStaged(usize),
}

/// Folder, relative to a directory root, that holds files whose final name is
/// not known yet. Left in place if the run aborts.
pub const STAGING_DIR: &str = ".canvas-decks-staging";

/// Destination for retrieved files. Paths come from the organizer and are
/// relative to the sink's root.
pub trait OutputSink {
    fn write(&mut self, path: &OutputPath, bytes: &[u8]) -> Result<(), OutputError>;

    /// Hands over a file whose path is assigned later by [`OutputSink::commit`].
    fn stage(&mut self, key: usize, name: &str, bytes: Vec<u8>) -> Result<(), OutputError>;

    /// Moves the file staged under `key` to `path`, returning its size.
    fn commit(&mut self, key: usize, path: &OutputPath) -> Result<u64, OutputError>;

    /// Completes the output. Called once, after the last write.
    fn finish(&mut self) -> Result<OutputArtifact, OutputError>;
}

/// Builds the sink for `mode`.
pub fn open_sink(mode: &OutputMode) -> Result<Box<dyn OutputSink>, OutputError> {
    match mode {
        OutputMode::Directory(root) => Ok(Box::new(DirectorySink::new(root.clone())?)),
        OutputMode::Archive => Ok(Box::new(ArchiveSink::new())),
    }
}

/// Writes a directory tree: one subfolder per module folder of the path.
/// Staged files live under [`STAGING_DIR`] until committed.
pub struct DirectorySink {
    root: PathBuf,
    staged: HashMap<usize, (PathBuf, u64)>,
}

impl DirectorySink {
    pub fn new(root: PathBuf) -> Result<Self, OutputError> {
        ensure_output_dir(&root)?;
        Ok(Self {
            root,
            staged: HashMap::new(),
        })
    }

    fn target_dir(&self, path: &OutputPath) -> PathBuf {
        match &path.folder {
            Some(folder) => self.root.join(folder),
            None => self.root.clone(),
        }
    }
}

impl OutputSink for DirectorySink {
    fn write(&mut self, path: &OutputPath, bytes: &[u8]) -> Result<(), OutputError> {
        check_components(path)?;
        AtomicFileWriter::new(self.target_dir(path)).write(&path.file_name, bytes)?;
        Ok(())
    }

    fn stage(&mut self, key: usize, name: &str, bytes: Vec<u8>) -> Result<(), OutputError> {
        let staged_name = format!("{key:04} {}", sanitize(name));
        let staged = AtomicFileWriter::new(self.root.join(STAGING_DIR))
            .write(&staged_name, &bytes)?;
        self.staged.insert(key, (staged, bytes.len() as u64));
        Ok(())
    }

    fn commit(&mut self, key: usize, path: &OutputPath) -> Result<u64, OutputError> {
        check_components(path)?;
        let (staged, len) = self.staged.remove(&key).ok_or(OutputError::NotStaged(key))?;
        let dir = self.target_dir(path);
        ensure_output_dir(&dir)?;
        let target = dir.join(&path.file_name);
        if target.is_file() {
            fs::remove_file(&target)?;
        }
        fs::rename(&staged, &target)?;
        Ok(len)
    }

    fn finish(&mut self) -> Result<OutputArtifact, OutputError> {
        if self.staged.is_empty() {
            // Fails unless the folder is empty.
            let _ = fs::remove_dir(self.root.join(STAGING_DIR));
        } else {
            engine_warn!(
                "{} staged file(s) were never committed, left in {}",
                self.staged.len(),
                STAGING_DIR
            );
        }
        Ok(OutputArtifact::Directory(self.root.clone()))
    }
}

/// Collects every file into a deflated zip archive held in memory. Staged
/// files wait outside the archive until committed.
pub struct ArchiveSink {
    writer: Option<ZipWriter<Cursor<Vec<u8>>>>,
    staged: HashMap<usize, Vec<u8>>,
}

impl ArchiveSink {
    pub fn new() -> Self {
        Self {
            writer: Some(ZipWriter::new(Cursor::new(Vec::new()))),
            staged: HashMap::new(),
        }
    }
}

impl Default for ArchiveSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for ArchiveSink {
    fn write(&mut self, path: &OutputPath, bytes: &[u8]) -> Result<(), OutputError> {
        check_components(path)?;
        let writer = self.writer.as_mut().ok_or(OutputError::Finished)?;
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file(path.to_string(), options)?;
        writer.write_all(bytes)?;
        Ok(())
    }

    fn stage(&mut self, key: usize, _name: &str, bytes: Vec<u8>) -> Result<(), OutputError> {
        if self.writer.is_none() {
            return Err(OutputError::Finished);
        }
        self.staged.insert(key, bytes);
        Ok(())
    }

    fn commit(&mut self, key: usize, path: &OutputPath) -> Result<u64, OutputError> {
        let bytes = self.staged.remove(&key).ok_or(OutputError::NotStaged(key))?;
        self.write(path, &bytes)?;
        Ok(bytes.len() as u64)
    }

    fn finish(&mut self) -> Result<OutputArtifact, OutputError> {
        let writer = self.writer.take().ok_or(OutputError::Finished)?;
        let cursor = writer.finish()?;
        Ok(OutputArtifact::Archive(cursor.into_inner()))
    }
}

fn check_components(path: &OutputPath) -> Result<(), OutputError> {
    let unsafe_component = path
        .components()
        .any(|part| part.is_empty() || part == "." || part == "..");
    if unsafe_component {
        return Err(OutputError::UnsafePath(path.to_string()));
    }
    Ok(())
}
