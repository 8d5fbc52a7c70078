use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use importer_core::ExtractionDecision;
use importer_logging::importer_trace;
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

/// Base names never extracted.
const JUNK_NAMES: &[&str] = &[".DS_Store", "Thumbs.db"];
const JUNK_DIRS: &[&str] = &["__MACOSX/"];

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("unable to open zip-archive {path:?}: {message}")]
    Open { path: PathBuf, message: String },
    #[error("archive entry {name:?} would be written outside the destination")]
    UnsafeEntry { name: String },
    #[error("zip error: {0}")]
    Zip(#[from] ZipError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Extracts a release zip into a working tree, stripping the archive's base folder.
pub struct ArchiveExtractor {
    archive: ZipArchive<File>,
    names: Vec<String>,
    root: PathBuf,
    base_prefix: String,
}

impl ArchiveExtractor {
    pub fn open(
        path: &Path,
        root: impl Into<PathBuf>,
        base_prefix: impl Into<String>,
    ) -> Result<Self, ArchiveError> {
        let open_error = |message: String| ArchiveError::Open {
            path: path.to_path_buf(),
            message,
        };
        let file = File::open(path).map_err(|err| open_error(err.to_string()))?;
        let archive = ZipArchive::new(file).map_err(|err| open_error(err.to_string()))?;
        let names = (0..archive.len())
            .filter_map(|index| archive.name_for_index(index).map(str::to_string))
            .collect();

        Ok(Self {
            archive,
            names,
            root: root.into(),
            base_prefix: base_prefix.into(),
        })
    }

    /// Entry names in archive order, without OS metadata files.
    pub fn entries(&self) -> impl Iterator<Item = &str> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .filter(|name| !is_junk(name))
    }

    /// Entry name relative to the destination root.
    pub fn destination_name<'n>(&self, name: &'n str) -> &'n str {
        let name = if self.base_prefix.is_empty() {
            name
        } else {
            name.strip_prefix(self.base_prefix.as_str()).unwrap_or(name)
        };
        name.trim_start_matches('/')
    }

    pub fn destination(&self, name: &str) -> PathBuf {
        self.root.join(self.destination_name(name))
    }

    pub fn decision(&self, name: &str) -> ExtractionDecision {
        if name.ends_with('/') {
            return ExtractionDecision::SkipDirectory;
        }
        let destination = self.destination(name);
        ExtractionDecision::probe(destination.is_file(), destination.is_dir())
    }

    /// Write the entry to its destination, returning the number of bytes written.
    ///
    /// Directories are never written; they yield `0`.
    pub fn extract(&mut self, name: &str) -> Result<u64, ArchiveError> {
        if !self.decision(name).writes_bytes() {
            return Ok(0);
        }

        let relative = self.destination_name(name);
        if !is_enclosed(relative) {
            return Err(ArchiveError::UnsafeEntry {
                name: name.to_string(),
            });
        }
        let destination = self.root.join(relative);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut entry = self.archive.by_name(name)?;
        let mut out = File::create(&destination)?;
        let bytes = io::copy(&mut entry, &mut out)?;
        importer_trace!("extracted {} ({} bytes) to {:?}", name, bytes, destination);
        Ok(bytes)
    }
}

fn is_junk(name: &str) -> bool {
    let base = name.trim_end_matches('/').rsplit('/').next().unwrap_or(name);
    JUNK_NAMES.contains(&base)
        || JUNK_DIRS
            .iter()
            .any(|dir| name.starts_with(dir) || name.contains(&format!("/{dir}")))
}

fn is_enclosed(relative: &str) -> bool {
    !relative.is_empty()
        && Path::new(relative)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}
