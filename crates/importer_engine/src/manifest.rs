use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use importer_core::{patch_manifest_version, ManifestPatchError};
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("{path:?}: {source}")]
    Patch {
        path: PathBuf,
        source: ManifestPatchError,
    },
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to update {path:?}: {source}")]
    Write { path: PathBuf, source: PersistError },
}

/// Set the `"version"` field of the manifest at `path` in place.
pub fn patch_manifest_file(path: &Path, new_version: &str) -> Result<(), ManifestError> {
    let text = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let patched = patch_manifest_version(&text, new_version).map_err(|source| ManifestError::Patch {
        path: path.to_path_buf(),
        source,
    })?;

    let write_error = |source| ManifestError::Write {
        path: path.to_path_buf(),
        source,
    };
    let (writer, filename) = AtomicFileWriter::for_path(path).map_err(write_error)?;
    writer.write(&filename, patched).map_err(write_error)?;
    Ok(())
}
