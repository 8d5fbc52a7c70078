use std::fs;
use std::path::{Path, PathBuf};

use importer_core::ResolvedFile;
use importer_logging::{importer_info, importer_warn};
use thiserror::Error;

use crate::fetch::Fetcher;
use crate::persist::{AtomicFileWriter, PersistError};
use crate::FetchError;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("failed to download from {url}: {source}")]
    Fetch { url: String, source: FetchError },
    #[error("download metadata {path:?} is unreadable: {message}")]
    Sidecar { path: PathBuf, message: String },
    #[error("failed to store download: {0}")]
    Persist(#[from] PersistError),
}

/// A downloaded archive and the metadata stored beside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRecord {
    pub archive: PathBuf,
    pub sidecar: PathBuf,
    pub resolved: ResolvedFile,
    /// True when no network transfer happened for this record.
    pub from_cache: bool,
}

/// Download URL of a file given its path relative to the listing root.
pub fn download_url(base_url: &str, relative: &str) -> String {
    format!(
        "{}/{}/download",
        base_url.trim_end_matches('/'),
        relative.trim_matches('/')
    )
}

/// Local file name for a download URL: the path segment before `/download`.
pub fn archive_name(download_url: &str) -> String {
    let without_suffix = download_url
        .trim_end_matches('/')
        .strip_suffix("/download")
        .unwrap_or(download_url);
    without_suffix
        .rsplit('/')
        .next()
        .unwrap_or(without_suffix)
        .to_string()
}

/// `<archive>.json`
pub fn sidecar_path(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_os_string();
    name.push(".json");
    PathBuf::from(name)
}

/// Fetches release archives into a work directory, at most once per archive.
pub struct DownloadStage<'a> {
    fetcher: &'a dyn Fetcher,
    base_url: String,
    dir: PathBuf,
}

impl<'a> DownloadStage<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, base_url: impl Into<String>, dir: PathBuf) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
            dir,
        }
    }

    /// Download URL and local cache path for a file name or relative path.
    pub fn resolve(&self, filename: &str) -> (String, PathBuf) {
        let url = download_url(&self.base_url, filename);
        let path = self.dir.join(archive_name(&url));
        (url, path)
    }

    pub fn download_url(&self, relative: &str) -> String {
        download_url(&self.base_url, relative)
    }

    /// The record for `archive` when both the archive and its sidecar exist.
    pub fn cached(&self, archive: &Path) -> Result<Option<DownloadRecord>, DownloadError> {
        let sidecar = sidecar_path(archive);
        if !archive.is_file() || !sidecar.is_file() {
            return Ok(None);
        }

        let content = fs::read(&sidecar).map_err(|err| DownloadError::Sidecar {
            path: sidecar.clone(),
            message: err.to_string(),
        })?;
        let resolved: ResolvedFile =
            serde_json::from_slice(&content).map_err(|err| DownloadError::Sidecar {
                path: sidecar.clone(),
                message: err.to_string(),
            })?;

        Ok(Some(DownloadRecord {
            archive: archive.to_path_buf(),
            sidecar,
            resolved,
            from_cache: true,
        }))
    }

    /// Fetch `resolved` into `archive`, then write the sidecar.
    ///
    /// Nothing is written when the fetch fails.
    pub fn download(
        &self,
        resolved: ResolvedFile,
        archive: &Path,
    ) -> Result<DownloadRecord, DownloadError> {
        if archive.exists() {
            importer_warn!("replacing {:?}: its download metadata is missing", archive);
        }

        let output = self
            .fetcher
            .fetch(&resolved.download_url)
            .map_err(|source| DownloadError::Fetch {
                url: resolved.download_url.clone(),
                source,
            })?;

        let (writer, filename) = AtomicFileWriter::for_path(archive)?;
        let archive = writer.write(&filename, &output.bytes)?;

        let sidecar = sidecar_path(&archive);
        let json = serde_json::to_string_pretty(&resolved).map_err(|err| DownloadError::Sidecar {
            path: sidecar.clone(),
            message: err.to_string(),
        })?;
        let (writer, sidecar_name) = AtomicFileWriter::for_path(&sidecar)?;
        writer.write(&sidecar_name, json)?;

        importer_info!(
            "downloaded {} bytes from {} to {:?}",
            output.metadata.byte_len,
            output.metadata.final_url,
            archive
        );

        Ok(DownloadRecord {
            archive,
            sidecar,
            resolved,
            from_cache: false,
        })
    }

    /// Reuse the cached archive for `resolved` or download it.
    pub fn ensure(&self, resolved: ResolvedFile) -> Result<DownloadRecord, DownloadError> {
        let archive = self.dir.join(archive_name(&resolved.download_url));
        match self.cached(&archive)? {
            Some(record) => Ok(record),
            None => self.download(resolved, &archive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_name_is_the_segment_before_download() {
        assert_eq!(
            archive_name("https://sourceforge.net/projects/htmlawed/files/1.1.19/htmLawed_1.1.19_19Jan2015.zip/download"),
            "htmLawed_1.1.19_19Jan2015.zip"
        );
        assert_eq!(archive_name("https://example.com/files/a.zip"), "a.zip");
    }

    #[test]
    fn download_url_joins_without_double_separators() {
        assert_eq!(
            download_url("https://sourceforge.net/projects/htmlawed/files/", "/1.1.19/a.zip"),
            "https://sourceforge.net/projects/htmlawed/files/1.1.19/a.zip/download"
        );
    }

    #[test]
    fn sidecar_appends_json_extension() {
        assert_eq!(sidecar_path(Path::new("var/zip/a.zip")), PathBuf::from("var/zip/a.zip.json"));
    }
}
