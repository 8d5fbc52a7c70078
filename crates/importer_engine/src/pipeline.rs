use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use importer_core::{
    compose_message, file_by_index, file_by_name, parse_file_index, summary_line, ListingEntry,
    ResolvedFile, StagedFile, VersionExtractor, VersionFormatError, VersionInfo,
};
use importer_logging::importer_info;
use thiserror::Error;

use crate::archive::{ArchiveError, ArchiveExtractor};
use crate::command::{CommandError, CommandRunner, CommandSpec, RenderedCommand};
use crate::config::EngineConfig;
use crate::crawler::{CrawlError, ListingCrawler, PageSource};
use crate::digest::{archive_digests, md5_file};
use crate::download::{DownloadError, DownloadRecord, DownloadStage};
use crate::fetch::{Fetcher, ProgressSink};
use crate::manifest::{patch_manifest_file, ManifestError};
use crate::EngineEvent;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unable to find file {requested:?} on the remote listing")]
    NotFound {
        requested: String,
        available: Vec<ListingEntry>,
    },
    #[error(transparent)]
    Crawl(#[from] CrawlError),
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error(transparent)]
    Version(#[from] VersionFormatError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("failed to hash {path:?}: {source}")]
    Digest { path: PathBuf, source: io::Error },
}

impl ImportError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ImportError::NotFound { .. })
    }
}

/// What to import: a file name / relative path, or a 1-based file number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportRequest {
    Name(String),
    Index(i64),
}

impl ImportRequest {
    pub fn from_arg(arg: &str) -> Self {
        match parse_file_index(arg) {
            Some(index) => ImportRequest::Index(index),
            None => ImportRequest::Name(arg.to_string()),
        }
    }
}

impl fmt::Display for ImportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportRequest::Name(name) => f.write_str(name),
            ImportRequest::Index(index) => write!(f, "{index}"),
        }
    }
}

#[derive(Debug)]
pub struct ImportOutcome {
    pub download: DownloadRecord,
    pub version: Option<VersionInfo>,
    pub staged: Vec<StagedFile>,
    pub message: String,
    pub commit_line: String,
}

/// Runs one import: resolve, download, patch manifest, extract, commit, tag.
pub struct Importer<'a, S> {
    config: &'a EngineConfig,
    crawler: ListingCrawler<S>,
    fetcher: &'a dyn Fetcher,
    runner: &'a dyn CommandRunner,
    sink: &'a dyn ProgressSink,
    versions: VersionExtractor,
}

impl<'a, S: PageSource> Importer<'a, S> {
    pub fn new(
        config: &'a EngineConfig,
        crawler: ListingCrawler<S>,
        fetcher: &'a dyn Fetcher,
        runner: &'a dyn CommandRunner,
        sink: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            config,
            crawler,
            fetcher,
            runner,
            sink,
            versions: VersionExtractor::new(&config.project),
        }
    }

    pub fn crawler(&self) -> &ListingCrawler<S> {
        &self.crawler
    }

    /// All files of the remote listing, in the order used for file numbers.
    pub fn available_files(&mut self) -> Result<Vec<ListingEntry>, ImportError> {
        Ok(self.crawler.files()?)
    }

    pub fn run(&mut self, request: &ImportRequest) -> Result<ImportOutcome, ImportError> {
        let (filename, known) = match request {
            ImportRequest::Index(number) => {
                let files = self.crawler.files()?;
                let entry = file_by_index(&files, *number)
                    .cloned()
                    .ok_or_else(|| not_found(request, files.clone()))?;
                self.sink.emit(EngineEvent::FileNumberResolved {
                    number: *number,
                    relative_url: entry.relative_url.clone(),
                });
                (entry.relative_url.clone(), Some(entry))
            }
            ImportRequest::Name(name) => (name.clone(), None),
        };

        let download = self.obtain_archive(request, &filename, known)?;
        let resolved = &download.resolved;

        let version = self.versions.extract(&resolved.download_url)?;
        if let Some(info) = &version {
            patch_manifest_file(&self.config.manifest_path, &info.version)?;
            self.sink.emit(EngineEvent::ManifestPatched {
                path: self.config.manifest_path.clone(),
                version: info.version.clone(),
            });
            let manifest = self.tree_relative(&self.config.manifest_path);
            self.stage(&manifest, true)?;
        }

        let staged = self.extract_all(&download.archive)?;

        let summary = summary_line(version.as_ref(), &resolved.entry.name);
        self.sink.emit(EngineEvent::CommitSuggestion {
            summary: summary.clone(),
            fallback: version.is_none(),
        });
        let digests = archive_digests(&download.archive).map_err(|source| ImportError::Digest {
            path: download.archive.clone(),
            source,
        })?;
        let message = compose_message(&summary, resolved, &digests, &staged);

        let commit = CommandSpec::new(self.config.vcs_program.as_str())
            .raw("commit")
            .switch("--author", Some(self.config.commit_author.as_str()))
            .switch("--date", Some(resolved.entry.date.as_str()))
            .switch("-F", None)
            .temp_file(message.clone())
            .render()?;
        self.sink.emit(EngineEvent::CommandPrepared {
            command_line: commit.line().to_string(),
        });
        self.execute(&commit)?;

        if let Some(info) = &version {
            let tag = CommandSpec::new(self.config.vcs_program.as_str())
                .raw("tag")
                .raw("-f")
                .quoted(info.version.as_str())
                .render()?;
            if self.execute(&tag)? {
                self.sink.emit(EngineEvent::Tagged {
                    version: info.version.clone(),
                });
            }
        }

        Ok(ImportOutcome {
            commit_line: commit.line().to_string(),
            download,
            version,
            staged,
            message,
        })
    }

    fn obtain_archive(
        &mut self,
        request: &ImportRequest,
        filename: &str,
        known: Option<ListingEntry>,
    ) -> Result<DownloadRecord, ImportError> {
        let stage = DownloadStage::new(
            self.fetcher,
            self.config.listing_url.as_str(),
            self.config.download_dir.clone(),
        );
        let (_, archive) = stage.resolve(filename);

        if let Some(record) = stage.cached(&archive)? {
            importer_info!("reusing {:?}", record.archive);
            self.sink.emit(EngineEvent::AlreadyDownloaded {
                path: record.archive.clone(),
            });
            return Ok(record);
        }

        let entry = match known {
            Some(entry) => entry,
            None => {
                let files = self.crawler.files()?;
                match file_by_name(&files, filename) {
                    Some(entry) => entry.clone(),
                    None => return Err(not_found(request, files)),
                }
            }
        };
        let url = stage.download_url(&entry.relative_url);
        let resolved = ResolvedFile::new(entry, url);
        self.sink.emit(EngineEvent::DownloadStarted {
            url: resolved.download_url.clone(),
            destination: archive.clone(),
        });
        Ok(stage.download(resolved, &archive)?)
    }

    fn extract_all(&self, archive: &Path) -> Result<Vec<StagedFile>, ImportError> {
        let mut extractor = ArchiveExtractor::open(
            archive,
            self.config.tree_root.clone(),
            self.config.archive_prefix.as_str(),
        )?;
        let names: Vec<String> = extractor.entries().map(str::to_string).collect();

        let mut staged = Vec::new();
        for name in names {
            let decision = extractor.decision(&name);
            if !decision.writes_bytes() {
                continue;
            }
            let bytes = extractor.extract(&name)?;
            self.sink.emit(EngineEvent::Unzipped {
                name: name.clone(),
                decision,
                bytes,
            });

            let destination = extractor.destination(&name);
            let relative = extractor.destination_name(&name);
            self.stage(Path::new(relative), false)?;
            let md5 = md5_file(&destination).map_err(|source| ImportError::Digest {
                path: destination.clone(),
                source,
            })?;
            staged.push(StagedFile {
                path: relative.to_string(),
                md5,
            });
        }
        Ok(staged)
    }

    /// `git add [--] <path>`, with `path` relative to the tree root the runner works in.
    fn stage(&self, path: &Path, separate: bool) -> Result<(), ImportError> {
        let mut spec = CommandSpec::new(self.config.vcs_program.as_str()).raw("add");
        if separate {
            spec = spec.raw("--");
        }
        let command = spec.quoted(path.to_string_lossy()).render()?;
        self.execute(&command)?;
        Ok(())
    }

    /// A path as seen from the tree root. Paths outside the tree are made absolute.
    fn tree_relative(&self, path: &Path) -> PathBuf {
        match path.strip_prefix(&self.config.tree_root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()),
        }
    }

    /// Returns whether the command was handed to the runner.
    fn execute(&self, command: &RenderedCommand) -> Result<bool, ImportError> {
        if self.config.dry_run {
            importer_info!("dry run, not running: {}", command.line());
            return Ok(false);
        }
        self.runner.run(command)?;
        Ok(true)
    }
}

fn not_found(request: &ImportRequest, available: Vec<ListingEntry>) -> ImportError {
    ImportError::NotFound {
        requested: request.to_string(),
        available,
    }
}
