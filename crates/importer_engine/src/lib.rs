//! Importer engine: network, filesystem and version-control side of the import pipeline.
mod archive;
mod clock;
mod command;
mod config;
mod crawler;
mod digest;
mod download;
mod fetch;
mod manifest;
mod markup;
mod page_cache;
mod persist;
mod pipeline;
mod types;

pub use archive::{ArchiveError, ArchiveExtractor};
pub use clock::{Clock, FixedClock, SystemClock};
pub use command::{CommandError, CommandRunner, CommandSpec, RenderedCommand, ShellRunner, Slot};
pub use config::{ConfigError, EngineConfig, DEFAULT_AUTHOR, DEFAULT_PROJECT};
pub use crawler::{parse_rows, CrawlError, ListingCache, ListingCrawler, PageSource, DEFAULT_MAX_DEPTH};
pub use digest::{archive_digests, md5_file};
pub use download::{archive_name, download_url, sidecar_path, DownloadError, DownloadRecord, DownloadStage};
pub use fetch::{FetchSettings, Fetcher, NullProgressSink, ProgressSink, ReqwestFetcher};
pub use manifest::{patch_manifest_file, ManifestError};
pub use markup::{MarkupDocument, MarkupError, MarkupNode};
pub use page_cache::{cache_key, CachedPageSource, PageCache, DEFAULT_STALENESS};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use pipeline::{ImportError, ImportOutcome, ImportRequest, Importer};
pub use types::{EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput};
