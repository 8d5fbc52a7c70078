use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use importer_logging::{importer_debug, importer_warn};

use crate::clock::Clock;
use crate::crawler::{CrawlError, PageSource};
use crate::fetch::{Fetcher, ProgressSink};
use crate::markup::MarkupDocument;
use crate::persist::{AtomicFileWriter, PersistError};
use crate::EngineEvent;

/// Cached listing pages are re-fetched once they are this old.
pub const DEFAULT_STALENESS: Duration = Duration::from_secs(3600);

/// On-disk page cache: `{dir}/{md5(url)}.html`, capture time is the file mtime.
pub struct PageCache<'c> {
    dir: PathBuf,
    staleness: Duration,
    clock: &'c dyn Clock,
}

impl<'c> PageCache<'c> {
    pub fn new(dir: PathBuf, staleness: Duration, clock: &'c dyn Clock) -> Self {
        Self {
            dir,
            staleness,
            clock,
        }
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.html", cache_key(url)))
    }

    /// Cached payload for `url`, or `None` when absent, unreadable or stale.
    pub fn load(&self, url: &str) -> Option<Vec<u8>> {
        let path = self.path_for(url);
        let captured: DateTime<Utc> = fs::metadata(&path).ok()?.modified().ok()?.into();
        if !self.is_fresh(captured) {
            importer_debug!("page cache stale for {} ({:?})", url, path);
            return None;
        }
        match fs::read(&path) {
            Ok(bytes) => {
                importer_debug!("page cache hit for {} ({:?})", url, path);
                Some(bytes)
            }
            Err(err) => {
                importer_warn!("failed to read cached page {:?}: {}", path, err);
                None
            }
        }
    }

    pub fn store(&self, url: &str, bytes: &[u8]) -> Result<PathBuf, PersistError> {
        let writer = AtomicFileWriter::new(self.dir.clone());
        writer.write(&format!("{}.html", cache_key(url)), bytes)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn is_fresh(&self, captured: DateTime<Utc>) -> bool {
        // A capture time in the future counts as one second old.
        let age = (self.clock.now() - captured).num_seconds().max(1);
        u64::try_from(age).map_or(false, |age| age < self.staleness.as_secs())
    }
}

/// Hex MD5 of the page URL, used as the cache file stem.
pub fn cache_key(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

/// Serves listing pages from the [`PageCache`], fetching and storing on a miss.
///
/// Every network fetch is announced with [`EngineEvent::PageFetchStarted`]
/// before it starts.
pub struct CachedPageSource<'a> {
    fetcher: &'a dyn Fetcher,
    cache: &'a PageCache<'a>,
    sink: &'a dyn ProgressSink,
}

impl<'a> CachedPageSource<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, cache: &'a PageCache<'a>, sink: &'a dyn ProgressSink) -> Self {
        Self {
            fetcher,
            cache,
            sink,
        }
    }
}

impl PageSource for CachedPageSource<'_> {
    fn page(&self, url: &str) -> Result<MarkupDocument, CrawlError> {
        if let Some(bytes) = self.cache.load(url) {
            return Ok(MarkupDocument::parse(&bytes, None)?);
        }

        self.sink.emit(EngineEvent::PageFetchStarted {
            url: url.to_string(),
        });
        let output = self.fetcher.fetch(url)?;
        let document = MarkupDocument::parse(&output.bytes, output.metadata.content_type.as_deref())?;

        if let Err(err) = self.cache.store(url, &output.bytes) {
            importer_warn!("failed to cache page {}: {}", url, err);
        }
        Ok(document)
    }
}
