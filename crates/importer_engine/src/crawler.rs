use std::collections::HashMap;

use importer_core::{files_only, EntryKind, ListingEntry};
use importer_logging::{importer_debug, importer_warn};
use thiserror::Error;

use crate::markup::{MarkupDocument, MarkupError, MarkupNode};
use crate::FetchError;

/// Rows of the remote file table that describe files or folders.
const ROW_QUERY: &str =
    r#"table#files_list tr[class^="file "], table#files_list tr[class^="folder "]"#;

pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Parsed listing rows per normalized directory path.
pub type ListingCache = HashMap<String, Vec<ListingEntry>>;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("could not obtain listing page: {0}")]
    Fetch(#[from] FetchError),
    #[error("could not read listing page: {0}")]
    Markup(#[from] MarkupError),
    #[error("listing of {directory:?} is nested deeper than {max_depth} folders")]
    TooDeep { directory: String, max_depth: usize },
}

/// Source of parsed listing pages, keyed by absolute page URL.
pub trait PageSource {
    fn page(&self, url: &str) -> Result<MarkupDocument, CrawlError>;
}

impl<T: PageSource + ?Sized> PageSource for &T {
    fn page(&self, url: &str) -> Result<MarkupDocument, CrawlError> {
        (**self).page(url)
    }
}

/// Walks a remote directory index and flattens it into listing order.
pub struct ListingCrawler<S> {
    source: S,
    root_url: String,
    max_depth: usize,
    cache: ListingCache,
}

impl<S: PageSource> ListingCrawler<S> {
    pub fn new(source: S, root_url: impl Into<String>) -> Self {
        Self {
            source,
            root_url: root_url.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            cache: ListingCache::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &ListingCache {
        &self.cache
    }

    /// Entries of `directory` followed by the expanded contents of each of its folders.
    pub fn listing(&mut self, directory: &str) -> Result<Vec<ListingEntry>, CrawlError> {
        self.walk(normalize(directory), 0)
    }

    /// Every file of the remote index, in listing order.
    pub fn files(&mut self) -> Result<Vec<ListingEntry>, CrawlError> {
        Ok(files_only(&self.listing("")?))
    }

    /// Absolute URL of the index page for `directory`.
    pub fn page_url(&self, directory: &str) -> String {
        let root = self.root_url.trim_end_matches('/');
        let directory = normalize(directory);
        if directory.is_empty() {
            format!("{root}/")
        } else {
            format!("{root}/{directory}/")
        }
    }

    // Child paths always extend their parent's, so the depth bound also ends
    // any self-referencing folder chain.
    fn walk(&mut self, directory: String, depth: usize) -> Result<Vec<ListingEntry>, CrawlError> {
        if depth > self.max_depth {
            return Err(CrawlError::TooDeep {
                directory,
                max_depth: self.max_depth,
            });
        }

        let mut listing = match self.cache.get(&directory) {
            Some(rows) => rows.clone(),
            None => {
                let rows = self.read_directory(&directory)?;
                self.cache.insert(directory.clone(), rows.clone());
                rows
            }
        };

        let folders: Vec<ListingEntry> = listing.iter().filter(|e| e.is_folder()).cloned().collect();
        for folder in folders {
            for mut item in self.walk(normalize(&folder.relative_url), depth + 1)? {
                item.parent_folder.get_or_insert_with(|| folder.name.clone());
                listing.push(item);
            }
        }

        Ok(listing)
    }

    fn read_directory(&self, directory: &str) -> Result<Vec<ListingEntry>, CrawlError> {
        let url = self.page_url(directory);
        let document = self.source.page(&url)?;
        let rows = parse_rows(&document, directory)?;
        importer_debug!("listed {} rows in {:?}", rows.len(), url);
        Ok(rows)
    }
}

/// Extract listing entries from one index page of `directory`.
pub fn parse_rows(document: &MarkupDocument, directory: &str) -> Result<Vec<ListingEntry>, CrawlError> {
    let mut rows = Vec::new();
    for row in document.query(ROW_QUERY)? {
        if let Some(entry) = parse_row(row, directory)? {
            rows.push(entry);
        }
    }
    Ok(rows)
}

fn parse_row(row: MarkupNode<'_>, directory: &str) -> Result<Option<ListingEntry>, CrawlError> {
    let Some(kind) = row.attr("class").and_then(EntryKind::from_class) else {
        return Ok(None);
    };
    let href = row.first_attr("th a", "href")?;
    let target = match kind {
        // File links point at `<file>/download`.
        EntryKind::File => dirname(&href),
        EntryKind::Folder => href.as_str(),
    };
    let base = basename(target);
    if base.is_empty() {
        importer_warn!("skipping {} row without link in {:?}", kind, directory);
        return Ok(None);
    }

    let relative_url = if directory.is_empty() {
        format!("/{base}")
    } else {
        format!("/{directory}/{base}")
    };

    Ok(Some(ListingEntry {
        kind,
        name: row.first_text("th a")?,
        relative_url,
        date: row.first_attr("td:first-of-type abbr", "title")?,
        parent_folder: None,
    }))
}

fn normalize(directory: &str) -> String {
    directory.trim_matches('/').to_string()
}

fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

fn dirname(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit_once('/').map_or("", |(parent, _)| parent)
}
