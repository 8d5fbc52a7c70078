use std::fmt;

use serde::{Deserialize, Serialize};

/// Row classification of a remote directory index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

impl EntryKind {
    /// Classify a row `class` attribute (`"file "`, `"folder "`, ...).
    pub fn from_class(class: &str) -> Option<Self> {
        match class.split_whitespace().next()? {
            "file" => Some(EntryKind::File),
            "folder" => Some(EntryKind::Folder),
            _ => None,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Folder => write!(f, "folder"),
        }
    }
}

/// One row (file or folder) discovered in a remote directory index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub name: String,
    /// Path relative to the listing root, always starting with `/`.
    #[serde(rename = "url")]
    pub relative_url: String,
    pub date: String,
    #[serde(rename = "dir", default, skip_serializing_if = "Option::is_none")]
    pub parent_folder: Option<String>,
}

impl ListingEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

/// The listing entry chosen as import target, with its download URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFile {
    #[serde(flatten)]
    pub entry: ListingEntry,
    pub download_url: String,
}

impl ResolvedFile {
    pub fn new(entry: ListingEntry, download_url: impl Into<String>) -> Self {
        debug_assert!(!entry.relative_url.is_empty());
        Self {
            entry,
            download_url: download_url.into(),
        }
    }

    /// Relative URL with percent escapes decoded, for human-readable output.
    pub fn decoded_url(&self) -> String {
        decode_url_component(&self.entry.relative_url)
    }
}

/// Keep only `File` entries, preserving listing order.
pub fn files_only(listing: &[ListingEntry]) -> Vec<ListingEntry> {
    listing.iter().filter(|e| e.is_file()).cloned().collect()
}

/// Interpret a command-line argument as a 1-based file number.
///
/// The argument is a number only when its integer rendering equals the
/// argument with leading zeros removed, so `"12"` and `"007"` are numbers
/// while `"0"`, `"1.1.19"` or a file name are not.
pub fn parse_file_index(arg: &str) -> Option<i64> {
    let value: i64 = arg.parse().ok()?;
    (arg.trim_start_matches('0') == value.to_string()).then_some(value)
}

/// Decode `%XX` escapes and `+` the way form-encoded URLs are decoded.
pub fn decode_url_component(input: &str) -> String {
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}
