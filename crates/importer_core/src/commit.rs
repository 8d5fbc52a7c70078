use std::fmt::Write;

use crate::listing::ResolvedFile;
use crate::version::VersionInfo;

/// Content digests of the imported archive, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDigests {
    pub sha256: String,
    pub sha1: String,
    pub md5: String,
}

/// A file written by the extraction and added to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Path relative to the working tree root.
    pub path: String,
    pub md5: String,
}

/// First line of the commit message.
///
/// Falls back to naming the archive when its file name carries no version.
pub fn summary_line(version: Option<&VersionInfo>, filename: &str) -> String {
    match version {
        Some(info) => format!("updated to v{}, {}", info.version, info.nice_date),
        None => {
            let base = filename
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or(filename);
            format!("imported {base}")
        }
    }
}

/// Full commit message: summary, source metadata, archive digests and the
/// numbered listing of staged files.
pub fn compose_message(
    summary: &str,
    resolved: &ResolvedFile,
    digests: &ArchiveDigests,
    staged: &[StagedFile],
) -> String {
    let mut message = String::with_capacity(256 + staged.len() * 64);
    message.push_str(summary);
    let _ = write!(
        message,
        "\n\nfile: {}\ndate: {}\n\nSHA256:{}\nSHA1:{}\nMD5:{}\n\nListing:\n--------\n",
        resolved.decoded_url(),
        resolved.entry.date,
        digests.sha256,
        digests.sha1,
        digests.md5,
    );
    message.push_str(&format_listing(staged));
    message
}

/// One line per staged file, `"  1. path   MD5:..."`, paths padded to the longest.
pub fn format_listing(staged: &[StagedFile]) -> String {
    let width = staged
        .iter()
        .map(|f| f.path.chars().count())
        .max()
        .unwrap_or(0);
    let mut buffer = String::new();
    for (index, file) in staged.iter().enumerate() {
        let number = format!("{}.", index + 1);
        let _ = writeln!(
            buffer,
            "{number:>4} {path:<width$} MD5:{md5}",
            path = file.path,
            md5 = file.md5,
        );
    }
    buffer
}
