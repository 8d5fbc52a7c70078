use std::cell::Cell;
use std::fmt::Write;

use importer_core::ListingEntry;
use importer_engine::{EngineEvent, ProgressSink};
use importer_logging::importer_debug;

/// Prints pipeline progress to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    listing_announced: Cell<bool>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for ConsoleSink {
    fn emit(&self, event: EngineEvent) {
        if let EngineEvent::PageFetchStarted { url } = &event {
            importer_debug!("fetching listing page {}", url);
            if self.listing_announced.replace(true) {
                return;
            }
        }
        println!("{}", describe(&event));
    }
}

/// Console text for one pipeline event.
pub fn describe(event: &EngineEvent) -> String {
    match event {
        EngineEvent::PageFetchStarted { .. } => "obtaining files from sourceforge...".to_string(),
        EngineEvent::FileNumberResolved {
            number,
            relative_url,
        } => format!("file number {number} is '{}'", relative_url.trim_start_matches('/')),
        EngineEvent::DownloadStarted { url, destination } => format!(
            "downloading from: {url}\ndownloading to: {}",
            destination.display()
        ),
        EngineEvent::AlreadyDownloaded { path } => format!(
            "already downloaded to {}, remove the file if you want to download again.",
            path.display()
        ),
        EngineEvent::ManifestPatched { path, version } => {
            format!("set version {version} in {}", path.display())
        }
        EngineEvent::Unzipped {
            name,
            decision,
            bytes,
        } => format!("unzip {name} ({decision}): {} bytes", group_thousands(*bytes)),
        EngineEvent::CommitSuggestion { summary, fallback } => {
            let kind = if *fallback { "fallback" } else { "nice" };
            format!("{kind} commit message suggestion:\n{summary}")
        }
        EngineEvent::CommandPrepared { command_line } => format!("command:\n{command_line}"),
        EngineEvent::Tagged { version } => format!("tagged {version}"),
    }
}

/// Numbered table of the files in the listing: `  #NN  name    date`.
pub fn available_files(files: &[ListingEntry]) -> String {
    let mut buffer = String::new();
    for (index, file) in files.iter().enumerate() {
        let _ = writeln!(
            buffer,
            "  #{:02}  {:<34}    {}",
            index + 1,
            file.name,
            file.date
        );
    }
    buffer
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use importer_core::{EntryKind, ExtractionDecision};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn byte_counts_use_thousands_separators() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(123_456_789), "123,456,789");
    }

    #[test]
    fn unzip_line_names_entry_and_decision() {
        let event = EngineEvent::Unzipped {
            name: "htmLawed/htmLawed.php".to_string(),
            decision: ExtractionDecision::Overwrite,
            bytes: 98_514,
        };
        assert_eq!(describe(&event), "unzip htmLawed/htmLawed.php (overwrite): 98,514 bytes");
    }

    #[test]
    fn file_number_drops_leading_separator() {
        let event = EngineEvent::FileNumberResolved {
            number: 3,
            relative_url: "/1.1.19/htmLawed_1.1.19_19Jan2015.zip".to_string(),
        };
        assert_eq!(
            describe(&event),
            "file number 3 is '1.1.19/htmLawed_1.1.19_19Jan2015.zip'"
        );
    }

    #[test]
    fn suggestion_headline_depends_on_fallback() {
        let nice = EngineEvent::CommitSuggestion {
            summary: "updated to v1.1.19, 19 Jan 15".to_string(),
            fallback: false,
        };
        let fallback = EngineEvent::CommitSuggestion {
            summary: "imported snapshot.zip".to_string(),
            fallback: true,
        };
        assert!(describe(&nice).starts_with("nice commit message suggestion:\n"));
        assert!(describe(&fallback).starts_with("fallback commit message suggestion:\n"));
    }

    #[test]
    fn download_lines_show_both_ends() {
        let event = EngineEvent::DownloadStarted {
            url: "https://sourceforge.net/projects/htmlawed/files/a.zip/download".to_string(),
            destination: PathBuf::from("var/zip/a.zip"),
        };
        assert_eq!(
            describe(&event),
            "downloading from: https://sourceforge.net/projects/htmlawed/files/a.zip/download\n\
             downloading to: var/zip/a.zip"
        );
    }

    #[test]
    fn available_files_are_numbered_and_padded() {
        let files = vec![ListingEntry {
            kind: EntryKind::File,
            name: "htmLawed_1.1.19_19Jan2015.zip".to_string(),
            relative_url: "/1.1.19/htmLawed_1.1.19_19Jan2015.zip".to_string(),
            date: "2015-01-19 19:07:31 UTC".to_string(),
            parent_folder: Some("1.1.19".to_string()),
        }];
        assert_eq!(
            available_files(&files),
            format!(
                "  #01  htmLawed_1.1.19_19Jan2015.zip{}    2015-01-19 19:07:31 UTC\n",
                " ".repeat(34 - 29)
            )
        );
    }
}
