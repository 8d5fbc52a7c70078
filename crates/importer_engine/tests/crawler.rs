use std::cell::RefCell;
use std::collections::HashMap;

use importer_core::{EntryKind, ListingEntry};
use importer_engine::{parse_rows, CrawlError, ListingCrawler, MarkupDocument, PageSource};
use pretty_assertions::assert_eq;

const ROOT: &str = "https://sourceforge.net/projects/htmlawed/files";

fn folder_row(name: &str, path: &str, date: &str) -> String {
    format!(
        r#"<tr title="{name}" class="folder ">
  <th scope="row" headers="files_name_h"><a href="/projects/htmlawed/files/{path}/" class="folder"><span class="name">{name}</span></a></th>
  <td headers="files_date_h" class="opt"><abbr title="{date}">{date}</abbr></td>
  <td headers="files_size_h" class="opt"></td>
</tr>"#
    )
}

fn file_row(name: &str, path: &str, date: &str) -> String {
    format!(
        r#"<tr title="{name}" class="file ">
  <th scope="row" headers="files_name_h"><a href="{ROOT}/{path}/download" title="Click to download {name}"><span class="name">{name}</span></a></th>
  <td headers="files_date_h" class="opt"><abbr title="{date}">{date}</abbr></td>
  <td headers="files_size_h" class="opt">95.3 kB</td>
</tr>"#
    )
}

fn page(rows: &[String]) -> String {
    format!(
        r#"<html><body>
<table id="files_list"><thead><tr><th>Name</th><th>Modified</th><th>Size</th></tr></thead>
<tbody>
<tr class="empty"><td colspan="3">Parent folder</td></tr>
{}
</tbody></table>
</body></html>"#,
        rows.join("\n")
    )
}

/// Pages served from memory, recording every request.
#[derive(Default)]
struct MapSource {
    pages: HashMap<String, String>,
    requests: RefCell<Vec<String>>,
}

impl MapSource {
    fn with(mut self, directory: &str, rows: &[String]) -> Self {
        let url = if directory.is_empty() {
            format!("{ROOT}/")
        } else {
            format!("{ROOT}/{directory}/")
        };
        self.pages.insert(url, page(rows));
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl PageSource for MapSource {
    fn page(&self, url: &str) -> Result<MarkupDocument, CrawlError> {
        self.requests.borrow_mut().push(url.to_string());
        let html = self.pages.get(url).map(String::as_str).unwrap_or("<html></html>");
        Ok(MarkupDocument::parse_str(html))
    }
}

fn releases() -> MapSource {
    MapSource::default()
        .with(
            "",
            &[
                folder_row("1.1.19", "1.1.19", "2015-01-19 19:07:31 UTC"),
                folder_row("1.1.18", "1.1.18", "2014-11-16 08:12:02 UTC"),
                file_row("README.txt", "README.txt", "2015-01-19 19:10:00 UTC"),
            ],
        )
        .with(
            "1.1.19",
            &[file_row(
                "htmLawed_1.1.19_19Jan2015.zip",
                "1.1.19/htmLawed_1.1.19_19Jan2015.zip",
                "2015-01-19 19:07:31 UTC",
            )],
        )
        .with(
            "1.1.18",
            &[
                folder_row("extras", "1.1.18/extras", "2014-11-16 08:12:02 UTC"),
                file_row(
                    "htmLawed_1.1.18_16Nov2014.zip",
                    "1.1.18/htmLawed_1.1.18_16Nov2014.zip",
                    "2014-11-16 08:12:02 UTC",
                ),
            ],
        )
        .with(
            "1.1.18/extras",
            &[file_row(
                "htmLawed_tests.zip",
                "1.1.18/extras/htmLawed_tests.zip",
                "2014-11-16 08:13:00 UTC",
            )],
        )
}

#[test]
fn parse_rows_reads_sourceforge_table() {
    let html = page(&[
        folder_row("1.1.19", "1.1.19", "2015-01-19 19:07:31 UTC"),
        file_row("README.txt", "README.txt", "2015-01-19 19:10:00 UTC"),
    ]);
    let document = MarkupDocument::parse(html.as_bytes(), Some("text/html; charset=utf-8")).unwrap();

    let rows = parse_rows(&document, "").unwrap();
    assert_eq!(
        rows,
        vec![
            ListingEntry {
                kind: EntryKind::Folder,
                name: "1.1.19".to_string(),
                relative_url: "/1.1.19".to_string(),
                date: "2015-01-19 19:07:31 UTC".to_string(),
                parent_folder: None,
            },
            ListingEntry {
                kind: EntryKind::File,
                name: "README.txt".to_string(),
                relative_url: "/README.txt".to_string(),
                date: "2015-01-19 19:10:00 UTC".to_string(),
                parent_folder: None,
            },
        ]
    );
}

#[test]
fn rows_of_a_subfolder_are_relative_to_the_root() {
    let html = page(&[file_row("a.zip", "1.1.19/a.zip", "2015-01-19 19:07:31 UTC")]);
    let document = MarkupDocument::parse_str(&html);

    let rows = parse_rows(&document, "1.1.19").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].relative_url, "/1.1.19/a.zip");
}

#[test]
fn files_lists_every_file_once_in_listing_order() {
    let mut crawler = ListingCrawler::new(releases(), ROOT);

    let files = crawler.files().unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.relative_url.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "/README.txt",
            "/1.1.19/htmLawed_1.1.19_19Jan2015.zip",
            "/1.1.18/htmLawed_1.1.18_16Nov2014.zip",
            "/1.1.18/extras/htmLawed_tests.zip",
        ]
    );
}

#[test]
fn nested_entries_carry_their_innermost_folder() {
    let mut crawler = ListingCrawler::new(releases(), ROOT);

    let files = crawler.files().unwrap();
    let folders: Vec<Option<&str>> = files.iter().map(|f| f.parent_folder.as_deref()).collect();
    assert_eq!(folders, vec![None, Some("1.1.19"), Some("1.1.18"), Some("extras")]);
}

#[test]
fn each_directory_is_requested_once() {
    let mut crawler = ListingCrawler::new(releases(), ROOT);
    crawler.files().unwrap();
    crawler.files().unwrap();
    crawler.listing("1.1.18").unwrap();

    let mut requests = crawler.source().requests();
    requests.sort();
    assert_eq!(
        requests,
        vec![
            format!("{ROOT}/"),
            format!("{ROOT}/1.1.18/"),
            format!("{ROOT}/1.1.18/extras/"),
            format!("{ROOT}/1.1.19/"),
        ]
    );
    assert_eq!(crawler.cache().len(), 4);
}

#[test]
fn nesting_beyond_the_limit_fails() {
    let mut crawler = ListingCrawler::new(releases(), ROOT).with_max_depth(1);

    let err = crawler.files().unwrap_err();
    assert!(matches!(
        err,
        CrawlError::TooDeep { ref directory, max_depth: 1 } if directory == "1.1.18/extras"
    ));
}

#[test]
fn self_named_folders_stop_at_the_depth_limit() {
    // Every "loop" page links to a "loop" subfolder, forever.
    let mut source = MapSource::default();
    let mut directory = String::new();
    for _ in 0..5 {
        let child = if directory.is_empty() {
            "loop".to_string()
        } else {
            format!("{directory}/loop")
        };
        source = source.with(&directory, &[folder_row("loop", &child, "2015-01-19 19:07:31 UTC")]);
        directory = child;
    }
    let mut crawler = ListingCrawler::new(source, ROOT).with_max_depth(3);

    assert!(matches!(crawler.files(), Err(CrawlError::TooDeep { max_depth: 3, .. })));
    assert_eq!(crawler.source().requests().len(), 4);
}

#[test]
fn empty_folder_contributes_nothing() {
    let source = MapSource::default().with(
        "",
        &[
            folder_row("empty", "empty", "2015-01-19 19:07:31 UTC"),
            file_row("a.zip", "a.zip", "2015-01-19 19:07:31 UTC"),
        ],
    );
    let mut crawler = ListingCrawler::new(source, ROOT);

    let listing = crawler.listing("").unwrap();
    assert_eq!(listing.len(), 2);
    assert_eq!(crawler.files().unwrap().len(), 1);
}

#[test]
fn page_url_has_a_trailing_slash() {
    let crawler = ListingCrawler::new(MapSource::default(), format!("{ROOT}/"));
    assert_eq!(crawler.page_url(""), format!("{ROOT}/"));
    assert_eq!(crawler.page_url("/1.1.19/"), format!("{ROOT}/1.1.19/"));
}
