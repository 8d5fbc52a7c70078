use url::form_urlencoded;

use crate::listing::ListingEntry;

/// Find a file by display name, or by relative URL when `name` contains `/`.
///
/// URL lookups try the literal path first and then its form-encoded spelling,
/// segment by segment. The first match in listing order wins.
pub fn file_by_name<'a>(files: &'a [ListingEntry], name: &str) -> Option<&'a ListingEntry> {
    if name.contains('/') {
        let literal = format!("/{}", name.trim_start_matches('/'));
        find_by_url(files, &literal).or_else(|| {
            let encoded = format!("/{}", encode_path(name.trim_start_matches('/')));
            find_by_url(files, &encoded)
        })
    } else {
        files.iter().find(|entry| entry.name == name)
    }
}

/// Find a file by its 1-based position; zero and negative values select the first file.
pub fn file_by_index(files: &[ListingEntry], index: i64) -> Option<&ListingEntry> {
    let position = usize::try_from(index.saturating_sub(1).max(0)).ok()?;
    files.get(position)
}

fn find_by_url<'a>(files: &'a [ListingEntry], url: &str) -> Option<&'a ListingEntry> {
    files.iter().find(|entry| entry.relative_url == url)
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| form_urlencoded::byte_serialize(segment.as_bytes()).collect::<String>())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::encode_path;

    #[test]
    fn encoding_keeps_separators() {
        assert_eq!(encode_path("1.1.19/my file.zip"), "1.1.19/my+file.zip");
        assert_eq!(encode_path("a&b/c"), "a%26b/c");
    }
}
