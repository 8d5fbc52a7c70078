use regex::Regex;
use thiserror::Error;

/// Version and release date parsed from an archive file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// `MAJOR.MINOR.PATCH`
    pub version: String,
    /// Date as written in the file name, e.g. `19Jan2015`.
    pub raw_date: String,
    /// Date rendered as `D Mon YY`, e.g. `19 Jan 15`.
    pub nice_date: String,
}

/// The file name matched the release pattern but its date could not be split.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("date sub-expression not matched in {raw_date:?}")]
pub struct VersionFormatError {
    pub raw_date: String,
}

/// Extracts [`VersionInfo`] from `<project>_<X.Y.Z>_<DDMonYYYY>.zip` names.
#[derive(Debug, Clone)]
pub struct VersionExtractor {
    release: Regex,
    date: Regex,
}

impl VersionExtractor {
    pub fn new(project: &str) -> Self {
        let pattern = format!(
            r"\b{}_(?P<version>\d+\.\d+\.\d+)_(?P<date>\d+[A-Z][a-z]{{2}}20\d\d)\.zip\b",
            regex::escape(project)
        );
        Self {
            release: Regex::new(&pattern).expect("release pattern is valid"),
            date: Regex::new(r"^(\d+)([A-Za-z]+)(\d+)$").expect("date pattern is valid"),
        }
    }

    /// Returns `Ok(None)` for names that do not follow the release naming scheme.
    pub fn extract(&self, name_or_url: &str) -> Result<Option<VersionInfo>, VersionFormatError> {
        let Some(caps) = self.release.captures(name_or_url) else {
            return Ok(None);
        };
        let version = caps["version"].to_string();
        let raw_date = caps["date"].to_string();

        let nice_date = self
            .nice_date(&raw_date)
            .ok_or_else(|| VersionFormatError {
                raw_date: raw_date.clone(),
            })?;

        Ok(Some(VersionInfo {
            version,
            raw_date,
            nice_date,
        }))
    }

    fn nice_date(&self, raw_date: &str) -> Option<String> {
        let caps = self.date.captures(raw_date)?;
        // The day stays text so an overlong digit run cannot overflow.
        let day = match caps[1].trim_start_matches('0') {
            "" => "0",
            digits => digits,
        };
        let year: i64 = caps[3].parse().ok()?;
        Some(format!("{} {} {:02}", day, &caps[2], year - 2000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_loses_leading_zero_and_year_keeps_two_digits() {
        let extractor = VersionExtractor::new("htmLawed");
        let info = extractor
            .extract("htmLawed_1.2.0_05Mar2008.zip")
            .unwrap()
            .unwrap();
        assert_eq!(info.nice_date, "5 Mar 08");
    }

    #[test]
    fn date_splitter_rejects_garbage() {
        let extractor = VersionExtractor::new("htmLawed");
        assert_eq!(extractor.nice_date("Jan2015"), None);
    }
}
