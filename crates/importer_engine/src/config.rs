use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::crawler::DEFAULT_MAX_DEPTH;
use crate::fetch::FetchSettings;
use crate::page_cache::DEFAULT_STALENESS;

pub const DEFAULT_PROJECT: &str = "htmLawed";
pub const DEFAULT_AUTHOR: &str = "Santosh Patnaik <santosh.patnaik@roswellpark.org>";
const LISTING_URL_MASK: &str = "https://sourceforge.net/projects/{}/files/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("listing url {url:?} is not usable: {message}")]
    ListingUrl { url: String, message: String },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Project name as used in archive file names.
    pub project: String,
    /// Root of the remote file index.
    pub listing_url: String,
    /// Folder that wraps the archive contents, stripped on extraction.
    pub archive_prefix: String,
    pub commit_author: String,
    pub vcs_program: String,
    /// Working tree that receives the extracted files.
    pub tree_root: PathBuf,
    pub manifest_path: PathBuf,
    pub page_cache_dir: PathBuf,
    pub download_dir: PathBuf,
    pub page_staleness: Duration,
    pub max_crawl_depth: usize,
    pub page_fetch: FetchSettings,
    pub archive_fetch: FetchSettings,
    /// Extract and report, but run no version-control commands.
    pub dry_run: bool,
}

impl EngineConfig {
    /// Defaults for `project`, laid out as `{work_dir}/cache`, `{work_dir}/zip`
    /// and `{tree_root}/composer.json`.
    pub fn for_project(project: &str, tree_root: PathBuf, work_dir: PathBuf) -> Self {
        Self {
            project: project.to_string(),
            listing_url: LISTING_URL_MASK.replace("{}", &project.to_lowercase()),
            archive_prefix: format!("{project}/"),
            commit_author: DEFAULT_AUTHOR.to_string(),
            vcs_program: "git".to_string(),
            manifest_path: tree_root.join("composer.json"),
            tree_root,
            page_cache_dir: work_dir.join("cache"),
            download_dir: work_dir.join("zip"),
            page_staleness: DEFAULT_STALENESS,
            max_crawl_depth: DEFAULT_MAX_DEPTH,
            page_fetch: FetchSettings::default(),
            archive_fetch: FetchSettings::for_archives(),
            dry_run: false,
        }
    }

    pub fn default_with_paths(tree_root: PathBuf, work_dir: PathBuf) -> Self {
        Self::for_project(DEFAULT_PROJECT, tree_root, work_dir)
    }

    /// Reject settings the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let listing_error = |message: String| ConfigError::ListingUrl {
            url: self.listing_url.clone(),
            message,
        };
        let url = Url::parse(&self.listing_url).map_err(|err| listing_error(err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(listing_error(format!("unsupported scheme {}", url.scheme())));
        }

        for (field, value) in [
            ("project", &self.project),
            ("vcs_program", &self.vcs_program),
            ("commit_author", &self.commit_author),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty { field });
            }
        }
        Ok(())
    }
}
