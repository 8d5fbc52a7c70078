use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use importer_engine::EngineConfig;
use importer_logging::{importer_info, importer_warn};
use ron::extensions::Extensions;
use serde::Deserialize;

pub const DEFAULT_SETTINGS_FILE: &str = "./importer.ron";

/// Optional overrides read from the settings file. Unset fields keep the
/// engine defaults.
///
/// ```ron
/// (
///     project: "htmLawed",
///     tree_root: "/src/htmlawed",
///     page_staleness_secs: 600,
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub project: Option<String>,
    pub listing_url: Option<String>,
    pub archive_prefix: Option<String>,
    pub commit_author: Option<String>,
    pub vcs_program: Option<String>,
    pub tree_root: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub manifest_path: Option<PathBuf>,
    pub page_staleness_secs: Option<u64>,
    pub max_crawl_depth: Option<usize>,
}

impl Settings {
    /// Apply the overrides that do not depend on the directory layout.
    pub fn apply(&self, config: &mut EngineConfig) {
        if let Some(url) = &self.listing_url {
            config.listing_url = url.clone();
        }
        if let Some(prefix) = &self.archive_prefix {
            config.archive_prefix = prefix.clone();
        }
        if let Some(author) = &self.commit_author {
            config.commit_author = author.clone();
        }
        if let Some(program) = &self.vcs_program {
            config.vcs_program = program.clone();
        }
        if let Some(path) = &self.manifest_path {
            config.manifest_path = path.clone();
        }
        if let Some(secs) = self.page_staleness_secs {
            config.page_staleness = Duration::from_secs(secs);
        }
        if let Some(depth) = self.max_crawl_depth {
            config.max_crawl_depth = depth;
        }
    }
}

/// Read settings from `path`. A missing file yields the defaults; an unreadable
/// or malformed one is logged and ignored.
pub fn load_settings(path: &Path) -> Settings {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Settings::default();
        }
        Err(err) => {
            importer_warn!("Failed to read settings from {:?}: {}", path, err);
            return Settings::default();
        }
    };

    let options = ron::Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
    match options.from_str::<Settings>(&content) {
        Ok(settings) => {
            importer_info!("Loaded settings from {:?}", path);
            settings
        }
        Err(err) => {
            importer_warn!("Failed to parse settings from {:?}: {}", path, err);
            Settings::default()
        }
    }
}
