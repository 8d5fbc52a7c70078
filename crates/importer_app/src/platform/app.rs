use std::path::PathBuf;

use anyhow::Context;
use importer_engine::{
    CachedPageSource, EngineConfig, ImportRequest, Importer, ListingCrawler, PageCache,
    ReqwestFetcher, ShellRunner, SystemClock, DEFAULT_PROJECT,
};
use importer_logging::importer_info;

use super::console::ConsoleSink;
use super::settings::{load_settings, Settings};
use crate::Cli;

const DEFAULT_TREE: &str = ".";
const DEFAULT_WORK_DIR: &str = "./var";

pub fn run_app(cli: &Cli) -> anyhow::Result<()> {
    let settings = load_settings(&cli.config);
    let config = engine_config(cli, &settings);
    config.validate().context("invalid settings")?;
    importer_info!(
        "importing {:?} from {} into {:?}{}",
        cli.filename,
        config.listing_url,
        config.tree_root,
        if config.dry_run { " (dry run)" } else { "" }
    );

    let clock = SystemClock;
    let cache = PageCache::new(config.page_cache_dir.clone(), config.page_staleness, &clock);
    let page_fetcher = ReqwestFetcher::new(config.page_fetch.clone());
    let archive_fetcher = ReqwestFetcher::new(config.archive_fetch.clone());
    let sink = ConsoleSink::new();
    let source = CachedPageSource::new(&page_fetcher, &cache, &sink);
    let crawler = ListingCrawler::new(source, config.listing_url.as_str())
        .with_max_depth(config.max_crawl_depth);
    let runner = ShellRunner::new(config.tree_root.clone());

    let mut importer = Importer::new(&config, crawler, &archive_fetcher, &runner, &sink);
    let outcome = importer.run(&ImportRequest::from_arg(&cli.filename))?;

    importer_info!(
        "imported {:?}: {} files staged, version {}",
        outcome.download.archive,
        outcome.staged.len(),
        outcome
            .version
            .as_ref()
            .map_or("unknown", |info| info.version.as_str())
    );
    Ok(())
}

/// Layer defaults, settings file and command line, in that order.
fn engine_config(cli: &Cli, settings: &Settings) -> EngineConfig {
    let tree_root = cli
        .tree
        .clone()
        .or_else(|| settings.tree_root.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TREE));
    let work_dir = cli
        .work_dir
        .clone()
        .or_else(|| settings.work_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_WORK_DIR));
    let project = settings.project.as_deref().unwrap_or(DEFAULT_PROJECT);

    let mut config = EngineConfig::for_project(project, tree_root, work_dir);
    settings.apply(&mut config);
    config.dry_run = cli.dry_run;
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("release-import").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_use_the_current_directory() {
        let config = engine_config(&cli(&["a.zip"]), &Settings::default());
        assert_eq!(config.tree_root, PathBuf::from("."));
        assert_eq!(config.manifest_path, PathBuf::from("./composer.json"));
        assert_eq!(config.download_dir, PathBuf::from("./var/zip"));
        assert_eq!(config.page_cache_dir, PathBuf::from("./var/cache"));
        assert!(!config.dry_run);
    }

    #[test]
    fn command_line_wins_over_settings() {
        let settings = Settings {
            tree_root: Some(PathBuf::from("/from/settings")),
            work_dir: Some(PathBuf::from("/work/settings")),
            ..Settings::default()
        };
        let config = engine_config(&cli(&["--tree", "/from/cli", "--dry-run", "a.zip"]), &settings);
        assert_eq!(config.tree_root, PathBuf::from("/from/cli"));
        assert_eq!(config.download_dir, PathBuf::from("/work/settings/zip"));
        assert!(config.dry_run);
    }

    #[test]
    fn settings_project_changes_derived_defaults() {
        let settings = Settings {
            project: Some("Widget".to_string()),
            manifest_path: Some(PathBuf::from("package/composer.json")),
            ..Settings::default()
        };
        let config = engine_config(&cli(&["a.zip"]), &settings);
        assert_eq!(config.listing_url, "https://sourceforge.net/projects/widget/files/");
        assert_eq!(config.archive_prefix, "Widget/");
        assert_eq!(config.manifest_path, PathBuf::from("package/composer.json"));
    }
}
