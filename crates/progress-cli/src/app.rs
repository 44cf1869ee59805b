use std::path::Path;

use anyhow::{bail, Context, Result};
use progress_core::config::{resolve_path, Config, WarnLevel};
use progress_core::db::SampleDb;
use progress_core::publish::{open_content_store, Publisher};
use progress_core::tracker::Tracker;
use tracing::{debug, warn};

use crate::root::{resolve_config, ConfigLocation};

/// Everything an interactive session needs, built from the configuration.
pub struct App {
    pub tracker: Tracker,
    pub open_after_publish: bool,
}

impl App {
    pub fn from_args(explicit_config: Option<&Path>) -> Result<Self> {
        Self::from_location(resolve_config(explicit_config))
    }

    pub fn from_location(loc: ConfigLocation) -> Result<Self> {
        let config = match &loc.file {
            Some(file) => Config::load(file)
                .with_context(|| format!("loading config {}", file.display()))?,
            None => {
                debug!(base_dir = %loc.base_dir.display(), "no config file found, using defaults");
                Config::default()
            }
        };

        let mut errors = Vec::new();
        for w in config.validate() {
            match w.level {
                WarnLevel::Warning => warn!("config: {}", w.message),
                WarnLevel::Error => errors.push(w.message),
            }
        }
        if !errors.is_empty() {
            bail!("invalid configuration: {}", errors.join("; "));
        }

        let db_path = resolve_path(&loc.base_dir, &config.store.path);
        let db = SampleDb::open(&db_path)
            .with_context(|| format!("opening sample store {}", db_path.display()))?;
        let publisher = Publisher::new(
            open_content_store(&config.publish, &loc.base_dir).context("opening content store")?,
        );
        debug!(
            store = %db_path.display(),
            base_url = publisher.base_url(),
            "session ready"
        );

        let tracker = Tracker::new(db, publisher, config.display_options()?);
        Ok(Self {
            tracker,
            open_after_publish: config.browser.open_after_publish,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn location(dir: &TempDir, yaml: &str) -> ConfigLocation {
        let file = dir.path().join("progress.yaml");
        std::fs::write(&file, yaml).unwrap();
        ConfigLocation {
            file: Some(file),
            base_dir: dir.path().to_path_buf(),
        }
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let loc = location(
            &dir,
            "store:\n  path: data/progress.redb\npublish:\n  type: dir\n  path: public\n  base_url: https://p.example.com\n",
        );
        let app = App::from_location(loc).unwrap();
        assert!(dir.path().join("data/progress.redb").is_file());
        assert!(dir.path().join("public").is_dir());
        assert_eq!(
            app.tracker.homepage_url(),
            "https://p.example.com/index.html"
        );
        assert!(!app.open_after_publish);
    }

    #[test]
    fn validation_errors_are_fatal() {
        let dir = TempDir::new().unwrap();
        let loc = location(&dir, "display:\n  utc_offset_hours: 30\n");
        let err = App::from_location(loc).err().unwrap();
        assert!(format!("{err:#}").contains("utc_offset_hours"));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let loc = ConfigLocation {
            file: Some(dir.path().join("nope.yaml")),
            base_dir: dir.path().to_path_buf(),
        };
        let err = App::from_location(loc).err().unwrap();
        assert!(format!("{err:#}").contains("config file not found"));
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let dir = TempDir::new().unwrap();
        let loc = ConfigLocation {
            file: None,
            base_dir: dir.path().to_path_buf(),
        };
        let app = App::from_location(loc).unwrap();
        assert!(dir.path().join("progress.redb").is_file());
        assert!(app.tracker.homepage_url().starts_with("file://"));
    }
}
