use crate::error::{ProgressError, Result};
use crate::render::DisplayOptions;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "progress.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// redb file; relative paths resolve against the config directory.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("progress.redb")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// PublishConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PublishConfig {
    /// Write pages into a local directory (a static site root).
    Dir {
        #[serde(default = "default_site_dir")]
        path: PathBuf,
        /// Public URL the directory is served from; `file://` URLs otherwise.
        #[serde(default)]
        base_url: Option<String>,
    },
    /// Upload pages to an S3-compatible bucket.
    S3 {
        bucket: String,
        #[serde(default = "default_region")]
        region: String,
        /// Custom endpoint for S3-compatible services (path-style requests).
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        public_base_url: Option<String>,
    },
}

fn default_site_dir() -> PathBuf {
    PathBuf::from("site")
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for PublishConfig {
    fn default() -> Self {
        PublishConfig::Dir {
            path: default_site_dir(),
            base_url: None,
        }
    }
}

// ---------------------------------------------------------------------------
// DisplayConfig / BrowserConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// Hours added to stored UTC timestamps when rendering pages.
    #[serde(default)]
    pub utc_offset_hours: i32,
}

fn default_title() -> String {
    "Progress".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            utc_offset_hours: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub open_after_publish: bool,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            store: StoreConfig::default(),
            publish: PublishConfig::default(),
            display: DisplayConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ProgressError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn display_options(&self) -> Result<DisplayOptions> {
        let utc_offset = self
            .display
            .utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ProgressError::Config(format!(
                    "display.utc_offset_hours out of range: {}",
                    self.display.utc_offset_hours
                ))
            })?;
        Ok(DisplayOptions {
            title: self.display.title.clone(),
            utc_offset,
        })
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.version != 1 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("unknown config version {}, expected 1", self.version),
            });
        }

        if !(-23..=23).contains(&self.display.utc_offset_hours) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "display.utc_offset_hours must be between -23 and 23, got {}",
                    self.display.utc_offset_hours
                ),
            });
        }

        if self.display.title.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "display.title is empty".to_string(),
            });
        }

        if self.store.path.as_os_str().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "store.path is empty".to_string(),
            });
        }

        match &self.publish {
            PublishConfig::Dir { path, .. } => {
                if path.as_os_str().is_empty() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: "publish.path is empty".to_string(),
                    });
                }
            }
            PublishConfig::S3 {
                bucket, endpoint, ..
            } => {
                if bucket.trim().is_empty() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: "publish.bucket is empty".to_string(),
                    });
                }
                if let Some(ep) = endpoint {
                    if !ep.starts_with("http://") && !ep.starts_with("https://") {
                        warnings.push(ConfigWarning {
                            level: WarnLevel::Error,
                            message: format!("publish.endpoint must be an http(s) URL: {ep}"),
                        });
                    }
                }
            }
        }

        warnings
    }
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_yaml_yields_defaults() {
        let cfg: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.store.path, PathBuf::from("progress.redb"));
        assert_eq!(cfg.publish, PublishConfig::default());
        assert_eq!(cfg.display.title, "Progress");
        assert!(!cfg.browser.open_after_publish);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn s3_publish_is_tagged() {
        let yaml = "publish:\n  type: s3\n  bucket: my-progress\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            cfg.publish,
            PublishConfig::S3 {
                bucket: "my-progress".to_string(),
                region: "us-east-1".to_string(),
                endpoint: None,
                public_base_url: None,
            }
        );
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ProgressError::Config(_)));
    }

    #[test]
    fn offset_out_of_range_is_error() {
        let mut cfg = Config::default();
        cfg.display.utc_offset_hours = 30;
        assert!(cfg
            .validate()
            .iter()
            .any(|w| w.level == WarnLevel::Error));
        assert!(cfg.display_options().is_err());
    }

    #[test]
    fn display_options_apply_offset() {
        let mut cfg = Config::default();
        cfg.display.utc_offset_hours = -3;
        let display = cfg.display_options().unwrap();
        assert_eq!(display.utc_offset.local_minus_utc(), -3 * 3600);
    }

    #[test]
    fn s3_requires_bucket_and_http_endpoint() {
        let cfg = Config {
            publish: PublishConfig::S3 {
                bucket: " ".to_string(),
                region: default_region(),
                endpoint: Some("minio.local:9000".to_string()),
                public_base_url: None,
            },
            ..Config::default()
        };
        let errors = cfg
            .validate()
            .into_iter()
            .filter(|w| w.level == WarnLevel::Error)
            .count();
        assert_eq!(errors, 2);
    }

    #[test]
    fn resolve_path_keeps_absolute() {
        let base = Path::new("/home/me/.progress");
        assert_eq!(
            resolve_path(base, Path::new("progress.redb")),
            PathBuf::from("/home/me/.progress/progress.redb")
        );
        assert_eq!(
            resolve_path(base, Path::new("/srv/site")),
            PathBuf::from("/srv/site")
        );
    }
}
