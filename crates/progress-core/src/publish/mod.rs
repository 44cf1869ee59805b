//! Publishing rendered pages to a content store.
//!
//! Keys follow the site layout in [`crate::paths`]: `index.html` for the
//! homepage and `{item_id}/index.html` for each item. Every object is written
//! with a `text/html` content type and simply overwritten on republish.

pub mod dir;
pub mod s3;

use std::path::Path;

use tracing::debug;

use crate::config::{resolve_path, PublishConfig};
use crate::error::Result;
use crate::paths::{self, HTML_CONTENT_TYPE};
use crate::types::ItemId;

pub use dir::DirContentStore;
pub use s3::{S3ContentStore, S3Credentials};

/// Object storage as seen by the publisher: flat keys with `/` separators.
pub trait ContentStore {
    /// Create or overwrite the object at `key`.
    fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<()>;

    /// Remove the object at `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// Every key starting with `prefix`, ascending.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Public URL that keys are served under.
    fn base_url(&self) -> &str;
}

/// Build the content store described by `cfg`.
///
/// Relative directory paths resolve against `base_dir` (the config directory).
pub fn open_content_store(cfg: &PublishConfig, base_dir: &Path) -> Result<Box<dyn ContentStore>> {
    match cfg {
        PublishConfig::Dir { path, base_url } => Ok(Box::new(DirContentStore::new(
            resolve_path(base_dir, path),
            base_url.clone(),
        )?)),
        PublishConfig::S3 {
            bucket,
            region,
            endpoint,
            public_base_url,
        } => Ok(Box::new(S3ContentStore::new(
            bucket,
            region,
            endpoint.as_deref(),
            public_base_url.clone(),
            S3Credentials::from_env()?,
        )?)),
    }
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

pub struct Publisher {
    store: Box<dyn ContentStore>,
}

impl Publisher {
    pub fn new(store: Box<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Publish a page previously rendered to `path`.
    pub fn publish_file(&self, key: &str, path: &Path) -> Result<()> {
        let body = std::fs::read(path)?;
        self.store.put(key, &body, HTML_CONTENT_TYPE)?;
        debug!(key, bytes = body.len(), "published staged page");
        Ok(())
    }

    /// Remove every object under `{item}/`. Returns the number removed.
    pub fn delete_prefix(&self, item: &ItemId) -> Result<usize> {
        let keys = self.store.list(&paths::item_prefix(item))?;
        for key in &keys {
            self.store.delete(key)?;
        }
        debug!(item = %item, removed = keys.len(), "deleted published objects");
        Ok(keys.len())
    }

    pub fn url_for(&self, key: &str) -> String {
        paths::url_for(self.store.base_url(), key)
    }

    pub fn base_url(&self) -> &str {
        self.store.base_url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BASE: &str = "https://progress.example.com";

    fn site(dir: &TempDir) -> DirContentStore {
        DirContentStore::new(dir.path().join("site"), Some(BASE.to_string())).unwrap()
    }

    fn publisher(dir: &TempDir) -> Publisher {
        Publisher::new(Box::new(site(dir)))
    }

    fn publish(p: &Publisher, dir: &TempDir, key: &str, html: &str) {
        let staged = dir.path().join("staged.html");
        std::fs::write(&staged, html).unwrap();
        p.publish_file(key, &staged).unwrap();
    }

    #[test]
    fn publish_file_overwrites_existing_key() {
        let dir = TempDir::new().unwrap();
        let p = publisher(&dir);
        publish(&p, &dir, "alpha/index.html", "one");
        publish(&p, &dir, "alpha/index.html", "<p>two</p>");
        let body = std::fs::read_to_string(dir.path().join("site/alpha/index.html")).unwrap();
        assert_eq!(body, "<p>two</p>");
    }

    #[test]
    fn delete_prefix_only_touches_that_item() {
        let dir = TempDir::new().unwrap();
        let p = publisher(&dir);
        publish(&p, &dir, "index.html", "home");
        publish(&p, &dir, "alpha/index.html", "a");
        publish(&p, &dir, "alpha/extra.html", "a2");
        publish(&p, &dir, "alpha-2/index.html", "b");

        let removed = p.delete_prefix(&ItemId::parse("alpha").unwrap()).unwrap();

        assert_eq!(removed, 2);
        let store = site(&dir);
        assert!(store.list("alpha/").unwrap().is_empty());
        assert_eq!(store.list("").unwrap(), vec!["alpha-2/index.html", "index.html"]);
    }

    #[test]
    fn url_for_uses_store_base_url() {
        let dir = TempDir::new().unwrap();
        let p = publisher(&dir);
        assert_eq!(p.url_for("alpha/index.html"), format!("{BASE}/alpha/index.html"));
        assert_eq!(p.base_url(), BASE);
    }
}
