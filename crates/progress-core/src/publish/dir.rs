use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::io::{atomic_write, ensure_dir, prune_empty_dirs};

use super::ContentStore;

/// A content store backed by a local directory, e.g. the document root of a
/// static web server.
pub struct DirContentStore {
    root: PathBuf,
    base_url: String,
}

impl DirContentStore {
    /// Create the directory if needed. Without an explicit `base_url`, pages
    /// are addressed with `file://` URLs so they open straight from disk.
    pub fn new(root: PathBuf, base_url: Option<String>) -> Result<Self> {
        ensure_dir(&root)?;
        let root = root.canonicalize()?;
        let base_url = base_url.unwrap_or_else(|| format!("file://{}", root.display()));
        Ok(Self { root, base_url })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

fn collect_keys(dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let key = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        if entry.file_type()?.is_dir() {
            collect_keys(&entry.path(), &key, out)?;
        } else {
            out.push(key);
        }
    }
    Ok(())
}

impl ContentStore for DirContentStore {
    fn put(&self, key: &str, body: &[u8], _content_type: &str) -> Result<()> {
        atomic_write(&self.path_for(key), body)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        if let Some(parent) = path.parent() {
            prune_empty_dirs(&self.root, parent)?;
        }
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        collect_keys(&self.root, "", &mut keys)?;
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
