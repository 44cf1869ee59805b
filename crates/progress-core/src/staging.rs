use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;

/// Scratch directory holding the pages rendered during one action.
///
/// The directory is removed when the value is dropped, so an action that
/// fails halfway through rendering or uploading leaves nothing behind.
pub struct Staging {
    dir: TempDir,
}

impl Staging {
    pub fn new(parent: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("progress-stage-");
        let dir = match parent {
            Some(p) => {
                crate::io::ensure_dir(p)?;
                builder.tempdir_in(p)?
            }
            None => builder.tempdir()?,
        };
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `html` at the location `key` maps to inside the staging directory.
    pub fn write(&self, key: &str, html: &str) -> Result<PathBuf> {
        let path = key
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.dir.path().to_path_buf(), |acc, part| acc.join(part));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, html)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_mirrors_key_layout() {
        let staging = Staging::new(None).unwrap();
        let path = staging.write("alpha/index.html", "<p>a</p>").unwrap();
        assert!(path.starts_with(staging.path()));
        assert!(path.ends_with("alpha/index.html"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<p>a</p>");
    }

    #[test]
    fn drop_removes_directory() {
        let parent = TempDir::new().unwrap();
        let staged_dir = {
            let staging = Staging::new(Some(parent.path())).unwrap();
            staging.write("index.html", "home").unwrap();
            staging.path().to_path_buf()
        };
        assert!(!staged_dir.exists());
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
    }
}
