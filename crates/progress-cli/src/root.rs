use progress_core::config::CONFIG_FILE;
use std::path::{Path, PathBuf};

/// Directory under `$HOME` used when no project config is found.
pub const HOME_DIR: &str = ".progress";
pub const HOME_CONFIG_FILE: &str = "config.yaml";

/// Where the configuration lives and what relative paths in it resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    /// Config file to load, or `None` to run on defaults.
    pub file: Option<PathBuf>,
    pub base_dir: PathBuf,
}

/// Resolve the configuration location.
///
/// Priority:
/// 1. `--config` flag / `PROGRESS_CONFIG` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `progress.yaml`
/// 3. `~/.progress/config.yaml`
/// 4. No file: defaults rooted at `~/.progress` (or `cwd` without a home dir)
pub fn resolve_config(explicit: Option<&Path>) -> ConfigLocation {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_from(explicit, &cwd, home::home_dir().as_deref())
}

fn resolve_from(explicit: Option<&Path>, cwd: &Path, home: Option<&Path>) -> ConfigLocation {
    if let Some(p) = explicit {
        let file = if p.is_absolute() {
            p.to_path_buf()
        } else {
            cwd.join(p)
        };
        let base_dir = file.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.to_path_buf());
        return ConfigLocation {
            file: Some(file),
            base_dir,
        };
    }

    // Walk upward looking for progress.yaml
    let mut dir = cwd.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return ConfigLocation {
                file: Some(candidate),
                base_dir: dir,
            };
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => break,
        }
    }

    let base_dir = home
        .map(|h| h.join(HOME_DIR))
        .unwrap_or_else(|| cwd.to_path_buf());
    let home_config = base_dir.join(HOME_CONFIG_FILE);
    ConfigLocation {
        file: home_config.is_file().then_some(home_config),
        base_dir,
    }
}
