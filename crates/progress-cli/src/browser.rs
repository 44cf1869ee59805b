//! Best-effort "open this URL in a browser".
//!
//! Strategies, in order:
//! 1. each command listed in `$BROWSER` (colon separated, `%s` is replaced by
//!    the URL, otherwise the URL is appended), if found on `PATH`
//! 2. the platform opener (`xdg-open`, `open`, `start`, ...) via the `open` crate
//!
//! Failures are logged at debug level and reported as `false`; callers fall
//! back to printing the URL.

use std::process::{Command, Stdio};
use tracing::debug;

pub fn open_url(url: &str) -> bool {
    if let Ok(browsers) = std::env::var("BROWSER") {
        for entry in browsers.split(':') {
            if try_command(entry, url) {
                return true;
            }
        }
    }
    match open::that(url) {
        Ok(()) => true,
        Err(e) => {
            debug!(url, error = %e, "platform opener failed");
            false
        }
    }
}

/// Split one `$BROWSER` entry into program and arguments for `url`.
fn browser_command(entry: &str, url: &str) -> Option<(String, Vec<String>)> {
    let mut parts = entry.split_whitespace();
    let program = parts.next()?.to_string();
    let mut args: Vec<String> = parts.map(|a| a.replace("%s", url)).collect();
    if !entry.contains("%s") {
        args.push(url.to_string());
    }
    Some((program, args))
}

fn try_command(entry: &str, url: &str) -> bool {
    let Some((program, args)) = browser_command(entry, url) else {
        return false;
    };
    let path = match which::which(&program) {
        Ok(p) => p,
        Err(e) => {
            debug!(program, error = %e, "browser from $BROWSER not found");
            return false;
        }
    };
    match Command::new(path)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(mut child) => {
            // Terminal browsers run until the user quits them; reap off-thread.
            std::thread::spawn(move || {
                if let Err(e) = child.wait() {
                    debug!(error = %e, "waiting on browser process failed");
                }
            });
            true
        }
        Err(e) => {
            debug!(program, error = %e, "failed to launch browser");
            false
        }
    }
}
