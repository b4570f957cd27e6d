//! Atomic persistence of rendered configuration files
//!
//! Content is written to a temporary sibling and renamed into place, so the
//! server and the supervisor never observe a half-written file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

/// Writes rendered text to disk, skipping identical content unless forced
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigWriter;

impl ConfigWriter {
    pub fn new() -> Self {
        Self
    }

    /// Persist `content` at `target`.
    ///
    /// Returns `true` when the file was written, `false` when it already held
    /// the same content and `force` was not set.
    pub fn write(&self, content: &str, target: &Path, force: bool) -> io::Result<bool> {
        if !force {
            if let Ok(existing) = fs::read_to_string(target) {
                if existing == content {
                    debug!("{} is up to date", target.display());
                    return Ok(false);
                }
            }
        }

        write_atomic(target, content)?;
        debug!("Wrote {}", target.display());
        Ok(true)
    }
}

/// Write `content` to a temporary sibling of `target` and rename it into place
pub fn write_atomic(target: &Path, content: &str) -> io::Result<()> {
    let temp = temp_path(target);

    if let Err(e) = fs::write(&temp, content).and_then(|_| fs::rename(&temp, target)) {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }

    Ok(())
}

fn temp_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}
