//! Restart marker
//!
//! A zero-byte file whose existence means "the server was stopped on purpose,
//! start it again". The watcher creates it right before killing the server;
//! the worker removes it right before starting the server.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartMarker {
    path: PathBuf,
}

impl RestartMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the marker. Requesting twice is the same as requesting once.
    pub fn request(&self) -> io::Result<()> {
        OpenOptions::new().create(true).write(true).truncate(true).open(&self.path)?;
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.path.exists()
    }

    /// Remove the marker; returns whether it was present
    pub fn consume(&self) -> io::Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
