//! Log file tailing
//!
//! `Tail` follows one file by byte offset and returns complete lines appended
//! since the previous call. A file that shrinks or is replaced (different
//! inode) is read again from the top. `MultiTail` labels several tails so the
//! server's access and error logs can be printed side by side.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

/// Follows a single file
#[derive(Debug)]
pub struct Tail {
    path: PathBuf,
    offset: u64,
    inode: Option<u64>,
    partial: Vec<u8>,
}

impl Tail {
    /// Start following `path` from its current end.
    ///
    /// The file does not have to exist yet; it is read from the top once it appears.
    pub fn attach(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (offset, inode) = match std::fs::metadata(&path) {
            Ok(metadata) => (metadata.len(), Some(metadata.ino())),
            Err(_) => (0, None),
        };

        Self {
            path,
            offset,
            inode,
            partial: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines appended since the last call. A trailing line without a newline
    /// is held back until it is completed.
    pub fn consume(&mut self) -> io::Result<Vec<String>> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let metadata = file.metadata()?;
        let replaced = self.inode.is_some_and(|inode| inode != metadata.ino());
        if replaced || metadata.len() < self.offset {
            self.offset = 0;
            self.partial.clear();
        }
        self.inode = Some(metadata.ino());

        if metadata.len() == self.offset {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(self.offset))?;
        let read = file.read_to_end(&mut self.partial)?;
        self.offset += read as u64;

        // Decode complete lines only; a character may be split across reads
        let mut lines: Vec<String> = Vec::new();
        while let Some(end) = self.partial.iter().position(|&byte| byte == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=end).collect();
            let line = String::from_utf8_lossy(&line);
            lines.push(line.trim_end_matches(['\n', '\r']).to_string());
        }

        Ok(lines)
    }
}

/// Several labeled tails, consumed together
#[derive(Debug, Default)]
pub struct MultiTail {
    tails: Vec<(String, Tail)>,
}

impl MultiTail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: impl Into<String>, tail: Tail) {
        self.tails.push((label.into(), tail));
    }

    /// New lines of every tail, in registration order, paired with their label
    pub fn consume(&mut self) -> Vec<(String, String)> {
        let mut lines = Vec::new();
        for (label, tail) in &mut self.tails {
            match tail.consume() {
                Ok(new_lines) => lines.extend(new_lines.into_iter().map(|line| (label.clone(), line))),
                Err(e) => log::debug!("Failed to read {}: {}", tail.path().display(), e),
            }
        }
        lines
    }

    /// Print new lines to stdout, prefixed with their label
    pub fn print_new(&mut self) {
        for (label, line) in self.consume() {
            println!("[{}] {}", label, line);
        }
    }
}
