// src/control/tail.rs

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Incremental reader of a growing log file.
///
/// Remembers the last-read byte offset and only reads newly appended bytes on
/// each poll, so tailing stays cheap as logs grow. Partial trailing lines are
/// carried between polls; a shrunken file (rotation/truncation) resets the
/// offset to the start.
#[derive(Debug)]
pub struct LogTailer {
    path: PathBuf,
    offset: u64,
    carry: Vec<u8>,
}

impl LogTailer {
    /// Tail from the beginning of the file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            carry: Vec::new(),
        }
    }

    /// Tail from the current end of the file, so only output appended after
    /// this point is reported. A missing file starts at offset zero.
    pub fn from_end(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let offset = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        Self {
            path,
            offset,
            carry: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all complete lines appended since the last call.
    ///
    /// A file that does not exist (yet, or anymore) yields no lines rather
    /// than an error, since log files appear and disappear independently of
    /// the tailer.
    pub async fn read_new_lines(&mut self) -> Result<Vec<String>> {
        let mut file = match tokio::fs::File::open(&self.path).await {
            Ok(f) => f,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("opening log file {:?}", self.path));
            }
        };

        let len = file
            .metadata()
            .await
            .with_context(|| format!("reading metadata of {:?}", self.path))?
            .len();

        if len < self.offset {
            // File was truncated or replaced; start over.
            self.offset = 0;
            self.carry.clear();
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(self.offset))
            .await
            .with_context(|| format!("seeking in {:?}", self.path))?;

        let mut buf = Vec::with_capacity((len - self.offset) as usize);
        let read = (&mut file)
            .take(len - self.offset)
            .read_to_end(&mut buf)
            .await
            .with_context(|| format!("reading from {:?}", self.path))?;
        self.offset += read as u64;

        self.carry.extend_from_slice(&buf[..read]);
        Ok(self.drain_complete_lines())
    }

    fn drain_complete_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();

        while let Some(pos) = self.carry.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.carry.drain(..=pos).collect();
            line.pop(); // the newline itself
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }

        lines
    }
}

/// Last `n` complete lines of a file; empty for a missing file.
pub fn tail_lines(path: &Path, n: usize) -> Result<Vec<String>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err).with_context(|| format!("reading log file {:?}", path)),
    };

    let lines: Vec<&str> = contents.lines().collect();
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].iter().map(|s| s.to_string()).collect())
}
