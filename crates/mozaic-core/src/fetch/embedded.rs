//! Line-reader strategy for embedded interpreter hosts.
//!
//! Reads the file line by line, drops a byte order mark at the start of the
//! first line, and rejoins the lines with the platform separator. A line ends
//! at `\n`, `\r\n` or a lone `\r`; no trailing separator is kept. Malformed
//! UTF-8 is replaced, as the filesystem strategy does.

use super::filesystem::FilesystemFetcher;
use super::FetchError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

const BOM: char = '\u{feff}';

#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

#[derive(Debug, Clone, Default)]
pub struct EmbeddedFetcher {
    root: Option<PathBuf>,
}

impl EmbeddedFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let file = FilesystemFetcher::locate(self.root.as_deref(), path);
        let io_err = |source| FetchError::Io {
            path: file.clone(),
            source,
        };

        let mut reader = BufReader::new(File::open(&file).map_err(io_err)?);
        let mut content = String::new();
        let mut chunk = Vec::new();
        let mut first = true;

        loop {
            chunk.clear();
            if reader.read_until(b'\n', &mut chunk).map_err(io_err)? == 0 {
                break;
            }
            for raw in split_lines(&chunk) {
                let line = String::from_utf8_lossy(raw);
                if first {
                    content.push_str(line.strip_prefix(BOM).unwrap_or(&line));
                    first = false;
                } else {
                    content.push_str(LINE_SEPARATOR);
                    content.push_str(&line);
                }
            }
        }

        Ok(content)
    }
}

/// Split one `\n`-terminated chunk into lines, also ending lines at `\r`.
///
/// `\r` is ASCII, so splitting before decoding never cuts a UTF-8 sequence.
fn split_lines(chunk: &[u8]) -> Vec<&[u8]> {
    let body = chunk.strip_suffix(b"\n").unwrap_or(chunk);
    let mut lines: Vec<&[u8]> = body.split(|&b| b == b'\r').collect();
    // A terminating `\r` (from `\r\n` or at end of file) leaves an empty tail
    if body.ends_with(b"\r") {
        lines.pop();
    }
    lines
}
