//! Line-oriented file loaders for wordlists, seed lists, and scope files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Errors that can occur while loading a line-delimited file.
#[derive(Debug, Error)]
pub enum WordlistError {
    /// The file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed to load.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Loads a newline-delimited file, skipping blank lines.
///
/// Entries are returned verbatim apart from trailing-whitespace trimming; a
/// wordlist entry is opaque to the engine.
///
/// # Errors
///
/// Returns [`WordlistError::Io`] if the file cannot be opened or a line
/// cannot be read.
pub fn load_lines(path: &Path) -> Result<Vec<String>, WordlistError> {
    let file = File::open(path).map_err(|source| WordlistError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| WordlistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            continue;
        }
        lines.push(trimmed.to_string());
    }

    debug!(path = %path.display(), entries = lines.len(), "loaded line file");
    Ok(lines)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_lines_skips_blank_lines() {
        let file = write_temp("admin\n\nbackup\n   \nlogin\n");
        let lines = load_lines(file.path()).unwrap();
        assert_eq!(lines, vec!["admin", "backup", "login"]);
    }

    #[test]
    fn test_load_lines_preserves_leading_whitespace_and_symbols() {
        let file = write_temp(".git/HEAD\n%20odd\n  indented\n");
        let lines = load_lines(file.path()).unwrap();
        assert_eq!(lines, vec![".git/HEAD", "%20odd", "  indented"]);
    }

    #[test]
    fn test_load_lines_missing_file_returns_io_error() {
        let result = load_lines(Path::new("/nonexistent/wordlist.txt"));
        assert!(matches!(result, Err(WordlistError::Io { .. })));
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("/nonexistent/wordlist.txt"), "got: {msg}");
    }

    #[test]
    fn test_load_lines_empty_file_returns_empty_vec() {
        let file = write_temp("");
        let lines = load_lines(file.path()).unwrap();
        assert!(lines.is_empty());
    }
}
