//! Incremental writer for confirmed-good URLs.
//!
//! Discovered URLs are appended to the output file as they arrive, one per
//! line, flushed per line so partial runs still leave usable output. Output
//! order is arrival order, not discovery order.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tracing::warn;

/// A confirmed-good discovery forwarded to the output sink.
#[derive(Debug, Clone)]
pub struct Confirmed {
    /// The discovered URL.
    pub url: String,
    /// Status code the probe returned.
    pub status: u16,
    /// Captured body length in bytes.
    pub body_len: usize,
}

/// Consumes confirmed discoveries and appends them to `path`.
///
/// With `clean` set, lines are bare URLs ready for piping into other tools;
/// otherwise each line carries the status code and body length.
///
/// Returns the number of lines written.
///
/// # Errors
///
/// Returns the underlying IO error if the file cannot be created or written.
pub async fn write_confirmed(
    path: &Path,
    clean: bool,
    mut rx: mpsc::Receiver<Confirmed>,
) -> Result<usize, std::io::Error> {
    let file = File::create(path).await?;
    let mut writer = BufWriter::new(file);
    let mut written = 0usize;

    while let Some(confirmed) = rx.recv().await {
        let line = if clean {
            format!("{}\n", confirmed.url)
        } else {
            format!(
                "{} {} [{}]\n",
                confirmed.status, confirmed.url, confirmed.body_len
            )
        };
        writer.write_all(line.as_bytes()).await?;
        // Flush per line: a killed run must not lose confirmed results.
        writer.flush().await?;
        written += 1;
    }

    if let Err(error) = writer.shutdown().await {
        warn!(%error, "failed to finalize output file");
    }
    Ok(written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn run_writer(clean: bool, items: Vec<Confirmed>) -> (String, usize) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("found.txt");
        let (tx, rx) = mpsc::channel(16);
        for item in items {
            tx.send(item).await.unwrap();
        }
        drop(tx);

        let written = write_confirmed(&path, clean, rx).await.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        (content, written)
    }

    #[tokio::test]
    async fn test_writer_annotated_lines() {
        let (content, written) = run_writer(
            false,
            vec![Confirmed {
                url: "http://example.com/admin".to_string(),
                status: 200,
                body_len: 13,
            }],
        )
        .await;
        assert_eq!(written, 1);
        assert_eq!(content, "200 http://example.com/admin [13]\n");
    }

    #[tokio::test]
    async fn test_writer_clean_lines() {
        let (content, written) = run_writer(
            true,
            vec![
                Confirmed {
                    url: "http://example.com/a".to_string(),
                    status: 200,
                    body_len: 1,
                },
                Confirmed {
                    url: "http://example.com/b".to_string(),
                    status: 301,
                    body_len: 0,
                },
            ],
        )
        .await;
        assert_eq!(written, 2);
        assert_eq!(content, "http://example.com/a\nhttp://example.com/b\n");
    }

    #[tokio::test]
    async fn test_writer_empty_run_creates_empty_file() {
        let (content, written) = run_writer(true, vec![]).await;
        assert_eq!(written, 0);
        assert!(content.is_empty());
    }
}
