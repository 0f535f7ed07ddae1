//! File-backed log source.

use std::{io, path::PathBuf};

use async_trait::async_trait;
use tokio::{fs::File, io::BufReader};

use crate::application::jobs::{LogReader, LogSource};

/// Reads the application log from a file on disk.
#[derive(Debug, Clone)]
pub struct FileLogSource {
    path: PathBuf,
}

impl FileLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LogSource for FileLogSource {
    async fn open(&self) -> io::Result<LogReader> {
        let file = File::open(&self.path).await?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncBufReadExt;

    use super::*;

    #[tokio::test]
    async fn reads_lines_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("application.log");
        std::fs::write(&path, "first\nsecond\n").expect("write");

        let source = FileLogSource::new(&path);
        let mut lines = source.open().await.expect("open").lines();
        assert_eq!(lines.next_line().await.expect("line"), Some("first".into()));
        assert_eq!(lines.next_line().await.expect("line"), Some("second".into()));
        assert_eq!(lines.next_line().await.expect("line"), None);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = FileLogSource::new(dir.path().join("absent.log"));
        let err = source.open().await.err().expect("missing");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
