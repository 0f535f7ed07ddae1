use std::io;

use async_trait::async_trait;
use tokio::io::AsyncBufRead;

/// Line-oriented reader over the log being exported.
pub type LogReader = Box<dyn AsyncBufRead + Send + Unpin>;

/// Where export jobs read log lines from.
///
/// Each job opens its own reader, so concurrent exports never share a cursor.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn open(&self) -> io::Result<LogReader>;

    /// Human-readable origin used in logs.
    fn describe(&self) -> String;
}
