// # Event Sink
//
// Every resolver attempt, update attempt and scheduler transition is
// reported as a timestamped log line. This is the only observability
// channel the engine guarantees; `tracing` output is diagnostic extra.
//
// ## Implementations
//
// - `ChannelSink`: bounded Tokio channel, consumed live by a UI or daemon
// - `MemorySink`: append-only in-memory log (UI log panes, tests)
//
// ## Format
//
// ```text
// [2025-10-16 14:03:07] Public IP found: 203.0.113.5
// ```

use chrono::{DateTime, Local, Timelike};
use std::fmt;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

/// One line of the event log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Local wall-clock time, truncated to the second
    pub timestamp: DateTime<Local>,
    /// Human-readable description of the step and its outcome
    pub message: String,
}

impl LogEntry {
    /// Create an entry stamped with the current time
    pub fn now(message: impl Into<String>) -> Self {
        let now = Local::now();
        Self {
            timestamp: now.with_nanosecond(0).unwrap_or(now),
            message: message.into(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.message
        )
    }
}

/// Receiver of event log lines
///
/// Implementations must not block: `emit` is called from the scheduler's
/// control path as well as from update workers. The scheduler never holds
/// its own lock while emitting, so `emit` may read the scheduler's state.
pub trait EventSink: Send + Sync {
    /// Append an entry to the log
    fn emit(&self, entry: LogEntry);

    /// Append a message stamped with the current time
    fn log(&self, message: String) {
        self.emit(LogEntry::now(message));
    }
}

/// Event sink backed by a bounded Tokio channel
///
/// When the channel is full the entry is dropped with a warning, so a slow
/// consumer can never stall an update.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<LogEntry>,
}

impl ChannelSink {
    /// Create a sink and the receiver that consumes it
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<LogEntry>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Create a sink whose entries are consumed as a stream
    pub fn with_stream(capacity: usize) -> (Self, ReceiverStream<LogEntry>) {
        let (sink, rx) = Self::new(capacity);
        (sink, ReceiverStream::new(rx))
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, entry: LogEntry) {
        match self.tx.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => {
                warn!(
                    "Event channel full, dropping log line: {}. Consider increasing the event channel capacity.",
                    entry.message
                );
            }
            Err(TrySendError::Closed(entry)) => {
                debug!("Event receiver dropped, discarding log line: {}", entry.message);
            }
        }
    }
}

/// Append-only in-memory event log
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries, oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Snapshot of all messages, oldest first
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|entry| entry.message.clone()).collect()
    }

    /// Number of entries in the log
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        // A panic while pushing cannot leave the Vec half-written
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSink for MemorySink {
    fn emit(&self, entry: LogEntry) {
        self.lock().push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio_stream::StreamExt;

    #[test]
    fn test_entry_display_format() {
        let entry = LogEntry {
            timestamp: Local.with_ymd_and_hms(2025, 10, 16, 14, 3, 7).unwrap(),
            message: "Public IP found: 203.0.113.5".to_string(),
        };

        assert_eq!(
            entry.to_string(),
            "[2025-10-16 14:03:07] Public IP found: 203.0.113.5"
        );
    }

    #[test]
    fn test_entry_timestamp_truncated_to_second() {
        let entry = LogEntry::now("tick");
        assert_eq!(entry.timestamp.nanosecond(), 0);
    }

    #[test]
    fn test_memory_sink_preserves_order() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        sink.log("first".to_string());
        sink.log("second".to_string());

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.messages(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_channel_sink_stream() {
        let (sink, mut stream) = ChannelSink::with_stream(8);

        sink.log("one".to_string());
        sink.log("two".to_string());
        drop(sink);

        let mut messages = Vec::new();
        while let Some(entry) = stream.next().await {
            messages.push(entry.message);
        }
        assert_eq!(messages, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_channel_sink_drops_when_full() {
        let (sink, mut rx) = ChannelSink::new(1);

        sink.log("kept".to_string());
        sink.log("dropped".to_string());

        assert_eq!(rx.recv().await.unwrap().message, "kept");
        assert!(rx.try_recv().is_err());
    }
}
