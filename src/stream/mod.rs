//! Per-session buffer for streamed model output.
//!
//! The reasoning engine pushes partial text into a [`StreamingSink`] while it
//! generates. Whoever needs the text (the tool execution contract before a
//! tool runs, the turn after the loop finishes) calls [`StreamingSink::take`],
//! which hands over everything accumulated so far and leaves the buffer empty.
//! Each pushed fragment is therefore delivered exactly once.

use tokio::sync::Mutex;

/// Single-slot accumulator with an atomic drain.
#[derive(Debug, Default)]
pub struct StreamingSink {
    pending: Mutex<String>,
}

impl StreamingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment of generated text.
    pub async fn push(&self, fragment: &str) {
        if fragment.is_empty() {
            return;
        }
        self.pending.lock().await.push_str(fragment);
    }

    /// Take the accumulated text, leaving the sink empty.
    ///
    /// Returns an empty string when nothing is pending.
    pub async fn take(&self) -> String {
        std::mem::take(&mut *self.pending.lock().await)
    }

    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn take_drains_once() {
        let sink = StreamingSink::new();
        sink.push("Hello, ").await;
        sink.push("world").await;

        assert_eq!(sink.take().await, "Hello, world");
        assert_eq!(sink.take().await, "");
        assert!(sink.is_empty().await);
    }

    #[tokio::test]
    async fn take_on_empty_sink_is_not_an_error() {
        let sink = StreamingSink::new();
        assert_eq!(sink.take().await, "");
    }

    #[tokio::test]
    async fn concurrent_takes_never_duplicate_output() {
        let sink = Arc::new(StreamingSink::new());
        for i in 0..50 {
            sink.push(&format!("{i};")).await;
        }

        let a = tokio::spawn({
            let sink = Arc::clone(&sink);
            async move { sink.take().await }
        });
        let b = tokio::spawn({
            let sink = Arc::clone(&sink);
            async move { sink.take().await }
        });
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        let delivered = format!("{a}{b}");
        assert_eq!(delivered.matches(';').count(), 50);
        assert!(a.is_empty() || b.is_empty());
    }
}
