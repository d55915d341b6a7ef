//! Bounded FIFO message queue shared by the task lanes.
//!
//! Mirrors the teacher's `TaskQueue` (a `Mutex`-guarded `VecDeque`) but adds
//! a fixed capacity with silent drop-on-overflow, since lane queues must
//! never grow unbounded while a transfer is in progress.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

/// A single queued command: a command string plus the priority/duration pair
/// consumed by the UI banner, not by the data lanes themselves.
#[derive(Debug, Clone)]
pub struct Command {
    /// The raw command text, e.g. `"/tmp/wallpaper.png|cb_menu_wallpaper"`.
    pub text: String,
    /// Banner priority. Not interpreted by any lane.
    pub priority: i32,
    /// Banner display duration. Not interpreted by any lane.
    pub duration: Duration,
}

/// A bounded, thread-safe FIFO of [`Command`]s.
///
/// Overflow is silent: `push` past capacity drops the new command and bumps
/// [`MessageQueue::dropped_count`], leaving existing queue contents and lane
/// state untouched (invariant 5 / testable property 3).
#[derive(Debug)]
pub struct MessageQueue {
    inner: Mutex<VecDeque<Command>>,
    capacity: usize,
    dropped: AtomicU64,
}

impl MessageQueue {
    /// Create an empty queue with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Push a command. Returns `true` if it was enqueued, `false` if dropped
    /// because the queue was already at capacity.
    pub fn push(&self, text: impl Into<String>, priority: i32, duration: Duration) -> bool {
        let mut guard = self.inner.lock();
        if guard.len() >= self.capacity {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        guard.push_back(Command {
            text: text.into(),
            priority,
            duration,
        });
        true
    }

    /// Pop the oldest command's text, or `None` if the queue is empty.
    ///
    /// Non-blocking: a lane calls this once per tick and moves on if there is
    /// nothing ready.
    pub fn pull(&self) -> Option<String> {
        self.inner.lock().pop_front().map(|cmd| cmd.text)
    }

    /// Drop all pending commands without processing them.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Number of commands currently queued.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the queue currently holds no commands.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of commands ever dropped due to overflow.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Split a command of the form `"primary|tag"` into its primary argument and
/// optional completion tag.
pub fn split_tag(command: &str) -> (&str, Option<&str>) {
    match command.split_once('|') {
        Some((primary, tag)) if !tag.is_empty() => (primary, Some(tag)),
        Some((primary, _)) => (primary, None),
        None => (command, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pull_round_trip() {
        let q = MessageQueue::new(8);
        assert!(q.push("a", 0, Duration::ZERO));
        assert!(q.push("b", 0, Duration::ZERO));
        assert_eq!(q.pull().as_deref(), Some("a"));
        assert_eq!(q.pull().as_deref(), Some("b"));
        assert_eq!(q.pull(), None);
    }

    #[test]
    fn overflow_is_silent_and_state_is_unchanged() {
        let q = MessageQueue::new(2);
        assert!(q.push("a", 0, Duration::ZERO));
        assert!(q.push("b", 0, Duration::ZERO));
        assert!(!q.push("c", 0, Duration::ZERO));
        assert_eq!(q.len(), 2);
        assert_eq!(q.dropped_count(), 1);
        assert_eq!(q.pull().as_deref(), Some("a"));
        assert_eq!(q.pull().as_deref(), Some("b"));
        assert_eq!(q.pull(), None);
    }

    #[test]
    fn clear_drops_everything() {
        let q = MessageQueue::new(8);
        q.push("a", 0, Duration::ZERO);
        q.push("b", 0, Duration::ZERO);
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.pull(), None);
    }

    #[test]
    fn split_tag_recognizes_completion_tag() {
        assert_eq!(split_tag("/tmp/x.png"), ("/tmp/x.png", None));
        assert_eq!(
            split_tag("/tmp/x.png|cb_menu_wallpaper"),
            ("/tmp/x.png", Some("cb_menu_wallpaper"))
        );
        assert_eq!(split_tag("http://h/list|"), ("http://h/list", None));
    }
}
