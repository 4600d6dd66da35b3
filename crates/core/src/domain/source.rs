use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies the execution context that triggered an operation.
///
/// One source is captured per externally-triggered operation and attached
/// to every event that operation causes, whichever thread ends up firing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSource {
    context_id: u64,
    thread_id: ThreadId,
    thread_name: Option<String>,
}

impl EventSource {
    /// Capture a new source on the current thread.
    pub fn capture() -> Self {
        let current = thread::current();
        Self {
            context_id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            thread_id: current.id(),
            thread_name: current.name().map(str::to_string),
        }
    }

    pub fn context_id(&self) -> u64 {
        self.context_id
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    pub fn thread_name(&self) -> Option<&str> {
        self.thread_name.as_deref()
    }

    /// True when the caller is running on the thread that captured this source.
    pub fn is_current_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.thread_name {
            Some(name) => write!(f, "context {} ({})", self.context_id, name),
            None => write!(f, "context {} ({:?})", self.context_id, self.thread_id),
        }
    }
}
