//! In-memory navigation history
//!
//! A stack of `(path, state)` entries with a cursor, feeding paths to
//! [`Router::resolve`](crate::Router::resolve):
//! - push truncates forward entries, replace overwrites the current one
//! - `back`, `forward` and `go` move the cursor and notify listeners
//! - state is stored as JSON, so a restored value is a fresh deserialized copy
//! - the stack is capped at a configurable size, dropping the oldest entries

use crate::{debug_log, error_log, trace_log};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Default maximum number of entries
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// History failures
#[derive(Debug, Error)]
pub enum HistoryError {
    /// State could not be converted to or from JSON
    #[error("history state: {0}")]
    State(#[from] serde_json::Error),
}

/// Direction of a history change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationDirection {
    /// A new entry, or a move towards newer entries
    Forward,
    /// A move towards older entries
    Back,
    /// The current entry was overwritten
    Replace,
}

/// One history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub path: String,
    /// Serialized state, if any was stored with the entry
    pub state: Option<Value>,
}

impl HistoryEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            state: None,
        }
    }

    /// Create with state serialized to JSON
    pub fn with_state<S: Serialize>(
        path: impl Into<String>,
        state: &S,
    ) -> Result<Self, HistoryError> {
        Ok(Self {
            path: path.into(),
            state: Some(serde_json::to_value(state)?),
        })
    }

    /// Deserialize the stored state
    pub fn state<S: DeserializeOwned>(&self) -> Result<Option<S>, HistoryError> {
        decode(self.state.as_ref())
    }
}

/// A history change, as returned to the caller and given to listeners
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationEvent {
    pub from: Option<String>,
    pub to: String,
    pub direction: NavigationDirection,
    /// State of the destination entry
    pub state: Option<Value>,
}

impl NavigationEvent {
    /// Deserialize the destination entry's state
    pub fn context<S: DeserializeOwned>(&self) -> Result<Option<S>, HistoryError> {
        decode(self.state.as_ref())
    }
}

fn decode<S: DeserializeOwned>(value: Option<&Value>) -> Result<Option<S>, HistoryError> {
    value
        .map(|value| S::deserialize(value).map_err(HistoryError::from))
        .transpose()
}

// ============================================================================
// Cancellation
// ============================================================================

/// Cancels the listeners registered with its signal
#[derive(Debug, Clone, Default)]
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Abort; further calls have no effect
    pub fn abort(&self) {
        self.signal.aborted.store(true, Ordering::Release);
    }
}

/// Read side of an [`AbortController`]
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    aborted: Arc<AtomicBool>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }
}

/// Options for [`History::listen`]
#[derive(Debug, Clone, Default)]
pub struct ListenOptions {
    /// Remove the listener after its first notification
    pub once: bool,
    /// Stop notifying once the signal is aborted
    pub signal: Option<AbortSignal>,
}

impl ListenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// Handle returned by [`History::listen`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Box<dyn FnMut(&NavigationEvent) + Send>;

struct Listener {
    id: ListenerId,
    callback: Callback,
    options: ListenOptions,
}

impl Listener {
    fn is_aborted(&self) -> bool {
        self.options
            .signal
            .as_ref()
            .is_some_and(AbortSignal::is_aborted)
    }
}

// ============================================================================
// History
// ============================================================================

/// Navigation history stack
///
/// # Example
///
/// ```
/// use tree_navigator::history::{History, ListenOptions};
/// use std::sync::{Arc, Mutex};
///
/// let mut history = History::new("/");
/// history.push("/users");
/// history.push_with_state("/users/42", &serde_json::json!({ "scroll": 120 })).unwrap();
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// history.listen(move |event| sink.lock().unwrap().push(event.to.clone()), ListenOptions::new());
///
/// history.back();
/// history.forward();
/// assert_eq!(*seen.lock().unwrap(), vec!["/users", "/users/42"]);
/// ```
pub struct History {
    entries: Vec<HistoryEntry>,
    current: usize,
    /// 0 = unlimited
    max_size: usize,
    listeners: Vec<Listener>,
    next_listener: u64,
}

impl History {
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self::with_max_size(initial_path, DEFAULT_MAX_SIZE)
    }

    /// Create with a custom size limit; 0 disables the limit
    pub fn with_max_size(initial_path: impl Into<String>, max_size: usize) -> Self {
        Self {
            entries: vec![HistoryEntry::new(initial_path)],
            current: 0,
            max_size,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn current_path(&self) -> &str {
        &self.entries[self.current].path
    }

    pub fn current_entry(&self) -> &HistoryEntry {
        &self.entries[self.current]
    }

    /// Deserialize the current entry's state
    pub fn current_state<S: DeserializeOwned>(&self) -> Result<Option<S>, HistoryError> {
        self.current_entry().state()
    }

    /// Push a path, dropping forward entries
    pub fn push(&mut self, path: impl Into<String>) -> NavigationEvent {
        self.push_entry(HistoryEntry::new(path))
    }

    /// Push a path with state
    ///
    /// Nothing changes when the state cannot be serialized.
    pub fn push_with_state<S: Serialize>(
        &mut self,
        path: impl Into<String>,
        state: &S,
    ) -> Result<NavigationEvent, HistoryError> {
        let entry = HistoryEntry::with_state(path, state).map_err(|err| {
            error_log!("Cannot store history state: {}", err);
            err
        })?;
        Ok(self.push_entry(entry))
    }

    /// Overwrite the current entry
    pub fn replace(&mut self, path: impl Into<String>) -> NavigationEvent {
        self.replace_entry(HistoryEntry::new(path))
    }

    pub fn replace_with_state<S: Serialize>(
        &mut self,
        path: impl Into<String>,
        state: &S,
    ) -> Result<NavigationEvent, HistoryError> {
        let entry = HistoryEntry::with_state(path, state).map_err(|err| {
            error_log!("Cannot store history state: {}", err);
            err
        })?;
        Ok(self.replace_entry(entry))
    }

    /// Step back one entry
    pub fn back(&mut self) -> Option<NavigationEvent> {
        self.go(-1)
    }

    /// Step forward one entry
    pub fn forward(&mut self) -> Option<NavigationEvent> {
        self.go(1)
    }

    /// Move the cursor by `delta` entries and notify listeners
    ///
    /// Returns `None` without notifying when `delta` is 0 or the target is
    /// out of range.
    pub fn go(&mut self, delta: isize) -> Option<NavigationEvent> {
        let target = self
            .current
            .checked_add_signed(delta)
            .filter(|&target| delta != 0 && target < self.entries.len())?;

        let from = Some(self.current_path().to_string());
        self.current = target;
        let entry = self.current_entry();
        let event = NavigationEvent {
            from,
            to: entry.path.clone(),
            direction: if delta < 0 {
                NavigationDirection::Back
            } else {
                NavigationDirection::Forward
            },
            state: entry.state.clone(),
        };

        debug_log!("History {:?} to '{}'", event.direction, event.to);
        self.notify(&event);
        Some(event)
    }

    pub fn can_go_back(&self) -> bool {
        self.current > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.current + 1 < self.entries.len()
    }

    /// Drop every entry and start over; listeners are kept
    pub fn clear(&mut self, initial_path: impl Into<String>) {
        self.entries.clear();
        self.entries.push(HistoryEntry::new(initial_path));
        self.current = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; history holds at least the initial entry
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Restore saved entries; ignored when `current` is out of range
    pub fn restore(&mut self, entries: Vec<HistoryEntry>, current: usize) -> bool {
        if current >= entries.len() {
            return false;
        }
        self.entries = entries;
        self.current = current;
        self.enforce_size_limit();
        true
    }

    /// Register a listener for `back`, `forward` and `go`
    pub fn listen<F>(&mut self, callback: F, options: ListenOptions) -> ListenerId
    where
        F: FnMut(&NavigationEvent) + Send + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(Listener {
            id,
            callback: Box::new(callback),
            options,
        });
        id
    }

    /// Remove a listener; false if it was already gone
    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        self.listeners.len() != before
    }

    /// Listeners that would be notified by the next traversal
    pub fn listener_count(&self) -> usize {
        self.listeners
            .iter()
            .filter(|listener| !listener.is_aborted())
            .count()
    }

    fn push_entry(&mut self, entry: HistoryEntry) -> NavigationEvent {
        let from = Some(self.current_path().to_string());

        self.entries.truncate(self.current + 1);
        let event = NavigationEvent {
            from,
            to: entry.path.clone(),
            direction: NavigationDirection::Forward,
            state: entry.state.clone(),
        };
        self.entries.push(entry);
        self.current += 1;
        self.enforce_size_limit();

        trace_log!("History push '{}' ({} entries)", event.to, self.entries.len());
        event
    }

    fn replace_entry(&mut self, entry: HistoryEntry) -> NavigationEvent {
        let from = Some(self.current_path().to_string());
        let event = NavigationEvent {
            from,
            to: entry.path.clone(),
            direction: NavigationDirection::Replace,
            state: entry.state.clone(),
        };
        self.entries[self.current] = entry;

        trace_log!("History replace '{}'", event.to);
        event
    }

    fn notify(&mut self, event: &NavigationEvent) {
        self.listeners.retain(|listener| !listener.is_aborted());
        for listener in &mut self.listeners {
            (listener.callback)(event);
        }
        self.listeners.retain(|listener| !listener.options.once);
    }

    fn enforce_size_limit(&mut self) {
        if self.max_size > 0 && self.entries.len() > self.max_size {
            let excess = self.entries.len() - self.max_size;
            self.entries.drain(0..excess);
            self.current = self.current.saturating_sub(excess);
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new("/")
    }
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("entries", &self.entries)
            .field("current", &self.current)
            .field("max_size", &self.max_size)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Scroll {
        y: u32,
    }

    fn recorder(history: &mut History, options: ListenOptions) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        history.listen(
            move |event| sink.lock().unwrap().push(event.to.clone()),
            options,
        );
        seen
    }

    #[test]
    fn test_history_creation() {
        let history = History::default();
        assert_eq!(history.current_path(), "/");
        assert_eq!(history.len(), 1);
        assert!(!history.can_go_back());
        assert!(!history.can_go_forward());
    }

    #[test]
    fn test_history_truncation_on_push() {
        let mut history = History::new("/");
        history.push("/page1");
        history.push("/page2");
        history.back();

        let event = history.push("/page3");
        assert_eq!(event.from.as_deref(), Some("/page1"));
        assert_eq!(event.direction, NavigationDirection::Forward);

        let paths: Vec<&str> = history.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/", "/page1", "/page3"]);
        assert!(!history.can_go_forward());
    }

    #[test]
    fn test_history_replace() {
        let mut history = History::new("/");
        history.push("/page1");

        let event = history.replace("/page2");
        assert_eq!(event.direction, NavigationDirection::Replace);
        assert_eq!(history.current_path(), "/page2");
        assert_eq!(history.len(), 2);

        history.back();
        assert_eq!(history.current_path(), "/");
    }

    #[test]
    fn test_go() {
        let mut history = History::new("/");
        history.push("/a");
        history.push("/b");
        history.push("/c");

        let event = history.go(-3).unwrap();
        assert_eq!(event.to, "/");
        assert_eq!(event.from.as_deref(), Some("/c"));
        assert_eq!(event.direction, NavigationDirection::Back);

        assert!(history.go(-1).is_none());
        assert!(history.go(4).is_none());
        assert!(history.go(0).is_none());
        assert_eq!(history.current_path(), "/");

        assert_eq!(history.go(2).unwrap().to, "/b");
    }

    #[test]
    fn test_state_round_trip_is_a_copy() {
        let mut history = History::new("/");
        let state = Scroll { y: 100 };
        history.push_with_state("/page1", &state).unwrap();
        history.push("/page2");

        let event = history.back().unwrap();
        assert_eq!(event.context::<Scroll>().unwrap(), Some(Scroll { y: 100 }));
        assert_eq!(history.current_state::<Scroll>().unwrap(), Some(state));

        assert!(history.current_state::<String>().is_err());

        history.forward();
        assert_eq!(history.current_state::<Scroll>().unwrap(), None);
    }

    #[test]
    fn test_unserializable_state_leaves_history_untouched() {
        let mut history = History::new("/");
        let mut state = std::collections::HashMap::new();
        state.insert(vec![1u8], "non-string key");

        assert!(matches!(
            history.push_with_state("/page1", &state),
            Err(HistoryError::State(_))
        ));
        assert_eq!(history.len(), 1);
        assert_eq!(history.current_path(), "/");
    }

    #[test]
    fn test_history_max_size() {
        let mut history = History::with_max_size("/", 3);
        history.push("/page1");
        history.push("/page2");
        history.push("/page3");
        history.push("/page4");

        assert_eq!(history.len(), 3);
        assert_eq!(history.current_path(), "/page4");

        history.back();
        history.back();
        assert_eq!(history.current_path(), "/page2");
        assert!(!history.can_go_back());
    }

    #[test]
    fn test_history_restore() {
        let mut history = History::new("/");
        let entries = vec![
            HistoryEntry::new("/"),
            HistoryEntry::new("/page1"),
            HistoryEntry::new("/page2"),
        ];

        assert!(!history.restore(entries.clone(), 3));
        assert_eq!(history.len(), 1);

        assert!(history.restore(entries, 1));
        assert_eq!(history.current_path(), "/page1");
        assert!(history.can_go_back());
        assert!(history.can_go_forward());
    }

    #[test]
    fn test_listeners_only_see_traversal() {
        let mut history = History::new("/");
        let seen = recorder(&mut history, ListenOptions::new());

        history.push("/a");
        history.replace("/b");
        assert!(seen.lock().unwrap().is_empty());

        history.back();
        history.forward();
        assert_eq!(*seen.lock().unwrap(), vec!["/", "/b"]);
    }

    #[test]
    fn test_once_listener() {
        let mut history = History::new("/");
        history.push("/a");
        history.push("/b");
        let seen = recorder(&mut history, ListenOptions::new().once());

        history.back();
        history.back();
        assert_eq!(*seen.lock().unwrap(), vec!["/a"]);
        assert_eq!(history.listener_count(), 0);
    }

    #[test]
    fn test_aborted_listener() {
        let mut history = History::new("/");
        history.push("/a");
        let controller = AbortController::new();
        let seen = recorder(&mut history, ListenOptions::new().signal(controller.signal()));
        assert_eq!(history.listener_count(), 1);

        history.back();
        controller.abort();
        assert_eq!(history.listener_count(), 0);
        history.forward();

        assert_eq!(*seen.lock().unwrap(), vec!["/"]);
    }

    #[test]
    fn test_unlisten() {
        let mut history = History::new("/");
        history.push("/a");
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let id = history.listen(move |_| *sink.lock().unwrap() += 1, ListenOptions::default());

        assert!(history.unlisten(id));
        assert!(!history.unlisten(id));
        history.back();
        assert_eq!(*seen.lock().unwrap(), 0);
    }
}
