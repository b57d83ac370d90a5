//! Transient status messages
//!
//! Surfaces show short-lived statuses ("Saved.", "Already in this region.")
//! that disappear after a delay. [`ScheduledClear`] is the delayed task and
//! its cancellation handle; [`StatusSlot`] holds the status a surface renders
//! and replaces or clears it.

use crate::i18n::{t, MessageKey};
use crate::types::Language;
use parking_lot::Mutex;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A status line by message key, rendered lazily in the current language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub key: MessageKey,
    pub params: Vec<(String, String)>,
}

impl StatusLine {
    pub fn new(key: MessageKey) -> Self {
        Self {
            key,
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.push((name.to_string(), value.into()));
        self
    }

    pub fn render(&self, language: Language) -> String {
        let params: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        t(language, self.key, &params)
    }
}

/// A delayed task that runs unless cancelled first
///
/// Dropping the handle cancels the task.
#[must_use = "dropping a ScheduledClear cancels it"]
pub struct ScheduledClear {
    cancel: Option<mpsc::Sender<()>>,
}

impl ScheduledClear {
    /// Run `task` on a worker thread after `delay`
    pub fn schedule<F>(delay: Duration, task: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<()>();
        let spawned = thread::Builder::new()
            .name("status-clear".to_string())
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(delay) {
                    task();
                }
            });
        if let Err(e) = spawned {
            tracing::warn!("failed to schedule status clear: {}", e);
        }
        Self { cancel: Some(tx) }
    }

    pub fn cancel(mut self) {
        self.send_cancel();
    }

    fn send_cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            // the worker may already have finished
            let _ = tx.send(());
        }
    }
}

impl Drop for ScheduledClear {
    fn drop(&mut self) {
        self.send_cancel();
    }
}

impl std::fmt::Debug for ScheduledClear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledClear").finish_non_exhaustive()
    }
}

#[derive(Default)]
struct SlotState {
    current: Option<StatusLine>,
    generation: u64,
    pending: Option<ScheduledClear>,
}

/// One status position on a surface
#[derive(Clone, Default)]
pub struct StatusSlot {
    state: Arc<Mutex<SlotState>>,
}

impl StatusSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<StatusLine> {
        self.state.lock().current.clone()
    }

    /// Show `line` until it is replaced or cleared
    pub fn set(&self, line: StatusLine) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.pending = None;
        state.current = Some(line);
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.pending = None;
        state.current = None;
    }

    /// Show `line` and clear it after `delay` unless something else is shown
    /// first
    pub fn flash(&self, line: StatusLine, delay: Duration) {
        self.flash_then(line, delay, || {});
    }

    /// Like [`flash`](Self::flash), running `on_clear` on the worker thread
    /// once the scheduled clear has removed `line`
    ///
    /// `on_clear` does not run when the line was replaced or cleared first.
    pub fn flash_then<F>(&self, line: StatusLine, delay: Duration, on_clear: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.state.lock();
        state.generation += 1;
        let generation = state.generation;
        state.current = Some(line);

        let slot = Arc::clone(&self.state);
        state.pending = Some(ScheduledClear::schedule(delay, move || {
            let cleared = {
                let mut state = slot.lock();
                // a clear that fired after a replacement must not wipe it
                let current = state.generation == generation;
                if current {
                    state.current = None;
                    state.pending = None;
                }
                current
            };
            if cleared {
                on_clear();
            }
        }));
    }

    /// Whether a scheduled clear is waiting
    pub fn has_pending_clear(&self) -> bool {
        self.state.lock().pending.is_some()
    }
}

impl std::fmt::Debug for StatusSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusSlot")
            .field("current", &self.current())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    const SHORT: Duration = Duration::from_millis(20);
    const SETTLE: Duration = Duration::from_millis(300);

    #[test]
    fn test_scheduled_clear_runs_after_delay() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let _task = ScheduledClear::schedule(SHORT, move || flag.store(true, Ordering::SeqCst));
        thread::sleep(SETTLE);
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_cancelled_clear_never_runs() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let task = ScheduledClear::schedule(Duration::from_millis(100), move || {
            flag.store(true, Ordering::SeqCst)
        });
        task.cancel();
        thread::sleep(SETTLE);
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_flash_clears_itself() {
        let slot = StatusSlot::new();
        slot.flash(StatusLine::new(MessageKey::StatusSaveSuccess), SHORT);
        assert_eq!(slot.current().map(|l| l.key), Some(MessageKey::StatusSaveSuccess));
        thread::sleep(SETTLE);
        assert_eq!(slot.current(), None);
        assert!(!slot.has_pending_clear());
    }

    #[test]
    fn test_set_after_flash_is_not_cleared() {
        let slot = StatusSlot::new();
        slot.flash(StatusLine::new(MessageKey::StatusSaveSuccess), SHORT);
        slot.set(StatusLine::new(MessageKey::StatusSaveFailed));
        thread::sleep(SETTLE);
        assert_eq!(slot.current().map(|l| l.key), Some(MessageKey::StatusSaveFailed));
    }

    #[test]
    fn test_flash_then_runs_hook_after_clear() {
        let slot = StatusSlot::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observed = slot.clone();
        slot.flash_then(StatusLine::new(MessageKey::StatusSaveSuccess), SHORT, move || {
            sink.lock().push(observed.current());
        });
        thread::sleep(SETTLE);
        assert_eq!(*seen.lock(), vec![None]);
    }

    #[test]
    fn test_flash_then_skips_hook_when_replaced() {
        let slot = StatusSlot::new();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        slot.flash_then(StatusLine::new(MessageKey::StatusSaveSuccess), SHORT, move || {
            flag.store(true, Ordering::SeqCst)
        });
        slot.set(StatusLine::new(MessageKey::StatusSaveFailed));
        thread::sleep(SETTLE);
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_render_substitutes_params() {
        let line = StatusLine::new(MessageKey::StatusSwitching).with_param("region", "Japan (JP)");
        assert_eq!(line.render(Language::En), "Switching to Japan (JP)…");
    }
}
