//! Per-context preference synchronization
//!
//! A [`SyncBroker`] is the context-local view of the preference record. It
//! hydrates from the [`PreferenceStore`] on activation and afterwards only
//! changes in response to store notifications or to its own writes.
//!
//! Fields follow one of two editing models:
//!
//! - **Auto-commit** (`favorites`, `language`): every edit is written right
//!   away through a coalescing writer. Only one write is in flight at a time;
//!   edits arriving meanwhile are merged into a single queued patch, so a
//!   later value for a field supersedes an earlier queued one.
//! - **Explicit-commit** (`overlayEnabled`, `windowMode`): edits collect in a
//!   draft until [`SyncBroker::save`] or [`SyncBroker::discard`]. A save
//!   takes the same writer, so it never overlaps an auto-commit write. While
//!   the draft differs from the last synced record, incoming notifications
//!   are deferred instead of applied.
//!
//! Every applied record carries the store revision that committed it; a
//! record older than the one already applied is ignored.

use crate::error::{Error, Result};
use crate::preferences::{apply_patch, CommittedRecord, PreferenceStore};
use crate::regions::{is_valid_region, normalize_region};
use crate::storage::{KeyValueStore, Subscription};
use crate::types::{Language, PreferencePatch, PreferenceRecord, WindowMode};
use parking_lot::{Condvar, Mutex};
use std::sync::{Arc, Weak};
use std::thread;

type Observer = Arc<dyn Fn(&PreferenceRecord) + Send + Sync>;
type SettledObserver = Arc<dyn Fn(Option<&str>) + Send + Sync>;

/// Pending explicit-commit edits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplicitDraft {
    pub overlay_enabled: Option<bool>,
    pub window_mode: Option<WindowMode>,
}

impl ExplicitDraft {
    /// Whether applying the draft would change `synced`
    pub fn is_dirty(&self, synced: &PreferenceRecord) -> bool {
        self.overlay_enabled
            .is_some_and(|enabled| enabled != synced.overlay_enabled)
            || self.window_mode.is_some_and(|mode| mode != synced.window_mode)
    }

    pub fn as_patch(&self) -> PreferencePatch {
        PreferencePatch {
            overlay_enabled: self.overlay_enabled,
            window_mode: self.window_mode,
            ..PreferencePatch::default()
        }
    }

    fn is_empty(&self) -> bool {
        self.overlay_enabled.is_none() && self.window_mode.is_none()
    }
}

struct ContextState {
    synced: PreferenceRecord,
    /// Revision of `synced`; 0 until a committed record has been applied
    revision: u64,
    queued: Option<PreferencePatch>,
    in_flight: Option<PreferencePatch>,
    writing: bool,
    last_error: Option<String>,
    draft: ExplicitDraft,
    deferred: Option<CommittedRecord>,
}

impl ContextState {
    fn new(synced: PreferenceRecord) -> Self {
        Self {
            synced,
            revision: 0,
            queued: None,
            in_flight: None,
            writing: false,
            last_error: None,
            draft: ExplicitDraft::default(),
            deferred: None,
        }
    }

    /// Synced record with in-flight, queued and draft edits layered on top
    fn view(&self) -> PreferenceRecord {
        let mut view = self.synced.clone();
        for patch in [&self.in_flight, &self.queued].into_iter().flatten() {
            view = apply_patch(&view, patch);
        }
        if !self.draft.is_empty() {
            view = apply_patch(&view, &self.draft.as_patch());
        }
        view
    }

    fn is_dirty(&self) -> bool {
        self.draft.is_dirty(&self.synced)
    }

    /// Apply a record from another context. Returns whether the view changed.
    fn apply_incoming(&mut self, committed: CommittedRecord) -> bool {
        if committed.revision <= self.revision {
            return false;
        }
        if self.is_dirty() {
            tracing::debug!(
                revision = committed.revision,
                "deferring preference update while local edits are unsaved"
            );
            if self
                .deferred
                .as_ref()
                .map_or(true, |d| d.revision < committed.revision)
            {
                self.deferred = Some(committed);
            }
            return false;
        }
        self.adopt(committed);
        true
    }

    /// Apply the result of this context's own write, dirty or not
    fn apply_own(&mut self, committed: CommittedRecord) -> bool {
        if committed.revision <= self.revision {
            return false;
        }
        if self
            .deferred
            .as_ref()
            .is_some_and(|d| d.revision <= committed.revision)
        {
            self.deferred = None;
        }
        self.adopt(committed);
        true
    }

    fn adopt(&mut self, committed: CommittedRecord) {
        self.synced = committed.record;
        self.revision = committed.revision;
    }

    fn release_deferred(&mut self) {
        if let Some(deferred) = self.deferred.take() {
            if deferred.revision > self.revision {
                self.adopt(deferred);
            }
        }
    }
}

struct Shared<S> {
    prefs: Arc<PreferenceStore<S>>,
    state: Mutex<ContextState>,
    idle: Condvar,
    observers: Mutex<Vec<Observer>>,
    settled: Mutex<Vec<SettledObserver>>,
}

impl<S: KeyValueStore + 'static> Shared<S> {
    fn notify(&self, view: &PreferenceRecord) {
        let observers: Vec<Observer> = self.observers.lock().iter().cloned().collect();
        for observer in observers {
            observer(view);
        }
    }

    fn notify_settled(&self, error: Option<&str>) {
        let observers: Vec<SettledObserver> = self.settled.lock().iter().cloned().collect();
        for observer in observers {
            observer(error);
        }
    }

    /// Hand the writer back after an explicit save. Returns whether edits
    /// queued meanwhile still need writing.
    fn release_writer(&self) -> bool {
        let mut state = self.state.lock();
        if state.queued.is_some() {
            return true;
        }
        state.writing = false;
        self.idle.notify_all();
        false
    }

    /// Write queued patches one at a time until the queue is empty
    fn drain(&self) {
        loop {
            let patch = {
                let mut state = self.state.lock();
                let patch = state.queued.take();
                state.in_flight = patch.clone();
                patch
            };

            let Some(patch) = patch else {
                let error = self.state.lock().last_error.clone();
                self.notify_settled(error.as_deref());

                let mut state = self.state.lock();
                // an edit submitted while settling is picked up here
                if state.queued.is_some() {
                    continue;
                }
                state.writing = false;
                self.idle.notify_all();
                return;
            };

            let result = self.prefs.write_committed(&patch);

            let view = {
                let mut state = self.state.lock();
                state.in_flight = None;
                match result {
                    Ok(committed) => {
                        state.last_error = None;
                        state.apply_own(committed);
                    }
                    Err(e) => {
                        tracing::warn!("failed to persist preferences: {}", e);
                        state.last_error = Some(e.to_string());
                    }
                }
                state.view()
            };
            self.notify(&view);
        }
    }
}

/// Context-local preference state kept in sync with the store
pub struct SyncBroker<S> {
    shared: Arc<Shared<S>>,
    _subscription: Subscription,
}

impl<S: KeyValueStore + 'static> SyncBroker<S> {
    /// Subscribe to changes and hydrate from the store
    ///
    /// Fails with the store's error if the record cannot be read; the broker
    /// never starts from guessed defaults.
    pub fn activate(prefs: Arc<PreferenceStore<S>>) -> Result<Self> {
        let shared = Arc::new(Shared {
            prefs: Arc::clone(&prefs),
            state: Mutex::new(ContextState::new(crate::preferences::default_preferences())),
            idle: Condvar::new(),
            observers: Mutex::new(Vec::new()),
            settled: Mutex::new(Vec::new()),
        });

        let weak: Weak<Shared<S>> = Arc::downgrade(&shared);
        let subscription = prefs.subscribe(move |committed| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let view = {
                let mut state = shared.state.lock();
                if !state.apply_incoming(committed.clone()) {
                    return;
                }
                state.view()
            };
            shared.notify(&view);
        });

        let initial = prefs.read()?;
        {
            let mut state = shared.state.lock();
            // A notification that raced the read is at least as new
            if state.revision == 0 {
                state.synced = initial;
            }
        }

        Ok(Self {
            shared,
            _subscription: subscription,
        })
    }

    /// The record this context renders: synced state plus local edits
    pub fn view(&self) -> PreferenceRecord {
        self.shared.state.lock().view()
    }

    /// The last record received from the store
    pub fn synced(&self) -> PreferenceRecord {
        self.shared.state.lock().synced.clone()
    }

    /// Call `observer` with the new view whenever it changes
    ///
    /// Observers may run on the thread that committed a store write and must
    /// not write to the store themselves.
    pub fn on_change<F>(&self, observer: F)
    where
        F: Fn(&PreferenceRecord) + Send + Sync + 'static,
    {
        self.shared.observers.lock().push(Arc::new(observer));
    }

    /// Call `observer` each time the auto-commit writer runs out of work,
    /// with the error of the last write if it failed
    ///
    /// Runs on the writer thread before [`flush`](Self::flush) returns.
    pub fn on_settled<F>(&self, observer: F)
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        self.shared.settled.lock().push(Arc::new(observer));
    }

    // Auto-commit fields

    /// Queue an auto-commit edit
    ///
    /// If no write is running one is started on a worker thread; otherwise
    /// the edit is merged into the queued patch and written after the
    /// current write completes.
    pub fn submit(&self, patch: PreferencePatch) {
        if patch.is_empty() {
            return;
        }
        let (start, view) = {
            let mut state = self.shared.state.lock();
            state.queued = Some(match state.queued.take() {
                Some(queued) => queued.merged_with(patch),
                None => patch,
            });
            let start = !state.writing;
            state.writing = true;
            (start, state.view())
        };
        self.shared.notify(&view);

        if start {
            self.spawn_writer();
        }
    }

    /// Drain the queue on a worker thread; the caller has set `writing`
    fn spawn_writer(&self) {
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("prefs-writer".to_string())
            .spawn(move || shared.drain());
        if let Err(e) = spawned {
            tracing::warn!("failed to spawn preference writer, writing inline: {}", e);
            self.shared.drain();
        }
    }

    /// Pin or unpin a region; returns whether it is pinned afterwards
    pub fn toggle_favorite(&self, code: &str) -> Result<bool> {
        let code = normalize_region(code);
        if !is_valid_region(&code) {
            return Err(Error::InvalidRegion(code));
        }
        let mut favorites = self.view().favorites;
        let pinned = if let Some(pos) = favorites.iter().position(|f| *f == code) {
            favorites.remove(pos);
            false
        } else {
            favorites.push(code);
            true
        };
        self.submit(PreferencePatch::favorites(favorites));
        Ok(pinned)
    }

    pub fn set_language(&self, language: Language) {
        if self.view().language != language {
            self.submit(PreferencePatch::language(language));
        }
    }

    /// Block until every queued auto-commit edit has been written
    pub fn flush(&self) {
        let mut state = self.shared.state.lock();
        while state.writing {
            self.shared.idle.wait(&mut state);
        }
    }

    pub fn is_saving(&self) -> bool {
        self.shared.state.lock().writing
    }

    /// Error of the most recent failed auto-commit write, cleared by the next
    /// successful one
    pub fn last_error(&self) -> Option<String> {
        self.shared.state.lock().last_error.clone()
    }

    // Explicit-commit fields

    pub fn edit_overlay_enabled(&self, enabled: bool) {
        let view = {
            let mut state = self.shared.state.lock();
            state.draft.overlay_enabled = Some(enabled);
            state.view()
        };
        self.shared.notify(&view);
    }

    pub fn edit_window_mode(&self, mode: WindowMode) {
        let view = {
            let mut state = self.shared.state.lock();
            state.draft.window_mode = Some(mode);
            state.view()
        };
        self.shared.notify(&view);
    }

    pub fn draft(&self) -> ExplicitDraft {
        self.shared.state.lock().draft.clone()
    }

    /// Whether the draft differs from the last synced record
    pub fn is_dirty(&self) -> bool {
        self.shared.state.lock().is_dirty()
    }

    /// Whether a notification is waiting for the draft to be resolved
    pub fn has_deferred(&self) -> bool {
        self.shared.state.lock().deferred.is_some()
    }

    /// Persist the draft
    ///
    /// Waits for a running auto-commit write and holds the writer while the
    /// draft is written; edits submitted meanwhile are written afterwards.
    /// On failure the draft is kept so the user can retry.
    pub fn save(&self) -> Result<PreferenceRecord> {
        let patch = {
            let mut state = self.shared.state.lock();
            while state.writing {
                self.shared.idle.wait(&mut state);
            }
            if state.is_dirty() {
                state.writing = true;
                Some(state.draft.as_patch())
            } else {
                None
            }
        };

        let Some(patch) = patch else {
            let view = {
                let mut state = self.shared.state.lock();
                state.draft = ExplicitDraft::default();
                state.release_deferred();
                state.view()
            };
            self.shared.notify(&view);
            return Ok(view);
        };

        let result = self.shared.prefs.write_committed(&patch);
        let saved = {
            let mut state = self.shared.state.lock();
            result.map(|committed| {
                if state.draft.as_patch() == patch {
                    state.draft = ExplicitDraft::default();
                }
                state.apply_own(committed);
                if !state.is_dirty() {
                    state.release_deferred();
                }
                state.view()
            })
        };
        if self.shared.release_writer() {
            self.spawn_writer();
        }

        let view = saved.map_err(|e| {
            tracing::error!("failed to save preferences: {}", e);
            e
        })?;
        self.shared.notify(&view);
        Ok(view)
    }

    /// Drop the draft and apply any deferred notification
    pub fn discard(&self) {
        let view = {
            let mut state = self.shared.state.lock();
            state.draft = ExplicitDraft::default();
            state.release_deferred();
            state.view()
        };
        self.shared.notify(&view);
    }
}
