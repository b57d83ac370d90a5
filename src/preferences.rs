//! Preference store
//!
//! The switcher keeps one [`PreferenceRecord`] under [`SETTINGS_KEY`] in a
//! [`KeyValueStore`]. Stored data may be partial or come from an older
//! build; every read merges it field by field against hard defaults, so
//! callers always see a fully populated record.
//!
//! [`PreferenceStore::write`] is the only mutation path. It reads the current
//! record, merges the patch over it and persists the result. There is no
//! locking across calls: two concurrent writers race and the last commit
//! wins for the fields it carries.
//!
//! # Example
//!
//! ```rust
//! use appstore_switcher::{MemoryStore, PreferencePatch, PreferenceStore};
//!
//! let prefs = PreferenceStore::new(MemoryStore::new());
//! let saved = prefs.write(&PreferencePatch::favorites(["zz", "US"]))?;
//! assert_eq!(saved.favorites, vec!["us".to_string()]);
//! # Ok::<(), appstore_switcher::Error>(())
//! ```

use crate::error::Result;
use crate::regions::{filter_valid_regions, DEFAULT_FAVORITE_REGIONS};
use crate::storage::{KeyValueStore, StorageChange, Subscription};
use crate::types::{Language, PreferencePatch, PreferenceRecord, RegionCode, WindowMode};
use serde_json::Value;

/// Storage key of the preference record
pub const SETTINGS_KEY: &str = "appStoreRegionSettings";

pub const DEFAULT_OVERLAY_ENABLED: bool = true;
pub const DEFAULT_LANGUAGE: Language = Language::En;
pub const DEFAULT_WINDOW_MODE: WindowMode = WindowMode::Sidepanel;

/// The record used on first run
pub fn default_preferences() -> PreferenceRecord {
    PreferenceRecord {
        favorites: default_favorites(),
        overlay_enabled: DEFAULT_OVERLAY_ENABLED,
        language: DEFAULT_LANGUAGE,
        window_mode: DEFAULT_WINDOW_MODE,
    }
}

fn default_favorites() -> Vec<RegionCode> {
    DEFAULT_FAVORITE_REGIONS.iter().map(|c| c.to_string()).collect()
}

/// Normalize and validate favorites, falling back to the defaults when
/// nothing valid remains
fn normalize_favorites<I, S>(codes: I) -> Vec<RegionCode>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let favorites = filter_valid_regions(codes);
    if favorites.is_empty() {
        default_favorites()
    } else {
        favorites
    }
}

/// Build a full record from whatever is stored under [`SETTINGS_KEY`]
///
/// Each field falls back to its default independently: a missing or
/// malformed `language` does not discard valid `favorites`.
pub fn merge_preferences(stored: Option<&Value>) -> PreferenceRecord {
    let Some(Value::Object(fields)) = stored else {
        return default_preferences();
    };

    let favorites = match fields.get("favorites") {
        Some(Value::Array(items)) => normalize_favorites(items.iter().filter_map(Value::as_str)),
        _ => default_favorites(),
    };
    let overlay_enabled = fields
        .get("overlayEnabled")
        .and_then(Value::as_bool)
        .unwrap_or(DEFAULT_OVERLAY_ENABLED);
    let language = fields
        .get("language")
        .and_then(Value::as_str)
        .and_then(Language::parse)
        .unwrap_or(DEFAULT_LANGUAGE);
    let window_mode = fields
        .get("windowMode")
        .and_then(Value::as_str)
        .and_then(WindowMode::parse)
        .unwrap_or(DEFAULT_WINDOW_MODE);

    PreferenceRecord {
        favorites,
        overlay_enabled,
        language,
        window_mode,
    }
}

/// Shallow-merge `patch` over `current` and re-apply validation
pub fn apply_patch(current: &PreferenceRecord, patch: &PreferencePatch) -> PreferenceRecord {
    PreferenceRecord {
        favorites: match &patch.favorites {
            Some(codes) => normalize_favorites(codes),
            None => normalize_favorites(&current.favorites),
        },
        overlay_enabled: patch.overlay_enabled.unwrap_or(current.overlay_enabled),
        language: patch.language.unwrap_or(current.language),
        window_mode: patch.window_mode.unwrap_or(current.window_mode),
    }
}

/// A record together with the store revision that committed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedRecord {
    pub record: PreferenceRecord,
    pub revision: u64,
}

/// Typed access to the preference record in a [`KeyValueStore`]
pub struct PreferenceStore<S> {
    store: S,
}

impl<S: KeyValueStore> PreferenceStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying key-value store
    pub fn storage(&self) -> &S {
        &self.store
    }

    /// Read the current record, merged against defaults
    ///
    /// Storage failures are returned as errors, never replaced by defaults.
    pub fn read(&self) -> Result<PreferenceRecord> {
        let stored = self.store.get(SETTINGS_KEY)?;
        Ok(merge_preferences(stored.as_ref()))
    }

    /// Merge `patch` over the current record, persist and return the result
    pub fn write(&self, patch: &PreferencePatch) -> Result<PreferenceRecord> {
        self.write_committed(patch).map(|committed| committed.record)
    }

    /// Like [`write`](Self::write), also reporting the commit revision
    pub fn write_committed(&self, patch: &PreferencePatch) -> Result<CommittedRecord> {
        let current = self.read()?;
        let next = apply_patch(&current, patch);
        let revision = self.store.set(SETTINGS_KEY, serde_json::to_value(&next)?)?;
        tracing::debug!(
            revision,
            favorites = ?next.favorites,
            language = %next.language,
            window_mode = %next.window_mode,
            overlay_enabled = next.overlay_enabled,
            "saved preferences"
        );
        Ok(CommittedRecord {
            record: next,
            revision,
        })
    }

    /// Persist the defaults if no record exists yet
    ///
    /// An existing record, even a partial or legacy one, is never touched.
    /// Returns whether the defaults were written.
    pub fn ensure_initialized(&self) -> Result<bool> {
        if self.store.get(SETTINGS_KEY)?.is_some() {
            return Ok(false);
        }
        let defaults = serde_json::to_value(default_preferences())?;
        self.store.set(SETTINGS_KEY, defaults)?;
        tracing::info!("initialized default preferences");
        Ok(true)
    }

    /// Receive every committed record, merged against defaults
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&CommittedRecord) + Send + Sync + 'static,
    {
        self.store
            .subscribe(Box::new(move |change: &StorageChange| {
                if change.key != SETTINGS_KEY {
                    return;
                }
                callback(&CommittedRecord {
                    record: merge_preferences(Some(&change.new_value)),
                    revision: change.revision,
                });
            }))
    }
}
