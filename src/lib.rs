//! # appstore-switcher - App Store storefront region switching
//!
//! This library switches App Store web pages (`apps.apple.com`) between
//! storefront regions and keeps the switcher's user preferences in sync
//! across every surface that shows them.
//!
//! ## Features
//!
//! - Catalog of App Store storefronts with English and Chinese labels
//! - Rewrite the region segment of App Store URLs (`/de/app/...` to `/us/app/...`)
//! - One persisted preference record with tolerant, field-by-field defaulting
//! - Change notification fan-out so every open surface converges on the latest record
//! - Auto-commit fields with a coalescing writer, explicit-commit fields with drafts
//! - Panel, page and background controllers built on host capabilities
//! - Localized UI strings with `{placeholder}` substitution
//!
//! ## Quick Start
//!
//! ### Rewriting URLs
//!
//! ```rust
//! use appstore_switcher::{build_url_for_region, extract_region, is_addressable_url};
//!
//! let url = "https://apps.apple.com/app/x/id123";
//! assert!(is_addressable_url(url));
//! assert_eq!(extract_region("https://apps.apple.com/de/app/x/id123").as_deref(), Some("de"));
//! assert_eq!(
//!     build_url_for_region(url, "jp").as_deref(),
//!     Some("https://apps.apple.com/jp/app/x/id123")
//! );
//! assert_eq!(build_url_for_region("https://example.com/us/app/x", "jp"), None);
//! ```
//!
//! ### Reading and Writing Preferences
//!
//! ```rust
//! use appstore_switcher::{Language, MemoryStore, PreferencePatch, PreferenceStore};
//!
//! let prefs = PreferenceStore::new(MemoryStore::new());
//! assert_eq!(prefs.read()?.favorites, vec!["us", "cn", "jp", "de"]);
//!
//! let saved = prefs.write(&PreferencePatch::language(Language::Zh))?;
//! assert_eq!(saved.language, Language::Zh);
//! # Ok::<(), appstore_switcher::Error>(())
//! ```
//!
//! ### Keeping Two Contexts in Sync
//!
//! ```rust
//! use appstore_switcher::{Language, MemoryStore, PreferenceStore, SyncBroker};
//! use std::sync::Arc;
//!
//! let prefs = Arc::new(PreferenceStore::new(Arc::new(MemoryStore::new())));
//! let panel = SyncBroker::activate(Arc::clone(&prefs))?;
//! let page = SyncBroker::activate(Arc::clone(&prefs))?;
//!
//! panel.set_language(Language::Zh);
//! panel.flush();
//! assert_eq!(page.view().language, Language::Zh);
//! # Ok::<(), appstore_switcher::Error>(())
//! ```
//!
//! ### Durable Storage
//!
//! ```rust,no_run
//! use appstore_switcher::{default_store_path, JsonFileStore, PreferenceStore};
//!
//! let path = default_store_path().expect("no config directory");
//! let prefs = PreferenceStore::new(JsonFileStore::new(path));
//! prefs.ensure_initialized()?;
//! println!("{:?}", prefs.read()?);
//! # Ok::<(), appstore_switcher::Error>(())
//! ```
//!
//! ## Editing Models
//!
//! - **Auto-commit** (`favorites`, `language`): written on every change; one
//!   write in flight, later edits coalesced into a single queued write.
//! - **Explicit-commit** (`overlayEnabled`, `windowMode`): kept in a draft
//!   until saved or discarded; notifications from other contexts wait while
//!   the draft is dirty.
//!
//! ## Error Handling
//!
//! Store operations return [`Result<T, Error>`]. Storage failures are never
//! masked by defaults:
//!
//! ```rust
//! use appstore_switcher::{Error, MemoryStore, PreferenceStore};
//!
//! let store = MemoryStore::new();
//! store.set_available(false);
//! let prefs = PreferenceStore::new(store);
//! match prefs.read() {
//!     Err(Error::StorageUnavailable(reason)) => eprintln!("storage: {}", reason),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```

// Re-export all public types at crate root
pub use types::{Language, PreferencePatch, PreferenceRecord, RegionCode, RegionOption, WindowMode};

// Re-export error types
pub use error::{Error, Result};

// Catalog and addressing
pub use addressing::{
    build_url_for_region, canonical_url, extract_region, is_addressable_url, plan_region_switch,
    RegionSwitch, APP_STORE_HOST,
};
pub use regions::{
    all_region_codes, filter_valid_regions, is_valid_region, normalize_region, query_regions,
    region_label, region_options, search_options, RegionCatalog, RegionInfo,
    DEFAULT_FAVORITE_REGIONS, PRIORITY_REGIONS,
};

// Storage, preferences and sync
pub use preferences::{
    apply_patch, default_preferences, merge_preferences, CommittedRecord, PreferenceStore,
    DEFAULT_LANGUAGE, DEFAULT_OVERLAY_ENABLED, DEFAULT_WINDOW_MODE, SETTINGS_KEY,
};
pub use storage::{ChangeListener, JsonFileStore, KeyValueStore, MemoryStore, StorageChange, Subscription};
pub use sync::{ExplicitDraft, SyncBroker};

// Surfaces
pub use background::{BackgroundController, Surface, SurfaceHost};
pub use location::{LocationChange, LocationFeed, LocationListener, LocationObserver, NavigationKind, Navigator};
pub use messaging::{
    handle_switch_region, FailureReason, PageRequest, SwitchRegionRequest, SwitchRegionResponse,
};
pub use page::{build_overlay, OverlayModel, PageController};
pub use panel::{PanelController, RegionItem, RegionList, SwitchOutcome, Tab, TabHost};
pub use status::{ScheduledClear, StatusLine, StatusSlot};

// Strings, configuration and logging
pub use config::{default_store_path, Timings, APP_DIR_NAME, STORE_FILE_NAME};
pub use i18n::{t, MessageKey};
pub use logging::init_logging;

// All modules are private - use re-exports above for public API
mod addressing;
mod background;
mod config;
mod error;
mod hub;
mod i18n;
mod location;
mod logging;
mod messaging;
mod page;
mod panel;
mod preferences;
mod regions;
mod status;
mod storage;
mod sync;
mod types;
