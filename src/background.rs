//! Background controller
//!
//! Seeds the store with defaults on start and decides which surface the
//! toolbar action opens.

use crate::error::Result;
use crate::preferences::{PreferenceStore, DEFAULT_WINDOW_MODE};
use crate::storage::{KeyValueStore, Subscription};
use crate::types::WindowMode;
use parking_lot::Mutex;
use std::sync::Arc;

/// A UI surface the toolbar action can open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Popup,
    SidePanel,
}

/// Opens surfaces on behalf of the background controller
pub trait SurfaceHost {
    fn open_side_panel(&self) -> Result<()>;

    fn open_popup(&self) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
struct TrackedMode {
    mode: WindowMode,
    revision: u64,
}

pub struct BackgroundController<S> {
    prefs: Arc<PreferenceStore<S>>,
    side_panel_available: bool,
    mode: Arc<Mutex<TrackedMode>>,
    _subscription: Subscription,
}

impl<S: KeyValueStore + 'static> BackgroundController<S> {
    /// Initialize defaults and start tracking the window mode
    ///
    /// Storage failures are logged, not returned: the controller then keeps
    /// the default window mode until a change notification arrives.
    pub fn start(prefs: Arc<PreferenceStore<S>>, side_panel_available: bool) -> Self {
        if let Err(e) = prefs.ensure_initialized() {
            tracing::error!("failed to initialize default settings: {}", e);
        }

        let mode = Arc::new(Mutex::new(TrackedMode {
            mode: DEFAULT_WINDOW_MODE,
            revision: 0,
        }));
        let tracked = Arc::clone(&mode);
        let subscription = prefs.subscribe(move |committed| {
            let mut tracked = tracked.lock();
            if committed.revision > tracked.revision {
                tracked.mode = committed.record.window_mode;
                tracked.revision = committed.revision;
            }
        });

        match prefs.read() {
            Ok(record) => {
                let mut tracked = mode.lock();
                if tracked.revision == 0 {
                    tracked.mode = record.window_mode;
                }
            }
            Err(e) => tracing::error!("failed to load settings in background: {}", e),
        }

        tracing::info!(side_panel_available, "background controller started");
        Self {
            prefs,
            side_panel_available,
            mode,
            _subscription: subscription,
        }
    }

    pub fn window_mode(&self) -> WindowMode {
        self.mode.lock().mode
    }

    pub fn side_panel_available(&self) -> bool {
        self.side_panel_available
    }

    pub fn preferences(&self) -> &PreferenceStore<S> {
        &self.prefs
    }

    /// The surface the toolbar action should open right now
    pub fn primary_surface(&self) -> Surface {
        if self.window_mode() == WindowMode::Sidepanel && self.side_panel_available {
            Surface::SidePanel
        } else {
            Surface::Popup
        }
    }

    /// Handle a click on the toolbar action
    ///
    /// A side panel that fails to open falls back to the popup.
    pub fn on_action(&self, host: &impl SurfaceHost) -> Result<Surface> {
        if self.primary_surface() == Surface::SidePanel {
            match host.open_side_panel() {
                Ok(()) => return Ok(Surface::SidePanel),
                Err(e) => tracing::warn!("failed to open side panel, falling back to popup: {}", e),
            }
        }
        host.open_popup()?;
        Ok(Surface::Popup)
    }
}
