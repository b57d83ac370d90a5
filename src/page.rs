//! Page controller
//!
//! Runs inside an App Store page. It answers `switch-region` messages from
//! the panel and drives the quick switch overlay: a compact select listing
//! the favorite regions, with the page's own region prepended when it is not
//! a favorite.

use crate::addressing::{extract_region, plan_region_switch, RegionSwitch};
use crate::config::Timings;
use crate::error::Result;
use crate::i18n::{t, MessageKey};
use crate::location::{LocationChange, LocationObserver, Navigator};
use crate::messaging::{handle_switch_region, PageRequest, SwitchRegionRequest, SwitchRegionResponse};
use crate::preferences::PreferenceStore;
use crate::regions::{normalize_region, region_label};
use crate::status::{StatusLine, StatusSlot};
use crate::storage::{KeyValueStore, Subscription};
use crate::sync::SyncBroker;
use crate::types::{PreferenceRecord, RegionCode, RegionOption};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::{Arc, Weak};

type Renderer = Arc<dyn Fn(&OverlayModel) + Send + Sync>;

/// Everything the overlay renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayModel {
    pub visible: bool,
    pub title: String,
    pub options: Vec<RegionOption>,
    pub selected: Option<RegionCode>,
    pub status: String,
}

struct PageInner<S, L> {
    broker: SyncBroker<S>,
    location: L,
    status: StatusSlot,
    timings: Timings,
    renderers: Mutex<Vec<Renderer>>,
}

impl<S, L> PageInner<S, L>
where
    S: KeyValueStore + 'static,
    L: LocationObserver + Navigator + 'static,
{
    fn overlay(&self) -> OverlayModel {
        let view = self.broker.view();
        let current = extract_region(&self.location.current_url());
        build_overlay(&view, current.as_deref(), self.status.current())
    }

    fn render(&self) {
        let renderers: Vec<Renderer> = self.renderers.lock().iter().cloned().collect();
        if renderers.is_empty() {
            return;
        }
        let model = self.overlay();
        for renderer in renderers {
            renderer(&model);
        }
    }

    /// Show a transient status and render again once it has cleared
    fn flash_status(self: &Arc<Self>, key: MessageKey) {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.status.flash_then(
            StatusLine::new(key),
            self.timings.overlay_status_clear,
            move || {
                if let Some(inner) = weak.upgrade() {
                    inner.render();
                }
            },
        );
    }
}

/// Build the overlay for `settings` on a page in region `current`
pub fn build_overlay(
    settings: &PreferenceRecord,
    current: Option<&str>,
    status: Option<StatusLine>,
) -> OverlayModel {
    let language = settings.language;
    let title = t(language, MessageKey::OverlayTitle, &[]);

    if !settings.overlay_enabled {
        return OverlayModel {
            visible: false,
            title,
            options: Vec::new(),
            selected: None,
            status: String::new(),
        };
    }

    let current = current.map(normalize_region);
    let mut codes = settings.favorites.clone();
    if let Some(code) = &current {
        if !codes.contains(code) {
            codes.insert(0, code.clone());
        }
    }

    let options: Vec<RegionOption> = codes
        .iter()
        .map(|code| RegionOption {
            code: code.clone(),
            label: region_label(code, language),
        })
        .collect();

    let (selected, derived_status) = match &current {
        Some(code) if codes.contains(code) => (
            Some(code.clone()),
            t(
                language,
                MessageKey::OverlayStatusCurrent,
                &[("region", &region_label(code, language))],
            ),
        ),
        _ => match options.first() {
            Some(first) => (
                Some(first.code.clone()),
                t(language, MessageKey::OverlayStatusSelected, &[("region", &first.label)]),
            ),
            None => (None, t(language, MessageKey::OverlayStatusNoFavorites, &[])),
        },
    };

    OverlayModel {
        visible: true,
        title,
        options,
        selected,
        status: status.map_or(derived_status, |line| line.render(language)),
    }
}

/// Controller of one App Store page
pub struct PageController<S, L> {
    inner: Arc<PageInner<S, L>>,
    _location: Subscription,
}

impl<S, L> PageController<S, L>
where
    S: KeyValueStore + 'static,
    L: LocationObserver + Navigator + 'static,
{
    pub fn attach(prefs: Arc<PreferenceStore<S>>, location: L) -> Result<Self> {
        Self::with_timings(prefs, location, Timings::default())
    }

    pub fn with_timings(prefs: Arc<PreferenceStore<S>>, location: L, timings: Timings) -> Result<Self> {
        let broker = SyncBroker::activate(prefs).map_err(|e| {
            tracing::error!("failed to read extension settings: {}", e);
            e
        })?;

        let inner = Arc::new(PageInner {
            broker,
            location,
            status: StatusSlot::new(),
            timings,
            renderers: Mutex::new(Vec::new()),
        });

        let weak: Weak<PageInner<S, L>> = Arc::downgrade(&inner);
        inner.broker.on_change(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.render();
            }
        });

        let weak: Weak<PageInner<S, L>> = Arc::downgrade(&inner);
        let location = inner.location.observe(Box::new(move |change: &LocationChange| {
            if let Some(inner) = weak.upgrade() {
                tracing::debug!(url = %change.url, "refreshing overlay for new location");
                inner.status.clear();
                inner.render();
            }
        }));

        Ok(Self {
            inner,
            _location: location,
        })
    }

    pub fn overlay(&self) -> OverlayModel {
        self.inner.overlay()
    }

    /// Call `renderer` with a fresh overlay whenever settings or the
    /// location change, and when a transient status clears
    pub fn on_render<F>(&self, renderer: F)
    where
        F: Fn(&OverlayModel) + Send + Sync + 'static,
    {
        self.inner.renderers.lock().push(Arc::new(renderer));
    }

    /// The region of the page, if the page carries one
    pub fn current_region(&self) -> Option<RegionCode> {
        extract_region(&self.inner.location.current_url())
    }

    pub fn settings(&self) -> PreferenceRecord {
        self.inner.broker.view()
    }

    /// A region picked in the overlay
    pub fn select_region(&self, code: &str) -> RegionSwitch {
        let inner = &self.inner;
        let language = inner.broker.view().language;
        let decision = plan_region_switch(&inner.location.current_url(), code);
        match &decision {
            RegionSwitch::Unsupported => inner.flash_status(MessageKey::OverlayStatusUnsupported),
            RegionSwitch::AlreadyThere => inner.flash_status(MessageKey::OverlayStatusAlready),
            RegionSwitch::Navigate(url) => {
                inner.status.set(
                    StatusLine::new(MessageKey::OverlayStatusSwitching)
                        .with_param("region", region_label(code, language)),
                );
                inner.render();
                inner.location.assign(url);
                return decision;
            }
        }
        inner.render();
        decision
    }

    /// Answer a switch request from a panel and navigate on success
    pub fn handle_switch_region(&self, request: &SwitchRegionRequest) -> SwitchRegionResponse {
        let response = handle_switch_region(&self.inner.location.current_url(), request);
        match response.target() {
            Some(url) => self.inner.location.assign(url),
            None => tracing::debug!(region = %request.region, "switch-region unsupported on this page"),
        }
        response
    }

    /// Dispatch a raw message; messages this page does not handle yield
    /// `None`
    pub fn handle_message(&self, message: &Value) -> Option<Value> {
        let PageRequest::SwitchRegion(request) = PageRequest::from_value(message)?;
        let response = self.handle_switch_region(&request);
        serde_json::to_value(response).ok()
    }
}
