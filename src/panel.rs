//! Popup and side panel controller
//!
//! The panel shows the region of the active tab, a searchable region list
//! with pinned regions first, and the preference controls. Region switches go
//! through the page first (`switch-region` message) and fall back to
//! navigating the tab directly when the page does not answer.

use crate::addressing::{
    extract_region, is_addressable_url, plan_region_switch, RegionSwitch, APP_STORE_HOST,
};
use crate::config::Timings;
use crate::error::Result;
use crate::i18n::MessageKey;
use crate::messaging::{SwitchRegionRequest, SwitchRegionResponse};
use crate::preferences::PreferenceStore;
use crate::regions::{normalize_region, region_label, region_options, search_options};
use crate::status::{StatusLine, StatusSlot};
use crate::storage::KeyValueStore;
use crate::sync::SyncBroker;
use crate::types::{Language, PreferenceRecord, RegionCode, WindowMode};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Region assumed when the tab carries none
const FALLBACK_REGION: &str = "us";

/// A browser tab as seen by the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: u64,
    pub url: Option<String>,
}

/// Tab access and page messaging provided by the host
pub trait TabHost: Send + Sync {
    /// The active tab of the current window, if any
    fn active_tab(&self) -> Result<Option<Tab>>;

    /// Point the tab at `url`
    fn navigate(&self, tab_id: u64, url: &str) -> Result<()>;

    /// Ask the page in the tab to switch region
    ///
    /// Fails with [`crate::Error::MessagingUnavailable`] when no page
    /// answers within `timeout`.
    fn send_switch_region(
        &self,
        tab_id: u64,
        request: &SwitchRegionRequest,
        timeout: Duration,
    ) -> Result<SwitchRegionResponse>;
}

impl<H: TabHost + ?Sized> TabHost for Arc<H> {
    fn active_tab(&self) -> Result<Option<Tab>> {
        (**self).active_tab()
    }

    fn navigate(&self, tab_id: u64, url: &str) -> Result<()> {
        (**self).navigate(tab_id, url)
    }

    fn send_switch_region(
        &self,
        tab_id: u64,
        request: &SwitchRegionRequest,
        timeout: Duration,
    ) -> Result<SwitchRegionResponse> {
        (**self).send_switch_region(tab_id, request, timeout)
    }
}

/// Result of a region switch request from the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The tab is navigating to this URL
    Navigated(String),
    AlreadyThere,
    Unsupported,
    NoActiveTab,
    /// Neither the page nor direct navigation worked
    Failed(String),
}

/// One row of the region list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionItem {
    pub code: RegionCode,
    pub label: String,
    pub pinned: bool,
    pub current: bool,
}

/// The region list split into its two groups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionList {
    pub pinned: Vec<RegionItem>,
    pub others: Vec<RegionItem>,
}

#[derive(Debug, Default)]
struct TabState {
    tab: Option<Tab>,
    current_region: RegionCode,
    active: bool,
}

/// Controller behind the popup and the side panel
pub struct PanelController<S, H> {
    broker: SyncBroker<S>,
    host: H,
    timings: Timings,
    tab: Mutex<TabState>,
    search: Mutex<String>,
    switch_status: StatusSlot,
    save_status: StatusSlot,
}

impl<S: KeyValueStore + 'static, H: TabHost> PanelController<S, H> {
    /// Hydrate from the store and look up the active tab
    pub fn open(prefs: Arc<PreferenceStore<S>>, host: H) -> Result<Self> {
        Self::with_timings(prefs, host, Timings::default())
    }

    pub fn with_timings(prefs: Arc<PreferenceStore<S>>, host: H, timings: Timings) -> Result<Self> {
        let broker = SyncBroker::activate(prefs).map_err(|e| {
            tracing::error!("failed to load settings in panel: {}", e);
            e
        })?;

        let save_status = StatusSlot::new();
        let slot = save_status.clone();
        let clear_after = timings.save_status_clear;
        broker.on_settled(move |error| match error {
            None => slot.flash(StatusLine::new(MessageKey::StatusSaveSuccess), clear_after),
            Some(_) => slot.set(StatusLine::new(MessageKey::StatusSaveFailed)),
        });

        let panel = Self {
            broker,
            host,
            timings,
            tab: Mutex::new(TabState {
                current_region: FALLBACK_REGION.to_string(),
                ..TabState::default()
            }),
            search: Mutex::new(String::new()),
            switch_status: StatusSlot::new(),
            save_status,
        };
        panel.refresh_tab();
        Ok(panel)
    }

    /// Re-read the active tab and derive the current region from it
    pub fn refresh_tab(&self) {
        let tab = match self.host.active_tab() {
            Ok(tab) => tab,
            Err(e) => {
                tracing::error!("failed to read active tab: {}", e);
                self.switch_status.set(StatusLine::new(MessageKey::StatusCantLoadTab));
                let mut state = self.tab.lock();
                state.tab = None;
                state.active = false;
                state.current_region = FALLBACK_REGION.to_string();
                return;
            }
        };

        let addressable = tab
            .as_ref()
            .and_then(|t| t.url.as_deref())
            .filter(|url| is_addressable_url(url));
        let region = addressable
            .and_then(extract_region)
            .unwrap_or_else(|| FALLBACK_REGION.to_string());

        let mut state = self.tab.lock();
        state.active = addressable.is_some();
        state.current_region = region;
        state.tab = tab;
        drop(state);
        self.switch_status.clear();
    }

    /// Whether the active tab is an App Store page
    pub fn is_active(&self) -> bool {
        self.tab.lock().active
    }

    pub fn current_region(&self) -> RegionCode {
        self.tab.lock().current_region.clone()
    }

    pub fn current_region_label(&self) -> String {
        region_label(&self.current_region(), self.language())
    }

    pub fn active_tab(&self) -> Option<Tab> {
        self.tab.lock().tab.clone()
    }

    /// The rendered preference record, local edits included
    pub fn view(&self) -> PreferenceRecord {
        self.broker.view()
    }

    pub fn language(&self) -> Language {
        self.broker.view().language
    }

    pub fn broker(&self) -> &SyncBroker<S> {
        &self.broker
    }

    /// Switch the active tab to `code`
    pub fn switch_region(&self, code: &str) -> SwitchOutcome {
        let Some((tab_id, url)) = self
            .active_tab()
            .and_then(|tab| tab.url.map(|url| (tab.id, url)))
        else {
            self.switch_status.set(StatusLine::new(MessageKey::StatusCantLoadTab));
            return SwitchOutcome::NoActiveTab;
        };

        let target = match plan_region_switch(&url, code) {
            RegionSwitch::Unsupported => {
                self.switch_status.set(StatusLine::new(MessageKey::StatusUnsupported));
                return SwitchOutcome::Unsupported;
            }
            RegionSwitch::AlreadyThere => {
                self.switch_status.set(StatusLine::new(MessageKey::StatusAlready));
                return SwitchOutcome::AlreadyThere;
            }
            RegionSwitch::Navigate(target) => target,
        };

        let code = normalize_region(code);
        self.switch_status.set(
            StatusLine::new(MessageKey::StatusSwitching)
                .with_param("region", region_label(&code, self.language())),
        );

        let final_url = match self.ask_page(tab_id, &code) {
            Some(url) => url,
            None => match self.host.navigate(tab_id, &target) {
                Ok(()) => target,
                Err(e) => {
                    tracing::error!("failed to switch region: {}", e);
                    self.switch_status.set(StatusLine::new(MessageKey::StatusSwitchFailed));
                    return SwitchOutcome::Failed(e.to_string());
                }
            },
        };

        let mut state = self.tab.lock();
        if let Some(tab) = state.tab.as_mut() {
            tab.url = Some(final_url.clone());
        }
        state.current_region = code;
        SwitchOutcome::Navigated(final_url)
    }

    /// Messaging leg of a switch; `None` means fall back to navigation
    fn ask_page(&self, tab_id: u64, code: &str) -> Option<String> {
        let request = SwitchRegionRequest::new(code);
        match self
            .host
            .send_switch_region(tab_id, &request, self.timings.message_timeout)
        {
            Ok(response) => match response.target() {
                Some(url) => Some(url.to_string()),
                None => {
                    tracing::warn!(region = code, "page declined region switch, navigating directly");
                    None
                }
            },
            Err(e) => {
                tracing::warn!("page did not answer ({}), navigating directly", e);
                None
            }
        }
    }

    // Auto-commit preferences

    /// Pin or unpin a region; returns whether it is pinned afterwards
    ///
    /// The last pinned region cannot be unpinned.
    pub fn toggle_pin(&self, code: &str) -> Result<bool> {
        let view = self.broker.view();
        if view.is_favorite(code) && view.favorites.len() == 1 {
            self.save_status.flash(
                StatusLine::new(MessageKey::StatusSelectFavorites),
                self.timings.save_status_clear,
            );
            return Ok(true);
        }
        self.save_status.set(StatusLine::new(MessageKey::StatusSaveInProgress));
        self.broker.toggle_favorite(code).map_err(|e| {
            self.save_status.clear();
            e
        })
    }

    pub fn set_language(&self, language: Language) {
        self.broker.set_language(language);
    }

    /// Wait for pending auto-commit writes
    pub fn flush(&self) {
        self.broker.flush();
    }

    // Explicit-commit preferences

    pub fn set_overlay_enabled(&self, enabled: bool) {
        self.broker.edit_overlay_enabled(enabled);
    }

    pub fn set_window_mode(&self, mode: WindowMode) {
        self.broker.edit_window_mode(mode);
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.broker.is_dirty()
    }

    pub fn save(&self) -> Result<PreferenceRecord> {
        self.save_status.set(StatusLine::new(MessageKey::StatusSaveInProgress));
        match self.broker.save() {
            Ok(record) => {
                self.save_status.flash(
                    StatusLine::new(MessageKey::StatusSaveSuccess),
                    self.timings.save_status_clear,
                );
                Ok(record)
            }
            Err(e) => {
                self.save_status.set(StatusLine::new(MessageKey::StatusSaveFailed));
                Err(e)
            }
        }
    }

    pub fn discard(&self) {
        self.broker.discard();
        self.save_status.clear();
    }

    // Region list

    pub fn set_search(&self, query: &str) {
        *self.search.lock() = query.to_string();
    }

    /// Catalog options filtered by the search query, pinned regions first
    pub fn region_list(&self) -> RegionList {
        let view = self.broker.view();
        let current = self.current_region();
        let query = self.search.lock().clone();

        let mut list = RegionList::default();
        for option in search_options(&region_options(view.language), &query) {
            let pinned = view.is_favorite(&option.code);
            let item = RegionItem {
                current: option.code == current,
                code: option.code,
                label: option.label,
                pinned,
            };
            if pinned {
                list.pinned.push(item);
            } else {
                list.others.push(item);
            }
        }
        list
    }

    // Status lines

    pub fn switch_status(&self) -> Option<String> {
        self.switch_status.current().map(|line| line.render(self.language()))
    }

    pub fn save_status(&self) -> Option<String> {
        self.save_status.current().map(|line| line.render(self.language()))
    }

    /// Notice shown instead of the list when the tab is not an App Store page
    pub fn inactive_notice(&self) -> Option<String> {
        if self.is_active() {
            return None;
        }
        Some(
            StatusLine::new(MessageKey::InactiveMessage)
                .with_param("domain", APP_STORE_HOST)
                .render(self.language()),
        )
    }
}
