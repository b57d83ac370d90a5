// Integration tests for region switching and preference sync across contexts
use appstore_switcher::{
    build_url_for_region, extract_region, is_addressable_url, plan_region_switch,
    BackgroundController, KeyValueStore, Language, LocationFeed, LocationObserver, MemoryStore,
    PageController, PanelController, PreferencePatch, PreferenceStore, RegionSwitch, Result,
    StorageChange, Subscription, Surface, SwitchOutcome, SwitchRegionRequest,
    SwitchRegionResponse, SyncBroker, Tab, TabHost, Timings, WindowMode,
};
use serde_json::{json, Value};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

type Prefs = Arc<PreferenceStore<Arc<MemoryStore>>>;

fn shared_prefs() -> Prefs {
    Arc::new(PreferenceStore::new(Arc::new(MemoryStore::new())))
}

#[test]
fn test_switch_scenarios() {
    assert_eq!(
        build_url_for_region("https://apps.apple.com/de/app/x/id123", "us").as_deref(),
        Some("https://apps.apple.com/us/app/x/id123")
    );
    assert_eq!(
        build_url_for_region("https://apps.apple.com/app/x/id123", "jp").as_deref(),
        Some("https://apps.apple.com/jp/app/x/id123")
    );
    assert!(!is_addressable_url("https://example.com/us/app/x"));
    assert_eq!(extract_region("https://example.com/us/app/x"), None);
}

#[test]
fn test_switch_properties_hold_for_catalog_regions() {
    let urls = [
        "https://apps.apple.com/de/app/x/id123",
        "https://apps.apple.com/app/x/id123?mt=8",
        "https://apps.apple.com/",
        "https://apps.apple.com//gb//developer/acme/id9#reviews",
    ];
    for url in urls {
        for code in ["us", "JP", " kr ", "cn"] {
            let built = build_url_for_region(url, code).unwrap();
            let normalized = code.trim().to_lowercase();
            assert_eq!(extract_region(&built), Some(normalized.clone()), "{} -> {}", url, code);
            assert_eq!(build_url_for_region(&built, code).as_deref(), Some(built.as_str()));
            assert_eq!(plan_region_switch(&built, &normalized), RegionSwitch::AlreadyThere);
        }
    }
}

#[test]
fn test_write_keeps_only_catalog_favorites() {
    let prefs = shared_prefs();
    prefs.write(&PreferencePatch::favorites(["zz", "us"])).unwrap();
    assert_eq!(prefs.read().unwrap().favorites, vec!["us"]);
}

#[test]
fn test_rapid_language_writes_settle_on_last() {
    let prefs = shared_prefs();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = prefs.subscribe(move |committed| {
        sink.lock().unwrap().push(committed.record.language);
    });

    prefs.write(&PreferencePatch::language(Language::En)).unwrap();
    prefs.write(&PreferencePatch::language(Language::Zh)).unwrap();

    assert_eq!(prefs.read().unwrap().language, Language::Zh);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.last(), Some(&Language::Zh));
    assert_eq!(seen.iter().filter(|l| **l == Language::Zh).count(), 1);
}

#[test]
fn test_rapid_language_edits_through_broker() {
    let prefs = shared_prefs();
    let writer = SyncBroker::activate(Arc::clone(&prefs)).unwrap();
    let reader = SyncBroker::activate(Arc::clone(&prefs)).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    reader.on_change(move |record| sink.lock().unwrap().push(record.language));

    writer.submit(PreferencePatch::language(Language::En));
    writer.submit(PreferencePatch::language(Language::Zh));
    writer.flush();

    assert_eq!(prefs.read().unwrap().language, Language::Zh);
    assert_eq!(reader.view().language, Language::Zh);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.iter().filter(|l| **l == Language::Zh).count(), 1);
}

/// Store whose first `set` blocks until released
struct GatedStore {
    inner: MemoryStore,
    entered: Mutex<Option<mpsc::Sender<()>>>,
    release: Mutex<Option<mpsc::Receiver<()>>>,
    writes: Mutex<Vec<Value>>,
}

impl KeyValueStore for GatedStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<u64> {
        let entered = self.entered.lock().unwrap().take();
        if let Some(entered) = entered {
            entered.send(()).unwrap();
            let release = self.release.lock().unwrap().take().unwrap();
            release.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        self.writes.lock().unwrap().push(value.clone());
        self.inner.set(key, value)
    }

    fn subscribe(&self, listener: Box<dyn Fn(&StorageChange) + Send + Sync>) -> Subscription {
        self.inner.subscribe(listener)
    }
}

impl GatedStore {
    /// The store, a receiver signalled when the first write is held and a
    /// sender that releases it
    fn new() -> (Arc<Self>, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let store = Arc::new(GatedStore {
            inner: MemoryStore::new(),
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(Some(release_rx)),
            writes: Mutex::new(Vec::new()),
        });
        (store, entered_rx, release_tx)
    }

    fn written(&self, field: &str) -> Vec<Value> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .map(|record| record[field].clone())
            .collect()
    }
}

#[test]
fn test_edits_during_a_write_are_coalesced() {
    let (store, entered_rx, release_tx) = GatedStore::new();
    let prefs = Arc::new(PreferenceStore::new(Arc::clone(&store)));
    let broker = SyncBroker::activate(prefs).unwrap();

    broker.submit(PreferencePatch::favorites(["us"]));
    entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(broker.is_saving());

    broker.submit(PreferencePatch::favorites(["jp"]));
    broker.submit(PreferencePatch::favorites(["kr"]));
    assert_eq!(broker.view().favorites, vec!["kr"]);

    release_tx.send(()).unwrap();
    broker.flush();

    assert_eq!(store.written("favorites"), vec![json!(["us"]), json!(["kr"])]);
    assert_eq!(broker.view().favorites, vec!["kr"]);
}

#[test]
fn test_save_waits_for_auto_commit_in_flight() {
    let (store, entered_rx, release_tx) = GatedStore::new();
    let prefs = Arc::new(PreferenceStore::new(Arc::clone(&store)));
    let broker = SyncBroker::activate(Arc::clone(&prefs)).unwrap();

    broker.set_language(Language::Zh);
    entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    broker.edit_overlay_enabled(false);

    let saved = thread::scope(|scope| {
        let saving = scope.spawn(|| broker.save());
        release_tx.send(()).unwrap();
        saving.join().unwrap()
    })
    .unwrap();
    broker.flush();

    assert!(!saved.overlay_enabled);
    assert_eq!(saved.language, Language::Zh);
    let stored = prefs.read().unwrap();
    assert!(!stored.overlay_enabled);
    assert_eq!(stored.language, Language::Zh);
    assert_eq!(broker.view(), stored);
    assert_eq!(store.written("overlayEnabled"), vec![json!(true), json!(false)]);
}

#[test]
fn test_overlay_status_clears_and_renders_again() {
    let prefs = shared_prefs();
    let feed = Arc::new(LocationFeed::new("https://apps.apple.com/jp/app/x/id1"));
    let page = PageController::with_timings(
        Arc::clone(&prefs),
        Arc::clone(&feed),
        Timings::uniform(Duration::from_millis(50)),
    )
    .unwrap();
    let rendered = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&rendered);
    page.on_render(move |model| sink.lock().unwrap().push(model.status.clone()));

    assert_eq!(page.select_region("jp"), RegionSwitch::AlreadyThere);
    thread::sleep(Duration::from_millis(400));

    assert_eq!(
        *rendered.lock().unwrap(),
        vec!["Already in this region.".to_string(), "Current: Japan (JP)".to_string()]
    );
    assert_eq!(page.overlay().status, "Current: Japan (JP)");
}

#[test]
fn test_contexts_converge_on_latest_record() {
    let prefs = shared_prefs();
    let contexts: Vec<_> = (0..3)
        .map(|_| SyncBroker::activate(Arc::clone(&prefs)).unwrap())
        .collect();

    contexts[0].toggle_favorite("kr").unwrap();
    contexts[0].flush();
    contexts[1].set_language(Language::Zh);
    contexts[1].flush();
    contexts[2].toggle_favorite("gb").unwrap();
    contexts[2].flush();

    let stored = prefs.read().unwrap();
    for context in &contexts {
        assert_eq!(context.view(), stored);
    }
    assert_eq!(stored.language, Language::Zh);
    assert_eq!(stored.favorites, vec!["us", "cn", "jp", "de", "kr", "gb"]);
}

#[test]
fn test_unsaved_draft_survives_remote_change() {
    let prefs = shared_prefs();
    let editing = SyncBroker::activate(Arc::clone(&prefs)).unwrap();
    let other = SyncBroker::activate(Arc::clone(&prefs)).unwrap();

    editing.edit_window_mode(WindowMode::Popup);
    other.set_language(Language::Zh);
    other.flush();

    assert_eq!(editing.view().window_mode, WindowMode::Popup);
    assert!(editing.has_deferred());

    let saved = editing.save().unwrap();
    assert_eq!(saved.window_mode, WindowMode::Popup);
    assert_eq!(saved.language, Language::Zh);
    assert_eq!(other.view(), saved);
}

/// Host with one tab whose page is driven by a `PageController`
struct OneTabHost {
    feed: Arc<LocationFeed>,
    page: Mutex<Option<PageController<Arc<MemoryStore>, Arc<LocationFeed>>>>,
}

impl TabHost for OneTabHost {
    fn active_tab(&self) -> Result<Option<Tab>> {
        Ok(Some(Tab {
            id: 1,
            url: Some(self.feed.current_url()),
        }))
    }

    fn navigate(&self, _tab_id: u64, url: &str) -> Result<()> {
        self.feed.navigate(url, appstore_switcher::NavigationKind::Load);
        Ok(())
    }

    fn send_switch_region(
        &self,
        _tab_id: u64,
        request: &SwitchRegionRequest,
        _timeout: Duration,
    ) -> Result<SwitchRegionResponse> {
        match self.page.lock().unwrap().as_ref() {
            Some(page) => Ok(page.handle_switch_region(request)),
            None => Err(appstore_switcher::Error::MessagingUnavailable(
                "no page listener".to_string(),
            )),
        }
    }
}

#[test]
fn test_panel_switches_page_through_message() {
    let prefs = shared_prefs();
    let _background = BackgroundController::start(Arc::clone(&prefs), true);
    let feed = Arc::new(LocationFeed::new("https://apps.apple.com/de/app/x/id123"));
    let timings = Timings::uniform(Duration::from_millis(500));
    let page = PageController::with_timings(Arc::clone(&prefs), Arc::clone(&feed), timings).unwrap();
    let host = Arc::new(OneTabHost {
        feed: Arc::clone(&feed),
        page: Mutex::new(Some(page)),
    });
    let panel = PanelController::with_timings(Arc::clone(&prefs), Arc::clone(&host), timings).unwrap();

    assert_eq!(panel.current_region(), "de");
    assert_eq!(
        panel.switch_region("us"),
        SwitchOutcome::Navigated("https://apps.apple.com/us/app/x/id123".to_string())
    );
    assert_eq!(feed.current_url(), "https://apps.apple.com/us/app/x/id123");

    let overlay = host.page.lock().unwrap().as_ref().unwrap().overlay();
    assert_eq!(overlay.selected.as_deref(), Some("us"));

    // page gone: the panel navigates the tab itself
    host.page.lock().unwrap().take();
    assert_eq!(
        panel.switch_region("jp"),
        SwitchOutcome::Navigated("https://apps.apple.com/jp/app/x/id123".to_string())
    );
    assert_eq!(feed.current_url(), "https://apps.apple.com/jp/app/x/id123");
}

#[test]
fn test_panel_preferences_reach_page_and_background() {
    let prefs = shared_prefs();
    let background = BackgroundController::start(Arc::clone(&prefs), true);
    let feed = Arc::new(LocationFeed::new("https://apps.apple.com/us/app/x/id1"));
    let page = PageController::attach(Arc::clone(&prefs), Arc::clone(&feed)).unwrap();
    let host = Arc::new(OneTabHost {
        feed: Arc::clone(&feed),
        page: Mutex::new(None),
    });
    let panel = PanelController::open(Arc::clone(&prefs), host).unwrap();

    panel.set_language(Language::Zh);
    panel.toggle_pin("kr").unwrap();
    panel.flush();
    assert_eq!(page.overlay().title, "App Store 区域");
    assert!(page.settings().is_favorite("kr"));

    panel.set_window_mode(WindowMode::Popup);
    panel.set_overlay_enabled(false);
    assert_eq!(background.primary_surface(), Surface::SidePanel);
    panel.save().unwrap();
    assert_eq!(background.primary_surface(), Surface::Popup);
    assert!(!page.overlay().visible);
}
