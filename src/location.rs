//! Page location observation

use crate::hub::{ListenerHub, Subscription};
use parking_lot::Mutex;

/// How the page location changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// A new history entry was pushed by the page
    Push,
    /// The current history entry was replaced
    Replace,
    /// The user moved through history
    Pop,
    /// Only the fragment changed
    Hash,
    /// The page became visible again; the URL may be unchanged
    Visible,
    /// A full navigation requested through [`Navigator::assign`]
    Load,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationChange {
    pub url: String,
    pub kind: NavigationKind,
}

pub type LocationListener = Box<dyn Fn(&LocationChange) + Send + Sync>;

/// Source of location-changed events for one page
pub trait LocationObserver: Send + Sync {
    fn current_url(&self) -> String;

    fn observe(&self, listener: LocationListener) -> Subscription;
}

/// Programmatic navigation of the page
pub trait Navigator: Send + Sync {
    fn assign(&self, url: &str);
}

/// In-process [`LocationObserver`] driven by explicit navigation calls
pub struct LocationFeed {
    url: Mutex<String>,
    hub: ListenerHub<LocationChange>,
}

impl LocationFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Mutex::new(url.into()),
            hub: ListenerHub::new(),
        }
    }

    /// Move to `url` and notify observers
    ///
    /// History and hash navigations that leave the URL unchanged are not
    /// reported. [`NavigationKind::Visible`] is always reported.
    pub fn navigate(&self, url: impl Into<String>, kind: NavigationKind) -> bool {
        let url = url.into();
        {
            let mut current = self.url.lock();
            if *current == url && kind != NavigationKind::Visible {
                return false;
            }
            current.clone_from(&url);
        }
        tracing::debug!(%url, ?kind, "location changed");
        self.hub.emit(&LocationChange { url, kind });
        true
    }
}

impl LocationObserver for LocationFeed {
    fn current_url(&self) -> String {
        self.url.lock().clone()
    }

    fn observe(&self, listener: LocationListener) -> Subscription {
        self.hub.subscribe_boxed(listener)
    }
}

impl Navigator for LocationFeed {
    fn assign(&self, url: &str) {
        self.navigate(url, NavigationKind::Load);
    }
}

impl<L: LocationObserver + ?Sized> LocationObserver for std::sync::Arc<L> {
    fn current_url(&self) -> String {
        (**self).current_url()
    }

    fn observe(&self, listener: LocationListener) -> Subscription {
        (**self).observe(listener)
    }
}

impl<N: Navigator + ?Sized> Navigator for std::sync::Arc<N> {
    fn assign(&self, url: &str) {
        (**self).assign(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_unchanged_url_is_not_reported() {
        let feed = LocationFeed::new("https://apps.apple.com/us/app/x/id1");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = feed.observe(Box::new(move |change: &LocationChange| {
            sink.lock().push(change.kind)
        }));

        assert!(!feed.navigate("https://apps.apple.com/us/app/x/id1", NavigationKind::Push));
        assert!(feed.navigate("https://apps.apple.com/us/app/y/id2", NavigationKind::Push));
        assert!(feed.navigate("https://apps.apple.com/us/app/y/id2", NavigationKind::Visible));

        assert_eq!(*seen.lock(), vec![NavigationKind::Push, NavigationKind::Visible]);
        assert_eq!(feed.current_url(), "https://apps.apple.com/us/app/y/id2");
    }
}
