//! Tab identity and lookup.
//!
//! The host environment owns the real tab list; this module defines the
//! boundary the relay queries plus an in-memory implementation for tests
//! and embedding.

use dashmap::DashMap;
use std::fmt;
use url::Url;

/// Identifies a browser tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the relay needs to know about a tab.
#[derive(Debug, Clone)]
pub struct TabInfo {
    pub id: TabId,
    pub url: Option<Url>,
    pub title: Option<String>,
}

/// Schemes whose tabs never show a badge count.
const PRIVILEGED_SCHEMES: &[&str] = &["chrome", "chrome-extension"];

/// Whether a URL belongs to a privileged page (browser-internal or
/// extension pages). The badge is always cleared for these.
pub fn is_privileged_url(url: &Url) -> bool {
    PRIVILEGED_SCHEMES.contains(&url.scheme())
}

/// Lookup boundary for tab state.
pub trait TabRegistry: Send + Sync {
    /// Resolve a tab id. `None` if the tab is gone.
    fn get(&self, tab: TabId) -> Option<TabInfo>;

    /// The currently focused tab, if any.
    fn active(&self) -> Option<TabInfo>;
}

/// In-memory tab registry.
pub struct MemoryTabs {
    tabs: DashMap<TabId, TabInfo>,
    active: DashMap<(), TabId>,
}

impl Default for MemoryTabs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTabs {
    pub fn new() -> Self {
        Self {
            tabs: DashMap::new(),
            active: DashMap::new(),
        }
    }

    pub fn insert(&self, info: TabInfo) {
        self.tabs.insert(info.id, info);
    }

    pub fn set_active(&self, tab: TabId) {
        self.active.insert((), tab);
    }

    pub fn remove(&self, tab: TabId) {
        self.tabs.remove(&tab);
    }
}

impl TabRegistry for MemoryTabs {
    fn get(&self, tab: TabId) -> Option<TabInfo> {
        self.tabs.get(&tab).map(|t| t.clone())
    }

    fn active(&self) -> Option<TabInfo> {
        let id = *self.active.get(&())?;
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privileged_urls() {
        assert!(is_privileged_url(
            &Url::parse("chrome://settings").unwrap()
        ));
        assert!(is_privileged_url(
            &Url::parse("chrome-extension://abcdef/popup.html").unwrap()
        ));
        assert!(!is_privileged_url(&Url::parse("https://example.com").unwrap()));
        assert!(!is_privileged_url(&Url::parse("http://localhost:8080").unwrap()));
    }

    #[test]
    fn test_memory_tabs_lookup() {
        let tabs = MemoryTabs::new();
        tabs.insert(TabInfo {
            id: TabId(7),
            url: Some(Url::parse("https://example.com").unwrap()),
            title: Some("Example".into()),
        });
        tabs.set_active(TabId(7));

        assert_eq!(tabs.get(TabId(7)).unwrap().id, TabId(7));
        assert!(tabs.get(TabId(8)).is_none());
        assert_eq!(tabs.active().unwrap().id, TabId(7));

        tabs.remove(TabId(7));
        assert!(tabs.get(TabId(7)).is_none());
    }
}
