//! Badge display boundary and policy.
//!
//! The badge is a derived counter: purely cosmetic, recomputed from the
//! authoritative store on every refresh and never used as a source of
//! truth.

use crate::base::tabs::TabId;
use dashmap::DashMap;

/// Badge background when the tab has cookies.
pub const BADGE_ACTIVE_COLOR: &str = "#4CAF50";

/// Badge background when it doesn't.
pub const BADGE_IDLE_COLOR: &str = "#757575";

/// The text shown for a given cookie count. Zero shows nothing.
pub fn badge_text(count: usize) -> String {
    if count > 0 {
        count.to_string()
    } else {
        String::new()
    }
}

/// Trait for the host badge surface.
pub trait BadgeSurface: Send + Sync {
    fn set_text(&self, tab: TabId, text: &str);
    fn set_color(&self, tab: TabId, color: &str);
}

/// Badge surface that discards everything.
#[derive(Debug, Default)]
pub struct NullBadge;

impl BadgeSurface for NullBadge {
    fn set_text(&self, _tab: TabId, _text: &str) {}
    fn set_color(&self, _tab: TabId, _color: &str) {}
}

/// Badge surface that remembers the last text and color per tab.
#[derive(Debug, Default)]
pub struct RecordingBadge {
    texts: DashMap<TabId, String>,
    colors: DashMap<TabId, String>,
}

impl RecordingBadge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, tab: TabId) -> Option<String> {
        self.texts.get(&tab).map(|t| t.clone())
    }

    pub fn color(&self, tab: TabId) -> Option<String> {
        self.colors.get(&tab).map(|c| c.clone())
    }
}

impl BadgeSurface for RecordingBadge {
    fn set_text(&self, tab: TabId, text: &str) {
        self.texts.insert(tab, text.to_string());
    }

    fn set_color(&self, tab: TabId, color: &str) {
        self.colors.insert(tab, color.to_string());
    }
}
