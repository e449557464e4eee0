//! The background relay/aggregator.
//!
//! A [`CookieRelay`] is the long-lived singleton on the far side of the
//! messaging boundary. Any number of per-tab monitors feed it change
//! notices through [`RelayPort`]s; it keeps a per-tab derived counter and
//! badge current, and answers pull queries against the authoritative
//! cookie store. Duplicate notices for the same underlying write are
//! harmless: the badge is recomputed from the store, not accumulated.

pub mod badge;
pub mod settings;

pub use badge::{badge_text, BadgeSurface, NullBadge, RecordingBadge, BADGE_ACTIVE_COLOR, BADGE_IDLE_COLOR};
pub use settings::{MemorySettings, Settings, SettingsStore};

use crate::base::tabs::{is_privileged_url, TabId, TabRegistry};
use crate::base::WatchError;
use crate::cookies::record::{CookieKey, CookieRecord};
use crate::cookies::store::{CookieStore, StoreQuery};
use crate::monitor::channel::{Ack, ChangeNotice, MessageChannel, SendError, Sending};
use crate::viewer::CookieExport;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use url::Url;

/// Notice queue depth. Senders briefly backpressure past this; delivery
/// stays at-most-once either way.
const NOTICE_QUEUE_DEPTH: usize = 32;

struct Envelope {
    tab: TabId,
    notice: ChangeNotice,
    ack: oneshot::Sender<Ack>,
}

/// Background cookie relay.
pub struct CookieRelay {
    store: Arc<dyn CookieStore>,
    tabs: Arc<dyn TabRegistry>,
    badge: Arc<dyn BadgeSurface>,
    settings: Arc<dyn SettingsStore>,
    notice_counts: DashMap<TabId, u64>,
}

impl CookieRelay {
    pub fn new(
        store: Arc<dyn CookieStore>,
        tabs: Arc<dyn TabRegistry>,
        badge: Arc<dyn BadgeSurface>,
        settings: Arc<dyn SettingsStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            tabs,
            badge,
            settings,
            notice_counts: DashMap::new(),
        })
    }

    /// Start the relay loop. Monitors connect through
    /// [`RelayHandle::port_for_tab`].
    pub fn spawn(self: &Arc<Self>) -> RelayHandle {
        let (tx, mut rx) = mpsc::channel::<Envelope>(NOTICE_QUEUE_DEPTH);
        let relay = Arc::clone(self);

        let task = tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                relay.on_notice(envelope.tab, &envelope.notice).await;
                // Receiver may have given up waiting; that's their loss
                let _ = envelope.ack.send(Ack);
            }
        });

        RelayHandle { tx, task }
    }

    async fn on_notice(&self, tab: TabId, notice: &ChangeNotice) {
        *self.notice_counts.entry(tab).or_insert(0) += 1;
        tracing::debug!(tab = %tab, url = ?notice.url(), "cookie change notice");
        self.update_badge(tab).await;
    }

    /// How many notices this tab's monitors have delivered.
    pub fn notice_count(&self, tab: TabId) -> u64 {
        self.notice_counts.get(&tab).map(|c| *c).unwrap_or(0)
    }

    /// All cookies relevant to a URL: the domain query's superset merged
    /// with the URL query, deduplicated by `(name, domain, path)`.
    pub async fn cookies_for_url(&self, url: &Url) -> Result<Vec<CookieRecord>, WatchError> {
        let host = url.host_str().unwrap_or("").to_string();

        let domain_cookies = self.store.get_all(StoreQuery::by_domain(host)).await?;
        let url_cookies = self.store.get_all(StoreQuery::by_url(url.clone())).await?;

        let mut order: Vec<CookieKey> = Vec::new();
        let mut merged: HashMap<CookieKey, CookieRecord> = HashMap::new();
        for cookie in domain_cookies.into_iter().chain(url_cookies) {
            let key = cookie.key();
            if !merged.contains_key(&key) {
                order.push(key.clone());
            }
            merged.insert(key, cookie);
        }

        Ok(order.into_iter().filter_map(|k| merged.remove(&k)).collect())
    }

    /// Cookie count for a URL; zero when the store query fails.
    pub async fn cookie_count_for_url(&self, url: &Url) -> usize {
        match self.cookies_for_url(url).await {
            Ok(cookies) => cookies.len(),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "cookie count query failed");
                0
            }
        }
    }

    /// Remove every cookie under a domain. Individual removal failures are
    /// logged and skipped; returns how many were actually cleared.
    pub async fn clear_domain(&self, domain: &str) -> Result<usize, WatchError> {
        let cookies = self.store.get_all(StoreQuery::by_domain(domain)).await?;
        let mut cleared = 0;

        for cookie in cookies {
            let scheme = if cookie.secure { "https" } else { "http" };
            let target = format!(
                "{scheme}://{}{}",
                cookie.domain.trim_start_matches('.'),
                cookie.path
            );
            let url = match Url::parse(&target) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(cookie = %cookie.name, error = %e, "unremovable cookie");
                    continue;
                }
            };

            match self.store.remove(&url, &cookie.name).await {
                Ok(true) => cleared += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(cookie = %cookie.name, error = %e, "failed to remove cookie");
                }
            }
        }

        Ok(cleared)
    }

    /// Export everything relevant to a URL for download.
    pub async fn export_cookies(&self, url: &Url) -> Result<CookieExport, WatchError> {
        Ok(CookieExport::new(url.as_str(), self.cookies_for_url(url).await?))
    }

    /// Recompute the badge for one tab from authoritative state.
    pub async fn update_badge(&self, tab: TabId) {
        let url = self.tabs.get(tab).and_then(|info| info.url);

        let url = match url {
            Some(url) if !is_privileged_url(&url) => url,
            // Gone tabs and privileged pages get a cleared badge
            _ => {
                self.badge.set_text(tab, "");
                return;
            }
        };

        let count = self.cookie_count_for_url(&url).await;
        self.badge.set_text(tab, &badge_text(count));
        self.badge.set_color(
            tab,
            if count > 0 {
                BADGE_ACTIVE_COLOR
            } else {
                BADGE_IDLE_COLOR
            },
        );
    }

    /// Refresh the badge of whichever tab is focused.
    pub async fn update_badge_for_active_tab(&self) {
        if let Some(info) = self.tabs.active() {
            self.update_badge(info.id).await;
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings.load()
    }

    pub fn save_settings(&self, settings: Settings) {
        self.settings.store(settings);
    }
}

/// Running relay loop plus the connection point for monitors.
pub struct RelayHandle {
    tx: mpsc::Sender<Envelope>,
    task: JoinHandle<()>,
}

impl RelayHandle {
    /// A send channel bound to one tab. Cheap to clone.
    pub fn port_for_tab(&self, tab: TabId) -> RelayPort {
        RelayPort {
            tab,
            tx: self.tx.clone(),
            revoked: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop the relay loop. Outstanding sends fail as unavailable.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

/// Per-tab send half of the messaging boundary.
///
/// The host may revoke a port at any time, independent of the page's own
/// lifecycle; a revoked port fails every send with context invalidation.
#[derive(Clone)]
pub struct RelayPort {
    tab: TabId,
    tx: mpsc::Sender<Envelope>,
    revoked: Arc<AtomicBool>,
}

impl RelayPort {
    pub fn tab(&self) -> TabId {
        self.tab
    }

    /// Permanently invalidate this port, as the host does when it tears
    /// down a content script's messaging capability.
    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::SeqCst);
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::SeqCst)
    }
}

impl MessageChannel for RelayPort {
    fn send(&self, notice: ChangeNotice) -> Sending {
        let tab = self.tab;
        let tx = self.tx.clone();
        let revoked = Arc::clone(&self.revoked);

        Box::pin(async move {
            if revoked.load(Ordering::SeqCst) {
                return Err(SendError::ContextInvalidated);
            }

            let (ack_tx, ack_rx) = oneshot::channel();
            tx.send(Envelope {
                tab,
                notice,
                ack: ack_tx,
            })
            .await
            .map_err(|_| SendError::NoReceiver)?;

            ack_rx.await.map_err(|_| SendError::NoReceiver)
        })
    }
}
