//! Content-script-side cookie monitoring.
//!
//! A [`CookieMonitor`] is the explicit per-page context object: it owns a
//! polling [`SnapshotDiffer`](differ::SnapshotDiffer) over the page's
//! visible jar, a listener on the realm's same-origin broadcast, and a
//! [`ChangeNotifier`](notifier::ChangeNotifier) that forwards both paths to
//! the background relay. A single [`LifecycleGuard`](guard::LifecycleGuard)
//! owns every timer and listener and is the only thing that stops them:
//! page unload, channel invalidation, and explicit teardown all converge on
//! it, and all of them are safe to trigger more than once.

pub mod channel;
pub mod differ;
pub mod guard;
pub mod notifier;

pub use channel::{Ack, ChangeNotice, MessageChannel, SendError, Sending};
pub use differ::SnapshotDiffer;
pub use guard::{LifecycleGuard, Subscription};
pub use notifier::{ChangeNotifier, ChannelError};

use crate::cookies::parse::parse_document_cookies;
use crate::cookies::record::CookieRecord;
use crate::page::{self, InstallReport, PageEvent, PageInfo, PageRealm};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

/// Monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// How often the differ re-reads the visible jar.
    pub poll_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// A request arriving over the runtime message listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRequest {
    /// The cookies visible to the page, parsed client-side.
    DocumentCookies,
    /// Location and title summary of the page.
    PageInfo,
    /// Install the page-level instrumentation hooks.
    InstallInstrumentation,
}

/// Reply to an [`AgentRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum AgentResponse {
    DocumentCookies(Vec<CookieRecord>),
    PageInfo(PageInfo),
    Installed(InstallReport),
}

/// Per-page monitor context.
pub struct CookieMonitor {
    realm: Arc<PageRealm>,
    notifier: Arc<ChangeNotifier>,
    guard: LifecycleGuard,
}

impl CookieMonitor {
    /// Start monitoring a page realm, forwarding changes over `channel`.
    ///
    /// Spawns the poll loop and the injected-event listener; both are owned
    /// by the returned monitor's guard and stop on the first teardown.
    pub fn spawn(
        realm: Arc<PageRealm>,
        channel: Arc<dyn MessageChannel>,
        config: MonitorConfig,
    ) -> Self {
        let guard = LifecycleGuard::new();
        let notifier = Arc::new(ChangeNotifier::new(channel, guard.clone()));

        let poll_task = tokio::spawn(poll_loop(
            Arc::clone(&realm),
            Arc::clone(&notifier),
            guard.clone(),
            config.poll_interval,
        ));
        guard.register(Subscription::for_task("poll timer", &poll_task));

        let events = realm.subscribe_events();
        let listener_task = tokio::spawn(event_loop(
            Arc::clone(&realm),
            events,
            Arc::clone(&notifier),
            guard.clone(),
        ));
        guard.register(Subscription::for_task("page event listener", &listener_task));

        Self {
            realm,
            notifier,
            guard,
        }
    }

    pub fn guard(&self) -> LifecycleGuard {
        self.guard.clone()
    }

    pub fn is_active(&self) -> bool {
        !self.guard.is_torn_down()
    }

    pub fn notifier(&self) -> &Arc<ChangeNotifier> {
        &self.notifier
    }

    /// Stop polling and listening. Safe to call any number of times.
    pub fn teardown(&self) {
        self.guard.teardown();
    }

    /// Serve a pull request from the popup or background.
    ///
    /// After teardown the listener is gone: requests produce `None` and no
    /// other observable effect.
    pub fn handle_request(&self, request: AgentRequest) -> Option<AgentResponse> {
        if self.guard.is_torn_down() {
            return None;
        }

        Some(match request {
            AgentRequest::DocumentCookies => AgentResponse::DocumentCookies(
                parse_document_cookies(
                    &self.realm.cookie_string(),
                    self.realm.hostname(),
                    self.realm.is_secure(),
                ),
            ),
            AgentRequest::PageInfo => AgentResponse::PageInfo(self.realm.page_info()),
            AgentRequest::InstallInstrumentation => {
                AgentResponse::Installed(page::install(&self.realm))
            }
        })
    }
}

/// Primary detection path: fixed-period polling of the visible jar.
async fn poll_loop(
    realm: Arc<PageRealm>,
    notifier: Arc<ChangeNotifier>,
    guard: LifecycleGuard,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut unload = realm.subscribe_unload();
    let mut differ = SnapshotDiffer::new(realm.cookie_string());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Teardown may have raced the timer firing
                if guard.is_torn_down() {
                    break;
                }

                if let Some((previous, current)) = differ.tick(&realm.cookie_string()) {
                    tracing::debug!(url = %realm.url(), "visible cookie jar changed");
                    let notice = ChangeNotice::SnapshotChanged {
                        url: Some(realm.url().to_string()),
                        previous,
                        current,
                    };
                    if let Err(ChannelError::ContextInvalidated) = notifier.notify(notice).await {
                        break;
                    }
                }
            }
            changed = unload.changed() => {
                if changed.is_err() || *unload.borrow() {
                    tracing::debug!(url = %realm.url(), "page unloading, stopping monitor");
                    guard.teardown();
                    break;
                }
            }
        }
    }
}

/// Secondary detection path: re-forward same-origin broadcasts from the
/// injected hooks. Observes a strict subset of what polling sees.
async fn event_loop(
    realm: Arc<PageRealm>,
    mut events: broadcast::Receiver<PageEvent>,
    notifier: Arc<ChangeNotifier>,
    guard: LifecycleGuard,
) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::trace!(missed, "page event listener lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        if guard.is_torn_down() {
            break;
        }

        let notice = ChangeNotice::CookieActivity {
            url: Some(realm.url().to_string()),
            event,
        };
        if let Err(ChannelError::ContextInvalidated) = notifier.notify(notice).await {
            break;
        }
    }
}
