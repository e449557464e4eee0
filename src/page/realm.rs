//! Simulated page execution realm.
//!
//! A [`PageRealm`] stands in for the page's own JavaScript realm: it owns
//! the visible cookie-jar string, the cookie write accessor, and the fetch
//! and XHR request primitives, and it carries the realm-scoped transports
//! (same-origin broadcast, unload signal) that bridge back into the
//! content-script context. Instrumentation (see [`super::inject`]) swaps
//! the accessor and request slots for transparent wrappers.

use crate::cookies::parse::visible_cookie_count;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, RwLock};
use time::OffsetDateTime;
use tokio::sync::{broadcast, watch};
use url::Url;

/// Event kind broadcast by an instrumentation hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEventKind {
    /// A write went through the cookie accessor.
    CookieSet,
    /// A fetch response carried a Set-Cookie header.
    FetchCookieSet,
    /// An XHR response carried a Set-Cookie header.
    XhrCookieSet,
}

/// A same-origin broadcast message from the injected hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEvent {
    pub kind: PageEventKind,
    pub timestamp: OffsetDateTime,
}

impl PageEvent {
    pub fn now(kind: PageEventKind) -> Self {
        Self {
            kind,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// Outcome of a simulated network request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub url: String,
    pub set_cookie: Option<String>,
}

/// Summary of the page, served to the popup on request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub url: String,
    pub hostname: String,
    pub protocol: String,
    pub pathname: String,
    pub title: String,
    pub cookie_count: usize,
}

pub(crate) type SetCookieFn = Arc<dyn Fn(&PageRealm, &str) + Send + Sync>;
pub(crate) type RequestFn = Arc<dyn Fn(&PageRealm, &str) -> PageResponse + Send + Sync>;

/// Broadcast capacity for page events. Listeners that lag simply lose
/// events; the path is best-effort.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// One page's execution realm.
pub struct PageRealm {
    url: Url,
    title: RwLock<String>,
    jar: Mutex<String>,

    pub(crate) cookie_configurable: bool,
    pub(crate) cookie_setter: RwLock<SetCookieFn>,
    pub(crate) fetch_fn: RwLock<RequestFn>,
    pub(crate) xhr_open_fn: RwLock<RequestFn>,
    pub(crate) hooks_installed: AtomicBool,
    pub(crate) events: broadcast::Sender<PageEvent>,

    /// Canned Set-Cookie headers by request URL, for the simulated network.
    responses: DashMap<String, Option<String>>,

    unload: watch::Sender<bool>,
}

impl PageRealm {
    pub fn new(url: Url) -> Arc<Self> {
        Self::build(url, true)
    }

    /// A realm whose cookie accessor descriptor is not configurable; the
    /// injector must skip that hook.
    pub fn with_locked_accessor(url: Url) -> Arc<Self> {
        Self::build(url, false)
    }

    fn build(url: Url, cookie_configurable: bool) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (unload, _) = watch::channel(false);

        Arc::new(Self {
            url,
            title: RwLock::new(String::new()),
            jar: Mutex::new(String::new()),
            cookie_configurable,
            cookie_setter: RwLock::new(Arc::new(PageRealm::native_set_cookie)),
            fetch_fn: RwLock::new(Arc::new(PageRealm::native_request)),
            xhr_open_fn: RwLock::new(Arc::new(PageRealm::native_request)),
            hooks_installed: AtomicBool::new(false),
            events,
            responses: DashMap::new(),
            unload,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or("")
    }

    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "https"
    }

    pub fn set_title(&self, title: impl Into<String>) {
        *self.title.write().unwrap_or_else(|e| e.into_inner()) = title.into();
    }

    /// The serialized jar visible to this page right now. Always succeeds;
    /// may be empty.
    pub fn cookie_string(&self) -> String {
        self.jar.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Write through the (possibly wrapped) cookie accessor.
    pub fn document_set_cookie(&self, line: &str) {
        let setter = self
            .cookie_setter
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        setter(self, line);
    }

    /// Issue a request through the (possibly wrapped) fetch primitive.
    pub fn fetch(&self, request_url: &str) -> PageResponse {
        let f = self
            .fetch_fn
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        f(self, request_url)
    }

    /// Issue a request through the (possibly wrapped) XHR open primitive.
    pub fn xhr_open(&self, request_url: &str) -> PageResponse {
        let f = self
            .xhr_open_fn
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        f(self, request_url)
    }

    /// Prime the simulated network with a response for `request_url`.
    pub fn prime_response(&self, request_url: impl Into<String>, set_cookie: Option<&str>) {
        self.responses
            .insert(request_url.into(), set_cookie.map(str::to_string));
    }

    /// Subscribe to same-origin broadcasts from the injected hooks.
    pub fn subscribe_events(&self) -> broadcast::Receiver<PageEvent> {
        self.events.subscribe()
    }

    /// Subscribe to the page unload signal.
    pub fn subscribe_unload(&self) -> watch::Receiver<bool> {
        self.unload.subscribe()
    }

    /// Signal page unload. Listeners tear their monitors down.
    pub fn unload(&self) {
        let _ = self.unload.send(true);
    }

    pub fn page_info(&self) -> PageInfo {
        PageInfo {
            url: self.url.to_string(),
            hostname: self.hostname().to_string(),
            protocol: format!("{}:", self.url.scheme()),
            pathname: self.url.path().to_string(),
            title: self.title.read().unwrap_or_else(|e| e.into_inner()).clone(),
            cookie_count: visible_cookie_count(&self.cookie_string()),
        }
    }

    /// The unwrapped cookie accessor: applies a `name=value; attrs` write
    /// to the visible jar the way `document.cookie` does. Only the visible
    /// string is maintained; a write whose expiry has already elapsed
    /// removes the name.
    fn native_set_cookie(realm: &PageRealm, line: &str) {
        let parsed = match cookie::Cookie::parse(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unparseable cookie write");
                return;
            }
        };

        let name = parsed.name().to_string();
        let expired = parsed
            .expires()
            .and_then(|e| e.datetime())
            .map(|t| t < OffsetDateTime::now_utc())
            .unwrap_or(false)
            || parsed
                .max_age()
                .map(|d| d.is_zero() || d.is_negative())
                .unwrap_or(false);

        let mut jar = realm.jar.lock().unwrap_or_else(|e| e.into_inner());
        let mut pairs: Vec<(String, String)> = jar
            .split(';')
            .filter_map(|p| {
                let p = p.trim();
                let (n, v) = p.split_once('=')?;
                Some((n.trim().to_string(), v.to_string()))
            })
            .collect();

        pairs.retain(|(n, _)| n != &name);
        if !expired {
            pairs.push((name, parsed.value().to_string()));
        }

        *jar = pairs
            .iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect::<Vec<_>>()
            .join("; ");
    }

    /// The unwrapped request primitive: consults the canned response table
    /// and applies any Set-Cookie header directly to the jar, bypassing the
    /// cookie accessor the way real network writes do.
    fn native_request(realm: &PageRealm, request_url: &str) -> PageResponse {
        let set_cookie = realm
            .responses
            .get(request_url)
            .and_then(|r| r.value().clone());

        if let Some(header) = &set_cookie {
            PageRealm::native_set_cookie(realm, header);
        }

        PageResponse {
            url: request_url.to_string(),
            set_cookie,
        }
    }
}
