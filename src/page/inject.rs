//! Page-level instrumentation injector.
//!
//! Wraps three realm globals behind transparent proxies: the cookie write
//! accessor, the fetch primitive, and the XHR open primitive. Each wrapper
//! preserves the original's behavior exactly and additionally broadcasts a
//! [`PageEvent`] on the realm's same-origin channel. This path observes only
//! the writes it can instrument; the polling differ remains the ground
//! truth, and both may fire for the same underlying write.

use crate::page::realm::{PageEvent, PageEventKind, PageRealm, RequestFn, SetCookieFn};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Which hooks ended up installed. Partial instrumentation is acceptable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub cookie_hook: bool,
    pub fetch_hook: bool,
    pub xhr_hook: bool,
}

/// Install the instrumentation hooks into a realm.
///
/// Idempotent in effect: a second call finds the hooks already wrapped and
/// installs nothing, so a single write never produces a doubled broadcast.
/// A non-configurable cookie accessor is skipped silently.
pub fn install(realm: &PageRealm) -> InstallReport {
    if realm.hooks_installed.swap(true, Ordering::SeqCst) {
        tracing::trace!("instrumentation already installed, skipping");
        return InstallReport::default();
    }

    let mut report = InstallReport::default();

    if realm.cookie_configurable {
        let mut slot = realm
            .cookie_setter
            .write()
            .unwrap_or_else(|e| e.into_inner());
        let original: SetCookieFn = slot.clone();
        let events = realm.events.clone();

        *slot = Arc::new(move |realm, line| {
            let _ = events.send(PageEvent::now(PageEventKind::CookieSet));
            original(realm, line);
        });
        report.cookie_hook = true;
    } else {
        tracing::debug!(hook = "cookie", "accessor not configurable, hook skipped");
    }

    {
        let mut slot = realm.fetch_fn.write().unwrap_or_else(|e| e.into_inner());
        *slot = wrap_request(slot.clone(), realm, PageEventKind::FetchCookieSet);
        report.fetch_hook = true;
    }

    {
        let mut slot = realm.xhr_open_fn.write().unwrap_or_else(|e| e.into_inner());
        *slot = wrap_request(slot.clone(), realm, PageEventKind::XhrCookieSet);
        report.xhr_hook = true;
    }

    tracing::debug!(?report, "instrumentation installed");
    report
}

/// Proxy a request primitive: same request, same response, plus a broadcast
/// when the response carried a Set-Cookie header.
fn wrap_request(original: RequestFn, realm: &PageRealm, kind: PageEventKind) -> RequestFn {
    let events = realm.events.clone();
    Arc::new(move |realm, request_url| {
        let response = original(realm, request_url);
        if response.set_cookie.is_some() {
            let _ = events.send(PageEvent::now(kind));
        }
        response
    })
}
