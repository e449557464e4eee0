//! # cookiewatch
//!
//! A browser-extension-inspired cookie inspection and monitoring library.
//!
//! `cookiewatch` models the moving parts of a cookie-viewer extension as
//! explicit Rust components: a per-page polling monitor over the visible
//! cookie jar, best-effort page instrumentation, a revocable messaging
//! boundary, and a long-lived background relay that keeps a per-tab badge
//! current and answers queries against the authoritative cookie store.
//!
//! ## Architecture
//!
//! Three isolated execution contexts communicate only by message passing:
//!
//! | Context | Component | Responsibility |
//! |---------|-----------|----------------|
//! | page realm | [`page::PageRealm`] + [`page::install`] | cookie accessor, request hooks, same-origin broadcast |
//! | content script | [`monitor::CookieMonitor`] | polling differ, notifier, lifecycle guard |
//! | background | [`relay::CookieRelay`] | derived badge counter, store queries, settings |
//!
//! The host may destroy the content script's messaging channel at any time,
//! independent of the page itself. The monitor treats that as its canonical
//! terminal state: the first send that fails with context invalidation
//! tears down polling and listening, idempotently, and nothing fires again.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cookiewatch::monitor::{CookieMonitor, MonitorConfig};
//! use cookiewatch::page::PageRealm;
//! use cookiewatch::relay::{CookieRelay, MemorySettings, NullBadge};
//! use cookiewatch::cookies::MemoryCookieStore;
//! use cookiewatch::base::tabs::{MemoryTabs, TabId};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let relay = CookieRelay::new(
//!         Arc::new(MemoryCookieStore::new()),
//!         Arc::new(MemoryTabs::new()),
//!         Arc::new(NullBadge),
//!         Arc::new(MemorySettings::new()),
//!     );
//!     let handle = relay.spawn();
//!
//!     let realm = PageRealm::new("https://example.com/".parse().unwrap());
//!     let port = handle.port_for_tab(TabId(1));
//!     let monitor = CookieMonitor::spawn(realm, Arc::new(port), MonitorConfig::default());
//!
//!     // ... page mutates cookies; the relay's badge follows ...
//!     monitor.teardown();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Core types and error definitions
//! - [`cookies`] - Cookie records, parsing, and the storage boundary
//! - [`monitor`] - Differ, lifecycle guard, and cross-boundary notifier
//! - [`page`] - Simulated page realm and instrumentation injector
//! - [`relay`] - Background relay, badge policy, and settings
//! - [`viewer`] - Popup filtering, stats, and export

pub mod base;
pub mod cookies;
pub mod monitor;
pub mod page;
pub mod relay;
pub mod viewer;
