//! The authoritative cookie-storage boundary.
//!
//! The host environment (the `chrome.cookies` surface, in the real
//! extension) owns ground truth; this module defines the trait the relay
//! pulls from plus [`MemoryCookieStore`], an in-memory implementation with
//! RFC 6265 domain and path matching.

use crate::base::WatchError;
use crate::cookies::record::CookieRecord;
use dashmap::DashMap;
use std::{future::Future, pin::Pin, sync::Arc};
use time::OffsetDateTime;
use url::Url;

/// Filter for a storage query. Domain queries return a superset that may
/// include path-scoped duplicates; callers deduplicate by
/// [`CookieKey`](crate::cookies::record::CookieKey).
#[derive(Debug, Clone, Default)]
pub struct StoreQuery {
    pub domain: Option<String>,
    pub url: Option<Url>,
}

impl StoreQuery {
    pub fn by_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            url: None,
        }
    }

    pub fn by_url(url: Url) -> Self {
        Self {
            domain: None,
            url: Some(url),
        }
    }
}

/// Alias for the `Future` type returned by store queries.
pub type Fetching = Pin<Box<dyn Future<Output = Result<Vec<CookieRecord>, WatchError>> + Send>>;

/// Alias for the `Future` type returned by store removals.
pub type Removing = Pin<Box<dyn Future<Output = Result<bool, WatchError>> + Send>>;

/// Trait for authoritative cookie storage.
///
/// Uses `&self` and boxed futures for trait-object compatibility, the same
/// shape as a host-API binding would have.
pub trait CookieStore: Send + Sync {
    /// All cookies matching the query. Unlike client-visible parsing this
    /// includes HTTP-only cookies.
    fn get_all(&self, query: StoreQuery) -> Fetching;

    /// Remove the cookie with `name` that applies to `url`. Resolves to
    /// whether anything was removed.
    fn remove(&self, url: &Url, name: &str) -> Removing;

    /// Insert a cookie, replacing any existing cookie with the same
    /// `(name, domain, path)` key.
    fn set(&self, record: CookieRecord);
}

/// Blanket implementation for Arc-wrapped stores.
impl<S: CookieStore + ?Sized> CookieStore for Arc<S> {
    fn get_all(&self, query: StoreQuery) -> Fetching {
        (**self).get_all(query)
    }

    fn remove(&self, url: &Url, name: &str) -> Removing {
        (**self).remove(url, name)
    }

    fn set(&self, record: CookieRecord) {
        (**self).set(record)
    }
}

/// In-memory cookie store.
///
/// Store shape follows Chromium's `CookieMonster`: a concurrent map from
/// domain to that domain's cookies.
pub struct MemoryCookieStore {
    store: DashMap<String, Vec<CookieRecord>>,
}

impl Default for MemoryCookieStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self {
            store: DashMap::new(),
        }
    }

    pub fn total_cookie_count(&self) -> usize {
        self.store.iter().map(|e| e.value().len()).sum()
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    fn domain_key(domain: &str) -> String {
        domain.trim_start_matches('.').to_lowercase()
    }

    /// Check if cookie domain matches request host.
    /// Implements RFC 6265 domain matching.
    fn domain_matches(cookie_domain: &str, request_host: &str, host_only: bool) -> bool {
        if host_only {
            // Host-only cookie: exact match required
            return cookie_domain.eq_ignore_ascii_case(request_host);
        }

        let cookie_domain = cookie_domain.trim_start_matches('.');

        if request_host.eq_ignore_ascii_case(cookie_domain) {
            return true;
        }

        // Check if request_host ends with .cookie_domain
        if request_host.len() > cookie_domain.len() {
            let suffix = &request_host[request_host.len() - cookie_domain.len()..];
            if suffix.eq_ignore_ascii_case(cookie_domain) {
                let char_before = request_host
                    .chars()
                    .nth(request_host.len() - cookie_domain.len() - 1);
                return char_before == Some('.');
            }
        }

        false
    }

    /// Check if request path matches cookie path.
    /// Implements RFC 6265 path matching.
    fn path_matches(cookie_path: &str, request_path: &str) -> bool {
        if request_path == cookie_path {
            return true;
        }

        if request_path.starts_with(cookie_path) {
            if cookie_path.ends_with('/') {
                return true;
            }
            let next_char = request_path.chars().nth(cookie_path.len());
            return next_char == Some('/');
        }

        false
    }

    /// Whether a stored cookie falls under a domain filter: the cookie's
    /// domain equals the filter or is a subdomain of it.
    fn domain_covered(filter: &str, cookie_domain: &str) -> bool {
        let filter = filter.trim_start_matches('.').to_lowercase();
        let cookie_domain = cookie_domain.trim_start_matches('.').to_lowercase();

        cookie_domain == filter || cookie_domain.ends_with(&format!(".{filter}"))
    }

    /// The host itself and all parent domains, for URL lookups.
    fn get_matching_domains(host: &str) -> Vec<String> {
        let mut domains = vec![host.to_string()];

        let parts: Vec<&str> = host.split('.').collect();
        for i in 1..parts.len().saturating_sub(1) {
            domains.push(parts[i..].join("."));
        }

        domains
    }

    fn cookies_for_url(&self, url: &Url) -> Vec<CookieRecord> {
        let host = url.host_str().unwrap_or("");
        let now = OffsetDateTime::now_utc();
        let mut result = Vec::new();

        for domain in Self::get_matching_domains(host) {
            if let Some(entry) = self.store.get(&domain) {
                for cookie in entry.iter() {
                    if !Self::domain_matches(&cookie.domain, host, cookie.host_only) {
                        continue;
                    }
                    if !Self::path_matches(&cookie.path, url.path()) {
                        continue;
                    }
                    if cookie.secure && url.scheme() != "https" {
                        continue;
                    }
                    if cookie.is_expired(now) {
                        continue;
                    }
                    result.push(cookie.clone());
                }
            }
        }

        // Longest path first
        result.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        result
    }

    fn cookies_for_domain(&self, filter: &str) -> Vec<CookieRecord> {
        let now = OffsetDateTime::now_utc();
        let mut result = Vec::new();

        for entry in self.store.iter() {
            for cookie in entry.value().iter() {
                if Self::domain_covered(filter, &cookie.domain) && !cookie.is_expired(now) {
                    result.push(cookie.clone());
                }
            }
        }

        result
    }
}

impl CookieStore for MemoryCookieStore {
    fn get_all(&self, query: StoreQuery) -> Fetching {
        let mut result = match (&query.domain, &query.url) {
            (Some(domain), _) => self.cookies_for_domain(domain),
            (None, Some(url)) => self.cookies_for_url(url),
            (None, None) => self.store.iter().flat_map(|e| e.value().clone()).collect(),
        };

        // A URL constraint on top of a domain query narrows the superset
        if let (Some(_), Some(url)) = (&query.domain, &query.url) {
            let by_url = self.cookies_for_url(url);
            result.retain(|c| by_url.iter().any(|u| u.key() == c.key()));
        }

        Box::pin(std::future::ready(Ok(result)))
    }

    fn remove(&self, url: &Url, name: &str) -> Removing {
        let host = url.host_str().unwrap_or("").to_string();
        let path = url.path().to_string();
        let mut removed = false;

        for domain in Self::get_matching_domains(&host) {
            if let Some(mut entry) = self.store.get_mut(&domain) {
                let before = entry.len();
                entry.retain(|c| {
                    !(c.name == name
                        && Self::domain_matches(&c.domain, &host, c.host_only)
                        && Self::path_matches(&c.path, &path))
                });
                if entry.len() < before {
                    removed = true;
                    break;
                }
            }
        }

        Box::pin(std::future::ready(Ok(removed)))
    }

    fn set(&self, record: CookieRecord) {
        let key = Self::domain_key(&record.domain);
        let mut entry = self.store.entry(key).or_default();

        // Replace existing if name/path match
        entry.retain(|c| c.name != record.name || c.path != record.path);
        entry.push(record);
    }
}
