//! Client-visible cookie-string parsing.
//!
//! Parses the serialized jar a page context can see (the `document.cookie`
//! view). This view is partial by construction: HTTP-only cookies never
//! appear in it, and no attributes beyond name/value survive serialization,
//! so domain, path and flags are filled in from the page's own location.

use crate::cookies::record::{CookieRecord, SameSite};
use cookie::Cookie;

/// Parse a raw cookie-jar string into records.
///
/// Values are percent-decoded and may themselves contain `=`; pairs without
/// a name are skipped without failing the rest of the string.
///
/// `host` and `secure` describe the page the string was read from; they are
/// assumptions, not observed attributes (`same_site` defaults to Lax the way
/// the extension UI assumes).
pub fn parse_document_cookies(raw: &str, host: &str, secure: bool) -> Vec<CookieRecord> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let mut records = Vec::new();
    for parsed in Cookie::split_parse_encoded(raw) {
        let pair = match parsed {
            Ok(pair) => pair,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed cookie pair");
                continue;
            }
        };

        records.push(CookieRecord {
            name: pair.name().to_string(),
            value: pair.value().to_string(),
            domain: host.to_string(),
            path: "/".to_string(),
            secure,
            // document.cookie can never observe HTTP-only cookies.
            http_only: false,
            host_only: true,
            same_site: SameSite::Lax,
            expiration_date: None,
        });
    }

    records
}

/// Count the visible cookies in a raw jar string.
pub fn visible_cookie_count(raw: &str) -> usize {
    raw.split(';').filter(|p| !p.trim().is_empty()).count()
}
