use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Represents a single cookie as seen through the extension storage API.
/// Descendant of Chromium's `net::CanonicalCookie`, trimmed to the fields
/// the `chrome.cookies` surface exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    #[serde(default)]
    pub host_only: bool,
    pub same_site: SameSite,
    /// `None` for session cookies. Serialized as epoch seconds
    /// (`expirationDate`), matching the storage API.
    #[serde(rename = "expirationDate", with = "time::serde::timestamp::option")]
    pub expiration_date: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SameSite {
    #[default]
    Unspecified,
    NoRestriction,
    Lax,
    Strict,
}

/// Composite identity of a cookie within the store.
///
/// Two records with the same key refer to the same cookie; queries that
/// overlap (domain query plus URL query) deduplicate on this.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CookieKey {
    pub name: String,
    pub domain: String,
    pub path: String,
}

impl CookieRecord {
    /// A host-only cookie with defaults for everything not given.
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".to_string(),
            secure: false,
            http_only: false,
            host_only: true,
            same_site: SameSite::Unspecified,
            expiration_date: None,
        }
    }

    pub fn key(&self) -> CookieKey {
        CookieKey {
            name: self.name.clone(),
            domain: self.domain.clone(),
            path: self.path.clone(),
        }
    }

    /// Session cookies have no expiration date.
    pub fn is_session(&self) -> bool {
        self.expiration_date.is_none()
    }

    pub fn is_expired(&self, current_time: OffsetDateTime) -> bool {
        match self.expiration_date {
            Some(expiry) => expiry < current_time,
            None => false,
        }
    }
}
