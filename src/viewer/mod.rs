//! Popup-side presentation logic: filtering, stats, and export.
//!
//! Everything here is pure over a slice of records the relay already
//! fetched; nothing talks to a boundary.

use crate::cookies::record::CookieRecord;
use serde::Serialize;
use time::OffsetDateTime;

/// One checkbox in the popup's filter row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterFlag {
    HttpOnly,
    Secure,
    Session,
    Persistent,
    SameSiteNone,
    SameSiteLax,
    SameSiteStrict,
    NoSameSite,
}

impl FilterFlag {
    fn matches(self, cookie: &CookieRecord) -> bool {
        use crate::cookies::record::SameSite;

        match self {
            FilterFlag::HttpOnly => cookie.http_only,
            FilterFlag::Secure => cookie.secure,
            FilterFlag::Session => cookie.is_session(),
            FilterFlag::Persistent => !cookie.is_session(),
            FilterFlag::SameSiteNone => cookie.same_site == SameSite::NoRestriction,
            FilterFlag::SameSiteLax => cookie.same_site == SameSite::Lax,
            FilterFlag::SameSiteStrict => cookie.same_site == SameSite::Strict,
            FilterFlag::NoSameSite => cookie.same_site == SameSite::Unspecified,
        }
    }
}

/// Search term plus checked flags.
///
/// Flags combine with OR; the search term must match regardless. With no
/// flags checked, search alone decides.
#[derive(Debug, Clone, Default)]
pub struct ViewFilter {
    pub search: String,
    pub flags: Vec<FilterFlag>,
}

impl ViewFilter {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: term.into(),
            flags: Vec::new(),
        }
    }

    pub fn with_flag(mut self, flag: FilterFlag) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn matches(&self, cookie: &CookieRecord) -> bool {
        let term = self.search.to_lowercase();
        let matches_search = term.is_empty()
            || cookie.name.to_lowercase().contains(&term)
            || cookie.value.to_lowercase().contains(&term)
            || cookie.domain.to_lowercase().contains(&term);

        if !matches_search {
            return false;
        }

        if self.flags.is_empty() {
            return true;
        }

        self.flags.iter().any(|flag| flag.matches(cookie))
    }

    pub fn apply(&self, cookies: &[CookieRecord]) -> Vec<CookieRecord> {
        cookies
            .iter()
            .filter(|c| self.matches(c))
            .cloned()
            .collect()
    }
}

/// Counts backing the popup's status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CookieStats {
    pub total: usize,
    pub http_only: usize,
    pub secure: usize,
    pub session: usize,
}

impl CookieStats {
    pub fn collect(cookies: &[CookieRecord]) -> Self {
        Self {
            total: cookies.len(),
            http_only: cookies.iter().filter(|c| c.http_only).count(),
            secure: cookies.iter().filter(|c| c.secure).count(),
            session: cookies.iter().filter(|c| c.is_session()).count(),
        }
    }

    /// Status line, Finder-style: `"3 cookies (1 HTTP-only, 2 secure)"`.
    pub fn summary(&self) -> String {
        let mut parts = vec![match self.total {
            0 => "No cookies".to_string(),
            1 => "1 cookie".to_string(),
            n => format!("{n} cookies"),
        }];

        if self.total > 0 {
            let mut stats = Vec::new();
            if self.http_only > 0 {
                stats.push(format!("{} HTTP-only", self.http_only));
            }
            if self.secure > 0 {
                stats.push(format!("{} secure", self.secure));
            }
            if self.session > 0 {
                stats.push(format!("{} session", self.session));
            }
            if !stats.is_empty() {
                parts.push(format!("({})", stats.join(", ")));
            }
        }

        parts.join(" ")
    }
}

/// Downloadable export of a page's cookies.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CookieExport {
    pub url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub cookies: Vec<CookieRecord>,
}

impl CookieExport {
    pub fn new(url: impl Into<String>, cookies: Vec<CookieRecord>) -> Self {
        Self {
            url: url.into(),
            timestamp: OffsetDateTime::now_utc(),
            cookies,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::record::SameSite;
    use time::Duration;

    fn sample() -> Vec<CookieRecord> {
        let mut session = CookieRecord::new("sid", "abc123", "example.com");
        session.http_only = true;
        session.secure = true;
        session.same_site = SameSite::Strict;

        let mut prefs = CookieRecord::new("prefs", "dark", "example.com");
        prefs.expiration_date = Some(OffsetDateTime::now_utc() + Duration::days(365));
        prefs.same_site = SameSite::Lax;

        let mut tracker = CookieRecord::new("track", "xyz", "ads.example.com");
        tracker.secure = true;
        tracker.same_site = SameSite::NoRestriction;

        vec![session, prefs, tracker]
    }

    #[test]
    fn test_no_flags_means_search_only() {
        let cookies = sample();
        assert_eq!(ViewFilter::default().apply(&cookies).len(), 3);
        assert_eq!(ViewFilter::search("sid").apply(&cookies).len(), 1);
        assert_eq!(ViewFilter::search("EXAMPLE.COM").apply(&cookies).len(), 3);
        assert_eq!(ViewFilter::search("nothing").apply(&cookies).len(), 0);
    }

    #[test]
    fn test_flags_combine_with_or() {
        let cookies = sample();
        let filter = ViewFilter::default()
            .with_flag(FilterFlag::HttpOnly)
            .with_flag(FilterFlag::SameSiteNone);
        let matched = filter.apply(&cookies);

        assert_eq!(matched.len(), 2);
        assert!(matched.iter().any(|c| c.name == "sid"));
        assert!(matched.iter().any(|c| c.name == "track"));
    }

    #[test]
    fn test_search_and_flags_both_required() {
        let cookies = sample();
        let filter = ViewFilter {
            search: "ads".to_string(),
            flags: vec![FilterFlag::Secure],
        };
        let matched = filter.apply(&cookies);

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "track");
    }

    #[test]
    fn test_session_and_persistent_flags() {
        let cookies = sample();
        assert_eq!(
            ViewFilter::default()
                .with_flag(FilterFlag::Session)
                .apply(&cookies)
                .len(),
            2
        );
        assert_eq!(
            ViewFilter::default()
                .with_flag(FilterFlag::Persistent)
                .apply(&cookies)
                .len(),
            1
        );
    }

    #[test]
    fn test_stats_summary() {
        let cookies = sample();
        let stats = CookieStats::collect(&cookies);
        assert_eq!(stats.total, 3);
        assert_eq!(
            stats.summary(),
            "3 cookies (1 HTTP-only, 2 secure, 2 session)"
        );

        assert_eq!(CookieStats::collect(&[]).summary(), "No cookies");

        let one = CookieStats {
            total: 1,
            http_only: 0,
            secure: 0,
            session: 1,
        };
        assert_eq!(one.summary(), "1 cookie (1 session)");
    }

    #[test]
    fn test_export_serializes_timestamp_and_records() {
        let export = CookieExport::new("https://example.com/", sample());
        let json = export.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["url"], "https://example.com/");
        assert!(value["timestamp"].is_string());
        assert_eq!(value["cookies"].as_array().unwrap().len(), 3);
        assert_eq!(value["cookies"][0]["httpOnly"], true);
    }
}
