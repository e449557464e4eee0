use thiserror::Error;

/// Central error taxonomy for cookiewatch.
///
/// Nothing in this crate escalates a `WatchError` into a panic or a
/// user-visible crash: boundary failures are either swallowed after a log
/// line or converted into the terminal "monitoring stopped" state by the
/// lifecycle guard.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum WatchError {
    /// The remote listener is absent. Expected and benign.
    #[error("Remote listener unavailable")]
    ChannelUnavailable,

    /// The messaging channel was permanently destroyed by the host.
    #[error("Extension context invalidated")]
    ContextInvalidated,

    /// A page-global accessor could not be wrapped. Non-fatal; the hook
    /// is skipped and instrumentation stays partial.
    #[error("Accessor '{hook}' is not configurable")]
    AccessorNotConfigurable { hook: &'static str },

    /// A cookie pair without a name was encountered during parsing.
    /// The offending pair is skipped; the rest of the string still parses.
    #[error("Malformed cookie pair: {pair:?}")]
    MalformedCookieHeader { pair: String },

    /// A tab id could not be resolved to a live tab.
    #[error("Tab {tab} not found")]
    TabNotFound { tab: u32 },
}

impl WatchError {
    pub fn malformed_pair(pair: impl Into<String>) -> Self {
        WatchError::MalformedCookieHeader { pair: pair.into() }
    }

    pub fn accessor_not_configurable(hook: &'static str) -> Self {
        WatchError::AccessorNotConfigurable { hook }
    }

    /// Whether this failure is allowed to trigger monitor teardown.
    ///
    /// Only a permanently destroyed channel ever does; everything else is
    /// swallowed locally (fail open).
    pub fn is_terminal(&self) -> bool {
        matches!(self, WatchError::ContextInvalidated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_context_invalidated_is_terminal() {
        assert!(WatchError::ContextInvalidated.is_terminal());
        assert!(!WatchError::ChannelUnavailable.is_terminal());
        assert!(!WatchError::accessor_not_configurable("cookie").is_terminal());
        assert!(!WatchError::malformed_pair("=1").is_terminal());
    }

    #[test]
    fn test_display_strings() {
        let err = WatchError::AccessorNotConfigurable { hook: "cookie" };
        assert_eq!(err.to_string(), "Accessor 'cookie' is not configurable");
    }
}
