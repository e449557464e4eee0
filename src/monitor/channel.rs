//! The messaging boundary between the content-script context and the
//! background process.
//!
//! Delivery is at-most-once and best-effort. The boundary reports failure
//! through an enumerated [`SendError`] rather than free-text error messages,
//! so the notifier can classify without substring matching.

use crate::page::PageEvent;
use std::{future::Future, pin::Pin, sync::Arc};
use thiserror::Error;

/// Acknowledgement that the remote process received and handled a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack;

/// What a monitor forwards across the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeNotice {
    /// The polling differ observed a net change to the visible jar.
    SnapshotChanged {
        url: Option<String>,
        previous: String,
        current: String,
    },
    /// The injected instrumentation observed a write attempt. Best-effort
    /// and non-authoritative; may duplicate a `SnapshotChanged` for the
    /// same underlying write.
    CookieActivity {
        url: Option<String>,
        event: PageEvent,
    },
}

impl ChangeNotice {
    pub fn url(&self) -> Option<&str> {
        match self {
            ChangeNotice::SnapshotChanged { url, .. } => url.as_deref(),
            ChangeNotice::CookieActivity { url, .. } => url.as_deref(),
        }
    }
}

/// Raw failure reported by a send attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    /// No one is listening on the other end right now.
    #[error("receiving end does not exist")]
    NoReceiver,

    /// The channel itself has been permanently destroyed by the host.
    #[error("extension context invalidated")]
    ContextInvalidated,

    /// Anything the boundary could not attribute. Classified as
    /// unavailable: an uncertain error must not tear the monitor down.
    #[error("send failed: {0}")]
    Other(String),
}

/// Trait for the fire-and-forget send half of the boundary.
///
/// `send` suspends only the calling continuation until the remote process
/// acknowledges or the call fails; it never blocks the context's event loop.
pub trait MessageChannel: Send + Sync {
    fn send(&self, notice: ChangeNotice) -> Sending;
}

/// Alias for the `Future` type returned by [`MessageChannel::send`].
pub type Sending = Pin<Box<dyn Future<Output = Result<Ack, SendError>> + Send>>;

/// Blanket implementation for Arc-wrapped channels.
impl<C: MessageChannel + ?Sized> MessageChannel for Arc<C> {
    fn send(&self, notice: ChangeNotice) -> Sending {
        (**self).send(notice)
    }
}
