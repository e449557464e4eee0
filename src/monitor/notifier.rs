//! Cross-boundary notifier: forwards change notices to the background
//! process and watches every attempt for channel invalidation.

use crate::monitor::channel::{Ack, ChangeNotice, MessageChannel, SendError};
use crate::monitor::guard::LifecycleGuard;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Failure of a notify attempt, after classification.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// The remote process is not listening. Expected and benign; callers
    /// swallow this.
    #[error("background process unavailable")]
    Unavailable,

    /// The channel is permanently gone. Teardown has already run by the
    /// time a caller sees this.
    #[error("extension context invalidated")]
    ContextInvalidated,
}

impl SendError {
    /// Map a raw boundary failure onto the notifier's taxonomy. Anything
    /// ambiguous classifies as `Unavailable` (fail open).
    pub fn classify(&self) -> ChannelError {
        match self {
            SendError::ContextInvalidated => ChannelError::ContextInvalidated,
            SendError::NoReceiver | SendError::Other(_) => ChannelError::Unavailable,
        }
    }
}

/// Wraps the send half of the messaging boundary.
///
/// State is monotonic: once a send fails with context invalidation the
/// notifier flips to `Invalidated`, triggers the lifecycle guard, and never
/// attempts another send.
pub struct ChangeNotifier {
    channel: Arc<dyn MessageChannel>,
    guard: LifecycleGuard,
    invalidated: AtomicBool,
}

impl ChangeNotifier {
    pub fn new(channel: Arc<dyn MessageChannel>, guard: LifecycleGuard) -> Self {
        Self {
            channel,
            guard,
            invalidated: AtomicBool::new(false),
        }
    }

    /// Whether the channel has been permanently invalidated.
    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::SeqCst)
    }

    /// Forward one notice to the background process.
    ///
    /// On `ContextInvalidated` the guard's teardown has completed before
    /// this returns.
    pub async fn notify(&self, notice: ChangeNotice) -> Result<Ack, ChannelError> {
        if self.is_invalidated() {
            return Err(ChannelError::ContextInvalidated);
        }

        match self.channel.send(notice).await {
            Ok(ack) => Ok(ack),
            Err(e) => match e.classify() {
                ChannelError::Unavailable => {
                    tracing::trace!(error = %e, "notice dropped, receiver unavailable");
                    Err(ChannelError::Unavailable)
                }
                ChannelError::ContextInvalidated => {
                    if !self.invalidated.swap(true, Ordering::SeqCst) {
                        tracing::warn!("messaging channel invalidated, stopping monitor");
                    }
                    self.guard.teardown();
                    Err(ChannelError::ContextInvalidated)
                }
            },
        }
    }
}
