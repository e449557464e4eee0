//! Base types and error handling.
//!
//! Provides foundational types shared across the crate:
//! - [`WatchError`](error::WatchError): the crate-wide error taxonomy
//! - [`TabId`](tabs::TabId) and the [`TabRegistry`](tabs::TabRegistry) boundary

pub mod error;
pub mod tabs;

pub use error::WatchError;
pub use tabs::{TabId, TabInfo, TabRegistry};
