//! The page execution realm and its instrumentation.

pub mod inject;
pub mod realm;

pub use inject::{install, InstallReport};
pub use realm::{PageEvent, PageEventKind, PageInfo, PageRealm, PageResponse};
