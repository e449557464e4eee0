//! Cookie records, parsing, and the storage boundary.
//!
//! Two views of the same cookies exist and are deliberately kept apart:
//!
//! - **Authoritative**: the storage boundary ([`CookieStore`](store::CookieStore))
//!   sees everything, including HTTP-only cookies.
//! - **Client-visible**: [`parse`] works on the serialized string a page can
//!   read, which can never contain HTTP-only cookies and carries no
//!   attributes.
//!
//! The relay queries the first; the monitor's differ watches the second.

pub mod parse;
pub mod record;
pub mod store;

pub use record::{CookieKey, CookieRecord, SameSite};
pub use store::{CookieStore, MemoryCookieStore, StoreQuery};
