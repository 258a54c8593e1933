//! Incremental feed pagination for clients
//!
//! Drives fetch-on-scroll against a cursor-paginated feed endpoint with a
//! small explicit state machine, plus the two client-side primitives that
//! always end up next to it: a tag-based cache registry and optimistic
//! two-phase values.
//!
//! # Architecture
//!
//! ```text
//! UI event (key change / scroll / retry)
//!     |
//!     v
//! Pager ---- FetchRequest {key, cursor, epoch} ----> transport
//!     ^                                                  |
//!     +------------- complete(request, result) <---------+
//! ```
//!
//! The pager itself never performs I/O: callers hand issued `FetchRequest`s
//! to whatever transport they use and feed the outcome back through
//! [`Pager::complete`]. Results carrying a stale epoch (the key changed
//! while the request was in flight) are discarded harmlessly.
//!
//! # Example
//!
//! ```
//! use feed_pager::{FeedKey, Page, Pager, Phase};
//!
//! let mut pager: Pager<String> = Pager::new();
//!
//! // Switching to a key restarts from scratch and issues the initial fetch.
//! let req = pager.set_key(FeedKey::home()).unwrap();
//! assert_eq!(pager.phase(), &Phase::FetchingInitial);
//!
//! // Transport completed; one more page exists.
//! pager.complete(&req, Ok(Page {
//!     items: vec!["first".to_string()],
//!     next_cursor: Some("c1".to_string()),
//! }));
//! assert_eq!(pager.phase(), &Phase::Ready);
//!
//! // Scroll proximity issues the next fetch, carrying the cursor.
//! let req = pager.near_end().unwrap();
//! assert_eq!(req.cursor.as_deref(), Some("c1"));
//! ```

mod cache;
mod optimistic;
mod pager;

pub use cache::TagCache;
pub use optimistic::Optimistic;
pub use pager::{FeedKey, FeedKind, FetchError, FetchRequest, Page, Pager, Phase};
