//! Persistent icon cache
//!
//! One file per vault entry, keyed by entry id. There is no index and no
//! eviction: a cached icon is trusted until the directory is cleared.
//!
//! # Cache States
//!
//! | State | On disk | Fetch behaviour |
//! |-------|---------|-----------------|
//! | Miss | nothing, or only an unfinished temporary file | network fetch |
//! | Hit | `<id>.png` | skipped, no network call |

pub mod store;

pub use store::IconCache;
