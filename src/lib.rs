//! vaulticon - icon sync for password-vault launcher extensions
//!
//! Fetches one icon per vault entry from a remote icon service into a local
//! cache, with bounded concurrency and a filesystem lock that keeps sync
//! runs from overlapping across process launches.

pub mod cache;
pub mod cli;
pub mod config;
pub mod entries;
pub mod error;
pub mod fetch;
pub mod notify;
pub mod sync;

pub use error::{VaultIconError, VaultIconResult};
