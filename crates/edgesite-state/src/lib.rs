//! edgesite-state: embedded ledger of published function versions and
//! edge bindings.
//!
//! Backed by [redb](https://docs.rs/redb). Values are JSON-serialized into
//! `&[u8]` columns under composite keys (`{function}/{tag}`,
//! `{distribution}/{event}`).
//!
//! Versions are append-only: publishing the same tag and source twice
//! returns the existing record, a different source under a taken tag is
//! refused, and nothing ever deletes one. A distribution can always
//! be pointed back at an older version.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::{StateStore, epoch_secs};
pub use types::*;
