//! # Cache Module
//!
//! Remembers resolutions so repeated requests skip the matching algorithms.
//!
//! - [`CacheBackend`]: an opaque, asynchronous string store. Anything from an
//!   in-process map to a shared network cache can sit behind it.
//! - [`MemoryCache`]: the built-in LRU backend.
//! - [`ResolutionCache`]: turns resolutions into backend entries and back.
//!
//! ## Cache Key Structure
//!
//! `{server_id}:{registry_version}:{METHOD} {path}|{languages}`
//!
//! - `server_id`: distinguishes engines sharing one backend
//! - `registry_version`: bumped by every route table change, so entries written
//!   against an older table are never read again
//! - `METHOD`, `path`: request method and normalised path (no query string)
//! - `languages`: the request's preferred languages, comma separated
//!
//! ## Failure Handling
//!
//! The cache is best-effort. Reads are bounded by a timeout; a timeout, a
//! backend error or an entry that no longer matches the route table counts as a
//! miss. Writes and removals run on spawned tasks and never delay a response.

mod memory;
mod resolution;

pub use memory::MemoryCache;
pub use resolution::{CachedResolution, ResolutionCache};

use async_trait::async_trait;

/// Asynchronous key/value store used by [`ResolutionCache`].
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> anyhow::Result<()>;

    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}
