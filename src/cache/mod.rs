//! Content-addressed build cache
//!
//! Decides on every invocation whether the compiler has to run and where
//! the artifact lives.
//!
//! # Correctness
//!
//! - Cache keys are a fingerprint of source bytes, compiler and flags
//! - Same inputs = same path = reuse without rebuilding
//! - Any changed input = a different path = unconditional rebuild
//! - Nothing is invalidated or evicted; stale entries are simply never addressed
//! - `--no-cache` artifacts carry the building pid; those of exited runs are pruned
//!
//! Concurrent invocations with the same fingerprint may both build the
//! same path. No lock is taken; both builds produce equivalent output.

pub mod fingerprint;
pub mod store;

pub use fingerprint::{hash_file, hash_update, Fingerprint};
pub use store::{ensure_dir, prune_disposable, ArtifactTarget, CacheMode, CacheStore};
