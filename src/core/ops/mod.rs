//! core::ops
//!
//! Cross-process coordination primitives.
//!
//! # Modules
//!
//! - [`lock`] - Exclusive lock over a single metadata file
//!
//! # Architecture
//!
//! Every mutation of shared metadata:
//! 1. Acquires the lock keyed to the file it rewrites
//! 2. Reads the current contents
//! 3. Writes the new contents atomically
//! 4. Releases the lock (on drop, so error paths release too)
//!
//! Locks are keyed per file, not per repository, so a staging-log update
//! does not wait on an unrelated branch-chain append.

pub mod lock;

pub use lock::{with_lock, LockError, ResourceLock, DEFAULT_LOCK_TIMEOUT, POLL_INTERVAL};
