//! Hygienic name generation.
//!
//! Locals discovered during code generation get names of the form
//! `_<original>_<counter>`. The counter is process-wide and atomic, so
//! every compilation in a process draws from one monotone sequence and
//! generated names never collide: across functions, across
//! compilations, and across threads. The leading underscore also keeps
//! an original name like `for` from colliding with a C keyword.

use std::sync::atomic::{AtomicU64, Ordering};

static UNIQUE_NAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A fresh hygienic name derived from `base`.
pub fn fresh_name(base: &str) -> String {
    let n = UNIQUE_NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("_{}_{}", base, n)
}
