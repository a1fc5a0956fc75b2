//! The process-wide default-cache convenience facade.
//!
//! This is the one place in the crate that touches global mutable state.
//! [`Cache`] itself is never made `Sync`; this module adds a `Mutex` around
//! a single lazily-constructed slot so that a process-wide singleton is
//! sound to call from more than one thread. It is opt-in: nothing runs
//! until [`init`] is called, and every other function is a silent
//! caller-input no-op until then.

use once_cell::sync::Lazy;
use std::sync::Mutex;

use crate::cache::Cache;
use crate::clock::{AbsTime, SystemClock};
use crate::config::CacheOptions;
use crate::GetResult;

static DEFAULT: Lazy<Mutex<Option<Cache<SystemClock>>>> = Lazy::new(|| Mutex::new(None));

/// Initializes the default cache instance. Calling this again reinitializes
/// it in place, discarding all entries.
pub fn init(cachesize: u32, options: CacheOptions) -> bool {
    let mut slot = DEFAULT.lock().unwrap();
    match slot.as_mut() {
        Some(cache) => cache.init(cachesize, options),
        None => match Cache::new(cachesize, options) {
            Some(cache) => {
                *slot = Some(cache);
                true
            }
            None => false,
        },
    }
}

/// Looks up `key` in the default cache. A miss before [`init`] is called
/// is indistinguishable from an ordinary miss.
pub fn get(key: &[u8]) -> Option<(Vec<u8>, u64)> {
    let slot = DEFAULT.lock().unwrap();
    let cache = slot.as_ref()?;
    cache
        .get(key, None)
        .map(|GetResult { value, ttl_remaining_secs }| (value.to_vec(), ttl_remaining_secs))
}

/// Looks up `key` using an explicit clock hint instead of the system clock.
pub fn get_at(key: &[u8], now: AbsTime) -> Option<(Vec<u8>, u64)> {
    let slot = DEFAULT.lock().unwrap();
    let cache = slot.as_ref()?;
    cache
        .get(key, Some(now))
        .map(|GetResult { value, ttl_remaining_secs }| (value.to_vec(), ttl_remaining_secs))
}

/// Inserts `(key, data)` with `ttl_secs` into the default cache. A no-op
/// before [`init`] is called.
pub fn set(key: &[u8], data: &[u8], ttl_secs: u64) {
    let mut slot = DEFAULT.lock().unwrap();
    if let Some(cache) = slot.as_mut() {
        cache.set(key, data, ttl_secs);
    }
}

/// Replaces the default cache's options wholesale — a full replace, not a
/// partial field-level update.
///
/// Takes effect via a reinitialization at the cache's current size, since
/// options are only ever consulted at `init` time; there is no live
/// "swap the callback under a running cache" path.
pub fn set_options(options: CacheOptions) -> bool {
    let mut slot = DEFAULT.lock().unwrap();
    match slot.as_mut() {
        Some(cache) => {
            let size = cache.size_bytes();
            cache.init(size, options)
        }
        None => false,
    }
}

/// Cumulative bytes written to the default cache's arena over its lifetime.
/// Returns 0 if the default cache has not been initialized.
pub fn motion() -> u64 {
    let slot = DEFAULT.lock().unwrap();
    slot.as_ref().map(Cache::motion).unwrap_or(0)
}
