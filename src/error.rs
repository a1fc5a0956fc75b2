use thiserror::Error;

/// Non-fatal errors reported by the cache.
///
/// Caller-input violations (oversized key/value, an uninitialized handle) are
/// deliberately *not* represented here: per the cache's error model those are
/// silent no-ops, not `Err` values. This enum only covers the one class of
/// recoverable failure that has a reportable outcome in the public API:
/// allocation failure during `init`/`reinit`.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to allocate a {requested_size}-byte cache arena")]
    AllocationFailed { requested_size: u32 },
}

pub type Result<T> = std::result::Result<T, CacheError>;
