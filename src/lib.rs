//! A fixed-budget, FIFO-rotating, time-to-live cache over opaque
//! byte-string keys and values.
//!
//! The whole cache lives in one contiguous byte buffer (the "arena"),
//! partitioned into a hash index and two entry regions. There is no
//! per-entry LRU bookkeeping: eviction falls out of where the writer,
//! oldest, and unused cursors sit as the arena rotates, which keeps
//! insertion and lookup at constant per-operation overhead regardless of
//! how large the cache gets.

/// Cache configuration (`CacheOptions`, the resize callback contract).
pub mod config;
/// Non-fatal error types.
pub mod error;
/// Process-wide default-instance convenience facade.
pub mod facade;

/// The injected time source (`Clock`, `SystemClock`, `ManualClock`).
pub mod clock;

/// The storage engine: arena layout, hash index, entry codec, cycle
/// controller.
mod cache;

pub use cache::cycle::TtlStats;
pub use cache::{Cache, GetResult};
pub use clock::{AbsTime, Clock, ManualClock, SystemClock};
pub use config::{CacheOptions, ResizeCallback, ResizeContext};
pub use error::{CacheError, Result};

/// Largest key length, in bytes, the cache will store.
pub const MAXKEYLEN: u32 = 1_000;
/// Largest value length, in bytes, the cache will store.
pub const MAXDATALEN: u32 = 1_000_000;
/// Smallest arena size the cache will allocate.
pub const MINCACHESIZE: u32 = 100;
/// Largest arena size the cache will allocate.
pub const MAXCACHESIZE: u32 = 1_000_000_000;
/// TTLs above this (seconds, 7 days) are clamped on insertion.
pub const MAX_TTL: u64 = 604_800;
/// Worst-case collision-chain steps a lookup will walk before giving up.
pub const MAX_CHAIN_STEPS: u32 = 100;
