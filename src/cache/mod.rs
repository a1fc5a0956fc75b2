//! The cache object: binds the arena, cursors, cycle state, and
//! configuration into the public handle.

pub(crate) mod codec;
pub mod cycle;
pub(crate) mod entry;
pub(crate) mod hash;

use crate::clock::{AbsTime, Clock, SystemClock};
use crate::config::CacheOptions;
use crate::error::{CacheError, Result};
use crate::{MAXCACHESIZE, MAXDATALEN, MAXKEYLEN, MAX_CHAIN_STEPS, MAX_TTL, MINCACHESIZE};
use cycle::{CycleOutcome, CycleState};

/// A borrowed hit from [`Cache::get`]. The slice is a borrow into the
/// arena, valid only until the next mutating call — exactly as long
/// as this value lives, since it borrows `&self`/`&mut self`.
#[derive(Debug)]
pub struct GetResult<'a> {
    pub value: &'a [u8],
    pub ttl_remaining_secs: u64,
}

/// The storage engine: one contiguous arena, four cursors, and the cycle
/// controller's bookkeeping. Single-threaded by design; callers that
/// need cross-thread access should go through [`crate::facade`] or add
/// their own synchronization.
pub struct Cache<C: Clock = SystemClock> {
    buf: Vec<u8>,
    size: u32,
    hsize: u32,
    writer: u32,
    oldest: u32,
    unused: u32,
    cycle: CycleState,
    motion: u64,
    options: CacheOptions,
    clock: C,
}

impl Cache<SystemClock> {
    /// Creates a cache backed by the system wall clock.
    pub fn new(cachesize: u32, options: CacheOptions) -> Option<Self> {
        Self::with_clock(cachesize, options, SystemClock)
    }
}

impl<C: Clock> Cache<C> {
    /// Creates a cache with an explicit clock source (tests inject a
    /// [`crate::clock::ManualClock`] here).
    pub fn with_clock(cachesize: u32, options: CacheOptions, clock: C) -> Option<Self> {
        let now = clock.now();
        let mut cache = Self {
            buf: Vec::new(),
            size: 0,
            hsize: 4,
            writer: 0,
            oldest: 0,
            unused: 0,
            cycle: CycleState::new(now),
            motion: 0,
            options: CacheOptions::default(),
            clock,
        };
        if cache.init(cachesize, options) {
            Some(cache)
        } else {
            None
        }
    }

    /// Reinitializes the cache at `cachesize`, discarding all entries.
    /// Allocates the new buffer before freeing the old one so a
    /// failing allocation leaves the prior state intact.
    pub fn init(&mut self, cachesize: u32, options: CacheOptions) -> bool {
        self.try_init(cachesize, options).is_ok()
    }

    fn try_init(&mut self, cachesize: u32, options: CacheOptions) -> Result<()> {
        let size = cachesize.clamp(MINCACHESIZE, MAXCACHESIZE);
        let mut new_buf: Vec<u8> = Vec::new();
        new_buf
            .try_reserve_exact(size as usize)
            .map_err(|_| CacheError::AllocationFailed {
                requested_size: size,
            })?;
        new_buf.resize(size as usize, 0);

        let hsize = hash::choose_hsize(size);
        let now = self.clock.now();

        self.buf = new_buf;
        self.size = size;
        self.hsize = hsize;
        self.writer = hsize;
        self.oldest = size;
        self.unused = size;
        self.cycle = CycleState::new(now);
        self.motion = 0;
        self.options = options;
        Ok(())
    }

    /// Looks up `key`. `clock_hint`, if given, substitutes for a clock read.
    /// Never mutates the cache — an expired entry is reported as a
    /// miss but left for the writer to age out naturally.
    pub fn get(&self, key: &[u8], clock_hint: Option<AbsTime>) -> Option<GetResult<'_>> {
        if key.len() as u32 > MAXKEYLEN || self.size == 0 {
            return None;
        }
        let now = clock_hint.unwrap_or_else(|| self.clock.now());
        let h = hash::bucket_offset(key, self.hsize);
        let mut prev = h;
        let mut pos = hash::slot(&self.buf, h);

        for _ in 0..MAX_CHAIN_STEPS {
            if pos == 0 {
                return None;
            }
            let keylen = entry::read_keylen(&self.buf, pos);
            if keylen == key.len() as u32 && entry::key_slice(&self.buf, pos, keylen) == key {
                let expiry = entry::read_expiry_at(&self.buf, pos);
                if expiry.as_secs() < now.as_secs() {
                    return None;
                }
                let datalen = entry::read_datalen(&self.buf, pos);
                let ttl_remaining = expiry.remaining_from(now).min(MAX_TTL as u64);
                let value = entry::data_slice(&self.buf, pos, keylen, datalen);
                return Some(GetResult {
                    value,
                    ttl_remaining_secs: ttl_remaining,
                });
            }
            let link = entry::read_link(&self.buf, pos);
            let next = prev ^ link;
            prev = pos;
            pos = next;
        }
        None
    }

    /// Inserts `(key, data)` with `ttl_secs` (clamped to `MAX_TTL`).
    /// Silently drops the request if `key`/`data` exceed the fixed bounds
    /// or if it can never fit even in an empty buffer.
    pub fn set(&mut self, key: &[u8], data: &[u8], ttl_secs: u64) {
        if key.len() as u32 > MAXKEYLEN || data.len() as u32 > MAXDATALEN {
            return;
        }
        let ttl = ttl_secs.min(MAX_TTL);
        let entrylen = entry::entry_len(key.len() as u32, data.len() as u32);

        loop {
            if self.writer + entrylen <= self.oldest {
                break;
            }
            if self.oldest == self.unused {
                if self.writer <= self.hsize {
                    // An empty buffer still can't fit this entry. Drop it.
                    return;
                }
                if self.rotate_or_resize() {
                    // Cache was just reinitialized; restart from scratch.
                    continue;
                }
            } else {
                self.evict_oldest();
            }
        }

        self.insert_entry(key, data, ttl);
    }

    /// Runs the cycle controller at a full-buffer rotation point. Returns
    /// `true` if the cache was reinitialized (the caller must restart its
    /// insertion attempt), `false` if a plain rotation was performed. A
    /// failed reinit during a resize has no usable buffer to fall back to,
    /// so it aborts the process rather than returning to a caller who would
    /// otherwise retry the same failing allocation forever.
    fn rotate_or_resize(&mut self) -> bool {
        let now = self.clock.now();
        match cycle::evaluate(&mut self.cycle, &mut self.options, self.size, now) {
            CycleOutcome::Resize { new_size } => {
                let options = std::mem::take(&mut self.options);
                if !self.init(new_size, options) {
                    codec::corrupt("reinit during resize failed to allocate a new arena");
                }
                true
            }
            CycleOutcome::Rotate => {
                self.unused = self.writer;
                self.oldest = self.hsize;
                self.writer = self.hsize;
                false
            }
        }
    }

    /// Evicts the oldest entry in the aged region, repairing the one chain
    /// link that pointed at it.
    fn evict_oldest(&mut self) {
        let p = self.oldest;
        let keylen = entry::read_keylen(&self.buf, p);
        let datalen = entry::read_datalen(&self.buf, p);
        let first_link = entry::read_link(&self.buf, p);

        let neighbor_raw = codec::read_u32(&self.buf, first_link);
        let repaired = neighbor_raw ^ p;
        debug_assert_ne!(
            repaired, p,
            "tail eviction would leave a self-referential chain link"
        );
        codec::write_u32(&mut self.buf, first_link, repaired);

        let elen = entry::entry_len(keylen, datalen);
        self.oldest += elen;
        if self.oldest > self.unused {
            codec::corrupt("oldest cursor overshot the unused boundary");
        }
        if self.oldest == self.unused {
            self.unused = self.size;
            self.oldest = self.size;
        }
    }

    /// Writes a brand-new entry at `writer` and threads it onto its
    /// bucket's chain as the newest member.
    fn insert_entry(&mut self, key: &[u8], data: &[u8], ttl: u64) {
        let now = self.clock.now();
        let expiry = now.plus_secs(ttl);
        let h = hash::bucket_offset(key, self.hsize);
        let old_head = hash::slot(&self.buf, h);
        let pos = self.writer;

        if old_head != 0 {
            let old_link = entry::read_link(&self.buf, old_head);
            entry::write_link(&mut self.buf, old_head, old_link ^ h ^ pos);
        }

        let link = old_head ^ h;
        entry::write_entry(&mut self.buf, pos, link, key, data, expiry);
        hash::set_slot(&mut self.buf, h, pos);

        let elen = entry::entry_len(key.len() as u32, data.len() as u32);
        self.writer += elen;
        self.motion = self.motion.saturating_add(elen as u64);
        self.cycle.ttl_stats.record(ttl);
    }

    /// Cumulative bytes written to the arena over the cache's lifetime.
    pub fn motion(&self) -> u64 {
        self.motion
    }

    /// The arena's current size in bytes.
    pub fn size_bytes(&self) -> u32 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn cache(size: u32) -> Cache<ManualClock> {
        Cache::with_clock(size, CacheOptions::default(), ManualClock::new(1_000)).unwrap()
    }

    fn invariants_hold<C: Clock>(cache: &Cache<C>) {
        assert!(cache.hsize <= cache.writer);
        assert!(cache.writer <= cache.oldest);
        assert!(cache.oldest <= cache.unused);
        assert!(cache.unused <= cache.size);
        if cache.oldest == cache.unused {
            assert_eq!(cache.unused, cache.size);
        }
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut c = cache(1024);
        c.set(b"a", b"hello", 60);
        let hit = c.get(b"a", None).expect("expected a hit");
        assert_eq!(hit.value, b"hello");
        assert_eq!(hit.ttl_remaining_secs, 60);
        invariants_hold(&c);
    }

    #[test]
    fn expiry_is_reported_as_a_miss_but_not_removed() {
        let clock = ManualClock::new(0);
        let mut c = Cache::with_clock(1024, CacheOptions::default(), clock).unwrap();
        c.set(b"a", b"hello", 60);
        assert!(c.get(b"a", Some(AbsTime::from_secs(30))).is_some());
        assert!(c.get(b"a", Some(AbsTime::from_secs(61))).is_none());
    }

    #[test]
    fn duplicate_keys_return_the_newest_value() {
        let mut c = cache(1024);
        c.set(b"k", b"v1", 3600);
        c.set(b"k", b"v2", 3600);
        assert_eq!(c.get(b"k", None).unwrap().value, b"v2");
    }

    #[test]
    fn lookup_misses_for_a_key_never_inserted() {
        let c = cache(1024);
        assert!(c.get(b"missing", None).is_none());
    }

    #[test]
    fn oversized_key_or_value_is_a_silent_no_op() {
        let mut c = cache(1024);
        let big_key = vec![0u8; crate::MAXKEYLEN as usize + 1];
        c.set(&big_key, b"v", 60);
        assert!(c.get(&big_key, None).is_none());
    }

    #[test]
    fn rotation_evicts_the_oldest_entries_first() {
        let mut c = cache(300);
        for i in 0..20u32 {
            c.set(format!("key{i}").as_bytes(), b"01234567", 3600);
            invariants_hold(&c);
        }
        // The most recently inserted entry must always still be retrievable.
        assert!(c.get(b"key19", None).is_some());
    }

    #[test]
    fn chain_cap_bounds_lookup_for_colliding_keys() {
        // A cache large enough that 200 tiny colliding entries fit in the
        // active region with no rotation or eviction, so the first-inserted
        // key survives in the arena purely as the tail of a too-long chain.
        let mut c = cache(2_000_000);
        let hsize = c.hsize;
        let mut colliding = Vec::new();
        let mut n: u64 = 0;
        while colliding.len() < 200 {
            let candidate = format!("flood{n}");
            if hash::bucket_offset(candidate.as_bytes(), hsize) == hash::bucket_offset(b"flood-seed", hsize) {
                colliding.push(candidate);
            }
            n += 1;
        }
        for key in &colliding {
            c.set(key.as_bytes(), b"x", 3600);
        }
        // The most recently inserted colliding key is the new bucket head,
        // so it's reachable in one step.
        assert!(c.get(colliding[199].as_bytes(), None).is_some());
        // The first-inserted key is 199 chain steps deep, past the 100-step
        // cap, even though its bytes are still live in the arena.
        assert!(c.get(colliding[0].as_bytes(), None).is_none());
        invariants_hold(&c);
    }

    #[test]
    fn eviction_repairs_the_chain_for_a_solo_bucket_entry() {
        let mut c = cache(200);
        c.set(b"solo", b"value", 3600);
        invariants_hold(&c);
        // Fill and rotate past this entry; the chain that pointed at it
        // must be left in a consistent, non-self-referential state.
        for i in 0..30u32 {
            c.set(format!("filler{i}").as_bytes(), b"01234567", 3600);
            invariants_hold(&c);
        }
    }

    #[test]
    fn motion_accumulates_bytes_written() {
        let mut c = cache(4096);
        assert_eq!(c.motion(), 0);
        c.set(b"a", b"hello", 60);
        let m = c.motion();
        assert!(m > 0);
        c.set(b"b", b"world", 60);
        assert!(c.motion() > m);
    }

    #[test]
    fn reinit_discards_all_entries() {
        let mut c = cache(1024);
        c.set(b"a", b"hello", 60);
        assert!(c.init(2048, CacheOptions::default()));
        assert!(c.get(b"a", None).is_none());
        assert_eq!(c.size_bytes(), 2048);
        assert_eq!(c.motion(), 0);
    }
}
