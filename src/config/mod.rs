use crate::cache::cycle::TtlStats;
use std::fmt;

/// The context handed to a [`CacheOptions::resize_callback`] at every
/// rotation: the observed ratio, the current and proposed sizes,
/// this cycle's TTL statistics, and the engine's own provisional decision.
/// The callback's return value overrides `provisional_decision`.
#[derive(Debug, Clone, Copy)]
pub struct ResizeContext {
    pub ratio: f64,
    pub old_size: u32,
    pub proposed_size: u32,
    pub ttl_stats: TtlStats,
    pub provisional_decision: bool,
}

/// A boxed resize hook. Called at most once per cycle rotation.
pub type ResizeCallback = Box<dyn FnMut(ResizeContext) -> bool + Send>;

/// Tunables for the cycle controller.
pub struct CacheOptions {
    /// Enables the cycle controller to reinitialize the cache at a new size.
    pub allow_resize: bool,
    /// Desired wall-clock duration between rotations.
    pub target_cycle_time_secs: u64,
    /// Observability/policy extension point, invoked at each rotation.
    pub resize_callback: Option<ResizeCallback>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            allow_resize: true,
            target_cycle_time_secs: 86_400,
            resize_callback: None,
        }
    }
}

// `resize_callback` is a trait object, so `Debug` has to be written by hand.
impl fmt::Debug for CacheOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheOptions")
            .field("allow_resize", &self.allow_resize)
            .field("target_cycle_time_secs", &self.target_cycle_time_secs)
            .field("resize_callback", &self.resize_callback.is_some())
            .finish()
    }
}
