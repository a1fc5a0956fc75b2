//! The cycle controller: measures wall-clock time between rotations,
//! tracks TTL statistics for the current cycle, and decides whether a
//! rotation should instead become a resize.

use crate::clock::AbsTime;
use crate::config::{CacheOptions, ResizeContext};
use crate::{MAXCACHESIZE, MINCACHESIZE};

/// Running TTL statistics for the entries inserted during one cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct TtlStats {
    pub count: u64,
    pub sum: u64,
    pub min: u64,
    pub max: u64,
}

impl TtlStats {
    pub(crate) fn record(&mut self, ttl_secs: u64) {
        if self.count == 0 {
            self.min = ttl_secs;
            self.max = ttl_secs;
        } else {
            self.min = self.min.min(ttl_secs);
            self.max = self.max.max(ttl_secs);
        }
        self.sum = self.sum.saturating_add(ttl_secs);
        self.count += 1;
    }
}

/// Mutable cycle-tracking state embedded in the cache object.
#[derive(Debug)]
pub(crate) struct CycleState {
    pub(crate) cycle_start: AbsTime,
    /// Previous cycle's `target_cycle_time / observed_cycle_time`; 0 means
    /// "no prior cycle recorded".
    pub(crate) last_ratio: f64,
    pub(crate) ttl_stats: TtlStats,
}

impl CycleState {
    pub(crate) fn new(now: AbsTime) -> Self {
        Self {
            cycle_start: now,
            last_ratio: 0.0,
            ttl_stats: TtlStats::default(),
        }
    }
}

/// The outcome of running the controller at a rotation point.
pub(crate) enum CycleOutcome {
    /// Rotate in place: freeze the active region as the new aged region.
    Rotate,
    /// Reinitialize the cache at `new_size`, discarding all entries.
    Resize { new_size: u32 },
}

/// Runs the controller at the moment the writer needs to wrap into a
/// non-empty aged region. Mutates `cycle` in place (resets `cycle_start`,
/// clears `ttl_stats`, updates `last_ratio`) and returns the decision.
pub(crate) fn evaluate(
    cycle: &mut CycleState,
    options: &mut CacheOptions,
    current_size: u32,
    now: AbsTime,
) -> CycleOutcome {
    let elapsed = now.elapsed_since(cycle.cycle_start);
    let mut outcome = CycleOutcome::Rotate;

    if options.allow_resize && elapsed > 0.0 {
        let target = options.target_cycle_time_secs as f64;
        let ratio = target / elapsed;
        let newsize = ((current_size as f64 * ratio * 1.10)
            .clamp(MINCACHESIZE as f64, MAXCACHESIZE as f64)) as u32;

        let grow = ratio > 1.0 && cycle.last_ratio > 1.0 && current_size < MAXCACHESIZE;
        let shrink = ratio < 0.5 && cycle.last_ratio < 0.5 && current_size > MINCACHESIZE;
        let mut decision = cycle.last_ratio != 0.0 && (grow || shrink);

        if let Some(cb) = options.resize_callback.as_mut() {
            let ctx = ResizeContext {
                ratio,
                old_size: current_size,
                proposed_size: newsize,
                ttl_stats: cycle.ttl_stats,
                provisional_decision: decision,
            };
            decision = cb(ctx);
        }

        if decision {
            log::info!(
                "cache resize: {current_size} -> {newsize} bytes (ratio={ratio:.3}, last_ratio={:.3})",
                cycle.last_ratio
            );
            cycle.last_ratio = 0.0;
            outcome = CycleOutcome::Resize { new_size: newsize };
        } else {
            log::debug!("cache rotation: ratio={ratio:.3} (no resize)");
            cycle.last_ratio = ratio;
        }
    } else {
        log::debug!("cache rotation (resize disabled or zero elapsed time)");
    }

    cycle.cycle_start = now;
    cycle.ttl_stats = TtlStats::default();

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(target: u64) -> CacheOptions {
        CacheOptions {
            allow_resize: true,
            target_cycle_time_secs: target,
            resize_callback: None,
        }
    }

    #[test]
    fn ttl_stats_tracks_min_max_sum() {
        let mut stats = TtlStats::default();
        stats.record(60);
        stats.record(10);
        stats.record(300);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, 10);
        assert_eq!(stats.max, 300);
        assert_eq!(stats.sum, 370);
    }

    #[test]
    fn single_fast_cycle_does_not_resize() {
        let mut cycle = CycleState::new(AbsTime::from_secs(0));
        let mut options = opts(10);
        let outcome = evaluate(&mut cycle, &mut options, 1024, AbsTime::from_secs(2));
        assert!(matches!(outcome, CycleOutcome::Rotate));
        assert!(cycle.last_ratio > 1.0);
    }

    #[test]
    fn two_consecutive_fast_cycles_grow() {
        let mut cycle = CycleState::new(AbsTime::from_secs(0));
        let mut options = opts(10);
        let first = evaluate(&mut cycle, &mut options, 1024, AbsTime::from_secs(2));
        assert!(matches!(first, CycleOutcome::Rotate));
        let second = evaluate(&mut cycle, &mut options, 1024, AbsTime::from_secs(4));
        match second {
            CycleOutcome::Resize { new_size } => {
                assert!(new_size > 1024);
                assert_eq!(cycle.last_ratio, 0.0);
            }
            CycleOutcome::Rotate => panic!("expected a resize after two agreeing fast cycles"),
        }
    }

    #[test]
    fn one_fast_then_one_slow_cycle_does_not_resize() {
        let mut cycle = CycleState::new(AbsTime::from_secs(0));
        let mut options = opts(10);
        let first = evaluate(&mut cycle, &mut options, 1024, AbsTime::from_secs(2));
        assert!(matches!(first, CycleOutcome::Rotate));
        let second = evaluate(&mut cycle, &mut options, 1024, AbsTime::from_secs(22));
        assert!(matches!(second, CycleOutcome::Rotate));
    }

    #[test]
    fn resize_callback_can_veto() {
        let mut cycle = CycleState::new(AbsTime::from_secs(0));
        let mut options = opts(10);
        options.resize_callback = Some(Box::new(|_ctx| false));
        evaluate(&mut cycle, &mut options, 1024, AbsTime::from_secs(2));
        let outcome = evaluate(&mut cycle, &mut options, 1024, AbsTime::from_secs(4));
        assert!(matches!(outcome, CycleOutcome::Rotate));
    }

    #[test]
    fn resize_callback_can_force() {
        let mut cycle = CycleState::new(AbsTime::from_secs(0));
        let mut options = opts(10);
        options.resize_callback = Some(Box::new(|_ctx| true));
        let outcome = evaluate(&mut cycle, &mut options, 1024, AbsTime::from_secs(2));
        assert!(matches!(outcome, CycleOutcome::Resize { .. }));
    }

    #[test]
    fn disabled_resize_never_resizes() {
        let mut cycle = CycleState::new(AbsTime::from_secs(0));
        let mut options = opts(10);
        options.allow_resize = false;
        evaluate(&mut cycle, &mut options, 1024, AbsTime::from_secs(2));
        let outcome = evaluate(&mut cycle, &mut options, 1024, AbsTime::from_secs(4));
        assert!(matches!(outcome, CycleOutcome::Rotate));
    }
}
