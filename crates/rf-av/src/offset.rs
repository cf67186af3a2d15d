//! Start-offset selection within the background clip.
//!
//! Each run cuts a fixed-length window out of the background clip. Where the
//! window starts is drawn from an [`OffsetSampler`] so runs get visual
//! variety, while tests can pin the choice.

use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of start offsets.
pub trait OffsetSampler: Send + Sync {
    /// Pick an offset in `[0, max_start)`.
    ///
    /// Values past `max_start` are clamped by [`choose_start_offset`].
    fn sample(&self, max_start: Duration) -> Duration;
}

/// Uniform sampler with millisecond resolution.
pub struct RandomOffset {
    rng: Mutex<StdRng>,
}

impl RandomOffset {
    /// Sampler seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sampler.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomOffset {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RandomOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomOffset").finish_non_exhaustive()
    }
}

impl OffsetSampler for RandomOffset {
    fn sample(&self, max_start: Duration) -> Duration {
        let max_ms = u64::try_from(max_start.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.rng.lock().gen_range(0..max_ms))
    }
}

/// Choose where a `window`-long cut of a `source`-long clip starts.
///
/// The result `o` always satisfies `0 <= o <= source - window`.
///
/// # Errors
///
/// Returns [`rf_core::Error::Validation`] when the window is longer than the
/// source.
pub fn choose_start_offset(
    sampler: &dyn OffsetSampler,
    source: Duration,
    window: Duration,
) -> rf_core::Result<Duration> {
    let max_start = source.checked_sub(window).ok_or_else(|| {
        rf_core::Error::Validation(format!(
            "background ({source:?}) is shorter than the {window:?} window"
        ))
    })?;
    Ok(sampler.sample(max_start).min(max_start))
}
