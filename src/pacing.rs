//! Randomized pauses used to make automated browsing look manual.

use rand::Rng;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Points in the control flow that pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Situation {
    /// After the listing page loads, before harvesting links.
    ListingSettle,
    /// After an article is archived, before the next one.
    BetweenArticles,
    /// Between scroll steps during human emulation.
    ScrollPause,
    /// Before rasterizing, so lazy-loaded media can arrive.
    BeforePrint,
    /// After an interactive save.
    AfterSave,
}

/// Maps each situation to the range its pause is drawn from.
pub trait PacingPolicy: Send + Sync {
    fn pause(&self, situation: Situation) -> RangeInclusive<Duration>;

    /// Pixels per scroll step.
    fn scroll_step(&self) -> RangeInclusive<u32>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HumanPacing;

impl PacingPolicy for HumanPacing {
    fn pause(&self, situation: Situation) -> RangeInclusive<Duration> {
        let secs = |lo: f64, hi: f64| Duration::from_secs_f64(lo)..=Duration::from_secs_f64(hi);
        match situation {
            Situation::ListingSettle => secs(5.0, 15.0),
            Situation::BetweenArticles => secs(5.0, 15.0),
            Situation::ScrollPause => secs(0.3, 1.0),
            Situation::BeforePrint => secs(2.0, 5.0),
            Situation::AfterSave => secs(2.0, 2.0),
        }
    }

    fn scroll_step(&self) -> RangeInclusive<u32> {
        300..=800
    }
}

/// Never waits; for tests and dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl PacingPolicy for NoDelay {
    fn pause(&self, _situation: Situation) -> RangeInclusive<Duration> {
        Duration::ZERO..=Duration::ZERO
    }

    fn scroll_step(&self) -> RangeInclusive<u32> {
        800..=800
    }
}

/// Samples from a [`PacingPolicy`] and sleeps.
#[derive(Clone)]
pub struct Pacer {
    policy: Arc<dyn PacingPolicy>,
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer").finish_non_exhaustive()
    }
}

impl Pacer {
    pub fn new(policy: impl PacingPolicy + 'static) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    pub fn human() -> Self {
        Self::new(HumanPacing)
    }

    pub fn none() -> Self {
        Self::new(NoDelay)
    }

    pub fn sample(&self, situation: Situation) -> Duration {
        let range = self.policy.pause(situation);
        let (lo, hi) = (range.start().as_millis() as u64, range.end().as_millis() as u64);
        if hi <= lo {
            return Duration::from_millis(lo);
        }
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }

    pub fn scroll_step(&self) -> u32 {
        let range = self.policy.scroll_step();
        let (lo, hi) = (*range.start(), *range.end());
        if hi <= lo {
            return lo.max(1);
        }
        rand::thread_rng().gen_range(lo..=hi).max(1)
    }

    /// Uniform index below `len`; `len` must be non-zero.
    pub fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }

    pub async fn pause(&self, situation: Situation) {
        let wait = self.sample(situation);
        if wait.is_zero() {
            return;
        }
        debug!("Pausing {:?} ({:?})", wait, situation);
        tokio::time::sleep(wait).await;
    }
}
