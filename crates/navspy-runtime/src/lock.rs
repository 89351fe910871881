#![forbid(unsafe_code)]

//! Navigation lock: suspends automatic section tracking after a link click.
//!
//! # Lifecycle
//!
//! ```text
//!            engage(now)                    scroll_end(now)
//!  Unlocked ───────────▶ Locked{awaiting} ─────────────────▶ Locked{settling}
//!     ▲                     │                                    │
//!     │   ceiling timer     │             settle timer           │
//!     └─────────────────────┴────────────────────────────────────┘
//! ```
//!
//! Engaging bumps a generation counter. Every timer captures the generation
//! it was scheduled under and is a no-op if a newer engagement happened in
//! the meantime, so a timer left over from an earlier click can never
//! release a newer lock.
//!
//! # Invariants
//!
//! 1. At most one lock is outstanding; engaging again replaces it.
//! 2. The scroll-end listener is one-shot and only armed while locked.
//! 3. The ceiling timer always releases the lock, even if `scrollend` never
//!    arrives.

use core::time::Duration;

use crate::timer::{TimerId, TimerQueue};

/// Payload of a lock timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTimer {
    /// Fires `settle_delay` after a scroll-end signal.
    Settle { generation: u64 },
    /// Fires `ceiling` after engagement regardless of scroll-end.
    Ceiling { generation: u64 },
}

/// Why a lock was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseReason {
    /// Scroll ended and the settle delay elapsed.
    Settled,
    /// The hard ceiling elapsed.
    Ceiling,
}

#[derive(Debug)]
pub struct NavigationLock {
    locked: bool,
    generation: u64,
    awaiting_scroll_end: bool,
    settle_timer: Option<TimerId>,
    ceiling_timer: Option<TimerId>,
    timers: TimerQueue<LockTimer>,
    settle_delay: Duration,
    ceiling: Duration,
}

impl NavigationLock {
    #[must_use]
    pub fn new(settle_delay: Duration, ceiling: Duration) -> Self {
        Self {
            locked: false,
            generation: 0,
            awaiting_scroll_end: false,
            settle_timer: None,
            ceiling_timer: None,
            timers: TimerQueue::new(),
            settle_delay,
            ceiling,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    #[inline]
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a one-shot scroll-end listener is armed.
    #[inline]
    #[must_use]
    pub const fn awaiting_scroll_end(&self) -> bool {
        self.awaiting_scroll_end
    }

    /// Engage (or re-engage) the lock. Returns the new generation.
    pub fn engage(&mut self, now: Duration) -> u64 {
        self.cancel_timers();
        self.generation += 1;
        self.locked = true;
        self.awaiting_scroll_end = true;
        let generation = self.generation;
        self.ceiling_timer = Some(
            self.timers
                .schedule(now.saturating_add(self.ceiling), LockTimer::Ceiling { generation }),
        );
        tracing::debug!(
            target: "navspy.lock",
            generation,
            ceiling_ms = self.ceiling.as_millis() as u64,
            "navigation lock engaged"
        );
        generation
    }

    /// Deliver a scroll-end signal. Returns `true` if it scheduled a release.
    pub fn scroll_end(&mut self, now: Duration) -> bool {
        if !self.locked || !self.awaiting_scroll_end {
            tracing::trace!(target: "navspy.lock", "scrollend ignored: no listener armed");
            return false;
        }
        self.awaiting_scroll_end = false;
        if let Some(id) = self.settle_timer.take() {
            self.timers.cancel(id);
        }
        let generation = self.generation;
        self.settle_timer = Some(
            self.timers
                .schedule(now.saturating_add(self.settle_delay), LockTimer::Settle { generation }),
        );
        tracing::debug!(
            target: "navspy.lock",
            generation,
            settle_ms = self.settle_delay.as_millis() as u64,
            "scroll ended, release scheduled"
        );
        true
    }

    /// Fire due timers. Returns the release reason if the lock was released.
    pub fn advance(&mut self, now: Duration) -> Option<ReleaseReason> {
        let mut released = None;
        for (id, timer) in self.timers.pop_due(now) {
            let (generation, reason) = match timer {
                LockTimer::Settle { generation } => {
                    if self.settle_timer == Some(id) {
                        self.settle_timer = None;
                    }
                    (generation, ReleaseReason::Settled)
                }
                LockTimer::Ceiling { generation } => {
                    if self.ceiling_timer == Some(id) {
                        self.ceiling_timer = None;
                    }
                    (generation, ReleaseReason::Ceiling)
                }
            };
            if generation != self.generation {
                tracing::trace!(
                    target: "navspy.lock",
                    stale = generation,
                    current = self.generation,
                    "stale lock timer ignored"
                );
                continue;
            }
            if reason == ReleaseReason::Ceiling {
                self.awaiting_scroll_end = false;
            }
            if self.locked {
                self.locked = false;
                released = Some(reason);
                tracing::debug!(
                    target: "navspy.lock",
                    generation,
                    reason = ?reason,
                    "navigation lock released"
                );
            }
        }
        released
    }

    /// Earliest pending lock deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Release immediately and drop every timer and listener.
    pub fn reset(&mut self) {
        self.cancel_timers();
        self.timers.clear();
        self.locked = false;
        self.awaiting_scroll_end = false;
        // Anything still in flight from before the reset is now stale.
        self.generation += 1;
    }

    fn cancel_timers(&mut self) {
        if let Some(id) = self.settle_timer.take() {
            self.timers.cancel(id);
        }
        if let Some(id) = self.ceiling_timer.take() {
            self.timers.cancel(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn lock() -> NavigationLock {
        NavigationLock::new(ms(100), ms(1000))
    }

    #[test]
    fn ceiling_releases_without_scroll_end() {
        let mut lock = lock();
        lock.engage(ms(0));
        assert!(lock.is_locked());
        assert_eq!(lock.advance(ms(999)), None);
        assert_eq!(lock.advance(ms(1000)), Some(ReleaseReason::Ceiling));
        assert!(!lock.is_locked());
        assert!(!lock.awaiting_scroll_end());
    }

    #[test]
    fn scroll_end_then_settle_releases_early() {
        let mut lock = lock();
        lock.engage(ms(0));
        assert!(lock.scroll_end(ms(300)));
        assert!(!lock.awaiting_scroll_end());
        assert_eq!(lock.advance(ms(399)), None);
        assert_eq!(lock.advance(ms(400)), Some(ReleaseReason::Settled));
        // The ceiling still fires later but has nothing left to release.
        assert_eq!(lock.advance(ms(1000)), None);
    }

    #[test]
    fn scroll_end_is_one_shot() {
        let mut lock = lock();
        lock.engage(ms(0));
        assert!(lock.scroll_end(ms(50)));
        assert!(!lock.scroll_end(ms(60)));
    }

    #[test]
    fn scroll_end_without_lock_is_ignored() {
        let mut lock = lock();
        assert!(!lock.scroll_end(ms(10)));
        assert!(lock.next_deadline().is_none());
    }

    #[test]
    fn reengage_cancels_previous_timers() {
        let mut lock = lock();
        lock.engage(ms(0));
        lock.scroll_end(ms(100));
        // Second click before the settle timer fires.
        let generation = lock.engage(ms(150));
        assert_eq!(generation, 2);
        assert_eq!(lock.advance(ms(200)), None);
        assert_eq!(lock.advance(ms(1000)), None);
        assert!(lock.is_locked());
        assert_eq!(lock.advance(ms(1150)), Some(ReleaseReason::Ceiling));
    }

    #[test]
    fn reset_drops_everything() {
        let mut lock = lock();
        lock.engage(ms(0));
        lock.reset();
        assert!(!lock.is_locked());
        assert!(lock.next_deadline().is_none());
        assert_eq!(lock.advance(ms(5000)), None);
    }
}
