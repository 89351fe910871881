#![forbid(unsafe_code)]

//! Scroll-spy: decides which configured section is active.
//!
//! [`SectionVisibilityTracker`] keeps a transient map of visible sections
//! and their intersection ratios and derives the single active section from
//! it:
//!
//! 1. While the [`NavigationLock`] is engaged every automatic update is
//!    dropped without touching any state.
//! 2. Intersection batches record (or remove) ratios for observed sections.
//! 3. Within `bottom_threshold_px` of the document end the last configured
//!    section wins regardless of ratios.
//! 4. Otherwise the strictly highest ratio wins; ties follow [`TieBreak`].
//!    If every recorded ratio is zero the first configured section wins.
//! 5. With nothing visible the previous active section sticks.
//!
//! Scroll events only apply rule 3; ratios change on intersection batches.
//!
//! An empty section list makes the tracker inert: automatic updates never
//! run and the active section stays the empty id.

use core::time::Duration;

use navspy_core::{IntersectionEntry, ScrollMetrics, SectionId, SectionList};

use crate::config::{SpyConfig, TieBreak};
use crate::lock::{NavigationLock, ReleaseReason};
use crate::signal::{ReadSignal, Signal};

#[derive(Debug)]
pub struct SectionVisibilityTracker {
    sections: SectionList,
    /// Sections with a matching document element, in configured order.
    observed: Vec<SectionId>,
    /// Visible sections in insertion order.
    visible: Vec<(SectionId, f64)>,
    active: Signal<SectionId>,
    lock: NavigationLock,
    bottom_threshold: f64,
    tie_break: TieBreak,
    torn_down: bool,
}

impl SectionVisibilityTracker {
    /// Build a tracker observing only the sections for which `present`
    /// returns `true`. Missing elements are skipped.
    pub fn new(
        sections: SectionList,
        config: &SpyConfig,
        present: impl Fn(&SectionId) -> bool,
    ) -> Self {
        let mut observed = Vec::with_capacity(sections.len());
        for id in &sections {
            if present(id) {
                observed.push(id.clone());
            } else {
                tracing::debug!(
                    target: "navspy.tracker",
                    section = %id,
                    "section element missing, not observed"
                );
            }
        }
        let initial = sections.first().cloned().unwrap_or_default();
        tracing::debug!(
            target: "navspy.tracker",
            configured = sections.len(),
            observed = observed.len(),
            initial = %initial,
            "scroll-spy attached"
        );
        Self {
            sections,
            observed,
            visible: Vec::new(),
            active: Signal::new(initial),
            lock: NavigationLock::new(config.settle_delay(), config.lock_ceiling()),
            bottom_threshold: config.bottom_threshold_px,
            tie_break: config.tie_break,
            torn_down: false,
        }
    }

    /// Build a tracker that assumes every configured section is present.
    pub fn with_all_present(sections: SectionList, config: &SpyConfig) -> Self {
        Self::new(sections, config, |_| true)
    }

    #[must_use]
    pub fn active_section(&self) -> SectionId {
        self.active.get()
    }

    /// Read-only handle to the active section.
    #[must_use]
    pub fn active_signal(&self) -> ReadSignal<SectionId> {
        self.active.reader()
    }

    #[must_use]
    pub fn sections(&self) -> &SectionList {
        &self.sections
    }

    /// Sections that were found in the document.
    #[must_use]
    pub fn observed(&self) -> &[SectionId] {
        &self.observed
    }

    /// Currently visible sections and their ratios, in insertion order.
    #[must_use]
    pub fn visible(&self) -> &[(SectionId, f64)] {
        &self.visible
    }

    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.sections.is_empty() || self.torn_down
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    #[must_use]
    pub fn lock(&self) -> &NavigationLock {
        &self.lock
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Apply an intersection batch. Returns `true` if the active section changed.
    pub fn on_intersection(
        &mut self,
        entries: &[IntersectionEntry],
        scroll: Option<&ScrollMetrics>,
    ) -> bool {
        if self.is_inert() {
            return false;
        }
        if self.lock.is_locked() {
            tracing::trace!(
                target: "navspy.tracker",
                entries = entries.len(),
                "intersection batch ignored while locked"
            );
            return false;
        }

        for entry in entries {
            if !self.observed.contains(&entry.section) {
                continue;
            }
            if entry.is_intersecting {
                self.record(&entry.section, entry.clamped_ratio());
            } else {
                self.visible.retain(|(id, _)| id != &entry.section);
            }
        }

        if let Some(last) = self.bottom_override(scroll) {
            return self.set_active(last, "bottom");
        }

        if self.visible.is_empty() {
            return false;
        }
        let winner = self.most_visible();
        self.set_active(winner, "ratio")
    }

    /// Apply a scroll sample. Returns `true` if the active section changed.
    pub fn on_scroll(&mut self, scroll: &ScrollMetrics) -> bool {
        if self.is_inert() || self.lock.is_locked() {
            return false;
        }
        match self.bottom_override(Some(scroll)) {
            Some(last) => self.set_active(last, "bottom"),
            None => false,
        }
    }

    /// Deliver a `scrollend` signal to the lock.
    pub fn on_scroll_end(&mut self, now: Duration) -> bool {
        if self.torn_down {
            return false;
        }
        self.lock.scroll_end(now)
    }

    /// Force the active section (link click) and engage the lock.
    ///
    /// `id` is not validated against the configured sections.
    pub fn set_active_section(&mut self, id: SectionId, now: Duration) -> bool {
        if self.torn_down {
            return false;
        }
        let changed = self.set_active(id, "navigate");
        self.lock.engage(now);
        changed
    }

    /// Fire due lock timers.
    pub fn advance(&mut self, now: Duration) -> Option<ReleaseReason> {
        if self.torn_down {
            return None;
        }
        self.lock.advance(now)
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        if self.torn_down {
            return None;
        }
        self.lock.next_deadline()
    }

    /// Stop observing, cancel timers and listeners, drop subscribers.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.visible.clear();
        self.observed.clear();
        self.lock.reset();
        self.active.clear_subscribers();
        tracing::debug!(target: "navspy.tracker", "scroll-spy torn down");
    }

    fn record(&mut self, id: &SectionId, ratio: f64) {
        match self.visible.iter_mut().find(|(seen, _)| seen == id) {
            Some((_, slot)) => *slot = ratio,
            None => self.visible.push((id.clone(), ratio)),
        }
    }

    fn bottom_override(&self, scroll: Option<&ScrollMetrics>) -> Option<SectionId> {
        let scroll = scroll?;
        if scroll.is_near_bottom(self.bottom_threshold) {
            self.sections.last().cloned()
        } else {
            None
        }
    }

    fn most_visible(&self) -> SectionId {
        let mut best_ratio = 0.0;
        let mut best = self.sections.first().cloned().unwrap_or_default();
        let mut consider = |id: &SectionId, ratio: f64| {
            if ratio > best_ratio {
                best_ratio = ratio;
                best = id.clone();
            }
        };
        match self.tie_break {
            TieBreak::FirstObserved => {
                for (id, ratio) in &self.visible {
                    consider(id, *ratio);
                }
            }
            TieBreak::ConfiguredOrder => {
                for id in &self.sections {
                    if let Some((_, ratio)) = self.visible.iter().find(|(seen, _)| seen == id) {
                        consider(id, *ratio);
                    }
                }
            }
        }
        best
    }

    fn set_active(&mut self, id: SectionId, cause: &'static str) -> bool {
        let changed = self.active.set(id);
        if changed {
            tracing::debug!(
                target: "navspy.tracker",
                active = %self.active.with(|a| a.to_string()),
                cause,
                "active section changed"
            );
        }
        changed
    }
}
