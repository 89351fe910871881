#![forbid(unsafe_code)]

//! Single serialized entry point for the navigation highlight.
//!
//! [`NavHighlighter`] owns the scroll-spy tracker, the underline calculator
//! and the host layout. Every host signal goes through
//! [`NavHighlighter::dispatch`], which:
//!
//! 1. fires every timer due at `now` (lock release, underline settle),
//! 2. applies the event,
//! 3. recomputes the underline if the active section changed or the
//!    viewport was resized.
//!
//! Ordering and locking therefore live in one place, and a host only has to
//! forward events in the order it receives them.

use core::time::Duration;

use navspy_core::{HostEvent, ScrollMetrics, SectionId, SectionList};

use crate::config::SpyConfig;
use crate::lock::ReleaseReason;
use crate::signal::ReadSignal;
use crate::tracker::SectionVisibilityTracker;
use crate::underline::{NavLayout, RecomputeCause, UnderlineGeometryCalculator, UnderlinePosition};

/// Result of one [`NavHighlighter::dispatch`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// The active section changed.
    pub active_changed: bool,
    /// The published underline changed.
    pub underline_changed: bool,
    /// The navigation lock was released while firing timers.
    pub lock_released: Option<ReleaseReason>,
    /// The event was dropped (torn down).
    pub ignored: bool,
}

impl DispatchOutcome {
    fn merge(&mut self, other: DispatchOutcome) {
        self.active_changed |= other.active_changed;
        self.underline_changed |= other.underline_changed;
        self.lock_released = self.lock_released.or(other.lock_released);
        self.ignored &= other.ignored;
    }
}

/// Navigation-highlight engine for one page view.
#[derive(Debug)]
pub struct NavHighlighter<L> {
    tracker: SectionVisibilityTracker,
    underline: UnderlineGeometryCalculator,
    layout: L,
    config: SpyConfig,
    scroll: Option<ScrollMetrics>,
    viewport: Option<(f64, f64)>,
    now: Duration,
    events: u64,
}

impl<L: NavLayout> NavHighlighter<L> {
    /// Build an engine observing the sections `present` reports as rendered,
    /// and compute the initial underline.
    pub fn new(
        sections: SectionList,
        config: SpyConfig,
        layout: L,
        present: impl Fn(&SectionId) -> bool,
        now: Duration,
    ) -> Self {
        let tracker = SectionVisibilityTracker::new(sections, &config, present);
        let underline = UnderlineGeometryCalculator::new(config.underline_settle());
        let mut this = Self {
            tracker,
            underline,
            layout,
            config,
            scroll: None,
            viewport: None,
            now,
            events: 0,
        };
        let active = this.tracker.active_section();
        this.underline
            .recompute(RecomputeCause::Initial, &active, &this.layout, now);
        this
    }

    /// Build an engine for a page; scroll-spy only runs on the home page.
    ///
    /// Off the home page the section list is empty, the tracker is inert and
    /// no underline is published.
    pub fn for_page(
        is_home: bool,
        sections: SectionList,
        config: SpyConfig,
        layout: L,
        now: Duration,
    ) -> Self {
        let sections = if is_home { sections } else { SectionList::empty() };
        Self::new(sections, config, layout, |_| true, now)
    }

    // --- Accessors ---------------------------------------------------------

    #[must_use]
    pub fn active_section(&self) -> SectionId {
        self.tracker.active_section()
    }

    #[must_use]
    pub fn active_signal(&self) -> ReadSignal<SectionId> {
        self.tracker.active_signal()
    }

    #[must_use]
    pub fn underline(&self) -> Option<UnderlinePosition> {
        self.underline.position()
    }

    #[must_use]
    pub fn underline_signal(&self) -> ReadSignal<Option<UnderlinePosition>> {
        self.underline.position_signal()
    }

    #[must_use]
    pub fn tracker(&self) -> &SectionVisibilityTracker {
        &self.tracker
    }

    #[must_use]
    pub fn config(&self) -> &SpyConfig {
        &self.config
    }

    #[must_use]
    pub fn layout(&self) -> &L {
        &self.layout
    }

    /// Mutable access for hosts that push layout updates.
    ///
    /// Layout changes take effect on the next recomputation trigger.
    pub fn layout_mut(&mut self) -> &mut L {
        &mut self.layout
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.tracker.is_locked()
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.tracker.is_torn_down()
    }

    /// Last scroll sample seen.
    #[must_use]
    pub fn scroll(&self) -> Option<ScrollMetrics> {
        self.scroll
    }

    /// Last viewport size seen.
    #[must_use]
    pub fn viewport(&self) -> Option<(f64, f64)> {
        self.viewport
    }

    /// Time of the latest dispatch.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Events dispatched so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.events
    }

    /// Earliest pending timer, for hosts that schedule a wakeup.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        match (self.tracker.next_deadline(), self.underline.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // --- Entry points ------------------------------------------------------

    /// Process one host event at monotonic time `now`.
    ///
    /// Time never moves backwards: an earlier `now` is treated as the latest
    /// time already seen.
    pub fn dispatch(&mut self, event: HostEvent, now: Duration) -> DispatchOutcome {
        if self.tracker.is_torn_down() {
            tracing::trace!(target: "navspy.host", kind = event.kind(), "dispatch after teardown");
            return DispatchOutcome {
                ignored: true,
                ..DispatchOutcome::default()
            };
        }
        let now = now.max(self.now);
        self.now = now;
        self.events += 1;

        let _span = tracing::trace_span!("navspy.dispatch", kind = event.kind()).entered();
        let mut outcome = self.fire_timers(now);

        let active_changed = match event {
            HostEvent::Intersection { entries, scroll } => {
                if scroll.is_some() {
                    self.scroll = scroll;
                }
                self.tracker.on_intersection(&entries, self.scroll.as_ref())
            }
            HostEvent::Scroll(metrics) => {
                self.scroll = Some(metrics);
                self.tracker.on_scroll(&metrics)
            }
            HostEvent::ScrollEnd => {
                self.tracker.on_scroll_end(now);
                false
            }
            HostEvent::Resize { width, height } => {
                self.viewport = Some((width, height));
                let active = self.tracker.active_section();
                outcome.underline_changed |=
                    self.underline
                        .recompute(RecomputeCause::Resize, &active, &self.layout, now);
                false
            }
            HostEvent::Navigate { section } => self.tracker.set_active_section(section, now),
            HostEvent::Tick => false,
        };

        if active_changed {
            outcome.active_changed = true;
            outcome.underline_changed |= self.recompute_for_active(now);
        }
        outcome
    }

    /// Explicit navigation (link click).
    pub fn set_active_section(&mut self, id: impl Into<SectionId>, now: Duration) -> DispatchOutcome {
        self.dispatch(HostEvent::navigate(id), now)
    }

    /// Advance time without another signal.
    pub fn advance(&mut self, now: Duration) -> DispatchOutcome {
        self.dispatch(HostEvent::Tick, now)
    }

    /// Recompute the underline from the current layout without a trigger,
    /// e.g. after the host re-rendered the nav.
    pub fn refresh_underline(&mut self) -> bool {
        let active = self.tracker.active_section();
        self.underline
            .recompute(RecomputeCause::Refresh, &active, &self.layout, self.now)
    }

    /// Disconnect everything. No later event or timer can change state.
    pub fn teardown(&mut self) {
        self.tracker.teardown();
        self.underline.teardown();
        tracing::debug!(target: "navspy.host", events = self.events, "highlighter torn down");
    }

    fn fire_timers(&mut self, now: Duration) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        outcome.lock_released = self.tracker.advance(now);
        let active = self.tracker.active_section();
        outcome.underline_changed = self.underline.advance(&active, &self.layout, now);
        outcome
    }

    fn recompute_for_active(&mut self, now: Duration) -> bool {
        let active = self.tracker.active_section();
        self.underline
            .recompute(RecomputeCause::ActiveChanged, &active, &self.layout, now)
    }
}

/// Dispatch a batch of `(time, event)` pairs in order, merging outcomes.
pub fn dispatch_all<L: NavLayout>(
    highlighter: &mut NavHighlighter<L>,
    events: impl IntoIterator<Item = (Duration, HostEvent)>,
) -> DispatchOutcome {
    let mut merged = DispatchOutcome {
        ignored: true,
        ..DispatchOutcome::default()
    };
    for (now, event) in events {
        merged.merge(highlighter.dispatch(event, now));
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use navspy_core::{IntersectionEntry as E, Rect};
    use std::collections::HashMap;

    #[derive(Debug, Default)]
    struct Layout {
        container: Option<Rect>,
        links: HashMap<String, Rect>,
    }

    impl NavLayout for Layout {
        fn container_rect(&self) -> Option<Rect> {
            self.container
        }

        fn link_rect(&self, section: &SectionId) -> Option<Rect> {
            self.links.get(section.as_str()).copied()
        }
    }

    fn layout() -> Layout {
        let mut links = HashMap::new();
        links.insert("projects".to_string(), Rect::from_span(110.0, 190.0));
        links.insert("experience".to_string(), Rect::from_span(190.0, 290.0));
        links.insert("about".to_string(), Rect::from_span(290.0, 350.0));
        links.insert("contact".to_string(), Rect::from_span(350.0, 430.0));
        Layout {
            container: Some(Rect::new(100.0, 0.0, 400.0, 48.0)),
            links,
        }
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn engine() -> NavHighlighter<Layout> {
        NavHighlighter::new(
            SectionList::new(["projects", "experience", "about", "contact"]),
            SpyConfig::default(),
            layout(),
            |_| true,
            ms(0),
        )
    }

    fn mid() -> Option<navspy_core::ScrollMetrics> {
        Some(navspy_core::ScrollMetrics::new(900.0, 800.0, 6000.0))
    }

    #[test]
    fn initial_underline_under_first_link() {
        let nav = engine();
        assert_eq!(
            nav.underline(),
            Some(UnderlinePosition {
                left: 10.0,
                width: 80.0
            })
        );
    }

    #[test]
    fn active_change_moves_underline() {
        let mut nav = engine();
        let out = nav.dispatch(
            HostEvent::Intersection {
                entries: vec![E::visible("about", 0.75)],
                scroll: mid(),
            },
            ms(16),
        );
        assert!(out.active_changed);
        assert!(out.underline_changed);
        assert_eq!(
            nav.underline(),
            Some(UnderlinePosition {
                left: 190.0,
                width: 60.0
            })
        );
    }

    #[test]
    fn navigate_then_ceiling_reenables_tracking() {
        let mut nav = engine();
        nav.set_active_section("contact", ms(0));
        let blocked = nav.dispatch(
            HostEvent::Intersection {
                entries: vec![E::visible("experience", 1.0)],
                scroll: mid(),
            },
            ms(10),
        );
        assert!(!blocked.active_changed);
        assert_eq!(nav.active_section(), "contact");

        let released = nav.advance(ms(1000));
        assert_eq!(released.lock_released, Some(ReleaseReason::Ceiling));

        let out = nav.dispatch(
            HostEvent::Intersection {
                entries: vec![E::visible("experience", 1.0)],
                scroll: mid(),
            },
            ms(1010),
        );
        assert!(out.active_changed);
        assert_eq!(nav.active_section(), "experience");
    }

    #[test]
    fn resize_reads_fresh_layout() {
        let mut nav = engine();
        nav.layout_mut().container = Some(Rect::new(60.0, 0.0, 400.0, 48.0));
        let out = nav.dispatch(
            HostEvent::Resize {
                width: 800.0,
                height: 600.0,
            },
            ms(5),
        );
        assert!(out.underline_changed);
        assert_eq!(nav.underline().map(|p| p.left), Some(50.0));
        assert_eq!(nav.viewport(), Some((800.0, 600.0)));
    }

    #[test]
    fn time_never_goes_backwards() {
        let mut nav = engine();
        nav.advance(ms(500));
        nav.advance(ms(100));
        assert_eq!(nav.now(), ms(500));
    }

    #[test]
    fn next_deadline_is_earliest_timer() {
        let mut nav = engine();
        // Initial underline settle.
        assert_eq!(nav.next_deadline(), Some(ms(100)));
        nav.advance(ms(100));
        assert_eq!(nav.next_deadline(), None);
        nav.set_active_section("about", ms(200));
        assert_eq!(nav.next_deadline(), Some(ms(300)));
    }

    #[test]
    fn off_home_page_is_inert() {
        let mut nav = NavHighlighter::for_page(
            false,
            SectionList::new(["projects", "contact"]),
            SpyConfig::default(),
            layout(),
            ms(0),
        );
        assert!(nav.active_section().is_empty());
        assert_eq!(nav.underline(), None);
        let out = nav.dispatch(
            HostEvent::Scroll(navspy_core::ScrollMetrics::new(5950.0, 0.0, 6000.0)),
            ms(1),
        );
        assert!(!out.active_changed);
    }

    #[test]
    fn teardown_ignores_everything() {
        let mut nav = engine();
        nav.teardown();
        let out = nav.set_active_section("contact", ms(1));
        assert!(out.ignored);
        assert_eq!(nav.active_section(), "projects");
        assert_eq!(nav.next_deadline(), None);
    }

    #[test]
    fn dispatch_all_merges_outcomes() {
        let mut nav = engine();
        let out = dispatch_all(
            &mut nav,
            [
                (ms(1), HostEvent::Tick),
                (
                    ms(2),
                    HostEvent::Intersection {
                        entries: vec![E::visible("about", 0.5)],
                        scroll: mid(),
                    },
                ),
                (ms(3), HostEvent::Tick),
            ],
        );
        assert!(out.active_changed);
        assert!(!out.ignored);
        assert_eq!(nav.event_count(), 3);
    }
}
