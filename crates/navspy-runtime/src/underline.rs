#![forbid(unsafe_code)]

//! Underline geometry for the active nav link.
//!
//! The underline is positioned relative to the nav container:
//!
//! ```text
//! left  = link.left - container.left
//! width = link.width
//! ```
//!
//! Geometry is always recomputed from a fresh [`NavLayout`] read, never
//! patched incrementally. A missing container or link yields `None`, which
//! the presentation layer paints as "no underline".
//!
//! Recomputation happens when the active section changes and on viewport
//! resize. The initial computation and every active change also schedule
//! one more recompute `underline_settle` later to absorb late layout shifts
//! such as a web font swap.

use core::time::Duration;

use navspy_core::{Rect, SectionId};

use crate::signal::{ReadSignal, Signal};
use crate::timer::{TimerId, TimerQueue};

/// Position of the underline in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UnderlinePosition {
    pub left: f64,
    pub width: f64,
}

/// Live layout of the navigation bar.
///
/// Implemented by the host adapter: a DOM reader on `wasm32`, or a snapshot
/// of rects pushed by the host elsewhere.
pub trait NavLayout {
    /// Bounding rect of the nav container, if rendered.
    fn container_rect(&self) -> Option<Rect>;

    /// Bounding rect of the link tagged `data-section="<section>"`, if any.
    fn link_rect(&self, section: &SectionId) -> Option<Rect>;
}

impl<L: NavLayout + ?Sized> NavLayout for &L {
    fn container_rect(&self) -> Option<Rect> {
        (**self).container_rect()
    }

    fn link_rect(&self, section: &SectionId) -> Option<Rect> {
        (**self).link_rect(section)
    }
}

/// Pure geometry: underline for `active` in `layout`.
#[must_use]
pub fn underline_for(active: &SectionId, layout: &impl NavLayout) -> Option<UnderlinePosition> {
    let container = layout.container_rect()?;
    let link = layout.link_rect(active)?;
    if !container.is_finite() || !link.is_finite() {
        return None;
    }
    Some(UnderlinePosition {
        left: link.left() - container.left(),
        width: link.width,
    })
}

/// What caused a recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeCause {
    Initial,
    ActiveChanged,
    Resize,
    Settle,
    /// Host asked for a recompute after re-rendering the nav.
    Refresh,
}

#[derive(Debug)]
pub struct UnderlineGeometryCalculator {
    position: Signal<Option<UnderlinePosition>>,
    settle_delay: Duration,
    settle_timer: Option<TimerId>,
    timers: TimerQueue<()>,
    recomputes: u64,
    torn_down: bool,
}

impl UnderlineGeometryCalculator {
    #[must_use]
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            position: Signal::new(None),
            settle_delay,
            settle_timer: None,
            timers: TimerQueue::new(),
            recomputes: 0,
            torn_down: false,
        }
    }

    #[must_use]
    pub fn position(&self) -> Option<UnderlinePosition> {
        self.position.get()
    }

    #[must_use]
    pub fn position_signal(&self) -> ReadSignal<Option<UnderlinePosition>> {
        self.position.reader()
    }

    /// Number of recomputations performed so far.
    #[must_use]
    pub const fn recompute_count(&self) -> u64 {
        self.recomputes
    }

    /// Recompute now. Returns `true` if the published position changed.
    ///
    /// `Initial` and `ActiveChanged` also (re)arm the delayed settle
    /// recomputation; a newer arm replaces an older one.
    pub fn recompute(
        &mut self,
        cause: RecomputeCause,
        active: &SectionId,
        layout: &impl NavLayout,
        now: Duration,
    ) -> bool {
        if self.torn_down {
            return false;
        }
        self.recomputes += 1;
        let next = underline_for(active, layout);
        let changed = self.position.set(next);
        tracing::trace!(
            target: "navspy.underline",
            cause = ?cause,
            section = %active,
            left = next.map(|p| p.left),
            width = next.map(|p| p.width),
            changed,
            "underline recomputed"
        );
        if matches!(cause, RecomputeCause::Initial | RecomputeCause::ActiveChanged) {
            self.arm_settle(now);
        }
        changed
    }

    /// Fire the delayed recomputation if it is due.
    pub fn advance(&mut self, active: &SectionId, layout: &impl NavLayout, now: Duration) -> bool {
        if self.torn_down || self.timers.is_empty() {
            return false;
        }
        let mut changed = false;
        for (id, ()) in self.timers.pop_due(now) {
            if self.settle_timer == Some(id) {
                self.settle_timer = None;
                changed |= self.recompute(RecomputeCause::Settle, active, layout, now);
            }
        }
        changed
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Cancel the pending recomputation and drop subscribers.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.settle_timer = None;
        self.timers.clear();
        self.position.clear_subscribers();
    }

    fn arm_settle(&mut self, now: Duration) {
        if let Some(id) = self.settle_timer.take() {
            self.timers.cancel(id);
        }
        self.settle_timer = Some(self.timers.schedule(now.saturating_add(self.settle_delay), ()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeNav {
        container: Option<Rect>,
        links: RefCell<HashMap<String, Rect>>,
    }

    impl FakeNav {
        fn new(container_x: f64) -> Self {
            Self {
                container: Some(Rect::new(container_x, 0.0, 600.0, 40.0)),
                links: RefCell::default(),
            }
        }

        fn link(self, id: &str, left: f64, right: f64) -> Self {
            self.links
                .borrow_mut()
                .insert(id.to_string(), Rect::from_span(left, right));
            self
        }
    }

    impl NavLayout for FakeNav {
        fn container_rect(&self) -> Option<Rect> {
            self.container
        }

        fn link_rect(&self, section: &SectionId) -> Option<Rect> {
            self.links.borrow().get(section.as_str()).copied()
        }
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn geometry_relative_to_container() {
        let nav = FakeNav::new(100.0).link("projects", 150.0, 230.0);
        assert_eq!(
            underline_for(&"projects".into(), &nav),
            Some(UnderlinePosition {
                left: 50.0,
                width: 80.0
            })
        );
    }

    #[test]
    fn missing_link_is_none() {
        let nav = FakeNav::new(100.0).link("projects", 150.0, 230.0);
        assert_eq!(underline_for(&"contact".into(), &nav), None);
    }

    #[test]
    fn missing_container_is_none() {
        let nav = FakeNav {
            container: None,
            ..FakeNav::default()
        }
        .link("projects", 150.0, 230.0);
        assert_eq!(underline_for(&"projects".into(), &nav), None);
    }

    #[test]
    fn settle_recompute_picks_up_font_swap() {
        let nav = FakeNav::new(0.0).link("about", 10.0, 60.0);
        let mut calc = UnderlineGeometryCalculator::new(ms(100));
        let active = SectionId::new("about");
        calc.recompute(RecomputeCause::Initial, &active, &nav, ms(0));
        assert_eq!(calc.position().map(|p| p.width), Some(50.0));

        // Font swaps in and widens the link before the settle timer.
        nav.links
            .borrow_mut()
            .insert("about".into(), Rect::from_span(10.0, 72.0));
        assert!(!calc.advance(&active, &nav, ms(99)));
        assert!(calc.advance(&active, &nav, ms(100)));
        assert_eq!(calc.position().map(|p| p.width), Some(62.0));
        assert_eq!(calc.next_deadline(), None);
    }

    #[test]
    fn resize_does_not_rearm_settle() {
        let nav = FakeNav::new(0.0).link("about", 10.0, 60.0);
        let mut calc = UnderlineGeometryCalculator::new(ms(100));
        let active = SectionId::new("about");
        calc.recompute(RecomputeCause::Initial, &active, &nav, ms(0));
        calc.advance(&active, &nav, ms(100));
        calc.recompute(RecomputeCause::Resize, &active, &nav, ms(500));
        assert_eq!(calc.next_deadline(), None);
    }

    #[test]
    fn newer_change_replaces_pending_settle() {
        let nav = FakeNav::new(0.0).link("about", 10.0, 60.0);
        let mut calc = UnderlineGeometryCalculator::new(ms(100));
        let active = SectionId::new("about");
        calc.recompute(RecomputeCause::Initial, &active, &nav, ms(0));
        calc.recompute(RecomputeCause::ActiveChanged, &active, &nav, ms(50));
        assert_eq!(calc.next_deadline(), Some(ms(150)));
    }

    #[test]
    fn teardown_stops_recomputation() {
        let nav = FakeNav::new(0.0).link("about", 10.0, 60.0);
        let mut calc = UnderlineGeometryCalculator::new(ms(100));
        let active = SectionId::new("about");
        calc.recompute(RecomputeCause::Initial, &active, &nav, ms(0));
        calc.teardown();
        let before = calc.recompute_count();
        assert!(!calc.advance(&active, &nav, ms(1000)));
        assert!(!calc.recompute(RecomputeCause::Resize, &active, &nav, ms(1000)));
        assert_eq!(calc.recompute_count(), before);
    }
}
