#![forbid(unsafe_code)]

//! `navspy-web` adapts the navigation highlight to a browser-like host.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (JS) pushes observer
//!   batches, scroll samples, clicks and layout rects.
//! - **Deterministic time**: the host advances a monotonic clock explicitly.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! This crate does not bind to `wasm-bindgen`. `navspy-wasm` wraps it with a
//! JS API; tests and native tools drive it directly.

#[cfg(feature = "input-parser")]
pub mod input_parser;
pub mod session_record;

use core::time::Duration;
use std::collections::VecDeque;

use navspy_core::{HostEvent, Rect, SectionId, SectionList};
use navspy_runtime::{
    DispatchOutcome, NavHighlighter, NavLayout, ReadSignal, SpyConfig, UnderlinePosition,
};

/// Web host error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebHostError {
    /// The host was torn down; no further steps are possible.
    TornDown,
}

impl core::fmt::Display for WebHostError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TornDown => write!(f, "host already torn down"),
        }
    }
}

impl std::error::Error for WebHostError {}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }
}

/// Nav layout pushed by the host (`getBoundingClientRect` results).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutSnapshot {
    container: Option<Rect>,
    links: Vec<(SectionId, Rect)>,
}

impl LayoutSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_container_rect(&mut self, rect: Rect) {
        self.container = Some(rect);
    }

    pub fn clear_container(&mut self) {
        self.container = None;
    }

    /// Record the rect of the link tagged `data-section="<section>"`.
    pub fn set_link_rect(&mut self, section: impl Into<SectionId>, rect: Rect) {
        let section = section.into();
        match self.links.iter_mut().find(|(id, _)| *id == section) {
            Some((_, slot)) => *slot = rect,
            None => self.links.push((section, rect)),
        }
    }

    /// Forget a link (unmounted or not rendered).
    pub fn clear_link(&mut self, section: &str) {
        self.links.retain(|(id, _)| id.as_str() != section);
    }

    /// Links currently known, in insertion order.
    pub fn links(&self) -> impl Iterator<Item = (&SectionId, &Rect)> {
        self.links.iter().map(|(id, rect)| (id, rect))
    }
}

impl NavLayout for LayoutSnapshot {
    fn container_rect(&self) -> Option<Rect> {
        self.container
    }

    fn link_rect(&self, section: &SectionId) -> Option<Rect> {
        self.links
            .iter()
            .find(|(id, _)| id == section)
            .map(|(_, rect)| *rect)
    }
}

/// Document offset a link click should smooth-scroll to.
///
/// `section_top` is the section's viewport-relative top; the fixed header
/// is subtracted so the heading lands just below it. Never negative.
#[must_use]
pub fn scroll_target(section_top: f64, scroll_y: f64, header_offset: f64) -> f64 {
    let target = section_top + scroll_y - header_offset;
    if target.is_finite() { target.max(0.0) } else { 0.0 }
}

/// Result of a single [`WebNavHost::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepResult {
    /// Number of queued events dispatched in this step.
    pub events_processed: u32,
    /// The active section changed.
    pub active_changed: bool,
    /// The published underline changed.
    pub underline_changed: bool,
    /// A navigation lock was released by a due timer.
    pub lock_released: bool,
}

impl StepResult {
    fn absorb(&mut self, outcome: DispatchOutcome) {
        self.active_changed |= outcome.active_changed;
        self.underline_changed |= outcome.underline_changed;
        self.lock_released |= outcome.lock_released.is_some();
    }
}

/// Host-driven wrapper around [`NavHighlighter`].
///
/// Events are queued with [`push_event`](Self::push_event) and processed in
/// order by [`step`](Self::step) at the current clock time. A step with an
/// empty queue still fires due timers.
#[derive(Debug)]
pub struct WebNavHost<L: NavLayout = LayoutSnapshot> {
    engine: NavHighlighter<L>,
    clock: DeterministicClock,
    queue: VecDeque<HostEvent>,
}

impl<L: NavLayout> WebNavHost<L> {
    /// Create a host observing every configured section.
    pub fn new(sections: SectionList, config: SpyConfig, layout: L) -> Self {
        Self::with_presence(sections, config, layout, |_| true)
    }

    /// Create a host; sections `present` rejects are not observed.
    pub fn with_presence(
        sections: SectionList,
        config: SpyConfig,
        layout: L,
        present: impl Fn(&SectionId) -> bool,
    ) -> Self {
        let clock = DeterministicClock::new();
        Self {
            engine: NavHighlighter::new(sections, config, layout, present, clock.now()),
            clock,
            queue: VecDeque::new(),
        }
    }

    /// Create a host for a page; only the home page tracks sections.
    pub fn for_page(is_home: bool, sections: SectionList, config: SpyConfig, layout: L) -> Self {
        let clock = DeterministicClock::new();
        Self {
            engine: NavHighlighter::for_page(is_home, sections, config, layout, clock.now()),
            clock,
            queue: VecDeque::new(),
        }
    }

    /// Queue a host event for the next step.
    pub fn push_event(&mut self, event: HostEvent) {
        self.queue.push_back(event);
    }

    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Advance the clock by `dt`.
    pub fn advance_time(&mut self, dt: Duration) {
        self.clock.advance(dt);
    }

    /// Set the clock to an absolute time.
    pub fn set_time(&mut self, now: Duration) {
        self.clock.set(now);
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Dispatch all queued events at the current time.
    pub fn step(&mut self) -> Result<StepResult, WebHostError> {
        if self.engine.is_torn_down() {
            self.queue.clear();
            return Err(WebHostError::TornDown);
        }
        let now = self.clock.now();
        let mut result = StepResult::default();
        if self.queue.is_empty() {
            result.absorb(self.engine.advance(now));
            return Ok(result);
        }
        while let Some(event) = self.queue.pop_front() {
            result.events_processed += 1;
            result.absorb(self.engine.dispatch(event, now));
        }
        Ok(result)
    }

    /// Handle a nav link click: queue the navigation and return the scroll
    /// offset the host should smooth-scroll to.
    pub fn navigate(&mut self, section: impl Into<SectionId>, section_top: f64, scroll_y: f64) -> f64 {
        self.push_event(HostEvent::navigate(section));
        scroll_target(
            section_top,
            scroll_y,
            self.engine.config().observer.header_offset,
        )
    }

    #[must_use]
    pub fn active_section(&self) -> SectionId {
        self.engine.active_section()
    }

    #[must_use]
    pub fn active_signal(&self) -> ReadSignal<SectionId> {
        self.engine.active_signal()
    }

    #[must_use]
    pub fn underline(&self) -> Option<UnderlinePosition> {
        self.engine.underline()
    }

    /// Earliest timer deadline, for scheduling a host wakeup.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.engine.next_deadline()
    }

    #[must_use]
    pub fn engine(&self) -> &NavHighlighter<L> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut NavHighlighter<L> {
        &mut self.engine
    }

    pub fn layout_mut(&mut self) -> &mut L {
        self.engine.layout_mut()
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.engine.is_torn_down()
    }

    /// Drop queued events and disconnect the engine.
    pub fn teardown(&mut self) {
        self.queue.clear();
        self.engine.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navspy_core::{IntersectionEntry, ScrollMetrics};
    use pretty_assertions::assert_eq;

    fn sections() -> SectionList {
        SectionList::new(["projects", "experience", "about", "contact"])
    }

    fn layout() -> LayoutSnapshot {
        let mut layout = LayoutSnapshot::new();
        layout.set_container_rect(Rect::new(100.0, 0.0, 600.0, 48.0));
        layout.set_link_rect("projects", Rect::from_span(150.0, 230.0));
        layout.set_link_rect("experience", Rect::from_span(250.0, 350.0));
        layout.set_link_rect("about", Rect::from_span(370.0, 430.0));
        layout.set_link_rect("contact", Rect::from_span(450.0, 520.0));
        layout
    }

    fn host() -> WebNavHost {
        WebNavHost::new(sections(), SpyConfig::default(), layout())
    }

    #[test]
    fn clock_advances_and_sets() {
        let mut clock = DeterministicClock::new();
        clock.advance(Duration::from_millis(16));
        clock.advance(Duration::from_millis(16));
        assert_eq!(clock.now(), Duration::from_millis(32));
        clock.set(Duration::from_secs(2));
        assert_eq!(clock.now(), Duration::from_secs(2));
    }

    #[test]
    fn scroll_target_subtracts_header_and_clamps() {
        assert_eq!(scroll_target(400.0, 1200.0, 80.0), 1520.0);
        assert_eq!(scroll_target(20.0, 0.0, 80.0), 0.0);
        assert_eq!(scroll_target(f64::NAN, 0.0, 80.0), 0.0);
    }

    #[test]
    fn snapshot_replaces_and_clears_links() {
        let mut snap = layout();
        snap.set_link_rect("about", Rect::from_span(370.0, 450.0));
        assert_eq!(
            snap.link_rect(&"about".into()).map(|r| r.width),
            Some(80.0)
        );
        snap.clear_link("about");
        assert_eq!(snap.link_rect(&"about".into()), None);
        assert_eq!(snap.links().count(), 3);
    }

    #[test]
    fn initial_underline_under_first_section() {
        let host = host();
        assert_eq!(host.active_section().as_str(), "projects");
        assert_eq!(
            host.underline(),
            Some(UnderlinePosition {
                left: 50.0,
                width: 80.0
            })
        );
    }

    #[test]
    fn step_processes_queue_in_order() {
        let mut host = host();
        host.push_event(HostEvent::Intersection {
            entries: vec![IntersectionEntry::visible("about", 0.9)],
            scroll: Some(ScrollMetrics::new(1800.0, 800.0, 5000.0)),
        });
        host.push_event(HostEvent::intersection([IntersectionEntry::hidden("about")]));
        assert_eq!(host.pending_events(), 2);
        let result = host.step().unwrap();
        assert_eq!(result.events_processed, 2);
        assert!(result.active_changed);
        assert!(result.underline_changed);
        assert_eq!(host.active_section().as_str(), "about");
        assert_eq!(host.pending_events(), 0);
    }

    #[test]
    fn empty_step_fires_timers() {
        let mut host = host();
        let target = host.navigate("contact", 900.0, 1000.0);
        assert_eq!(target, 1820.0);
        host.step().unwrap();
        assert!(host.engine().is_locked());

        host.advance_time(Duration::from_millis(1000));
        let result = host.step().unwrap();
        assert_eq!(result.events_processed, 0);
        assert!(result.lock_released);
        assert!(!host.engine().is_locked());
    }

    #[test]
    fn off_home_page_is_inert() {
        let mut host = WebNavHost::for_page(false, sections(), SpyConfig::default(), layout());
        host.push_event(HostEvent::intersection([IntersectionEntry::visible("about", 1.0)]));
        let result = host.step().unwrap();
        assert!(!result.active_changed);
        assert!(host.active_section().is_empty());
        assert_eq!(host.underline(), None);
    }

    #[test]
    fn step_after_teardown_errors() {
        let mut host = host();
        host.teardown();
        host.push_event(HostEvent::Tick);
        assert_eq!(host.step(), Err(WebHostError::TornDown));
        assert_eq!(host.pending_events(), 0);
        assert_eq!(WebHostError::TornDown.to_string(), "host already torn down");
    }
}
