#![forbid(unsafe_code)]

//! Platform-independent runner core wrapping `WebNavHost`.
//!
//! This module contains the logic shared between the wasm-bindgen exports
//! and the native test harness. No JS/WASM types here.

use core::time::Duration;

use navspy_core::{Rect, SectionId, SectionList};
use navspy_runtime::{SpyConfig, UnderlinePosition};
use navspy_web::input_parser::parse_encoded_input;
use navspy_web::{LayoutSnapshot, StepResult, WebNavHost};

/// Platform-independent navigation-highlight runner.
pub struct RunnerCore {
    host: WebNavHost<LayoutSnapshot>,
    sections: SectionList,
    /// Diagnostics for the host to drain (parse failures, step errors).
    logs: Vec<String>,
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
impl RunnerCore {
    /// Create a runner for a page. Off the home page the runner is inert.
    pub fn new(sections: Vec<String>, is_home: bool) -> Self {
        Self::with_config(sections, is_home, SpyConfig::default(), |_| true)
    }

    /// Create a runner; sections `present` rejects are not observed.
    pub fn with_config(
        sections: Vec<String>,
        is_home: bool,
        config: SpyConfig,
        present: impl Fn(&SectionId) -> bool,
    ) -> Self {
        let sections = SectionList::new(sections);
        let host = if is_home {
            WebNavHost::with_presence(sections.clone(), config, LayoutSnapshot::new(), present)
        } else {
            WebNavHost::for_page(false, sections.clone(), config, LayoutSnapshot::new())
        };
        Self {
            host,
            sections,
            logs: Vec::new(),
        }
    }

    /// Configured sections, in order.
    pub fn sections(&self) -> &SectionList {
        &self.sections
    }

    /// Advance the deterministic clock by `dt_ms` milliseconds.
    pub fn advance_time_ms(&mut self, dt_ms: f64) {
        // Host timing can be noisy (NaN/inf/negative); such inputs are dropped.
        let Some(dt) = duration_from_ms(dt_ms) else {
            return;
        };
        self.host.advance_time(dt);
    }

    /// Set the deterministic clock to absolute milliseconds.
    pub fn set_time_ms(&mut self, ts_ms: f64) {
        let Some(now) = duration_from_ms(ts_ms) else {
            return;
        };
        self.host.set_time(now);
    }

    /// Parse a JSON-encoded host signal and queue it.
    ///
    /// Returns `true` if the input was accepted, `false` if it was malformed.
    pub fn push_encoded_input(&mut self, json: &str) -> bool {
        match parse_encoded_input(json) {
            Ok(event) => {
                self.host.push_event(event);
                true
            }
            Err(err) => {
                self.logs.push(format!("input_parse_error: {err}"));
                false
            }
        }
    }

    /// Record the nav container rect. Rejects non-finite or negative sizes.
    pub fn set_container_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> bool {
        let Some(rect) = checked_rect(x, y, width, height) else {
            return false;
        };
        self.host.layout_mut().set_container_rect(rect);
        true
    }

    /// Record the rect of a nav link. Rejects non-finite or negative sizes.
    pub fn set_link_rect(&mut self, section: &str, x: f64, y: f64, width: f64, height: f64) -> bool {
        let Some(rect) = checked_rect(x, y, width, height) else {
            return false;
        };
        self.host.layout_mut().set_link_rect(section, rect);
        true
    }

    pub fn clear_link(&mut self, section: &str) {
        self.host.layout_mut().clear_link(section);
    }

    /// Recompute the underline from the current layout snapshot.
    pub fn refresh_underline(&mut self) -> bool {
        self.host.engine_mut().refresh_underline()
    }

    /// Process pending inputs and due timers.
    pub fn step(&mut self) -> StepResult {
        match self.host.step() {
            Ok(result) => result,
            Err(err) => {
                self.logs.push(format!("runner_step_error: {err}"));
                StepResult::default()
            }
        }
    }

    /// Queue a link click and return the scroll offset to smooth-scroll to.
    pub fn navigate(&mut self, section: &str, section_top: f64, scroll_y: f64) -> f64 {
        self.host.navigate(section, section_top, scroll_y)
    }

    pub fn active_section(&self) -> String {
        self.host.active_section().as_str().to_string()
    }

    pub fn underline(&self) -> Option<UnderlinePosition> {
        self.host.underline()
    }

    pub fn is_locked(&self) -> bool {
        self.host.engine().is_locked()
    }

    /// Earliest pending timer in milliseconds, if any.
    pub fn next_deadline_ms(&self) -> Option<f64> {
        self.host
            .next_deadline()
            .map(|d| d.as_nanos() as f64 / 1_000_000.0)
    }

    /// CSS `rootMargin` for the host's `IntersectionObserver`.
    pub fn root_margin(&self) -> String {
        self.host.engine().config().observer.root_margin()
    }

    /// Threshold list for the host's `IntersectionObserver`.
    pub fn thresholds(&self) -> Vec<f64> {
        self.host.engine().config().observer.thresholds.clone()
    }

    /// Drain accumulated diagnostics.
    pub fn take_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.logs)
    }

    /// Tear down; later calls are no-ops.
    pub fn destroy(&mut self) {
        self.host.teardown();
    }

    pub fn is_destroyed(&self) -> bool {
        self.host.is_torn_down()
    }
}

fn duration_from_ms(ms: f64) -> Option<Duration> {
    if !ms.is_finite() || ms < 0.0 {
        return None;
    }
    let nanos = (ms * 1_000_000.0).round().min(u64::MAX as f64);
    Some(Duration::from_nanos(nanos as u64))
}

fn checked_rect(x: f64, y: f64, width: f64, height: f64) -> Option<Rect> {
    let rect = Rect::new(x, y, width, height);
    (rect.is_finite() && width >= 0.0 && height >= 0.0).then_some(rect)
}

/// CSS selector for the nav link of `section`.
pub fn link_selector(section: &str) -> String {
    let mut escaped = String::with_capacity(section.len());
    for c in section.chars() {
        if matches!(c, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("[data-section=\"{escaped}\"]")
}
