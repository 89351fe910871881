#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for the NavSpyRunner.
//!
//! This module wraps [`super::runner_core::RunnerCore`] with JS-friendly types.
//! Only compiled on `wasm32` targets.

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use navspy_runtime::NavLayout;
use navspy_web::StepResult;

use super::dom::{self, DomLayout};
use super::runner_core::RunnerCore;

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = match info.location() {
                Some(loc) => format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                ),
                None => format!("panic: {info}"),
            };
            console_error(&msg);
        }));
    });
}

fn set_js(obj: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), &value);
}

fn step_result_to_js(result: StepResult) -> JsValue {
    let obj = Object::new();
    set_js(
        &obj,
        "eventsProcessed",
        JsValue::from_f64(f64::from(result.events_processed)),
    );
    set_js(&obj, "activeChanged", JsValue::from_bool(result.active_changed));
    set_js(
        &obj,
        "underlineChanged",
        JsValue::from_bool(result.underline_changed),
    );
    set_js(&obj, "lockReleased", JsValue::from_bool(result.lock_released));
    obj.into()
}

/// Navigation highlight exported to JavaScript.
#[wasm_bindgen]
pub struct NavSpyRunner {
    inner: RunnerCore,
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

#[wasm_bindgen]
impl NavSpyRunner {
    /// Create a runner for the given section ids (nav order).
    ///
    /// On the home page, sections without a matching element `id` are not
    /// observed. Elsewhere the runner is inert.
    #[wasm_bindgen(constructor)]
    pub fn new(sections: Vec<String>, is_home: bool) -> Self {
        install_panic_hook();
        Self {
            inner: RunnerCore::with_config(
                sections,
                is_home,
                navspy_runtime::SpyConfig::default(),
                dom::section_present,
            ),
        }
    }

    /// Parse a JSON-encoded host signal and queue it.
    /// Returns `true` if accepted, `false` if malformed.
    #[wasm_bindgen(js_name = pushEncodedInput)]
    pub fn push_encoded_input(&mut self, json: &str) -> bool {
        self.inner.push_encoded_input(json)
    }

    #[wasm_bindgen(js_name = setContainerRect)]
    pub fn set_container_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> bool {
        self.inner.set_container_rect(x, y, width, height)
    }

    #[wasm_bindgen(js_name = setLinkRect)]
    pub fn set_link_rect(&mut self, section: &str, x: f64, y: f64, width: f64, height: f64) -> bool {
        self.inner.set_link_rect(section, x, y, width, height)
    }

    /// Measure the nav container (matched by `selector`) and its
    /// `[data-section]` links from the live DOM.
    ///
    /// Returns `true` if the container was found.
    #[wasm_bindgen(js_name = measureDom)]
    pub fn measure_dom(&mut self, selector: &str) -> bool {
        let layout = DomLayout::new(selector);
        let Some(container) = layout.container_rect() else {
            return false;
        };
        self.inner.set_container_rect(
            container.x,
            container.y,
            container.width,
            container.height,
        );
        let sections: Vec<_> = self.inner.sections().iter().cloned().collect();
        for section in sections {
            match layout.link_rect(&section) {
                Some(r) => {
                    self.inner
                        .set_link_rect(section.as_str(), r.x, r.y, r.width, r.height);
                }
                None => self.inner.clear_link(section.as_str()),
            }
        }
        true
    }

    /// Recompute the underline from the last measured layout.
    #[wasm_bindgen(js_name = refreshUnderline)]
    pub fn refresh_underline(&mut self) -> bool {
        self.inner.refresh_underline()
    }

    /// Advance deterministic clock by `dt_ms` milliseconds.
    #[wasm_bindgen(js_name = advanceTime)]
    pub fn advance_time(&mut self, dt_ms: f64) {
        self.inner.advance_time_ms(dt_ms);
    }

    /// Set deterministic clock to absolute milliseconds.
    #[wasm_bindgen(js_name = setTime)]
    pub fn set_time(&mut self, ts_ms: f64) {
        self.inner.set_time_ms(ts_ms);
    }

    /// Process queued inputs and due timers.
    ///
    /// Returns `{ eventsProcessed, activeChanged, underlineChanged, lockReleased }`.
    pub fn step(&mut self) -> JsValue {
        step_result_to_js(self.inner.step())
    }

    /// Queue a click with host-measured geometry; returns the document
    /// offset to smooth-scroll to.
    pub fn navigate(&mut self, section: &str, section_top: f64, scroll_y: f64) -> f64 {
        self.inner.navigate(section, section_top, scroll_y)
    }

    /// Handle a nav link click, measuring the section element in the DOM.
    ///
    /// Returns the scroll target, or `undefined` when the section element
    /// is not rendered.
    #[wasm_bindgen(js_name = navigateToElement)]
    pub fn navigate_to_element(&mut self, section: &str) -> Option<f64> {
        let top = dom::section_top(section)?;
        let scroll_y = web_sys::window()
            .and_then(|w| w.scroll_y().ok())
            .unwrap_or(0.0);
        Some(self.inner.navigate(section, top, scroll_y))
    }

    #[wasm_bindgen(js_name = activeSection)]
    pub fn active_section(&self) -> String {
        self.inner.active_section()
    }

    /// `{ left, width }` in container coordinates, or `null`.
    pub fn underline(&self) -> JsValue {
        match self.inner.underline() {
            Some(pos) => {
                let obj = Object::new();
                set_js(&obj, "left", JsValue::from_f64(pos.left));
                set_js(&obj, "width", JsValue::from_f64(pos.width));
                obj.into()
            }
            None => JsValue::NULL,
        }
    }

    #[wasm_bindgen(js_name = isLocked)]
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Earliest pending timer (ms), for scheduling the next `step`.
    #[wasm_bindgen(js_name = nextDeadlineMs)]
    pub fn next_deadline_ms(&self) -> Option<f64> {
        self.inner.next_deadline_ms()
    }

    /// `rootMargin` to construct the `IntersectionObserver` with.
    #[wasm_bindgen(js_name = rootMargin)]
    pub fn root_margin(&self) -> String {
        self.inner.root_margin()
    }

    /// `threshold` array to construct the `IntersectionObserver` with.
    pub fn thresholds(&self) -> Array {
        self.inner
            .thresholds()
            .into_iter()
            .map(JsValue::from_f64)
            .collect()
    }

    /// Drain diagnostic log lines.
    #[wasm_bindgen(js_name = takeLogs)]
    pub fn take_logs(&mut self) -> Array {
        self.inner
            .take_logs()
            .into_iter()
            .map(|line| JsValue::from_str(&line))
            .collect()
    }

    /// Release timers and listeners. The runner is inert afterwards.
    pub fn destroy(&mut self) {
        self.inner.destroy();
    }
}
