#![forbid(unsafe_code)]

//! Intersection observer options.
//!
//! The host creates one `IntersectionObserver` per page using these options.
//! The same options drive [`ObserverOptions::observe`], a native emulation of
//! the observer used by simulators and tests: it only reports a section when
//! its intersecting state flips or its ratio crosses a threshold.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::event::IntersectionEntry;
use crate::geometry::Rect;
use crate::section::SectionId;

/// Default thresholds at which the observer samples intersection ratios.
pub const DEFAULT_THRESHOLDS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Height of the fixed header, excluded from the top of the root.
pub const DEFAULT_HEADER_OFFSET: f64 = 80.0;

/// Share of the viewport excluded from the bottom of the root, in percent.
pub const DEFAULT_BOTTOM_MARGIN_PERCENT: f64 = 50.0;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ObserverOptions {
    /// Pixels trimmed from the top of the viewport (fixed header height).
    pub header_offset: f64,
    /// Percentage of the viewport height trimmed from the bottom.
    pub bottom_margin_percent: f64,
    /// Ascending ratio thresholds.
    pub thresholds: Vec<f64>,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            header_offset: DEFAULT_HEADER_OFFSET,
            bottom_margin_percent: DEFAULT_BOTTOM_MARGIN_PERCENT,
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
        }
    }
}

impl ObserverOptions {
    /// CSS `rootMargin` string for `new IntersectionObserver(..)`.
    #[must_use]
    pub fn root_margin(&self) -> String {
        format!(
            "-{}px 0px -{}% 0px",
            trim_float(self.header_offset),
            trim_float(self.bottom_margin_percent)
        )
    }

    /// The effective root rectangle for a viewport of the given size.
    #[must_use]
    pub fn root_rect(&self, viewport_width: f64, viewport_height: f64) -> Rect {
        let bottom = viewport_height * self.bottom_margin_percent / 100.0;
        Rect::new(0.0, 0.0, viewport_width, viewport_height).inset(
            self.header_offset,
            0.0,
            bottom,
            0.0,
        )
    }

    /// Index of the highest threshold at or below `ratio`.
    fn bucket(&self, ratio: f64) -> usize {
        self.thresholds.iter().take_while(|&&t| t <= ratio).count()
    }

    /// Emulate one observer pass.
    ///
    /// `previous` holds the last reported ratio per section (`None` = not
    /// intersecting) and is updated in place. Returns only the entries that
    /// would be delivered in the batch.
    pub fn observe<'a>(
        &self,
        targets: impl IntoIterator<Item = (&'a SectionId, Rect)>,
        root: &Rect,
        previous: &mut Vec<(SectionId, Option<f64>)>,
    ) -> Vec<IntersectionEntry> {
        let mut batch = Vec::new();
        for (section, rect) in targets {
            let entry = IntersectionEntry::from_rects(section.clone(), &rect, root);
            let next = entry.is_intersecting.then_some(entry.ratio);
            let Some(idx) = previous.iter().position(|(id, _)| id == section) else {
                // A freshly observed target always reports once.
                previous.push((section.clone(), next));
                batch.push(entry);
                continue;
            };
            let slot = &mut previous[idx].1;
            let changed = match (*slot, next) {
                (None, None) => false,
                (Some(_), None) | (None, Some(_)) => true,
                (Some(a), Some(b)) => self.bucket(a) != self.bucket(b),
            };
            *slot = next;
            if changed {
                batch.push(entry);
            }
        }
        batch
    }
}

fn trim_float(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
