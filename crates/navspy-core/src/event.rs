#![forbid(unsafe_code)]

//! Host-environment signals.
//!
//! Every callback the browser would deliver (intersection batches, scroll,
//! resize, `scrollend`, link clicks, timer wakeups) is modeled as one
//! [`HostEvent`] variant so the runtime can process them through a single
//! serialized entry point.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, ScrollMetrics};
use crate::section::SectionId;

/// One record of an intersection batch (`IntersectionObserverEntry`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntersectionEntry {
    /// Observed section (the target element's `id`).
    pub section: SectionId,
    /// Whether the target currently intersects the root.
    pub is_intersecting: bool,
    /// Visible fraction of the target, `[0, 1]`.
    pub ratio: f64,
}

impl IntersectionEntry {
    /// An intersecting entry with the given ratio.
    pub fn visible(section: impl Into<SectionId>, ratio: f64) -> Self {
        Self {
            section: section.into(),
            is_intersecting: true,
            ratio,
        }
    }

    /// A non-intersecting entry.
    pub fn hidden(section: impl Into<SectionId>) -> Self {
        Self {
            section: section.into(),
            is_intersecting: false,
            ratio: 0.0,
        }
    }

    /// Derive an entry from a target rect and the (margin-adjusted) root.
    pub fn from_rects(section: impl Into<SectionId>, target: &Rect, root: &Rect) -> Self {
        match target.intersection_ratio(root) {
            Some(ratio) => Self::visible(section, ratio),
            None => Self::hidden(section),
        }
    }

    /// Ratio clamped into `[0, 1]`; NaN reads as 0.
    #[must_use]
    pub fn clamped_ratio(&self) -> f64 {
        if self.ratio.is_nan() {
            0.0
        } else {
            self.ratio.clamp(0.0, 1.0)
        }
    }
}

/// A signal delivered by the host environment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum HostEvent {
    /// An intersection observer batch.
    ///
    /// `scroll` carries a fresh scroll sample when the host has one; the
    /// runtime falls back to the last known metrics otherwise.
    Intersection {
        entries: Vec<IntersectionEntry>,
        scroll: Option<ScrollMetrics>,
    },
    /// A `scroll` event with the current scroll sample.
    Scroll(ScrollMetrics),
    /// A `scrollend` event.
    ScrollEnd,
    /// The viewport was resized.
    Resize { width: f64, height: f64 },
    /// The user clicked the nav link for a section.
    Navigate { section: SectionId },
    /// Time advanced with no other signal; only due timers run.
    Tick,
}

impl HostEvent {
    /// An intersection batch without a scroll sample.
    pub fn intersection(entries: impl IntoIterator<Item = IntersectionEntry>) -> Self {
        Self::Intersection {
            entries: entries.into_iter().collect(),
            scroll: None,
        }
    }

    /// A link click for `section`.
    pub fn navigate(section: impl Into<SectionId>) -> Self {
        Self::Navigate {
            section: section.into(),
        }
    }

    /// Short label used in logs and traces.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Intersection { .. } => "intersection",
            Self::Scroll(_) => "scroll",
            Self::ScrollEnd => "scrollend",
            Self::Resize { .. } => "resize",
            Self::Navigate { .. } => "navigate",
            Self::Tick => "tick",
        }
    }
}
