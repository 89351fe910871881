#![forbid(unsafe_code)]

//! Geometric primitives in CSS pixels.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle as reported by `getBoundingClientRect()`.
///
/// Uses viewport coordinates (origin at top-left, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from its horizontal span on a zero-height row.
    ///
    /// Handy for nav links where only the x-extent matters.
    #[inline]
    pub fn from_span(left: f64, right: f64) -> Self {
        Self::new(left, 0.0, (right - left).max(0.0), 0.0)
    }

    /// Left edge (alias for x).
    #[inline]
    pub const fn left(&self) -> f64 {
        self.x
    }

    /// Top edge (alias for y).
    #[inline]
    pub const fn top(&self) -> f64 {
        self.y
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Area in square pixels.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Whether every component is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Shrink (or grow, for negative values) each edge.
    ///
    /// Mirrors how a CSS `rootMargin` adjusts the intersection root: a
    /// negative margin pulls the edge inward.
    pub fn inset(&self, top: f64, right: f64, bottom: f64, left: f64) -> Rect {
        let x = self.x + left;
        let y = self.y + top;
        Rect {
            x,
            y,
            width: (self.width - left - right).max(0.0),
            height: (self.height - top - bottom).max(0.0),
        }
    }

    /// Intersection with another rectangle, or `None` when they don't touch.
    ///
    /// Edge-adjacent rectangles intersect with zero area, the same rule the
    /// browser uses to report `isIntersecting` for a zero-area overlap.
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        if x1 <= x2 && y1 <= y2 {
            Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
        } else {
            None
        }
    }

    /// Fraction of this rectangle's area that lies within `root`, in `[0, 1]`.
    ///
    /// Returns `None` when the rectangles do not intersect at all.
    ///
    /// Each axis is measured on its own so that a target contained in the
    /// root reports exactly `1.0`, never a rounding of it.
    pub fn intersection_ratio(&self, root: &Rect) -> Option<f64> {
        self.intersection_opt(root)?;
        if self.area() <= 0.0 {
            return Some(1.0);
        }
        let fx = axis_fraction(self.x, self.width, root.x, root.right());
        let fy = axis_fraction(self.y, self.height, root.y, root.bottom());
        Some((fx * fy).clamp(0.0, 1.0))
    }
}

/// Visible fraction of the span `[start, start + len]` inside `[lo, hi]`.
fn axis_fraction(start: f64, len: f64, lo: f64, hi: f64) -> f64 {
    let end = start + len;
    if lo <= start && end <= hi {
        return 1.0;
    }
    ((end.min(hi) - start.max(lo)) / len).max(0.0)
}

/// Document scroll state sampled by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScrollMetrics {
    /// `window.scrollY`.
    pub scroll_top: f64,
    /// `window.innerHeight`.
    pub viewport_height: f64,
    /// `document.documentElement.scrollHeight`.
    pub document_height: f64,
}

impl ScrollMetrics {
    #[must_use]
    pub const fn new(scroll_top: f64, viewport_height: f64, document_height: f64) -> Self {
        Self {
            scroll_top,
            viewport_height,
            document_height,
        }
    }

    /// Pixels of document left below the viewport.
    #[inline]
    #[must_use]
    pub fn distance_to_bottom(&self) -> f64 {
        self.document_height - (self.scroll_top + self.viewport_height)
    }

    /// Whether the viewport is within `threshold` pixels of the document end.
    ///
    /// The comparison is strict, so a threshold of 0 never matches.
    #[inline]
    #[must_use]
    pub fn is_near_bottom(&self, threshold: f64) -> bool {
        self.distance_to_bottom() < threshold
    }
}
