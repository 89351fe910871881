#![forbid(unsafe_code)]

//! navspy runtime
//!
//! Deterministic state machines behind the portfolio navigation highlight.
//!
//! # Key Components
//!
//! - [`SectionVisibilityTracker`] - scroll-spy deciding the active section
//! - [`NavigationLock`] - settle/ceiling lock engaged by link clicks
//! - [`UnderlineGeometryCalculator`] - underline offset and width under the active link
//! - [`NavHighlighter`] - single entry point funnelling every host signal
//! - [`Signal`] / [`ReadSignal`] - readable outputs with change notification
//! - [`SpyConfig`] - policy-as-data tunables
//!
//! # Role in navspy
//! The runtime never reads a wall clock or the DOM. Hosts pass monotonic
//! time and [`navspy_core::HostEvent`]s in, and supply layout through the
//! [`NavLayout`] trait.

pub mod config;
pub mod highlighter;
pub mod lock;
pub mod signal;
pub mod timer;
pub mod tracker;
pub mod underline;

#[cfg(feature = "config")]
pub use config::ConfigError;
pub use config::{SpyConfig, TieBreak};
pub use highlighter::{DispatchOutcome, NavHighlighter, dispatch_all};
pub use lock::{LockTimer, NavigationLock, ReleaseReason};
pub use signal::{ReadSignal, Signal, SignalGuard};
pub use timer::{TimerId, TimerQueue};
pub use tracker::SectionVisibilityTracker;
pub use underline::{
    NavLayout, RecomputeCause, UnderlineGeometryCalculator, UnderlinePosition, underline_for,
};
