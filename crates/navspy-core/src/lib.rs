#![forbid(unsafe_code)]

//! Core data model for navspy.
//!
//! # Role in navspy
//! `navspy-core` holds the vocabulary shared by every other crate: section
//! identifiers and their configured order, pixel geometry read from the host
//! layout, and the [`HostEvent`] values a host pushes into the engine.
//!
//! Nothing here owns a clock, a timer or a DOM handle. The runtime
//! (`navspy-runtime`) consumes these types; the host adapters (`navspy-web`,
//! `navspy-wasm`) produce them.

pub mod event;
pub mod geometry;
pub mod observer;
pub mod section;

pub use event::{HostEvent, IntersectionEntry};
pub use geometry::{Rect, ScrollMetrics};
pub use observer::ObserverOptions;
pub use section::{SectionId, SectionList};
