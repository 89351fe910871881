#![forbid(unsafe_code)]

//! navspy public facade crate.
//!
//! Re-exports the scroll-spy engine and its host adapter, and offers a
//! prelude for day-to-day usage:
//!
//! ```
//! use std::time::Duration;
//! use navspy::prelude::*;
//!
//! let mut host = WebNavHost::new(
//!     SectionList::new(["projects", "experience", "about", "contact"]),
//!     SpyConfig::default(),
//!     LayoutSnapshot::new(),
//! );
//! host.push_event(HostEvent::intersection([IntersectionEntry::visible("about", 0.6)]));
//! host.step()?;
//! assert_eq!(host.active_section().as_str(), "about");
//!
//! host.navigate("contact", 900.0, 1200.0);
//! host.step()?;
//! host.advance_time(Duration::from_secs(1));
//! host.step()?;
//! assert!(!host.engine().is_locked());
//! # Ok::<(), navspy::Error>(())
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use navspy_core::{
    HostEvent, IntersectionEntry, ObserverOptions, Rect, ScrollMetrics, SectionId, SectionList,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "config")]
pub use navspy_runtime::ConfigError;
pub use navspy_runtime::{
    DispatchOutcome, NavHighlighter, NavLayout, NavigationLock, ReadSignal, ReleaseReason,
    SectionVisibilityTracker, SpyConfig, TieBreak, UnderlineGeometryCalculator,
    UnderlinePosition, underline_for,
};

// --- Web re-exports --------------------------------------------------------

#[cfg(feature = "web")]
pub use navspy_web::session_record::{ReplayError, SessionRecorder, SessionTrace, replay};
#[cfg(feature = "web")]
pub use navspy_web::{
    DeterministicClock, LayoutSnapshot, StepResult, WebHostError, WebNavHost, scroll_target,
};

#[cfg(feature = "input-parser")]
pub use navspy_web::input_parser::{InputParseError, parse_encoded_input};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for navspy hosts.
#[derive(Debug)]
pub enum Error {
    /// Config failed to load or validate.
    #[cfg(feature = "config")]
    Config(ConfigError),
    /// The host was already torn down.
    #[cfg(feature = "web")]
    Host(WebHostError),
    /// A trace could not be replayed.
    #[cfg(feature = "web")]
    Replay(ReplayError),
    /// A host-encoded input was rejected.
    #[cfg(feature = "input-parser")]
    Input(InputParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            #[cfg(feature = "config")]
            Self::Config(ref err) => write!(f, "{err}"),
            #[cfg(feature = "web")]
            Self::Host(ref err) => write!(f, "{err}"),
            #[cfg(feature = "web")]
            Self::Replay(ref err) => write!(f, "{err}"),
            #[cfg(feature = "input-parser")]
            Self::Input(ref err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(feature = "config")]
impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

#[cfg(feature = "web")]
impl From<WebHostError> for Error {
    fn from(err: WebHostError) -> Self {
        Self::Host(err)
    }
}

#[cfg(feature = "web")]
impl From<ReplayError> for Error {
    fn from(err: ReplayError) -> Self {
        Self::Replay(err)
    }
}

#[cfg(feature = "input-parser")]
impl From<InputParseError> for Error {
    fn from(err: InputParseError) -> Self {
        Self::Input(err)
    }
}

/// Standard result type for navspy APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Error, HostEvent, IntersectionEntry, NavHighlighter, NavLayout, Rect, Result,
        ScrollMetrics, SectionId, SectionList, SpyConfig, UnderlinePosition,
    };

    #[cfg(feature = "web")]
    pub use crate::{LayoutSnapshot, StepResult, WebNavHost};

    pub use crate::{core, runtime};
    #[cfg(feature = "web")]
    pub use crate::web;
}

pub use navspy_core as core;
pub use navspy_runtime as runtime;
#[cfg(feature = "web")]
pub use navspy_web as web;
