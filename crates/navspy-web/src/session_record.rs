#![forbid(unsafe_code)]

//! Deterministic session recording and replay.
//!
//! [`SessionRecorder`] wraps a [`WebNavHost`] and records every host input
//! (events, layout rects, clock updates) together with a checkpoint after
//! each step. [`replay`] feeds the same inputs through a fresh host and
//! compares checkpoint checksums.
//!
//! # Trace layout
//!
//! - **Header**: section list, home-page flag and config.
//! - **Input** / **Container** / **Link** / **Tick**: timestamped host inputs.
//! - **Checkpoint**: FNV-1a checksum of the observable state, chained.
//! - **Summary**: checkpoint count and final checksum chain.
//!
//! The observable state is the active section, the underline position and
//! the lock flag. Time only advances through tick records, so a replay on
//! the same build reproduces the chain exactly.
//!
//! # Example
//!
//! ```ignore
//! let mut recorder = SessionRecorder::new(sections, true, SpyConfig::default());
//! recorder.set_container_rect(0, Rect::new(0.0, 0.0, 800.0, 48.0));
//! recorder.push_event(0, HostEvent::navigate("about"));
//! recorder.step()?;
//! recorder.set_time(1_000_000_000);
//! recorder.step()?;
//!
//! let trace = recorder.finish();
//! assert!(replay(&trace)?.ok());
//! ```

use core::time::Duration;

use navspy_core::{HostEvent, Rect, SectionId, SectionList};
use navspy_runtime::{SpyConfig, UnderlinePosition};

use crate::{LayoutSnapshot, StepResult, WebHostError, WebNavHost};

/// Schema version for session traces.
pub const SCHEMA_VERSION: &str = "navspy-trace-v1";

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a64_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn fnv1a64_u64(hash: u64, v: u64) -> u64 {
    fnv1a64_bytes(hash, &v.to_le_bytes())
}

fn fnv1a64_pair(prev: u64, next: u64) -> u64 {
    let hash = FNV_OFFSET_BASIS;
    let hash = fnv1a64_u64(hash, prev);
    fnv1a64_u64(hash, next)
}

/// Checksum of the observable highlight state.
#[must_use]
pub fn state_checksum(active: &SectionId, underline: Option<UnderlinePosition>, locked: bool) -> u64 {
    let mut hash = fnv1a64_bytes(FNV_OFFSET_BASIS, active.as_str().as_bytes());
    // Separator so "ab" + none differs from "a" + something.
    hash = fnv1a64_bytes(hash, &[0xff]);
    hash = match underline {
        Some(pos) => {
            let hash = fnv1a64_bytes(hash, &[1]);
            let hash = fnv1a64_u64(hash, pos.left.to_bits());
            fnv1a64_u64(hash, pos.width.to_bits())
        }
        None => fnv1a64_bytes(hash, &[0]),
    };
    fnv1a64_bytes(hash, &[u8::from(locked)])
}

fn host_checksum(host: &WebNavHost<LayoutSnapshot>) -> u64 {
    state_checksum(
        &host.active_section(),
        host.underline(),
        host.engine().is_locked(),
    )
}

/// A single record in a session trace.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceRecord {
    /// Session header (must be first).
    Header {
        sections: SectionList,
        is_home: bool,
        config: SpyConfig,
    },
    /// A host event at a specific timestamp.
    Input { ts_ns: u64, event: HostEvent },
    /// Nav container rect update.
    Container { ts_ns: u64, rect: Option<Rect> },
    /// Nav link rect update; `None` removes the link.
    Link {
        ts_ns: u64,
        section: SectionId,
        rect: Option<Rect>,
    },
    /// Clock set to `ts_ns`.
    Tick { ts_ns: u64 },
    /// State checkpoint after a step.
    Checkpoint {
        step_idx: u64,
        ts_ns: u64,
        active: SectionId,
        checksum: u64,
        checksum_chain: u64,
    },
    /// Trace summary (must be last).
    Summary {
        total_checkpoints: u64,
        final_checksum_chain: u64,
    },
}

/// A complete recorded session trace.
#[derive(Debug, Clone)]
pub struct SessionTrace {
    pub records: Vec<TraceRecord>,
}

impl SessionTrace {
    /// Number of checkpoints in the trace.
    #[must_use]
    pub fn checkpoint_count(&self) -> u64 {
        self.records
            .iter()
            .filter(|r| matches!(r, TraceRecord::Checkpoint { .. }))
            .count() as u64
    }

    /// Final checksum chain from the summary record.
    #[must_use]
    pub fn final_checksum_chain(&self) -> Option<u64> {
        self.records.iter().rev().find_map(|r| match r {
            TraceRecord::Summary {
                final_checksum_chain,
                ..
            } => Some(*final_checksum_chain),
            _ => None,
        })
    }

    /// Sequence of active sections seen at checkpoints.
    pub fn active_history(&self) -> impl Iterator<Item = &SectionId> {
        self.records.iter().filter_map(|r| match r {
            TraceRecord::Checkpoint { active, .. } => Some(active),
            _ => None,
        })
    }
}

/// Records a host session for deterministic replay.
#[derive(Debug)]
pub struct SessionRecorder {
    host: WebNavHost<LayoutSnapshot>,
    records: Vec<TraceRecord>,
    checksum_chain: u64,
    current_ts_ns: u64,
    step_idx: u64,
}

impl SessionRecorder {
    /// Start a recording. The initial state is checkpointed immediately.
    #[must_use]
    pub fn new(sections: SectionList, is_home: bool, config: SpyConfig) -> Self {
        let host = WebNavHost::for_page(
            is_home,
            sections.clone(),
            config.clone(),
            LayoutSnapshot::new(),
        );
        let mut this = Self {
            host,
            records: vec![TraceRecord::Header {
                sections,
                is_home,
                config,
            }],
            checksum_chain: 0,
            current_ts_ns: 0,
            step_idx: 0,
        };
        this.record_checkpoint();
        this
    }

    /// Record a host event at the given timestamp (nanoseconds since start).
    pub fn push_event(&mut self, ts_ns: u64, event: HostEvent) {
        self.current_ts_ns = ts_ns;
        self.records.push(TraceRecord::Input {
            ts_ns,
            event: event.clone(),
        });
        self.host.push_event(event);
    }

    pub fn set_container_rect(&mut self, ts_ns: u64, rect: Option<Rect>) {
        self.current_ts_ns = ts_ns;
        self.records.push(TraceRecord::Container { ts_ns, rect });
        apply_container(&mut self.host, rect);
    }

    pub fn set_link_rect(&mut self, ts_ns: u64, section: impl Into<SectionId>, rect: Option<Rect>) {
        let section = section.into();
        self.current_ts_ns = ts_ns;
        self.records.push(TraceRecord::Link {
            ts_ns,
            section: section.clone(),
            rect,
        });
        apply_link(&mut self.host, section, rect);
    }

    /// Record the clock moving to `ts_ns`.
    pub fn set_time(&mut self, ts_ns: u64) {
        self.current_ts_ns = ts_ns;
        self.records.push(TraceRecord::Tick { ts_ns });
        self.host.set_time(Duration::from_nanos(ts_ns));
    }

    /// Process one step and record a checkpoint.
    pub fn step(&mut self) -> Result<StepResult, WebHostError> {
        let result = self.host.step()?;
        self.step_idx += 1;
        self.record_checkpoint();
        Ok(result)
    }

    /// Finish recording and return the completed trace.
    #[must_use]
    pub fn finish(mut self) -> SessionTrace {
        let total_checkpoints = self
            .records
            .iter()
            .filter(|r| matches!(r, TraceRecord::Checkpoint { .. }))
            .count() as u64;
        self.records.push(TraceRecord::Summary {
            total_checkpoints,
            final_checksum_chain: self.checksum_chain,
        });
        SessionTrace {
            records: self.records,
        }
    }

    #[must_use]
    pub fn host(&self) -> &WebNavHost<LayoutSnapshot> {
        &self.host
    }

    fn record_checkpoint(&mut self) {
        let checksum = host_checksum(&self.host);
        let chain = fnv1a64_pair(self.checksum_chain, checksum);
        self.records.push(TraceRecord::Checkpoint {
            step_idx: self.step_idx,
            ts_ns: self.current_ts_ns,
            active: self.host.active_section(),
            checksum,
            checksum_chain: chain,
        });
        self.checksum_chain = chain;
    }
}

fn apply_container(host: &mut WebNavHost<LayoutSnapshot>, rect: Option<Rect>) {
    match rect {
        Some(rect) => host.layout_mut().set_container_rect(rect),
        None => host.layout_mut().clear_container(),
    }
}

fn apply_link(host: &mut WebNavHost<LayoutSnapshot>, section: SectionId, rect: Option<Rect>) {
    match rect {
        Some(rect) => host.layout_mut().set_link_rect(section, rect),
        None => host.layout_mut().clear_link(section.as_str()),
    }
}

/// Result of replaying a session trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayResult {
    /// Checkpoints replayed.
    pub total_checkpoints: u64,
    /// Final checksum chain from replay.
    pub final_checksum_chain: u64,
    /// First checkpoint whose checksum differs, if any.
    pub first_mismatch: Option<ReplayMismatch>,
}

impl ReplayResult {
    /// Whether the replay produced identical checksums.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.first_mismatch.is_none()
    }
}

/// Description of a checksum mismatch during replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayMismatch {
    pub step_idx: u64,
    pub expected: u64,
    pub actual: u64,
}

/// Errors that can occur during replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// The trace is missing a header record.
    MissingHeader,
    /// A host error occurred during replay.
    Host(WebHostError),
}

impl core::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "trace missing header record"),
            Self::Host(e) => write!(f, "host error: {e}"),
        }
    }
}

impl std::error::Error for ReplayError {}

impl From<WebHostError> for ReplayError {
    fn from(e: WebHostError) -> Self {
        Self::Host(e)
    }
}

/// Replay a recorded trace through a fresh host.
///
/// Inputs are fed in record order; each checkpoint after the first triggers
/// a step, matching the recording cadence.
pub fn replay(trace: &SessionTrace) -> Result<ReplayResult, ReplayError> {
    let (sections, is_home, config) = trace
        .records
        .first()
        .and_then(|r| match r {
            TraceRecord::Header {
                sections,
                is_home,
                config,
            } => Some((sections.clone(), *is_home, config.clone())),
            _ => None,
        })
        .ok_or(ReplayError::MissingHeader)?;

    let mut host = WebNavHost::for_page(is_home, sections, config, LayoutSnapshot::new());
    let mut replayed: u64 = 0;
    let mut checksum_chain: u64 = 0;
    let mut first_mismatch: Option<ReplayMismatch> = None;

    for record in &trace.records {
        match record {
            TraceRecord::Input { event, .. } => host.push_event(event.clone()),
            TraceRecord::Container { rect, .. } => apply_container(&mut host, *rect),
            TraceRecord::Link { section, rect, .. } => {
                apply_link(&mut host, section.clone(), *rect);
            }
            TraceRecord::Tick { ts_ns } => host.set_time(Duration::from_nanos(*ts_ns)),
            TraceRecord::Checkpoint {
                step_idx,
                checksum: expected,
                ..
            } => {
                // Checkpoint 0 is the initial state; later ones follow a step.
                if replayed > 0 {
                    host.step()?;
                }
                let actual = host_checksum(&host);
                checksum_chain = fnv1a64_pair(checksum_chain, actual);
                if actual != *expected && first_mismatch.is_none() {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        target: "navspy.host",
                        step_idx = *step_idx,
                        expected = *expected,
                        actual,
                        "replay diverged from recorded trace"
                    );
                    first_mismatch = Some(ReplayMismatch {
                        step_idx: *step_idx,
                        expected: *expected,
                        actual,
                    });
                }
                replayed += 1;
            }
            TraceRecord::Header { .. } | TraceRecord::Summary { .. } => {}
        }
    }

    Ok(ReplayResult {
        total_checkpoints: replayed,
        final_checksum_chain: checksum_chain,
        first_mismatch,
    })
}
