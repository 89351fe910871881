#![forbid(unsafe_code)]

//! JSON input parser for host-encoded navigation signals.
//!
//! The JS glue serializes each browser callback into a small JSON object with
//! a `kind` discriminator and hands it to [`parse_encoded_input`]:
//!
//! ```json
//! {"kind":"intersection","entries":[{"id":"about","isIntersecting":true,"intersectionRatio":0.5}],
//!  "scrollTop":1200,"viewportHeight":800,"documentHeight":5000}
//! {"kind":"scroll","scrollTop":1200,"viewportHeight":800,"documentHeight":5000}
//! {"kind":"scrollend"}
//! {"kind":"resize","width":1280,"height":800}
//! {"kind":"navigate","section":"contact"}
//! {"kind":"tick"}
//! ```
//!
//! Field names accept both the DOM spelling (`isIntersecting`) and snake case
//! (`is_intersecting`).

use navspy_core::{HostEvent, IntersectionEntry, ScrollMetrics};
use serde::Deserialize;

/// Errors from parsing encoded input JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputParseError {
    /// Malformed JSON.
    Json(String),
    /// Missing required field.
    MissingField(&'static str),
    /// Unrecognized `kind`.
    UnknownKind(String),
    /// A field is present but unusable (negative size, empty id, ...).
    InvalidValue(&'static str),
}

impl core::fmt::Display for InputParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "JSON parse error: {msg}"),
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
            Self::UnknownKind(kind) => write!(f, "unknown input kind: {kind}"),
            Self::InvalidValue(field) => write!(f, "invalid value for field: {field}"),
        }
    }
}

impl std::error::Error for InputParseError {}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(alias = "id", alias = "target")]
    section: Option<String>,
    #[serde(default, alias = "isIntersecting")]
    is_intersecting: Option<bool>,
    #[serde(default, alias = "intersectionRatio")]
    ratio: Option<f64>,
}

/// Internal deserialization target matching the JS glue's schema.
#[derive(Debug, Deserialize)]
struct RawInput {
    kind: String,
    #[serde(default)]
    entries: Option<Vec<RawEntry>>,
    #[serde(default, alias = "scrollTop", alias = "scrollY")]
    scroll_top: Option<f64>,
    #[serde(default, alias = "viewportHeight", alias = "innerHeight")]
    viewport_height: Option<f64>,
    #[serde(default, alias = "documentHeight", alias = "scrollHeight")]
    document_height: Option<f64>,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
    #[serde(default, alias = "id")]
    section: Option<String>,
}

/// Parse one JSON-encoded host signal into a [`HostEvent`].
pub fn parse_encoded_input(json: &str) -> Result<HostEvent, InputParseError> {
    let raw: RawInput =
        serde_json::from_str(json).map_err(|e| InputParseError::Json(e.to_string()))?;

    dispatch_raw(&raw)
}

/// Parse a JSON array of encoded host signals, stopping at the first error.
pub fn parse_encoded_inputs(json: &str) -> Result<Vec<HostEvent>, InputParseError> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(json).map_err(|e| InputParseError::Json(e.to_string()))?;
    values
        .into_iter()
        .map(|value| {
            let raw: RawInput =
                serde_json::from_value(value).map_err(|e| InputParseError::Json(e.to_string()))?;
            dispatch_raw(&raw)
        })
        .collect()
}

fn dispatch_raw(raw: &RawInput) -> Result<HostEvent, InputParseError> {
    match raw.kind.as_str() {
        "intersection" => parse_intersection(raw),
        "scroll" => parse_scroll(raw)?
            .map(HostEvent::Scroll)
            .ok_or(InputParseError::MissingField("scroll_top")),
        "scrollend" | "scroll_end" => Ok(HostEvent::ScrollEnd),
        "resize" => parse_resize(raw),
        "navigate" => parse_navigate(raw),
        "tick" => Ok(HostEvent::Tick),
        other => Err(InputParseError::UnknownKind(other.to_string())),
    }
}

fn parse_intersection(raw: &RawInput) -> Result<HostEvent, InputParseError> {
    let entries = raw
        .entries
        .as_ref()
        .ok_or(InputParseError::MissingField("entries"))?;
    let entries = entries
        .iter()
        .map(parse_entry)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(HostEvent::Intersection {
        entries,
        scroll: parse_scroll(raw)?,
    })
}

fn parse_entry(raw: &RawEntry) -> Result<IntersectionEntry, InputParseError> {
    let section = raw
        .section
        .as_deref()
        .ok_or(InputParseError::MissingField("entries[].section"))?;
    if section.is_empty() {
        return Err(InputParseError::InvalidValue("entries[].section"));
    }
    let is_intersecting = raw
        .is_intersecting
        .ok_or(InputParseError::MissingField("entries[].is_intersecting"))?;
    if !is_intersecting {
        return Ok(IntersectionEntry::hidden(section));
    }
    let ratio = raw.ratio.unwrap_or(0.0);
    if !ratio.is_finite() {
        return Err(InputParseError::InvalidValue("entries[].ratio"));
    }
    Ok(IntersectionEntry::visible(section, ratio))
}

/// All three metrics, or none; a partial sample is an error.
fn parse_scroll(raw: &RawInput) -> Result<Option<ScrollMetrics>, InputParseError> {
    match (raw.scroll_top, raw.viewport_height, raw.document_height) {
        (None, None, None) => Ok(None),
        (Some(top), Some(viewport), Some(document)) => {
            if !(top.is_finite() && viewport.is_finite() && document.is_finite()) {
                return Err(InputParseError::InvalidValue("scroll"));
            }
            Ok(Some(ScrollMetrics::new(top, viewport, document)))
        }
        (None, _, _) => Err(InputParseError::MissingField("scroll_top")),
        (_, None, _) => Err(InputParseError::MissingField("viewport_height")),
        (_, _, None) => Err(InputParseError::MissingField("document_height")),
    }
}

fn parse_resize(raw: &RawInput) -> Result<HostEvent, InputParseError> {
    let width = raw.width.ok_or(InputParseError::MissingField("width"))?;
    let height = raw.height.ok_or(InputParseError::MissingField("height"))?;
    if !width.is_finite() || width < 0.0 {
        return Err(InputParseError::InvalidValue("width"));
    }
    if !height.is_finite() || height < 0.0 {
        return Err(InputParseError::InvalidValue("height"));
    }
    Ok(HostEvent::Resize { width, height })
}

fn parse_navigate(raw: &RawInput) -> Result<HostEvent, InputParseError> {
    let section = raw
        .section
        .as_deref()
        .ok_or(InputParseError::MissingField("section"))?;
    if section.is_empty() {
        return Err(InputParseError::InvalidValue("section"));
    }
    Ok(HostEvent::navigate(section))
}
