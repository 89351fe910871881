#![forbid(unsafe_code)]

//! Policy-as-data configuration for the scroll-spy engine.
//!
//! Every tunable of the tracker, the navigation lock and the underline
//! calculator lives in one [`SpyConfig`] that can be loaded from TOML or JSON
//! at startup.
//!
//! # Loading
//!
//! ```toml
//! # navspy.toml
//! bottom_threshold_px = 120.0
//! lock_ceiling_ms = 1500
//! tie_break = "first_observed"
//!
//! [observer]
//! header_offset = 64.0
//! ```
//!
//! ```rust,ignore
//! let config = SpyConfig::from_toml_file("navspy.toml")?;
//! let config = SpyConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! `SpyConfig::default()` reproduces the site's built-in behavior: 100 px
//! bottom threshold, 100 ms settle delay, 1000 ms lock ceiling, 100 ms
//! underline settle delay, 80 px header and thresholds `0/.25/.5/.75/1`.

use core::time::Duration;
#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use navspy_core::ObserverOptions;

/// How exact ties between the highest intersection ratios are broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "config",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum TieBreak {
    /// Prefer the section that comes first in the configured order.
    #[default]
    ConfiguredOrder,
    /// Prefer the section that entered the observation map first.
    FirstObserved,
}

/// Tunables for one navigation-highlight instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct SpyConfig {
    /// Distance from the document end (px) under which the last section wins.
    pub bottom_threshold_px: f64,
    /// Delay between `scrollend` and the lock release.
    pub settle_delay_ms: u64,
    /// Hard ceiling on how long a navigation lock may stay engaged.
    pub lock_ceiling_ms: u64,
    /// Delay of the one-shot underline recomputation after a change.
    pub underline_settle_ms: u64,
    /// Policy for exact ratio ties.
    pub tie_break: TieBreak,
    /// Intersection observer options handed to the host.
    pub observer: ObserverOptions,
}

impl Default for SpyConfig {
    fn default() -> Self {
        Self {
            bottom_threshold_px: 100.0,
            settle_delay_ms: 100,
            lock_ceiling_ms: 1000,
            underline_settle_ms: 100,
            tie_break: TieBreak::default(),
            observer: ObserverOptions::default(),
        }
    }
}

impl SpyConfig {
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[must_use]
    pub const fn lock_ceiling(&self) -> Duration {
        Duration::from_millis(self.lock_ceiling_ms)
    }

    #[must_use]
    pub const fn underline_settle(&self) -> Duration {
        Duration::from_millis(self.underline_settle_ms)
    }

    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(s)
            .map_err(ConfigError::Toml)?
            .validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(s)
            .map_err(ConfigError::Json)?
            .validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Serialize to a pretty TOML string.
    #[cfg(feature = "config")]
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::TomlSer)
    }

    /// Check every parameter. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.bottom_threshold_px.is_finite() || self.bottom_threshold_px < 0.0 {
            errors.push(format!(
                "bottom_threshold_px must be finite and >= 0, got {}",
                self.bottom_threshold_px
            ));
        }

        if self.lock_ceiling_ms == 0 {
            errors.push("lock_ceiling_ms must be > 0".into());
        }

        if self.settle_delay_ms > self.lock_ceiling_ms {
            errors.push(format!(
                "settle_delay_ms ({}) must not exceed lock_ceiling_ms ({})",
                self.settle_delay_ms, self.lock_ceiling_ms
            ));
        }

        let observer = &self.observer;
        if !observer.header_offset.is_finite() || observer.header_offset < 0.0 {
            errors.push(format!(
                "observer.header_offset must be finite and >= 0, got {}",
                observer.header_offset
            ));
        }

        if !(0.0..100.0).contains(&observer.bottom_margin_percent) {
            errors.push(format!(
                "observer.bottom_margin_percent must be in [0, 100), got {}",
                observer.bottom_margin_percent
            ));
        }

        if observer.thresholds.is_empty() {
            errors.push("observer.thresholds must not be empty".into());
        }

        if observer
            .thresholds
            .iter()
            .any(|t| !(0.0..=1.0).contains(t))
        {
            errors.push("observer.thresholds must lie in [0, 1]".into());
        }

        if observer.thresholds.windows(2).any(|w| w[0] >= w[1]) {
            errors.push("observer.thresholds must be strictly ascending".into());
        }

        errors
    }

    #[cfg(feature = "config")]
    fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            tracing::warn!(
                target: "navspy.config",
                error_count = errors.len(),
                "rejected invalid navspy config"
            );
            Err(ConfigError::Invalid(errors))
        }
    }
}

/// Errors from loading a [`SpyConfig`].
#[cfg(feature = "config")]
#[derive(Debug)]
pub enum ConfigError {
    /// File could not be read.
    Io(std::io::Error),
    /// TOML did not parse.
    Toml(toml::de::Error),
    /// TOML could not be written.
    TomlSer(toml::ser::Error),
    /// JSON did not parse.
    Json(serde_json::Error),
    /// Parsed, but failed [`SpyConfig::validate`].
    Invalid(Vec<String>),
}

#[cfg(feature = "config")]
impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::TomlSer(e) => write!(f, "TOML serialize error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Invalid(errors) => write!(f, "invalid config: {}", errors.join("; ")),
        }
    }
}

#[cfg(feature = "config")]
impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::TomlSer(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}
