#![forbid(unsafe_code)]

//! Animation timing shared by the visibility controllers.
//!
//! Two durations cover every timeline: `base` for overlays and `long` for
//! height-driven disclosures. With the `policy-config` feature the values
//! can be loaded from TOML:
//!
//! ```toml
//! base_ms = 300
//! long_ms = 500
//! overlay_easing = "back"
//! disclosure_easing = "ease-in-out"
//! ```

use std::fmt;
use std::time::Duration;

use crate::timeline::Easing;

/// Errors from configuration parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Easing name not recognised.
    UnknownEasing(String),
    /// The configuration document could not be parsed.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEasing(name) => write!(f, "unknown easing: {name}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Durations and easings for controller timelines.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingConfig {
    /// Overlay entrance/exit duration.
    pub base: Duration,
    /// Disclosure expand/collapse duration.
    pub long: Duration,
    /// Easing for the overlay dialog's slide.
    pub overlay_easing: Easing,
    /// Easing for the disclosure height.
    pub disclosure_easing: Easing,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(300),
            long: Duration::from_millis(500),
            overlay_easing: Easing::Back,
            disclosure_easing: Easing::EaseInOut,
        }
    }
}

impl TimingConfig {
    /// Create the default timing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Timing with zero durations (animations complete on the first frame).
    pub fn instant() -> Self {
        Self {
            base: Duration::ZERO,
            long: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Set the overlay duration.
    pub fn base(mut self, duration: Duration) -> Self {
        self.base = duration;
        self
    }

    /// Set the disclosure duration.
    pub fn long(mut self, duration: Duration) -> Self {
        self.long = duration;
        self
    }

    /// Set the easing of the dialog slide and fade.
    pub fn overlay_easing(mut self, easing: Easing) -> Self {
        self.overlay_easing = easing;
        self
    }

    /// Set the easing of the panel height and fade.
    pub fn disclosure_easing(mut self, easing: Easing) -> Self {
        self.disclosure_easing = easing;
        self
    }

    /// Load timing from a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Parse`] for malformed TOML or wrongly typed values.
    /// - [`ConfigError::UnknownEasing`] for an unrecognised easing name.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let raw: RawTiming = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();
        if let Some(ms) = raw.base_ms {
            config.base = Duration::from_millis(ms);
        }
        if let Some(ms) = raw.long_ms {
            config.long = Duration::from_millis(ms);
        }
        if let Some(name) = raw.overlay_easing {
            config.overlay_easing = name.parse()?;
        }
        if let Some(name) = raw.disclosure_easing {
            config.disclosure_easing = name.parse()?;
        }
        Ok(config)
    }
}

#[cfg(feature = "policy-config")]
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTiming {
    base_ms: Option<u64>,
    long_ms: Option<u64>,
    overlay_easing: Option<String>,
    disclosure_easing: Option<String>,
}
