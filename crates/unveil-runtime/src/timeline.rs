#![forbid(unsafe_code)]

//! The timeline primitive: an imperative animation handle.
//!
//! A [`Timeline`] animates a set of property [`Track`]s between their `from`
//! and `to` values. Callers only command it (`play`, `reverse`, `seek`) and
//! observe it (`progress`, [`TimelineEvent`]s); how it advances is the
//! engine's business.
//!
//! # Event Contract
//!
//! - A forward run from progress `0.0` yields `Start`, then `Complete` when it
//!   reaches `1.0`.
//! - A reverse run yields a single `ReverseComplete` when it reaches `0.0`.
//! - Each event fires at most once per play/reverse cycle.
//! - `play()` while already playing forward (or parked at `1.0`) and
//!   `reverse()` while already reversing (or parked at `0.0`) are no-ops.
//! - `seek()` never yields events.
//!
//! Events are pulled with [`Timeline::poll_event`]. Dropping the handle drops
//! any undelivered events, which is how an owner detaches its callbacks.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use unveil_core::ElementId;

use crate::config::ConfigError;

/// Playback direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

/// Lifecycle event emitted by a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineEvent {
    /// Forward playback left progress `0.0`.
    Start,
    /// Forward playback reached progress `1.0`.
    Complete,
    /// Reverse playback reached progress `0.0`.
    ReverseComplete,
}

/// An imperative animation handle.
pub trait Timeline {
    /// Play forward from the current position.
    fn play(&mut self);

    /// Play backward from the current position.
    fn reverse(&mut self);

    /// Normalized position in `[0.0, 1.0]`.
    fn progress(&self) -> f64;

    /// Jump to `progress` (clamped) and pause. Yields no events.
    fn seek(&mut self, progress: f64);

    /// Advance playback by `delta`.
    ///
    /// Engines that drive themselves can keep the default no-op.
    fn advance(&mut self, _delta: Duration) {}

    /// Take the next pending lifecycle event, if any.
    fn poll_event(&mut self) -> Option<TimelineEvent>;
}

impl<T: Timeline + ?Sized> Timeline for Box<T> {
    fn play(&mut self) {
        (**self).play();
    }

    fn reverse(&mut self) {
        (**self).reverse();
    }

    fn progress(&self) -> f64 {
        (**self).progress()
    }

    fn seek(&mut self, progress: f64) {
        (**self).seek(progress);
    }

    fn advance(&mut self, delta: Duration) {
        (**self).advance(delta);
    }

    fn poll_event(&mut self) -> Option<TimelineEvent> {
        (**self).poll_event()
    }
}

/// Animated property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// Opacity combined with visibility (hidden at `0.0`).
    AutoAlpha,
    /// Vertical translation as a percentage of the element's height.
    YPercent,
    /// Height in pixels.
    Height,
    /// Backdrop blur radius in pixels.
    BackdropBlur,
}

/// Easing curve applied to a track.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Easing {
    Linear,
    /// Decelerating. Good for entrances.
    #[default]
    EaseOut,
    /// Accelerating. Good for exits.
    EaseIn,
    /// S-curve.
    EaseInOut,
    /// Slight overshoot then settle.
    Back,
}

impl Easing {
    /// Apply the easing function to a progress value (clamped to `[0.0, 1.0]`).
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            Self::EaseIn => t * t * t,
            Self::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let inv = -2.0 * t + 2.0;
                    1.0 - inv * inv * inv / 2.0
                }
            }
            Self::Back => {
                let c1 = 1.70158;
                let c3 = c1 + 1.0;
                let tm1 = t - 1.0;
                1.0 + c3 * tm1 * tm1 * tm1 + c1 * tm1 * tm1
            }
        }
    }

    /// Canonical lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseOut => "ease-out",
            Self::EaseIn => "ease-in",
            Self::EaseInOut => "ease-in-out",
            Self::Back => "back",
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Easing {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "ease-out" | "easeout" => Ok(Self::EaseOut),
            "ease-in" | "easein" => Ok(Self::EaseIn),
            "ease-in-out" | "easeinout" => Ok(Self::EaseInOut),
            "back" | "bounce" => Ok(Self::Back),
            other => Err(ConfigError::UnknownEasing(other.to_owned())),
        }
    }
}

/// One animated property of one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    pub target: ElementId,
    pub property: Property,
    pub from: f64,
    pub to: f64,
    pub easing: Easing,
}

impl Track {
    /// Create a linear track.
    pub fn new(target: ElementId, property: Property, from: f64, to: f64) -> Self {
        Self {
            target,
            property,
            from,
            to,
            easing: Easing::Linear,
        }
    }

    /// Set the easing curve.
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Value at the given raw progress.
    pub fn value_at(&self, progress: f64) -> f64 {
        let eased = self.easing.apply(progress);
        self.from + (self.to - self.from) * eased
    }
}

/// Description of a timeline to build: a duration and its tracks.
///
/// All tracks share the timeline's duration and start together.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimelineSpec {
    pub duration: Duration,
    pub tracks: Vec<Track>,
}

impl TimelineSpec {
    /// Create an empty spec with the given duration.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            tracks: Vec::new(),
        }
    }

    /// Append a track.
    pub fn track(mut self, track: Track) -> Self {
        self.tracks.push(track);
        self
    }

    /// Find the track animating `property` on `target`.
    pub fn find(&self, target: ElementId, property: Property) -> Option<&Track> {
        self.tracks
            .iter()
            .find(|t| t.target == target && t.property == property)
    }
}
