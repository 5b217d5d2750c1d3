#![forbid(unsafe_code)]

//! Runtime primitives the visibility controllers orchestrate.
//!
//! - [`Timeline`]: the opaque animation handle (play/reverse/progress/seek)
//!   plus its lifecycle event stream. [`TweenTimeline`] is the reference
//!   implementation.
//! - [`ScrollLockRegistry`]: process-wide, reference-counted scroll locking.
//! - [`OutsideInteractionDetector`]: subtree watches that report pointer/focus
//!   interactions landing outside a given element.
//! - [`AnimationClock`]: frame-delta source for driving timelines.
//! - [`TimingConfig`]: durations and easings shared by the controllers.

pub mod clock;
pub mod config;
pub mod outside;
pub mod scroll_lock;
pub mod timeline;
pub mod tween;

pub use clock::AnimationClock;
pub use config::{ConfigError, TimingConfig};
pub use outside::{OutsideInteractionDetector, Subscription};
pub use scroll_lock::{ScrollLockGuard, ScrollLockRegistry};
pub use timeline::{Direction, Easing, Property, Timeline, TimelineEvent, TimelineSpec, Track};
pub use tween::TweenTimeline;
