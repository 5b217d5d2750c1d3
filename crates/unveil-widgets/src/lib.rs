#![forbid(unsafe_code)]

//! Animated visibility controllers for overlay and disclosure widgets.
//!
//! Both widgets share one state machine, [`VisibilityController`], and differ
//! only in their [`VisibilityPolicy`]:
//!
//! - [`ModalController`]: portal-style overlay. Locks background scrolling
//!   while rendered, reports outside clicks, focuses itself once open.
//! - [`DisclosureController`]: inline panel behind a trigger. Always mounted,
//!   animates its height, mirrors its state onto the trigger and `aria-hidden`.
//!
//! Controllers are single-threaded. The host calls [`mount`] after each
//! render and feeds frame deltas to [`tick`] (or drives a self-advancing
//! timeline and calls [`pump`]).
//!
//! [`mount`]: VisibilityController::mount
//! [`tick`]: VisibilityController::tick
//! [`pump`]: VisibilityController::pump

pub mod disclosure;
pub mod modal;
pub mod visibility;

pub use disclosure::{DisclosureConfig, DisclosureController, DisclosurePolicy};
pub use modal::{
    AnimateFrom, ModalConfig, ModalController, ModalPolicy, ModalSize, ParseModalOptionError,
};
pub use visibility::{
    AnimationPhase, Callbacks, TimelineFactory, VisibilityController, VisibilityPolicy,
};
