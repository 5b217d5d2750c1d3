#![forbid(unsafe_code)]

//! Animated modal overlay.
//!
//! [`ModalController`] is a [`VisibilityController`] with the overlay policy:
//!
//! - Opening locks background scrolling on the scroll target (reference
//!   counted across every open modal) and starts watching the dialog for
//!   outside interactions.
//! - When the entrance completes the modal root receives focus.
//! - When the exit completes the lock reference is released and the watch
//!   dropped. With [`ModalConfig::restore_focus`] focus goes back to the
//!   element that held it before opening.
//! - Destroying the controller while it holds a lock clears every scroll
//!   lock in the registry. A modal constructed open reserves its lock and
//!   watch immediately, before the first render.
//!
//! Outside interactions only report: [`ModalController::on_outside_click`]
//! is told, and the caller decides whether to close.
//!
//! # Example
//!
//! ```ignore
//! let mut modal = ModalController::tween(root, dialog, ModalConfig::new().scroll_target(body), false)
//!     .on_outside_click(|_| dismissed.set(true));
//! modal.set_open(true, &mut doc);
//! modal.mount(&mut doc);
//! modal.tick(clock.delta(), &mut doc);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use unveil_core::{Document, ElementId, InteractionEvent};
use unveil_runtime::{
    Easing, OutsideInteractionDetector, Property, ScrollLockGuard, ScrollLockRegistry,
    Subscription, Timeline, TimelineSpec, TimingConfig, Track, TweenTimeline,
};

use crate::visibility::{VisibilityController, VisibilityPolicy};

/// Backdrop blur radius (px) once fully open.
pub const BACKDROP_BLUR_PX: f64 = 2.0;

// ============================================================================
// Options
// ============================================================================

/// Edge the dialog slides in from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum AnimateFrom {
    Top,
    #[default]
    Bottom,
}

impl AnimateFrom {
    /// CSS-style transform origin for the dialog.
    pub const fn transform_origin(self) -> &'static str {
        match self {
            Self::Top => "center top",
            Self::Bottom => "center bottom",
        }
    }

    /// Initial vertical offset of the dialog, in percent of its height.
    pub const fn y_percent(self) -> f64 {
        match self {
            Self::Top => -25.0,
            Self::Bottom => 25.0,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

impl fmt::Display for AnimateFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnimateFrom {
    type Err = ParseModalOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            _ => Err(ParseModalOptionError::AnimateFrom(s.to_owned())),
        }
    }
}

/// Dialog width preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum ModalSize {
    Small,
    #[default]
    Base,
    Large,
    XLarge,
}

impl ModalSize {
    /// Dialog width in pixels.
    pub const fn width(self) -> u16 {
        match self {
            Self::Small => 400,
            Self::Base => 600,
            Self::Large => 800,
            Self::XLarge => 1000,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Base => "base",
            Self::Large => "large",
            Self::XLarge => "xlarge",
        }
    }
}

impl fmt::Display for ModalSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModalSize {
    type Err = ParseModalOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "base" => Ok(Self::Base),
            "large" => Ok(Self::Large),
            "xlarge" => Ok(Self::XLarge),
            _ => Err(ParseModalOptionError::Size(s.to_owned())),
        }
    }
}

/// Error parsing a modal option from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseModalOptionError {
    /// Not `top` or `bottom`.
    AnimateFrom(String),
    /// Not `small`, `base`, `large` or `xlarge`.
    Size(String),
}

impl fmt::Display for ParseModalOptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnimateFrom(v) => write!(f, "invalid animate-from value: {v:?}"),
            Self::Size(v) => write!(f, "invalid modal size: {v:?}"),
        }
    }
}

impl std::error::Error for ParseModalOptionError {}

// ============================================================================
// Configuration
// ============================================================================

/// Modal configuration.
#[derive(Debug, Clone)]
pub struct ModalConfig {
    /// Edge the dialog slides in from.
    pub animate_from: AnimateFrom,
    /// Dialog width preset.
    pub size: ModalSize,
    /// Durations and easings.
    pub timing: TimingConfig,
    /// Return focus to the previously focused element after closing.
    pub restore_focus: bool,
    /// Element whose scrolling is locked. Defaults to the modal root.
    pub scroll_target: Option<ElementId>,
    /// Registry counting scroll locks across modals.
    pub registry: ScrollLockRegistry,
    /// Detector the host feeds interactions into.
    pub detector: OutsideInteractionDetector,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            animate_from: AnimateFrom::default(),
            size: ModalSize::default(),
            timing: TimingConfig::default(),
            restore_focus: false,
            scroll_target: None,
            registry: ScrollLockRegistry::global(),
            detector: OutsideInteractionDetector::new(),
        }
    }
}

impl ModalConfig {
    /// Create the default configuration (global scroll-lock registry).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the edge the dialog slides in from.
    pub fn animate_from(mut self, animate_from: AnimateFrom) -> Self {
        self.animate_from = animate_from;
        self
    }

    /// Set the dialog width preset.
    pub fn size(mut self, size: ModalSize) -> Self {
        self.size = size;
        self
    }

    /// Set durations and easings.
    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Return focus to the previously focused element after closing.
    pub fn restore_focus(mut self, restore: bool) -> Self {
        self.restore_focus = restore;
        self
    }

    /// Lock scrolling on `target` (normally the document body).
    pub fn scroll_target(mut self, target: ElementId) -> Self {
        self.scroll_target = Some(target);
        self
    }

    /// Use a private scroll-lock registry instead of the global one.
    pub fn registry(mut self, registry: ScrollLockRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Share an outside-interaction detector fed by the host.
    pub fn detector(mut self, detector: OutsideInteractionDetector) -> Self {
        self.detector = detector;
        self
    }
}

// ============================================================================
// Policy
// ============================================================================

type OutsideCallback = Rc<RefCell<Option<Box<dyn FnMut(&InteractionEvent)>>>>;

/// Overlay behaviour for [`VisibilityController`].
pub struct ModalPolicy {
    root: ElementId,
    dialog: ElementId,
    config: ModalConfig,
    lock: Option<ScrollLockGuard>,
    watch: Option<Subscription>,
    on_outside: OutsideCallback,
    previous_focus: Option<ElementId>,
}

impl fmt::Debug for ModalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalPolicy")
            .field("root", &self.root)
            .field("dialog", &self.dialog)
            .field("config", &self.config)
            .field("locked", &self.lock.is_some())
            .field("watching", &self.watch.is_some())
            .finish()
    }
}

impl ModalPolicy {
    /// Policy for a modal rendered as `root` (the backdrop wrapper) around
    /// `dialog`.
    pub fn new(root: ElementId, dialog: ElementId, config: ModalConfig) -> Self {
        Self {
            root,
            dialog,
            config,
            lock: None,
            watch: None,
            on_outside: Rc::new(RefCell::new(None)),
            previous_focus: None,
        }
    }

    /// The backdrop wrapper.
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// The dialog inside the backdrop.
    pub fn dialog(&self) -> ElementId {
        self.dialog
    }

    /// Configuration this policy was built with.
    pub fn config(&self) -> &ModalConfig {
        &self.config
    }

    /// Width the host should give the dialog, from the size preset.
    pub fn dialog_width(&self) -> u16 {
        self.config.size.width()
    }

    /// Transform origin the host should give the dialog, matching the edge
    /// it slides in from.
    pub fn transform_origin(&self) -> &'static str {
        self.config.animate_from.transform_origin()
    }

    /// Whether this instance holds a scroll-lock reference.
    pub fn holds_scroll_lock(&self) -> bool {
        self.lock.is_some()
    }

    /// Whether outside interactions are being watched.
    pub fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    fn scroll_target(&self) -> ElementId {
        self.config.scroll_target.unwrap_or(self.root)
    }

    fn hold(&mut self) {
        if self.lock.is_none() {
            self.lock = Some(self.config.registry.acquire(self.scroll_target()));
        }
        if self.watch.is_none() {
            let callback = Rc::clone(&self.on_outside);
            self.watch = Some(self.config.detector.watch(self.dialog, move |event| {
                if let Some(f) = callback.borrow_mut().as_mut() {
                    f(event);
                }
            }));
        }
    }
}

impl VisibilityPolicy for ModalPolicy {
    fn name(&self) -> &'static str {
        "modal"
    }

    fn timeline_spec(&self, _document: &dyn Document) -> TimelineSpec {
        let timing = &self.config.timing;
        TimelineSpec::new(timing.base)
            .track(Track::new(self.root, Property::AutoAlpha, 0.0, 1.0).easing(Easing::EaseOut))
            .track(
                Track::new(self.root, Property::BackdropBlur, 0.0, BACKDROP_BLUR_PX)
                    .easing(Easing::EaseOut),
            )
            .track(
                Track::new(self.dialog, Property::AutoAlpha, 0.0, 1.0)
                    .easing(timing.overlay_easing),
            )
            .track(
                Track::new(
                    self.dialog,
                    Property::YPercent,
                    self.config.animate_from.y_percent(),
                    0.0,
                )
                .easing(timing.overlay_easing),
            )
    }

    fn reserve(&mut self) {
        self.hold();
    }

    fn enter(&mut self, document: &mut dyn Document) {
        self.previous_focus = document.focused();
        self.hold();
    }

    fn complete(&mut self, document: &mut dyn Document) {
        document.focus(self.root);
    }

    fn exit(&mut self, document: &mut dyn Document) {
        self.watch = None;
        if let Some(lock) = self.lock.take() {
            lock.release();
        }
        if let Some(previous) = self.previous_focus.take()
            && self.config.restore_focus
        {
            document.focus(previous);
        }
    }

    fn teardown(&mut self) {
        self.watch = None;
        // Only a modal whose reference still counts clears the registry; a
        // closed one, or one already cleared, leaves other modals' locks alone.
        if self.lock.as_ref().is_some_and(ScrollLockGuard::is_current) {
            self.config.registry.unlock_all();
        }
        // Stale after the clear; dropping it is a no-op.
        self.lock = None;
        self.previous_focus = None;
    }
}

// ============================================================================
// Controller
// ============================================================================

/// A visibility controller running the overlay policy.
pub type ModalController<T> = VisibilityController<T, ModalPolicy>;

impl<T: Timeline> VisibilityController<T, ModalPolicy> {
    /// Create a modal controller building timelines with `factory`.
    pub fn modal(
        root: ElementId,
        dialog: ElementId,
        config: ModalConfig,
        open: bool,
        factory: impl FnMut(&TimelineSpec) -> T + 'static,
    ) -> Self {
        Self::new(ModalPolicy::new(root, dialog, config), open, factory)
    }

    /// Report interactions outside the dialog while the modal is rendered.
    pub fn on_outside_click(mut self, f: impl FnMut(&InteractionEvent) + 'static) -> Self {
        self.set_on_outside_click(f);
        self
    }

    /// Replace the outside-interaction callback.
    pub fn set_on_outside_click(&mut self, f: impl FnMut(&InteractionEvent) + 'static) {
        *self.policy_mut().on_outside.borrow_mut() = Some(Box::new(f));
    }

    /// Whether this modal holds a scroll-lock reference.
    pub fn holds_scroll_lock(&self) -> bool {
        self.policy().holds_scroll_lock()
    }

    /// Dialog width for the configured size preset.
    pub fn dialog_width(&self) -> u16 {
        self.policy().dialog_width()
    }

    /// Dialog transform origin for the configured animate-from edge.
    pub fn transform_origin(&self) -> &'static str {
        self.policy().transform_origin()
    }

    /// The detector outside interactions must be dispatched through.
    pub fn detector(&self) -> &OutsideInteractionDetector {
        &self.policy().config.detector
    }

    /// The scroll-lock registry this modal uses.
    pub fn registry(&self) -> &ScrollLockRegistry {
        &self.policy().config.registry
    }
}

impl ModalController<TweenTimeline> {
    /// Create a modal controller driven by [`TweenTimeline`]s.
    pub fn tween(root: ElementId, dialog: ElementId, config: ModalConfig, open: bool) -> Self {
        Self::modal(root, dialog, config, open, |spec: &TimelineSpec| {
            TweenTimeline::new(spec.clone())
        })
    }
}
