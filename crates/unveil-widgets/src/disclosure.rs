#![forbid(unsafe_code)]

//! Inline expand/collapse panel toggled by a trigger.
//!
//! The panel stays mounted for the controller's whole lifetime; collapsed
//! content is hidden by a zero height. The timeline animates the panel from
//! height `0` to its measured height.
//!
//! # Invariants
//!
//! - The trigger's active marker and the panel's `aria-hidden` agree with the
//!   direction the panel is heading: set when the expansion starts, cleared
//!   as soon as a collapse begins.
//! - One timeline handle for the controller's lifetime.

use std::fmt;

use unveil_core::{Document, ElementId};
use unveil_runtime::{Property, Timeline, TimelineSpec, TimingConfig, Track, TweenTimeline};

use crate::visibility::{VisibilityController, VisibilityPolicy};

/// Disclosure configuration.
#[derive(Debug, Clone, Default)]
pub struct DisclosureConfig {
    /// Durations and easings; the panel animates over `long`.
    pub timing: TimingConfig,
    /// Expanded height to use instead of measuring the panel.
    pub expanded_height: Option<f32>,
}

impl DisclosureConfig {
    /// Create the default configuration (measured height).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set durations and easings.
    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Use a fixed expanded height. Negative values clamp to `0`.
    pub fn expanded_height(mut self, height: f32) -> Self {
        self.expanded_height = Some(height.max(0.0));
        self
    }
}

/// Disclosure behaviour for [`VisibilityController`].
#[derive(Clone)]
pub struct DisclosurePolicy {
    trigger: ElementId,
    panel: ElementId,
    config: DisclosureConfig,
}

impl fmt::Debug for DisclosurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisclosurePolicy")
            .field("trigger", &self.trigger)
            .field("panel", &self.panel)
            .finish()
    }
}

impl DisclosurePolicy {
    /// Policy for `panel`, toggled by `trigger`.
    pub fn new(trigger: ElementId, panel: ElementId, config: DisclosureConfig) -> Self {
        Self {
            trigger,
            panel,
            config,
        }
    }

    /// The element carrying the active marker.
    pub fn trigger(&self) -> ElementId {
        self.trigger
    }

    /// The collapsible panel.
    pub fn panel(&self) -> ElementId {
        self.panel
    }

    fn show(&self, document: &mut dyn Document) {
        document.set_active(self.trigger, true);
        document.set_aria_hidden(self.panel, false);
    }

    fn hide(&self, document: &mut dyn Document) {
        document.set_active(self.trigger, false);
        document.set_aria_hidden(self.panel, true);
    }
}

impl VisibilityPolicy for DisclosurePolicy {
    fn name(&self) -> &'static str {
        "disclosure"
    }

    fn keeps_mounted(&self) -> bool {
        true
    }

    fn snaps_when_initially_open(&self) -> bool {
        true
    }

    fn timeline_spec(&self, document: &dyn Document) -> TimelineSpec {
        let height = self
            .config
            .expanded_height
            .unwrap_or_else(|| document.intrinsic_height(self.panel));
        let easing = self.config.timing.disclosure_easing;
        TimelineSpec::new(self.config.timing.long)
            .track(Track::new(self.panel, Property::Height, 0.0, f64::from(height)).easing(easing))
            .track(Track::new(self.panel, Property::AutoAlpha, 0.0, 1.0).easing(easing))
    }

    fn start(&mut self, document: &mut dyn Document) {
        self.show(document);
    }

    fn reverse_start(&mut self, document: &mut dyn Document) {
        self.hide(document);
    }

    fn park(&mut self, document: &mut dyn Document, open: bool) {
        if open {
            self.show(document);
        } else {
            self.hide(document);
        }
    }
}

/// A visibility controller running the disclosure policy.
pub type DisclosureController<T> = VisibilityController<T, DisclosurePolicy>;

impl<T: Timeline> VisibilityController<T, DisclosurePolicy> {
    /// Create a disclosure controller building its timeline with `factory`.
    pub fn disclosure(
        trigger: ElementId,
        panel: ElementId,
        config: DisclosureConfig,
        open: bool,
        factory: impl FnMut(&TimelineSpec) -> T + 'static,
    ) -> Self {
        Self::new(DisclosurePolicy::new(trigger, panel, config), open, factory)
    }
}

impl DisclosureController<TweenTimeline> {
    /// Create a disclosure controller driven by a [`TweenTimeline`].
    pub fn tween(trigger: ElementId, panel: ElementId, config: DisclosureConfig, open: bool) -> Self {
        Self::disclosure(trigger, panel, config, open, |spec: &TimelineSpec| {
            TweenTimeline::new(spec.clone())
        })
    }

    /// Current panel height.
    pub fn panel_height(&self) -> f64 {
        let panel = self.policy().panel;
        self.timeline()
            .and_then(|t| t.value(panel, Property::Height))
            .unwrap_or(0.0)
    }
}
