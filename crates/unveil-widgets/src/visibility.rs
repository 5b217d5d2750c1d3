#![forbid(unsafe_code)]

//! The animated visibility controller shared by overlays and disclosures.
//!
//! A [`VisibilityController`] turns a caller-owned open/closed intent into
//! timeline commands, keeps the rendered subtree alive until an exit
//! animation finishes, and runs widget-specific side effects through a
//! [`VisibilityPolicy`].
//!
//! # State Machine
//!
//! ```text
//! Idle → Entering → Entered → Leaving → Idle
//!          ↑                     │
//!          └──── reopen ─────────┘
//! ```
//!
//! 1. `set_open(true)` from `Idle` marks the subtree rendered and queues a
//!    play. The host renders, then calls [`mount`](VisibilityController::mount)
//!    which builds the timeline and plays it.
//! 2. `Start`/`Complete` events drained by [`pump`](VisibilityController::pump)
//!    fire the policy effects and caller callbacks; `Complete` enters `Entered`.
//! 3. `set_open(false)` reverses from wherever the timeline got to.
//!    `ReverseComplete` returns to `Idle`, unrenders the subtree (unless the
//!    policy keeps it mounted) and releases the timeline.
//!
//! # Invariants
//!
//! 1. An open intent always has a rendered subtree.
//! 2. At most one timeline handle exists per controller; a reopen during
//!    `Leaving` replays the same handle.
//! 3. No timeline command is issued before `mount()`.
//! 4. After [`teardown`](VisibilityController::teardown) no callback fires.
//!
//! # Failure Modes
//!
//! - Events that do not match the current phase are ignored.
//! - Commands with no handle are skipped, never escalated.
//! - A timeline that never completes leaves the controller in `Entering` or
//!   `Leaving`; there are no timeouts.

use std::fmt;
use std::time::Duration;

use unveil_core::Document;
use unveil_runtime::{Timeline, TimelineEvent, TimelineSpec};

// ============================================================================
// Animation Phase
// ============================================================================

/// Lifecycle phase of a visibility controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationPhase {
    /// Closed. The subtree is unrendered unless the policy keeps it mounted.
    #[default]
    Idle,
    /// Animating in (or waiting for `mount()` to start doing so).
    Entering,
    /// Fully open.
    Entered,
    /// Animating out.
    Leaving,
}

impl AnimationPhase {
    /// Whether the content is at least partially visible.
    pub fn is_visible(self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Whether a transition is in flight.
    pub fn is_animating(self) -> bool {
        matches!(self, Self::Entering | Self::Leaving)
    }

    /// Whether the phase counts as open for [`toggle`](VisibilityController::toggle).
    pub fn is_opening_or_open(self) -> bool {
        matches!(self, Self::Entering | Self::Entered)
    }
}

// ============================================================================
// Callbacks
// ============================================================================

type Callback = Box<dyn FnMut()>;

/// Caller callbacks fired on animation lifecycle transitions.
///
/// All callbacks are optional.
#[derive(Default)]
pub struct Callbacks {
    on_start: Option<Callback>,
    on_complete: Option<Callback>,
    on_reverse_start: Option<Callback>,
    on_reverse_complete: Option<Callback>,
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_reverse_start", &self.on_reverse_start.is_some())
            .field("on_reverse_complete", &self.on_reverse_complete.is_some())
            .finish()
    }
}

impl Callbacks {
    /// Create an empty callback set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when the entrance animation starts moving.
    pub fn on_start(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Called when the entrance animation finishes.
    pub fn on_complete(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Called when a close reverses the timeline.
    pub fn on_reverse_start(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_reverse_start = Some(Box::new(f));
        self
    }

    /// Called when the exit animation finishes and the controller is idle.
    pub fn on_reverse_complete(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_reverse_complete = Some(Box::new(f));
        self
    }

    fn fire(slot: &mut Option<Callback>) {
        if let Some(callback) = slot.as_mut() {
            callback();
        }
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Widget-specific behaviour plugged into a [`VisibilityController`].
///
/// Every hook defaults to a no-op; a policy only has to describe its
/// timeline.
pub trait VisibilityPolicy {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Keep the subtree rendered while `Idle` (content hidden by the
    /// timeline instead of unmounted).
    fn keeps_mounted(&self) -> bool {
        false
    }

    /// Jump straight to `Entered` at mount when constructed open, instead of
    /// playing the entrance.
    fn snaps_when_initially_open(&self) -> bool {
        false
    }

    /// Constructed open: take resources that need no document before the
    /// first render. Released by [`exit`](Self::exit) or [`teardown`](Self::teardown).
    fn reserve(&mut self) {}

    /// Build the timeline for a freshly mounted subtree.
    fn timeline_spec(&self, document: &dyn Document) -> TimelineSpec;

    /// The subtree became rendered for an entrance.
    fn enter(&mut self, _document: &mut dyn Document) {}

    /// The entrance started moving.
    fn start(&mut self, _document: &mut dyn Document) {}

    /// A reopen redirected an exit back into an entrance.
    fn resume(&mut self, document: &mut dyn Document) {
        self.start(document);
    }

    /// The entrance finished.
    fn complete(&mut self, _document: &mut dyn Document) {}

    /// A close reversed the timeline.
    fn reverse_start(&mut self, _document: &mut dyn Document) {}

    /// The controller returned to `Idle` after an entrance began.
    fn exit(&mut self, _document: &mut dyn Document) {}

    /// The timeline was mounted without animating; `open` is the state it
    /// was parked in.
    fn park(&mut self, _document: &mut dyn Document, _open: bool) {}

    /// The owner is being destroyed. Runs in any phase.
    fn teardown(&mut self) {}
}

// ============================================================================
// Controller
// ============================================================================

/// Builds a timeline handle from a spec at mount time.
pub type TimelineFactory<T> = Box<dyn FnMut(&TimelineSpec) -> T>;

/// Open/close state machine driving one timeline handle.
pub struct VisibilityController<T: Timeline, P: VisibilityPolicy> {
    policy: P,
    callbacks: Callbacks,
    factory: TimelineFactory<T>,
    intent: bool,
    rendered: bool,
    phase: AnimationPhase,
    handle: Option<T>,
    pending_play: bool,
    snap_on_mount: bool,
    /// Policy `enter` ran and `exit` has not yet.
    engaged: bool,
    handles_created: usize,
    torn_down: bool,
}

impl<T: Timeline, P: VisibilityPolicy + fmt::Debug> fmt::Debug for VisibilityController<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityController")
            .field("policy", &self.policy)
            .field("intent", &self.intent)
            .field("rendered", &self.rendered)
            .field("phase", &self.phase)
            .field("mounted", &self.handle.is_some())
            .field("pending_play", &self.pending_play)
            .finish()
    }
}

impl<T: Timeline, P: VisibilityPolicy> VisibilityController<T, P> {
    /// Create a controller.
    ///
    /// With `open == true` the controller starts in `Entering` with its
    /// subtree rendered and the policy's resources reserved; the entrance
    /// begins at the first [`mount`](Self::mount).
    pub fn new(
        mut policy: P,
        open: bool,
        factory: impl FnMut(&TimelineSpec) -> T + 'static,
    ) -> Self {
        let snap_on_mount = open && policy.snaps_when_initially_open();
        let rendered = open || policy.keeps_mounted();
        let pending_play = open && !snap_on_mount;
        if pending_play {
            policy.reserve();
        }
        Self {
            policy,
            callbacks: Callbacks::default(),
            factory: Box::new(factory),
            intent: open,
            rendered,
            phase: if open {
                AnimationPhase::Entering
            } else {
                AnimationPhase::Idle
            },
            handle: None,
            pending_play,
            snap_on_mount,
            engaged: false,
            handles_created: 0,
            torn_down: false,
        }
    }

    /// Set the caller callbacks.
    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Replace the caller callbacks.
    pub fn set_callbacks(&mut self, callbacks: Callbacks) {
        self.callbacks = callbacks;
    }

    // --- State queries ---

    /// Last requested intent.
    pub fn is_open(&self) -> bool {
        self.intent
    }

    /// Whether the subtree should currently exist.
    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    /// Whether a timeline handle is live.
    pub fn is_mounted(&self) -> bool {
        self.handle.is_some()
    }

    /// The live timeline handle.
    pub fn timeline(&self) -> Option<&T> {
        self.handle.as_ref()
    }

    /// Progress of the live timeline (`0.0` without one).
    pub fn progress(&self) -> f64 {
        self.handle.as_ref().map_or(0.0, Timeline::progress)
    }

    /// How many timeline handles this controller has built.
    pub fn handles_created(&self) -> usize {
        self.handles_created
    }

    /// Whether [`teardown`](Self::teardown) has run.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// The widget policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub(crate) fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    // --- Commands ---

    /// Post-render hook: build the timeline once the subtree exists.
    ///
    /// Call after every render. Does nothing while unrendered or when a
    /// handle is already live.
    pub fn mount(&mut self, document: &mut dyn Document) {
        if self.torn_down || self.handle.is_some() {
            return;
        }
        if !self.rendered {
            #[cfg(feature = "tracing")]
            tracing::trace!(policy = self.policy.name(), "mount skipped: not rendered");
            return;
        }

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "visibility_mount",
            policy = self.policy.name(),
            phase = ?self.phase
        )
        .entered();

        let spec = self.policy.timeline_spec(&*document);
        let mut handle = (self.factory)(&spec);
        handle.seek(0.0);
        self.handles_created += 1;

        if self.snap_on_mount {
            self.snap_on_mount = false;
            self.pending_play = false;
            handle.seek(1.0);
            self.handle = Some(handle);
            self.phase = AnimationPhase::Entered;
            self.policy.park(document, true);
            return;
        }

        if self.phase == AnimationPhase::Entering && self.pending_play {
            self.pending_play = false;
            if !self.engaged {
                self.policy.enter(document);
                self.engaged = true;
            }
            handle.play();
            self.handle = Some(handle);
            self.settle_if_parked(document);
        } else {
            self.handle = Some(handle);
            self.policy.park(document, false);
        }
    }

    /// Record a new intent and drive the state machine toward it.
    pub fn set_open(&mut self, open: bool, document: &mut dyn Document) {
        if self.torn_down {
            return;
        }
        self.intent = open;

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "visibility_set_open",
            policy = self.policy.name(),
            open,
            phase = ?self.phase
        )
        .entered();

        match (self.phase, open) {
            (AnimationPhase::Idle, true) => self.begin_enter(document),
            (AnimationPhase::Leaving, true) => self.resume_enter(document),
            (AnimationPhase::Entering, false) if self.handle.is_none() => {
                self.cancel_pending(document)
            }
            (AnimationPhase::Entering | AnimationPhase::Entered, false) => {
                self.begin_leave(document)
            }
            _ => {
                #[cfg(feature = "tracing")]
                tracing::trace!("intent unchanged for phase");
            }
        }
    }

    /// Flip the visibility: `Idle`/`Leaving` open, `Entering`/`Entered`
    /// close. A mid-entrance controller counts as open, so toggling reverses
    /// from the reached point.
    pub fn toggle(&mut self, document: &mut dyn Document) {
        let open = !self.phase.is_opening_or_open();
        self.set_open(open, document);
    }

    /// Drain pending timeline events and apply their transitions.
    pub fn pump(&mut self, document: &mut dyn Document) {
        if self.torn_down {
            return;
        }
        while let Some(event) = self.next_event() {
            self.apply_event(event, document);
        }
    }

    /// Advance the timeline by `delta`, then [`pump`](Self::pump).
    pub fn tick(&mut self, delta: Duration, document: &mut dyn Document) {
        if self.torn_down {
            return;
        }
        if let Some(handle) = self.handle.as_mut() {
            handle.advance(delta);
        }
        self.pump(document);
    }

    /// Destroy the controller's resources in any phase.
    ///
    /// Drops the timeline (detaching its events) and runs the policy
    /// teardown. Idempotent; also runs on drop.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(policy = self.policy.name(), phase = ?self.phase, "visibility teardown");
        self.torn_down = true;
        self.handle = None;
        self.pending_play = false;
        self.engaged = false;
        self.rendered = false;
        self.phase = AnimationPhase::Idle;
        self.policy.teardown();
    }

    // --- Transitions ---

    fn begin_enter(&mut self, document: &mut dyn Document) {
        self.phase = AnimationPhase::Entering;
        self.rendered = true;
        self.policy.enter(document);
        self.engaged = true;
        match self.handle.as_mut() {
            Some(handle) => {
                handle.play();
                self.settle_if_parked(document);
            }
            None => self.pending_play = true,
        }
    }

    fn resume_enter(&mut self, document: &mut dyn Document) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        handle.play();
        self.phase = AnimationPhase::Entering;
        self.policy.resume(document);
        self.settle_if_parked(document);
    }

    fn cancel_pending(&mut self, document: &mut dyn Document) {
        #[cfg(feature = "tracing")]
        tracing::debug!("pending mount cancelled");
        let reserved = self.pending_play;
        self.pending_play = false;
        self.snap_on_mount = false;
        self.phase = AnimationPhase::Idle;
        self.rendered = self.policy.keeps_mounted();
        if self.engaged || reserved {
            self.engaged = false;
            self.policy.exit(document);
        }
    }

    fn begin_leave(&mut self, document: &mut dyn Document) {
        let Some(handle) = self.handle.as_mut() else {
            #[cfg(feature = "tracing")]
            tracing::debug!("reverse skipped: no timeline");
            return;
        };
        handle.reverse();
        self.phase = AnimationPhase::Leaving;
        self.policy.reverse_start(document);
        Callbacks::fire(&mut self.callbacks.on_reverse_start);
        self.settle_if_parked(document);
    }

    fn finish_enter(&mut self, document: &mut dyn Document) {
        self.phase = AnimationPhase::Entered;
        self.policy.complete(document);
        Callbacks::fire(&mut self.callbacks.on_complete);
    }

    fn finish_leave(&mut self, document: &mut dyn Document) {
        self.phase = AnimationPhase::Idle;
        if !self.policy.keeps_mounted() {
            self.rendered = false;
            self.handle = None;
        }
        if self.engaged {
            self.engaged = false;
            self.policy.exit(document);
        }
        Callbacks::fire(&mut self.callbacks.on_reverse_complete);
    }

    /// A timeline commanded toward the end it already sits at emits nothing,
    /// so the transition completes here.
    fn settle_if_parked(&mut self, document: &mut dyn Document) {
        let Some(progress) = self.handle.as_ref().map(Timeline::progress) else {
            return;
        };
        match self.phase {
            AnimationPhase::Entering if progress >= 1.0 => self.finish_enter(document),
            AnimationPhase::Leaving if progress <= 0.0 => self.finish_leave(document),
            _ => {}
        }
    }

    fn next_event(&mut self) -> Option<TimelineEvent> {
        self.handle.as_mut().and_then(Timeline::poll_event)
    }

    fn apply_event(&mut self, event: TimelineEvent, document: &mut dyn Document) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "visibility_event",
            policy = self.policy.name(),
            event = ?event,
            phase = ?self.phase
        )
        .entered();

        match (event, self.phase) {
            (TimelineEvent::Start, AnimationPhase::Entering) => {
                self.policy.start(document);
                Callbacks::fire(&mut self.callbacks.on_start);
            }
            (TimelineEvent::Complete, AnimationPhase::Entering) => self.finish_enter(document),
            (TimelineEvent::ReverseComplete, AnimationPhase::Leaving) => {
                self.finish_leave(document)
            }
            _ => {
                #[cfg(feature = "tracing")]
                tracing::trace!("event ignored for phase");
            }
        }
    }
}

impl<T: Timeline, P: VisibilityPolicy> Drop for VisibilityController<T, P> {
    fn drop(&mut self) {
        self.teardown();
    }
}
