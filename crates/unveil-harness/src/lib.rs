#![forbid(unsafe_code)]

//! Test harness for unveil visibility controllers.
//!
//! - [`ScriptedTimeline`]: a timeline that records every command and only
//!   emits the events a test pushes through its [`TimelineScript`].
//! - [`ScriptedTimelines`]: factory handing out scripted timelines and
//!   keeping a script for each one it built.
//! - [`CallbackLog`]: records caller callbacks in firing order.
//! - [`Stage`]: an in-memory document with a body and a private scroll-lock
//!   registry and outside-interaction detector, for building controllers.
//! - [`strategies`]: proptest strategies for controller input sequences.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use unveil_core::{ElementId, MemoryDocument};
use unveil_runtime::{
    OutsideInteractionDetector, ScrollLockRegistry, Timeline, TimelineEvent, TimelineSpec,
    TimingConfig,
};
use unveil_widgets::{
    Callbacks, DisclosureConfig, DisclosureController, ModalConfig, ModalController,
};

// ============================================================================
// Scripted timeline
// ============================================================================

/// A command issued to a timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Play,
    Reverse,
    Seek(f64),
}

#[derive(Debug, Default)]
struct ScriptState {
    spec: TimelineSpec,
    commands: Vec<Command>,
    progress: f64,
    pending: VecDeque<TimelineEvent>,
    dropped: bool,
}

/// Timeline that does nothing on its own.
///
/// `play`/`reverse` are recorded but do not move the playhead; `seek` does.
/// Events reach the owner only when pushed through the matching
/// [`TimelineScript`].
#[derive(Debug)]
pub struct ScriptedTimeline {
    state: Rc<RefCell<ScriptState>>,
}

impl ScriptedTimeline {
    /// Create a timeline and the script that drives it.
    pub fn new(spec: TimelineSpec) -> (Self, TimelineScript) {
        let state = Rc::new(RefCell::new(ScriptState {
            spec,
            ..ScriptState::default()
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            TimelineScript { state },
        )
    }
}

impl Timeline for ScriptedTimeline {
    fn play(&mut self) {
        tracing::trace!("scripted play");
        self.state.borrow_mut().commands.push(Command::Play);
    }

    fn reverse(&mut self) {
        tracing::trace!("scripted reverse");
        self.state.borrow_mut().commands.push(Command::Reverse);
    }

    fn progress(&self) -> f64 {
        self.state.borrow().progress
    }

    fn seek(&mut self, progress: f64) {
        let mut state = self.state.borrow_mut();
        state.commands.push(Command::Seek(progress));
        state.progress = progress.clamp(0.0, 1.0);
    }

    fn poll_event(&mut self) -> Option<TimelineEvent> {
        self.state.borrow_mut().pending.pop_front()
    }
}

impl Drop for ScriptedTimeline {
    fn drop(&mut self) {
        self.state.borrow_mut().dropped = true;
    }
}

/// Test-side handle of a [`ScriptedTimeline`].
///
/// Stays usable after the timeline is dropped, so tests can check that a
/// detached handle's events go nowhere.
#[derive(Debug, Clone)]
pub struct TimelineScript {
    state: Rc<RefCell<ScriptState>>,
}

impl TimelineScript {
    /// Commands received so far.
    pub fn commands(&self) -> Vec<Command> {
        self.state.borrow().commands.clone()
    }

    /// Commands received, ignoring seeks.
    pub fn playback_commands(&self) -> Vec<Command> {
        self.state
            .borrow()
            .commands
            .iter()
            .copied()
            .filter(|c| !matches!(c, Command::Seek(_)))
            .collect()
    }

    /// The spec the timeline was built from.
    pub fn spec(&self) -> TimelineSpec {
        self.state.borrow().spec.clone()
    }

    /// Whether the owner still holds the timeline.
    pub fn is_attached(&self) -> bool {
        !self.state.borrow().dropped
    }

    /// Current playhead.
    pub fn progress(&self) -> f64 {
        self.state.borrow().progress
    }

    /// Move the playhead without emitting anything.
    pub fn set_progress(&self, progress: f64) {
        self.state.borrow_mut().progress = progress.clamp(0.0, 1.0);
    }

    /// Queue an event for the owner's next poll.
    pub fn emit(&self, event: TimelineEvent) {
        tracing::trace!(?event, "scripted event queued");
        self.state.borrow_mut().pending.push_back(event);
    }

    /// Queue `Start` after moving just past the beginning.
    pub fn start(&self) {
        self.set_progress(0.01);
        self.emit(TimelineEvent::Start);
    }

    /// Queue the rest of a forward run: `Complete` at progress `1.0`.
    pub fn complete(&self) {
        self.set_progress(1.0);
        self.emit(TimelineEvent::Complete);
    }

    /// Queue a whole forward run from the beginning.
    pub fn run_forward(&self) {
        self.start();
        self.complete();
    }

    /// Queue the end of a reverse run: `ReverseComplete` at progress `0.0`.
    pub fn run_reverse(&self) {
        self.set_progress(0.0);
        self.emit(TimelineEvent::ReverseComplete);
    }

    /// Events not yet polled.
    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }
}

/// Factory for [`ScriptedTimeline`]s that remembers every script it made.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTimelines {
    scripts: Rc<RefCell<Vec<TimelineScript>>>,
}

impl ScriptedTimelines {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory closure for controller constructors.
    pub fn factory(&self) -> impl FnMut(&TimelineSpec) -> ScriptedTimeline + 'static {
        let scripts = Rc::clone(&self.scripts);
        move |spec: &TimelineSpec| {
            let (timeline, script) = ScriptedTimeline::new(spec.clone());
            scripts.borrow_mut().push(script);
            timeline
        }
    }

    /// Number of timelines built.
    pub fn created(&self) -> usize {
        self.scripts.borrow().len()
    }

    /// Script of the most recently built timeline.
    pub fn latest(&self) -> Option<TimelineScript> {
        self.scripts.borrow().last().cloned()
    }

    /// Script of the `index`-th built timeline.
    pub fn get(&self, index: usize) -> Option<TimelineScript> {
        self.scripts.borrow().get(index).cloned()
    }
}

// ============================================================================
// Callback log
// ============================================================================

/// A recorded callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fired {
    Start,
    Complete,
    ReverseStart,
    ReverseComplete,
    OutsideClick,
}

/// Shared, ordered record of fired callbacks.
#[derive(Debug, Clone, Default)]
pub struct CallbackLog {
    entries: Rc<RefCell<Vec<Fired>>>,
}

impl CallbackLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A [`Callbacks`] set that records into this log.
    pub fn callbacks(&self) -> Callbacks {
        let (a, b, c, d) = (self.clone(), self.clone(), self.clone(), self.clone());
        Callbacks::new()
            .on_start(move || a.push(Fired::Start))
            .on_complete(move || b.push(Fired::Complete))
            .on_reverse_start(move || c.push(Fired::ReverseStart))
            .on_reverse_complete(move || d.push(Fired::ReverseComplete))
    }

    /// An outside-click callback that records into this log.
    pub fn outside_click(&self) -> impl FnMut(&unveil_core::InteractionEvent) + 'static {
        let log = self.clone();
        move |_: &unveil_core::InteractionEvent| log.push(Fired::OutsideClick)
    }

    /// Record `fired`.
    pub fn push(&self, fired: Fired) {
        self.entries.borrow_mut().push(fired);
    }

    /// Everything fired so far, in order.
    pub fn entries(&self) -> Vec<Fired> {
        self.entries.borrow().clone()
    }

    /// How many times `fired` was recorded.
    pub fn count(&self, fired: Fired) -> usize {
        self.entries.borrow().iter().filter(|&&f| f == fired).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

// ============================================================================
// Stage
// ============================================================================

/// A body element in an in-memory document, with isolated shared services.
#[derive(Debug)]
pub struct Stage {
    pub doc: MemoryDocument,
    pub body: ElementId,
    pub registry: ScrollLockRegistry,
    pub detector: OutsideInteractionDetector,
    pub timelines: ScriptedTimelines,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    pub fn new() -> Self {
        let mut doc = MemoryDocument::new();
        let body = doc.create_element(None);
        Self {
            doc,
            body,
            registry: ScrollLockRegistry::new(),
            detector: OutsideInteractionDetector::new(),
            timelines: ScriptedTimelines::new(),
        }
    }

    /// Add a plain element under the body.
    pub fn element(&mut self) -> ElementId {
        self.doc.create_element(Some(self.body))
    }

    /// Modal config wired to this stage's body, registry and detector.
    pub fn modal_config(&self) -> ModalConfig {
        ModalConfig::new()
            .scroll_target(self.body)
            .registry(self.registry.clone())
            .detector(self.detector.clone())
    }

    /// Build a modal (root and dialog elements included) on scripted
    /// timelines.
    pub fn modal(&mut self, open: bool) -> ModalController<ScriptedTimeline> {
        let config = self.modal_config();
        self.modal_with(config, open)
    }

    /// Build a modal with an explicit config.
    pub fn modal_with(&mut self, config: ModalConfig, open: bool) -> ModalController<ScriptedTimeline> {
        let root = self.element();
        let dialog = self.doc.create_element(Some(root));
        ModalController::modal(root, dialog, config, open, self.timelines.factory())
    }

    /// Build a disclosure (trigger and panel included) on a scripted
    /// timeline. The panel measures `height`.
    pub fn disclosure(&mut self, open: bool, height: f32) -> DisclosureController<ScriptedTimeline> {
        let trigger = self.element();
        let panel = self.element();
        self.doc.set_intrinsic_height(panel, height);
        DisclosureController::disclosure(
            trigger,
            panel,
            DisclosureConfig::new().timing(TimingConfig::default()),
            open,
            self.timelines.factory(),
        )
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// Proptest strategies for controller inputs.
pub mod strategies {
    use std::time::Duration;

    use proptest::prelude::*;

    /// One caller or frame action.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Step {
        SetOpen(bool),
        Toggle,
        Tick(Duration),
    }

    /// A single step; ticks are 0..=120 ms.
    pub fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            any::<bool>().prop_map(Step::SetOpen),
            Just(Step::Toggle),
            (0u64..=120).prop_map(|ms| Step::Tick(Duration::from_millis(ms))),
        ]
    }

    /// Up to `max` steps.
    pub fn steps(max: usize) -> impl Strategy<Value = Vec<Step>> {
        proptest::collection::vec(step(), 0..max)
    }
}
