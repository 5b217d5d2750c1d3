#![forbid(unsafe_code)]

//! Property tests: liveness, idempotence, reopen, lock counting, teardown.

use std::time::Duration;

use proptest::prelude::*;
use unveil_core::ElementId;
use unveil_harness::strategies::{Step, steps};
use unveil_harness::{CallbackLog, Command, Fired, Stage};
use unveil_runtime::{ScrollLockRegistry, TimelineEvent};
use unveil_widgets::{
    AnimationPhase, DisclosureConfig, DisclosureController, ModalConfig, ModalController,
};

fn apply<T, P>(
    ctl: &mut unveil_widgets::VisibilityController<T, P>,
    step: Step,
    doc: &mut unveil_core::MemoryDocument,
) where
    T: unveil_runtime::Timeline,
    P: unveil_widgets::VisibilityPolicy,
{
    match step {
        Step::SetOpen(open) => ctl.set_open(open, doc),
        Step::Toggle => ctl.toggle(doc),
        Step::Tick(delta) => ctl.tick(delta, doc),
    }
    ctl.mount(doc);
}

fn settle<T, P>(
    ctl: &mut unveil_widgets::VisibilityController<T, P>,
    doc: &mut unveil_core::MemoryDocument,
) where
    T: unveil_runtime::Timeline,
    P: unveil_widgets::VisibilityPolicy,
{
    for _ in 0..100 {
        ctl.tick(Duration::from_millis(50), doc);
    }
}

proptest! {
    #[test]
    fn modal_always_reaches_idle_after_final_close(seq in steps(40)) {
        let mut stage = Stage::new();
        let config = stage.modal_config();
        let root = stage.element();
        let dialog = stage.doc.create_element(Some(root));
        let mut modal = ModalController::tween(root, dialog, config, false);

        for step in seq {
            apply(&mut modal, step, &mut stage.doc);
            prop_assert!(!modal.is_open() || modal.is_rendered());
            prop_assert_eq!(modal.holds_scroll_lock(), modal.phase().is_visible());
            prop_assert_eq!(stage.registry.is_locked(stage.body), modal.holds_scroll_lock());
        }

        modal.set_open(false, &mut stage.doc);
        settle(&mut modal, &mut stage.doc);
        prop_assert_eq!(modal.phase(), AnimationPhase::Idle);
        prop_assert!(!modal.is_rendered());
        prop_assert!(!modal.is_mounted());
        prop_assert!(!stage.registry.is_engaged());
        prop_assert_eq!(stage.detector.watch_count(), 0);
    }

    #[test]
    fn disclosure_keeps_one_handle_and_settles(seq in steps(40)) {
        let mut stage = Stage::new();
        let trigger = stage.element();
        let panel = stage.element();
        stage.doc.set_intrinsic_height(panel, 64.0);
        let mut ctl = DisclosureController::tween(trigger, panel, DisclosureConfig::new(), false);
        ctl.mount(&mut stage.doc);

        for step in seq {
            apply(&mut ctl, step, &mut stage.doc);
            prop_assert_eq!(ctl.handles_created(), 1);
            prop_assert!(ctl.is_rendered());
            let height = ctl.panel_height();
            prop_assert!((0.0..=64.0).contains(&height));
        }

        ctl.set_open(false, &mut stage.doc);
        settle(&mut ctl, &mut stage.doc);
        prop_assert_eq!(ctl.phase(), AnimationPhase::Idle);
        prop_assert_eq!(ctl.panel_height(), 0.0);
        prop_assert!(!stage.doc.is_active(trigger));
        prop_assert!(stage.doc.is_aria_hidden(panel));
    }

    #[test]
    fn open_while_entered_is_silent(repeats in 1usize..8) {
        let mut stage = Stage::new();
        let log = CallbackLog::new();
        let mut modal = stage.modal(false).callbacks(log.callbacks());
        modal.set_open(true, &mut stage.doc);
        modal.mount(&mut stage.doc);
        let script = stage.timelines.latest().unwrap();
        script.run_forward();
        modal.pump(&mut stage.doc);
        let commands = script.commands();
        let fired = log.entries();

        for _ in 0..repeats {
            modal.set_open(true, &mut stage.doc);
            modal.mount(&mut stage.doc);
            modal.pump(&mut stage.doc);
        }
        prop_assert_eq!(script.commands(), commands);
        prop_assert_eq!(log.entries(), fired);
        prop_assert_eq!(stage.registry.ref_count(stage.body), 1);
    }

    #[test]
    fn reopen_mid_exit_resumes_forward(progress in 0.01f64..0.99) {
        let mut stage = Stage::new();
        let log = CallbackLog::new();
        let mut modal = stage.modal(false).callbacks(log.callbacks());
        modal.set_open(true, &mut stage.doc);
        modal.mount(&mut stage.doc);
        let script = stage.timelines.latest().unwrap();
        script.run_forward();
        modal.pump(&mut stage.doc);
        modal.set_open(false, &mut stage.doc);
        script.set_progress(progress);
        log.clear();

        modal.set_open(true, &mut stage.doc);
        modal.mount(&mut stage.doc);
        script.complete();
        modal.pump(&mut stage.doc);

        prop_assert_eq!(stage.timelines.created(), 1);
        prop_assert_eq!(
            script.playback_commands(),
            vec![Command::Play, Command::Reverse, Command::Play]
        );
        prop_assert_eq!(log.entries(), vec![Fired::Complete]);
        prop_assert_eq!(modal.phase(), AnimationPhase::Entered);
        prop_assert!(stage.registry.is_locked(stage.body));
    }

    #[test]
    fn teardown_mid_transition_detaches(
        reach_entered in any::<bool>(),
        start_leaving in any::<bool>(),
        late in proptest::sample::select(vec![
            TimelineEvent::Start,
            TimelineEvent::Complete,
            TimelineEvent::ReverseComplete,
        ]),
    ) {
        let mut stage = Stage::new();
        let log = CallbackLog::new();
        let mut modal = stage.modal(false).callbacks(log.callbacks());
        modal.set_open(true, &mut stage.doc);
        modal.mount(&mut stage.doc);
        let script = stage.timelines.latest().unwrap();
        script.start();
        if reach_entered {
            script.complete();
        }
        modal.pump(&mut stage.doc);
        if start_leaving {
            modal.set_open(false, &mut stage.doc);
        }
        prop_assert!(modal.phase().is_visible());
        log.clear();

        modal.teardown();
        script.emit(late);
        modal.pump(&mut stage.doc);
        drop(modal);

        prop_assert!(log.is_empty());
        prop_assert!(!script.is_attached());
        prop_assert!(!stage.registry.is_engaged());
        prop_assert_eq!(stage.registry.release_count(), 1);
        prop_assert_eq!(stage.detector.watch_count(), 0);
    }
}

// ============================================================================
// Scroll-lock reference counting across modals
// ============================================================================

struct Pair {
    stage: Stage,
    first: ModalController<unveil_harness::ScriptedTimeline>,
    second: ModalController<unveil_harness::ScriptedTimeline>,
}

fn open_pair() -> Pair {
    let mut stage = Stage::new();
    let mut first = stage.modal(false);
    let mut second = stage.modal(false);
    first.set_open(true, &mut stage.doc);
    first.mount(&mut stage.doc);
    second.set_open(true, &mut stage.doc);
    second.mount(&mut stage.doc);
    stage.timelines.get(0).unwrap().run_forward();
    stage.timelines.get(1).unwrap().run_forward();
    first.pump(&mut stage.doc);
    second.pump(&mut stage.doc);
    Pair {
        stage,
        first,
        second,
    }
}

#[test]
fn closing_one_of_two_modals_keeps_lock() {
    let Pair {
        mut stage,
        mut first,
        mut second,
    } = open_pair();

    first.set_open(false, &mut stage.doc);
    stage.timelines.get(0).unwrap().run_reverse();
    first.pump(&mut stage.doc);
    assert!(stage.registry.is_locked(stage.body));
    assert_eq!(stage.registry.ref_count(stage.body), 1);

    second.set_open(false, &mut stage.doc);
    stage.timelines.get(1).unwrap().run_reverse();
    second.pump(&mut stage.doc);
    assert!(!stage.registry.is_locked(stage.body));
    assert_eq!(stage.registry.release_count(), 1);
}

#[test]
fn destroying_two_open_modals_releases_exactly_once() {
    let Pair {
        stage,
        first,
        second,
    } = open_pair();
    drop(second);
    drop(first);
    assert!(!stage.registry.is_engaged());
    assert_eq!(stage.registry.release_count(), 1);
}

#[test]
fn stale_guard_cannot_release_a_later_lock() {
    let registry = ScrollLockRegistry::new();
    let mut stage = Stage::new();
    let body = ElementId::next();
    let config = ModalConfig::new()
        .scroll_target(body)
        .registry(registry.clone());
    let root = stage.element();
    let dialog = stage.doc.create_element(Some(root));
    let mut old = ModalController::tween(root, dialog, config, false);
    old.set_open(true, &mut stage.doc);

    registry.unlock_all();
    let fresh = registry.acquire(body);
    old.set_open(false, &mut stage.doc);
    assert!(registry.is_locked(body));
    drop(old);
    drop(fresh);
    assert!(!registry.is_locked(body));
}

#[test]
fn destroying_a_never_opened_modal_keeps_open_sibling_locked() {
    let mut stage = Stage::new();
    let mut open = stage.modal(false);
    open.set_open(true, &mut stage.doc);
    open.mount(&mut stage.doc);
    stage.timelines.latest().unwrap().run_forward();
    open.pump(&mut stage.doc);
    let closed = stage.modal(false);

    drop(closed);
    assert!(stage.registry.is_locked(stage.body));
    assert_eq!(stage.registry.release_count(), 0);
    assert_eq!(open.phase(), AnimationPhase::Entered);
    assert!(open.holds_scroll_lock());

    open.set_open(false, &mut stage.doc);
    stage.timelines.latest().unwrap().run_reverse();
    open.pump(&mut stage.doc);
    assert!(!stage.registry.is_locked(stage.body));
    assert_eq!(stage.registry.release_count(), 1);
}

#[test]
fn modal_constructed_open_locks_before_first_render() {
    let mut stage = Stage::new();
    let mut modal = stage.modal(true);

    assert!(modal.is_rendered());
    assert!(stage.registry.is_locked(stage.body));
    assert_eq!(stage.detector.watch_count(), 1);
    assert_eq!(stage.timelines.created(), 0);

    modal.mount(&mut stage.doc);
    stage.timelines.latest().unwrap().run_forward();
    modal.pump(&mut stage.doc);
    assert_eq!(modal.phase(), AnimationPhase::Entered);
    assert_eq!(stage.registry.ref_count(stage.body), 1);
}

#[test]
fn modal_already_cleared_does_not_clear_a_later_lock() {
    let Pair {
        mut stage,
        first,
        second,
    } = open_pair();
    drop(first);
    assert!(!stage.registry.is_engaged());

    let mut third = stage.modal(false);
    third.set_open(true, &mut stage.doc);
    assert!(stage.registry.is_locked(stage.body));

    drop(second);
    assert!(stage.registry.is_locked(stage.body));
    assert_eq!(stage.registry.ref_count(stage.body), 1);
    assert!(third.holds_scroll_lock());
}
