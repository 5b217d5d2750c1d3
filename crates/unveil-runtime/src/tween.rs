#![forbid(unsafe_code)]

//! Deterministic, frame-driven reference [`Timeline`].
//!
//! `TweenTimeline` advances only when told to (`advance(delta)`), which makes
//! it suitable both for a real frame loop (fed by
//! [`AnimationClock`](crate::AnimationClock)) and for tests.
//!
//! # Invariants
//!
//! - `progress()` is always in `[0.0, 1.0]`.
//! - Reversing mid-run keeps the current position; playback resumes from it.
//! - A zero-duration timeline completes on the first `advance`.
//!
//! # Failure Modes
//!
//! - `value()` for a property without a track returns `None`.

use std::collections::VecDeque;
use std::time::Duration;

use unveil_core::ElementId;

use crate::timeline::{Direction, Property, Timeline, TimelineEvent, TimelineSpec};

/// Frame-driven timeline built from a [`TimelineSpec`].
#[derive(Debug, Clone)]
pub struct TweenTimeline {
    spec: TimelineSpec,
    progress: f64,
    direction: Direction,
    playing: bool,
    pending: VecDeque<TimelineEvent>,
}

impl TweenTimeline {
    /// Create a paused timeline at progress `0.0`.
    pub fn new(spec: TimelineSpec) -> Self {
        Self {
            spec,
            progress: 0.0,
            direction: Direction::Forward,
            playing: false,
            pending: VecDeque::new(),
        }
    }

    /// The spec this timeline was built from.
    pub fn spec(&self) -> &TimelineSpec {
        &self.spec
    }

    /// Current playback direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the playhead is moving.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Current value of `property` on `target`.
    pub fn value(&self, target: ElementId, property: Property) -> Option<f64> {
        self.spec
            .find(target, property)
            .map(|track| track.value_at(self.progress))
    }

    fn step(&self, delta: Duration) -> f64 {
        let total = self.spec.duration.as_secs_f64();
        if total > 0.0 {
            delta.as_secs_f64() / total
        } else {
            1.0
        }
    }
}

impl Timeline for TweenTimeline {
    fn play(&mut self) {
        if self.progress >= 1.0 {
            self.direction = Direction::Forward;
            self.playing = false;
            return;
        }
        if self.playing && self.direction == Direction::Forward {
            return;
        }
        tracing::trace!(progress = self.progress, "tween play");
        self.direction = Direction::Forward;
        self.playing = true;
    }

    fn reverse(&mut self) {
        if self.progress <= 0.0 {
            self.direction = Direction::Reverse;
            self.playing = false;
            return;
        }
        if self.playing && self.direction == Direction::Reverse {
            return;
        }
        tracing::trace!(progress = self.progress, "tween reverse");
        self.direction = Direction::Reverse;
        self.playing = true;
    }

    fn progress(&self) -> f64 {
        self.progress
    }

    fn seek(&mut self, progress: f64) {
        self.progress = progress.clamp(0.0, 1.0);
        self.playing = false;
    }

    fn advance(&mut self, delta: Duration) {
        if !self.playing {
            return;
        }
        let step = self.step(delta);
        match self.direction {
            Direction::Forward => {
                if self.progress <= 0.0 && step > 0.0 {
                    self.pending.push_back(TimelineEvent::Start);
                }
                self.progress = (self.progress + step).min(1.0);
                if self.progress >= 1.0 {
                    self.playing = false;
                    self.pending.push_back(TimelineEvent::Complete);
                }
            }
            Direction::Reverse => {
                self.progress = (self.progress - step).max(0.0);
                if self.progress <= 0.0 {
                    self.playing = false;
                    self.pending.push_back(TimelineEvent::ReverseComplete);
                }
            }
        }
    }

    fn poll_event(&mut self) -> Option<TimelineEvent> {
        self.pending.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{Easing, Track};
    use proptest::prelude::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn drain(tl: &mut TweenTimeline) -> Vec<TimelineEvent> {
        std::iter::from_fn(|| tl.poll_event()).collect()
    }

    fn timeline(duration: u64) -> (TweenTimeline, ElementId) {
        let el = ElementId::next();
        let spec = TimelineSpec::new(ms(duration))
            .track(Track::new(el, Property::Height, 0.0, 100.0));
        (TweenTimeline::new(spec), el)
    }

    #[test]
    fn new_is_paused_at_zero() {
        let (tl, _) = timeline(100);
        assert_eq!(tl.progress(), 0.0);
        assert!(!tl.is_playing());
    }

    #[test]
    fn forward_run_emits_start_then_complete() {
        let (mut tl, _) = timeline(100);
        tl.play();
        tl.advance(ms(40));
        assert_eq!(drain(&mut tl), vec![TimelineEvent::Start]);
        tl.advance(ms(40));
        assert!(drain(&mut tl).is_empty());
        tl.advance(ms(40));
        assert_eq!(drain(&mut tl), vec![TimelineEvent::Complete]);
        assert_eq!(tl.progress(), 1.0);
        assert!(!tl.is_playing());
    }

    #[test]
    fn reverse_run_emits_single_reverse_complete() {
        let (mut tl, _) = timeline(100);
        tl.seek(1.0);
        tl.reverse();
        tl.advance(ms(60));
        assert!(drain(&mut tl).is_empty());
        tl.advance(ms(60));
        assert_eq!(drain(&mut tl), vec![TimelineEvent::ReverseComplete]);
        assert_eq!(tl.progress(), 0.0);
    }

    #[test]
    fn paused_timeline_does_not_advance() {
        let (mut tl, _) = timeline(100);
        tl.advance(ms(500));
        assert_eq!(tl.progress(), 0.0);
        assert!(tl.poll_event().is_none());
    }

    #[test]
    fn play_while_playing_forward_is_noop() {
        let (mut tl, _) = timeline(100);
        tl.play();
        tl.advance(ms(50));
        tl.play();
        tl.advance(ms(50));
        assert_eq!(
            drain(&mut tl),
            vec![TimelineEvent::Start, TimelineEvent::Complete]
        );
    }

    #[test]
    fn play_at_end_is_noop() {
        let (mut tl, _) = timeline(100);
        tl.seek(1.0);
        tl.play();
        assert!(!tl.is_playing());
        tl.advance(ms(100));
        assert!(tl.poll_event().is_none());
    }

    #[test]
    fn reverse_at_zero_is_noop() {
        let (mut tl, _) = timeline(100);
        tl.reverse();
        assert!(!tl.is_playing());
        tl.advance(ms(100));
        assert!(tl.poll_event().is_none());
    }

    #[test]
    fn reverse_mid_run_keeps_position() {
        let (mut tl, _) = timeline(100);
        tl.play();
        tl.advance(ms(70));
        let _ = drain(&mut tl);
        tl.reverse();
        assert!((tl.progress() - 0.7).abs() < 1e-9);
        tl.advance(ms(70));
        assert_eq!(drain(&mut tl), vec![TimelineEvent::ReverseComplete]);
    }

    #[test]
    fn replay_mid_reverse_resumes_without_start() {
        let (mut tl, _) = timeline(100);
        tl.seek(1.0);
        tl.reverse();
        tl.advance(ms(30));
        tl.play();
        tl.advance(ms(50));
        assert_eq!(drain(&mut tl), vec![TimelineEvent::Complete]);
    }

    #[test]
    fn zero_duration_completes_on_first_advance() {
        let (mut tl, _) = timeline(0);
        tl.play();
        tl.advance(Duration::ZERO);
        assert_eq!(
            drain(&mut tl),
            vec![TimelineEvent::Start, TimelineEvent::Complete]
        );
    }

    #[test]
    fn seek_emits_nothing_and_pauses() {
        let (mut tl, _) = timeline(100);
        tl.play();
        tl.seek(0.5);
        assert!(!tl.is_playing());
        assert!(tl.poll_event().is_none());
        tl.seek(7.0);
        assert_eq!(tl.progress(), 1.0);
    }

    #[test]
    fn value_follows_track_easing() {
        let el = ElementId::next();
        let spec = TimelineSpec::new(ms(100)).track(
            Track::new(el, Property::AutoAlpha, 0.0, 1.0).easing(Easing::EaseIn),
        );
        let mut tl = TweenTimeline::new(spec);
        tl.seek(0.5);
        assert_eq!(tl.value(el, Property::AutoAlpha), Some(0.125));
        assert_eq!(tl.value(el, Property::Height), None);
    }

    proptest! {
        #[test]
        fn progress_stays_in_bounds(steps in proptest::collection::vec((any::<bool>(), 0u64..80), 0..40)) {
            let (mut tl, el) = timeline(100);
            for (forward, delta) in steps {
                if forward { tl.play() } else { tl.reverse() }
                tl.advance(ms(delta));
                prop_assert!((0.0..=1.0).contains(&tl.progress()));
                let height = tl.value(el, Property::Height).unwrap();
                prop_assert!((0.0..=100.0).contains(&height));
            }
        }
    }
}
