//! Per-frame orchestration: extractor → tracker → classifier.
//!
//! The controller owns every piece of mutable session state (backend
//! model, position window, cooldown and votes). It is not `Sync`; callers
//! that capture on another thread hand frames over a channel and keep the
//! controller on one consumer.

use image::RgbImage;
use reelswipe_common::clock::SessionClock;
use reelswipe_common::config::DetectorSettings;
use reelswipe_common::error::{ReelswipeError, ReelswipeResult};

use crate::action::Action;
use crate::classifier::{Classification, ClassifierState, SwipeClassifier};
use crate::config::{ClassifierPolicy, SwipeConfig};
use crate::motion::{build_extractor, ExtractorKind, MotionExtractor, MotionSample};
use crate::tracker::{NormalizedPoint, PositionTracker};

/// What happened to one frame.
#[derive(Debug)]
pub enum FrameOutcome {
    /// The backend could not use the frame. Session state is untouched.
    Dropped(ReelswipeError),
    /// Nothing usable moved.
    NoMotion,
    /// A position was recorded; no action was emitted.
    Tracked(MotionSample, Classification),
    /// A swipe was confirmed. The position window has been cleared.
    Gesture(Action),
}

impl FrameOutcome {
    pub fn action(&self) -> Option<Action> {
        match self {
            Self::Gesture(action) => Some(*action),
            _ => None,
        }
    }
}

/// Turns a stream of frames into at most one [`Action`] per frame.
pub struct GestureController {
    extractor: Box<dyn MotionExtractor>,
    tracker: PositionTracker,
    classifier: SwipeClassifier,
    state: ClassifierState,
    clock: SessionClock,
}

impl GestureController {
    /// Build a controller for a compiled-in backend with its default policy.
    ///
    /// Fails on invalid tuning or when `kind` is not available.
    pub fn new(
        config: SwipeConfig,
        kind: ExtractorKind,
        settings: &DetectorSettings,
    ) -> ReelswipeResult<Self> {
        let extractor = build_extractor(kind, settings)?;
        Self::with_extractor(config, kind.default_policy(), extractor)
    }

    /// Build a controller around any extractor.
    pub fn with_extractor(
        config: SwipeConfig,
        policy: ClassifierPolicy,
        extractor: Box<dyn MotionExtractor>,
    ) -> ReelswipeResult<Self> {
        let tracker = PositionTracker::new(policy.tracker_capacity(&config));
        let classifier = SwipeClassifier::new(config, policy)?;
        let state = classifier.new_state();

        tracing::debug!(
            backend = %extractor.kind(),
            axis = %classifier.config().axis(),
            window = tracker.capacity(),
            "Gesture controller ready"
        );

        Ok(Self {
            extractor,
            tracker,
            classifier,
            state,
            clock: SessionClock::start(),
        })
    }

    /// Process a live frame stamped with the session clock.
    pub fn process_frame(&mut self, frame: &RgbImage) -> Option<Action> {
        let now = self.clock.elapsed_secs();
        self.process_frame_at(frame, now).action()
    }

    /// Process a frame captured at `timestamp` seconds.
    ///
    /// Timestamps must not go backwards within a session.
    pub fn process_frame_at(&mut self, frame: &RgbImage, timestamp: f64) -> FrameOutcome {
        if !timestamp.is_finite() {
            return FrameOutcome::Dropped(ReelswipeError::frame(format!(
                "timestamp {timestamp} is not a finite number of seconds"
            )));
        }

        let sample = match self.extractor.extract(frame) {
            Ok(Some(sample)) => sample,
            Ok(None) => return FrameOutcome::NoMotion,
            Err(err) => {
                tracing::trace!(error = %err, "Dropping frame");
                return FrameOutcome::Dropped(err);
            }
        };

        if sample.rebased {
            self.tracker.clear();
        }
        self.tracker
            .push(NormalizedPoint::new(timestamp, sample.x, sample.y));
        let classification = self
            .classifier
            .classify(self.tracker.window(), &mut self.state);

        match classification {
            Classification::Confirmed(action) => {
                self.tracker.clear();
                self.extractor.rebase();
                tracing::debug!(%action, t = timestamp, "Swipe confirmed");
                FrameOutcome::Gesture(action)
            }
            other => FrameOutcome::Tracked(sample, other),
        }
    }

    /// End the session: drop backend state, the window and the cooldown.
    pub fn close(&mut self) {
        self.extractor.reset();
        self.tracker.clear();
        self.state.clear();
        self.clock.restart();
    }

    pub fn config(&self) -> &SwipeConfig {
        self.classifier.config()
    }

    pub fn policy(&self) -> &ClassifierPolicy {
        self.classifier.policy()
    }

    pub fn kind(&self) -> ExtractorKind {
        self.extractor.kind()
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    pub fn state(&self) -> &ClassifierState {
        &self.state
    }

    /// Wall-clock time the session started.
    pub fn started_at(&self) -> &str {
        self.clock.epoch_wall()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::SwipeRejection;
    use crate::config::Axis;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    enum Step {
        At(f64, f64),
        Recentred(f64, f64),
        Nothing,
        Broken,
    }

    /// Replays a fixed list of readings, ignoring frame content.
    struct Scripted {
        steps: VecDeque<Step>,
        rebases: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn boxed(steps: Vec<Step>) -> Box<dyn MotionExtractor> {
            Self::counting(steps).0
        }

        fn counting(steps: Vec<Step>) -> (Box<dyn MotionExtractor>, Arc<AtomicUsize>) {
            let rebases = Arc::new(AtomicUsize::new(0));
            let extractor = Box::new(Self {
                steps: steps.into(),
                rebases: Arc::clone(&rebases),
            });
            (extractor, rebases)
        }
    }

    impl MotionExtractor for Scripted {
        fn extract(&mut self, _frame: &RgbImage) -> ReelswipeResult<Option<MotionSample>> {
            match self.steps.pop_front() {
                Some(Step::At(x, y)) => Ok(Some(MotionSample::new(x, y, 1.0))),
                Some(Step::Recentred(x, y)) => Ok(Some(MotionSample::new(x, y, 1.0).after_rebase())),
                Some(Step::Nothing) | None => Ok(None),
                Some(Step::Broken) => Err(ReelswipeError::frame("corrupt frame")),
            }
        }

        fn reset(&mut self) {
            self.steps.clear();
        }

        fn rebase(&mut self) {
            self.rebases.fetch_add(1, Ordering::SeqCst);
        }

        fn kind(&self) -> ExtractorKind {
            ExtractorKind::ForegroundCentroid
        }
    }

    const DT: f64 = 1.0 / 30.0;

    fn frame() -> RgbImage {
        RgbImage::new(4, 4)
    }

    fn run(controller: &mut GestureController, frames: usize) -> Vec<FrameOutcome> {
        let frame = frame();
        (0..frames)
            .map(|i| controller.process_frame_at(&frame, 10.0 + i as f64 * DT))
            .collect()
    }

    fn downward(n: usize, step: f64) -> Vec<Step> {
        (0..n).map(|i| Step::At(0.5, 0.2 + step * i as f64)).collect()
    }

    #[test]
    fn immediate_policy_emits_and_clears_window() {
        let mut controller = GestureController::with_extractor(
            SwipeConfig::default(),
            ClassifierPolicy::immediate(),
            Scripted::boxed(vec![Step::At(0.5, 0.2), Step::At(0.5, 0.45)]),
        )
        .unwrap();

        let outcomes = run(&mut controller, 2);
        assert!(matches!(
            outcomes[0],
            FrameOutcome::Tracked(_, Classification::Rejected(SwipeRejection::TooFewSamples { .. }))
        ));
        assert_eq!(outcomes[1].action(), Some(Action::Next));
        assert!(controller.tracker().is_empty());
        assert_eq!(controller.state().last_action_time(), Some(10.0 + DT));
    }

    #[test]
    fn confirmed_swipe_rebases_the_extractor() {
        let (extractor, rebases) =
            Scripted::counting(vec![Step::At(0.5, 0.2), Step::At(0.5, 0.45), Step::At(0.5, 0.5)]);
        let mut controller = GestureController::with_extractor(
            SwipeConfig::default(),
            ClassifierPolicy::immediate(),
            extractor,
        )
        .unwrap();

        let outcomes = run(&mut controller, 3);
        assert_eq!(outcomes[1].action(), Some(Action::Next));
        assert_eq!(rebases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn recentred_sample_starts_a_fresh_window() {
        // Without the reset, 0.9 -> 0.5 would read as an upward swipe.
        let mut controller = GestureController::with_extractor(
            SwipeConfig::default(),
            ClassifierPolicy::immediate(),
            Scripted::boxed(vec![Step::At(0.5, 0.9), Step::Recentred(0.5, 0.5)]),
        )
        .unwrap();

        let outcomes = run(&mut controller, 2);
        assert_eq!(outcomes[1].action(), None);
        assert_eq!(controller.tracker().len(), 1);
    }

    #[test]
    fn non_finite_timestamps_are_dropped() {
        let mut controller = GestureController::with_extractor(
            SwipeConfig::default(),
            ClassifierPolicy::immediate(),
            Scripted::boxed(vec![Step::At(0.5, 0.2), Step::At(0.5, 0.5)]),
        )
        .unwrap();

        let frame = frame();
        for t in [f64::NAN, f64::INFINITY] {
            match controller.process_frame_at(&frame, t) {
                FrameOutcome::Dropped(err) => assert!(err.is_transient()),
                other => panic!("expected dropped frame, got {other:?}"),
            }
        }
        assert!(controller.tracker().is_empty());
    }

    #[test]
    fn hardened_policy_waits_for_three_agreeing_votes() {
        let mut controller = GestureController::with_extractor(
            SwipeConfig::default(),
            ClassifierPolicy::hardened(),
            Scripted::boxed(downward(7, 0.05)),
        )
        .unwrap();

        let outcomes = run(&mut controller, 7);
        let actions: Vec<_> = outcomes.iter().map(FrameOutcome::action).collect();
        assert_eq!(actions[..6], [None; 6]);
        assert_eq!(actions[6], Some(Action::Next));
        assert!(matches!(
            outcomes[5],
            FrameOutcome::Tracked(_, Classification::Pending { votes: 2, .. })
        ));
        assert!(controller.tracker().is_empty());
        assert_eq!(controller.state().votes().count(), 0);
    }

    #[test]
    fn continued_motion_is_suppressed_by_cooldown() {
        let mut controller = GestureController::with_extractor(
            SwipeConfig::default(),
            ClassifierPolicy::immediate(),
            Scripted::boxed(downward(6, 0.2)),
        )
        .unwrap();

        let emitted = run(&mut controller, 6)
            .iter()
            .filter_map(FrameOutcome::action)
            .count();
        assert_eq!(emitted, 1);
    }

    #[test]
    fn broken_frames_are_dropped_without_touching_state() {
        let mut controller = GestureController::with_extractor(
            SwipeConfig::default(),
            ClassifierPolicy::immediate(),
            Scripted::boxed(vec![Step::At(0.5, 0.2), Step::Broken, Step::Nothing]),
        )
        .unwrap();

        let outcomes = run(&mut controller, 3);
        match &outcomes[1] {
            FrameOutcome::Dropped(err) => assert!(err.is_transient()),
            other => panic!("expected dropped frame, got {other:?}"),
        }
        assert!(matches!(outcomes[2], FrameOutcome::NoMotion));
        assert_eq!(controller.tracker().len(), 1);
    }

    #[test]
    fn horizontal_axis_reads_x_motion() {
        let config = SwipeConfig::default().with_axis(Axis::Horizontal);
        let mut controller = GestureController::with_extractor(
            config,
            ClassifierPolicy::immediate(),
            Scripted::boxed(vec![Step::At(0.8, 0.5), Step::At(0.5, 0.5)]),
        )
        .unwrap();

        let outcomes = run(&mut controller, 2);
        assert_eq!(outcomes[1].action(), Some(Action::Prev));
    }

    #[test]
    fn close_forgets_session() {
        let mut controller = GestureController::with_extractor(
            SwipeConfig::default(),
            ClassifierPolicy::immediate(),
            Scripted::boxed(vec![Step::At(0.5, 0.2), Step::At(0.5, 0.45), Step::At(0.5, 0.3)]),
        )
        .unwrap();

        run(&mut controller, 3);
        assert!(controller.state().last_action_time().is_some());
        assert_eq!(controller.tracker().len(), 1);

        controller.close();
        assert!(controller.tracker().is_empty());
        assert_eq!(controller.state().last_action_time(), None);
    }

    #[test]
    fn policy_that_cannot_fit_history_is_rejected() {
        let config = SwipeConfig::new(0.15, 0.6, Axis::Vertical, 3, 0.8).unwrap();
        let policy = ClassifierPolicy {
            min_samples: 8,
            tracker_capacity: None,
            ..ClassifierPolicy::immediate()
        };
        assert!(GestureController::with_extractor(config, policy, Scripted::boxed(vec![])).is_err());
    }

    #[test]
    #[cfg(feature = "optical-flow")]
    fn new_uses_backend_default_policy() {
        let controller = GestureController::new(
            SwipeConfig::default(),
            ExtractorKind::OpticalFlow,
            &DetectorSettings::default(),
        )
        .unwrap();
        assert_eq!(controller.kind(), ExtractorKind::OpticalFlow);
        assert_eq!(controller.policy(), &ClassifierPolicy::immediate());
        assert_eq!(controller.tracker().capacity(), controller.config().history());
    }
}
