//! Swipe classification over a window of tracked positions.
//!
//! # Algorithm
//!
//! On the newest `analysis_window` samples:
//!
//! 1. **Count**: at least `min_samples` samples.
//! 2. **Cooldown**: the newest sample must be `cooldown` seconds past the
//!    last emitted action.
//! 3. **Duration**: oldest-to-newest span must not exceed `max_duration`.
//! 4. **Displacement**: primary-axis motion must reach `min_displacement`.
//! 5. **Axis dominance**: cross-axis motion must stay within
//!    `cross_axis_ratio` of the primary motion.
//! 6. **Consistency** (optional): straight-line distance over path length.
//! 7. **Direction**: positive primary motion is NEXT, anything else PREV.
//! 8. **Confirmation**: emit immediately, or once the last `n` candidates agree.
//!    Any rejected window breaks the streak.
//!
//! Zero primary displacement resolves to PREV. It can only arise when the
//! displacement gate is bypassed, since `min_displacement` is always > 0.

use std::collections::VecDeque;

use reelswipe_common::error::ReelswipeResult;

use crate::action::Action;
use crate::config::{Axis, ClassifierPolicy, Confirmation, SwipeConfig};
use crate::tracker::NormalizedPoint;

/// Why a window did not produce a swipe candidate.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SwipeRejection {
    /// Not enough samples to judge.
    #[error("only {have} of {need} samples")]
    TooFewSamples { have: usize, need: usize },

    /// Still inside the cooldown after the last emitted action.
    #[error("cooling down for another {remaining_secs:.2}s")]
    CoolingDown { remaining_secs: f64 },

    /// Movement took longer than `max_duration`.
    #[error("movement too slow ({duration_secs:.2}s)")]
    TooSlow { duration_secs: f64 },

    /// Primary-axis movement below `min_displacement`.
    #[error("movement too small ({primary:+.3})")]
    TooSmall { primary: f64 },

    /// Too much cross-axis movement.
    #[error("off axis (primary {primary:+.3}, cross {secondary:.3})")]
    OffAxis { primary: f64, secondary: f64 },

    /// Path too erratic to be a swipe.
    #[error("path too erratic (consistency {consistency:.2})")]
    Erratic { consistency: f64 },
}

/// Result of feeding one window to the classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification {
    Rejected(SwipeRejection),
    /// A candidate was recorded but confirmation needs more agreeing votes.
    Pending { action: Action, votes: usize },
    /// An action was emitted. The caller must clear its position window.
    Confirmed(Action),
}

impl Classification {
    /// The emitted action, if any.
    pub fn action(&self) -> Option<Action> {
        match self {
            Self::Confirmed(action) => Some(*action),
            _ => None,
        }
    }
}

/// Per-session classifier state: cooldown anchor and confirmation votes.
#[derive(Debug, Clone)]
pub struct ClassifierState {
    last_action_time: Option<f64>,
    votes: VecDeque<Action>,
    vote_capacity: usize,
}

impl ClassifierState {
    /// Fresh state sized for the policy's confirmation mode.
    pub fn for_policy(policy: &ClassifierPolicy) -> Self {
        let vote_capacity = match policy.confirmation {
            Confirmation::Immediate => 1,
            Confirmation::Votes(n) => n.max(1),
        };
        Self {
            last_action_time: None,
            votes: VecDeque::with_capacity(vote_capacity),
            vote_capacity,
        }
    }

    /// Timestamp of the last emitted action.
    pub fn last_action_time(&self) -> Option<f64> {
        self.last_action_time
    }

    /// Candidate directions awaiting confirmation, oldest first.
    pub fn votes(&self) -> impl Iterator<Item = &Action> {
        self.votes.iter()
    }

    /// Forget votes and the cooldown anchor.
    pub fn clear(&mut self) {
        self.last_action_time = None;
        self.votes.clear();
    }

    fn break_streak(&mut self) {
        self.votes.clear();
    }

    fn record_vote(&mut self, action: Action) {
        if self.votes.len() == self.vote_capacity {
            self.votes.pop_front();
        }
        self.votes.push_back(action);
    }

    fn mark_emitted(&mut self, now: f64) {
        self.last_action_time = Some(now);
        self.votes.clear();
    }
}

/// Applies the swipe gates and the confirmation policy.
#[derive(Debug, Clone)]
pub struct SwipeClassifier {
    config: SwipeConfig,
    policy: ClassifierPolicy,
}

impl SwipeClassifier {
    /// Create a classifier. Fails if the policy cannot work with the config.
    pub fn new(config: SwipeConfig, policy: ClassifierPolicy) -> ReelswipeResult<Self> {
        policy.validate(&config)?;
        Ok(Self { config, policy })
    }

    pub fn config(&self) -> &SwipeConfig {
        &self.config
    }

    pub fn policy(&self) -> &ClassifierPolicy {
        &self.policy
    }

    /// State object matching this classifier's policy.
    pub fn new_state(&self) -> ClassifierState {
        ClassifierState::for_policy(&self.policy)
    }

    /// Classify the window. "Now" is the newest sample's timestamp.
    pub fn classify(
        &self,
        window: &[NormalizedPoint],
        state: &mut ClassifierState,
    ) -> Classification {
        if window.len() < self.policy.min_samples {
            state.break_streak();
            return Classification::Rejected(SwipeRejection::TooFewSamples {
                have: window.len(),
                need: self.policy.min_samples,
            });
        }
        let Some(newest) = window.last() else {
            return Classification::Rejected(SwipeRejection::TooFewSamples {
                have: 0,
                need: self.policy.min_samples,
            });
        };
        let now = newest.t;

        if let Some(last) = state.last_action_time {
            let since = now - last;
            if since.is_nan() || since < self.config.cooldown() {
                return Classification::Rejected(SwipeRejection::CoolingDown {
                    remaining_secs: self.config.cooldown() - since,
                });
            }
        }

        let action = match detect_swipe(window, &self.config, &self.policy) {
            Ok(action) => action,
            Err(rejection) => {
                state.break_streak();
                return Classification::Rejected(rejection);
            }
        };

        match self.policy.confirmation {
            Confirmation::Immediate => {
                state.mark_emitted(now);
                Classification::Confirmed(action)
            }
            Confirmation::Votes(required) => {
                state.record_vote(action);
                let agreeing = state
                    .votes
                    .iter()
                    .rev()
                    .take_while(|vote| **vote == action)
                    .count();
                if agreeing >= required {
                    state.mark_emitted(now);
                    Classification::Confirmed(action)
                } else {
                    Classification::Pending {
                        action,
                        votes: agreeing,
                    }
                }
            }
        }
    }
}

/// Stateless swipe test: count, duration, displacement, axis and
/// consistency gates, then direction. No cooldown, no confirmation.
pub fn detect_swipe(
    window: &[NormalizedPoint],
    config: &SwipeConfig,
    policy: &ClassifierPolicy,
) -> Result<Action, SwipeRejection> {
    let need = policy.min_samples.max(2);
    if window.len() < need {
        return Err(SwipeRejection::TooFewSamples {
            have: window.len(),
            need,
        });
    }

    let start = window.len().saturating_sub(policy.analysis_window.max(need));
    let recent = &window[start..];
    let (first, last) = (recent[0], recent[recent.len() - 1]);

    let duration_secs = last.t - first.t;
    if duration_secs.is_nan() || duration_secs > config.max_duration() {
        return Err(SwipeRejection::TooSlow { duration_secs });
    }

    let dx = last.x - first.x;
    let dy = last.y - first.y;
    let (primary, secondary) = match config.axis() {
        Axis::Vertical => (dy, dx.abs()),
        Axis::Horizontal => (dx, dy.abs()),
    };

    if primary.abs() < config.min_displacement() {
        return Err(SwipeRejection::TooSmall { primary });
    }

    if secondary > primary.abs() * policy.cross_axis_ratio {
        return Err(SwipeRejection::OffAxis { primary, secondary });
    }

    if let Some(floor) = policy.min_consistency {
        let consistency = path_consistency(recent);
        if consistency < floor {
            return Err(SwipeRejection::Erratic { consistency });
        }
    }

    Ok(direction(primary))
}

/// Direction for a primary-axis displacement. Ties resolve to PREV.
pub fn direction(primary: f64) -> Action {
    if primary > 0.0 {
        Action::Next
    } else {
        Action::Prev
    }
}

/// Straight-line distance between the endpoints divided by the summed
/// segment lengths. 1.0 is a perfectly straight path; a path with no
/// movement scores 0.0.
pub fn path_consistency(points: &[NormalizedPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let path_length: f64 = points.windows(2).map(|w| w[0].distance_to(&w[1])).sum();
    if path_length <= f64::EPSILON {
        return 0.0;
    }

    let straight = points[0].distance_to(&points[points.len() - 1]);
    (straight / path_length).min(1.0)
}
