//! The narrative is an explicit ordered list of timed steps executed by
//! a small scheduler. Each step carries the delay since the previous
//! step finished, so the whole sequence can be cancelled as a unit and
//! tests can fast-forward it on a virtual clock instead of waiting on
//! real timers.

use once_cell::sync::Lazy;

/// Default per-character reveal delay for the type-writer, milliseconds.
pub const TYPE_SPEED_MS: f64 = 45.0;
/// Floor for a single character delay after jitter.
pub const TYPE_DELAY_FLOOR_MS: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepAction {
    /// Fade the headline in with its final text.
    Headline(&'static str),
    /// Fade the subtitle in with its final text.
    Subtitle(&'static str),
    /// Type-writer reveal into one of the narrative line slots.
    TypeLine { slot: usize, text: &'static str },
    /// Particle burst at a viewport-fraction position.
    Burst { fx: f64, fy: f64, count: usize },
    /// Dim the surrounding card content ahead of the question.
    FocusCard,
    /// Reveal the binary choice (with its own bloom underneath).
    ShowQuestion,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Wait before this action, measured from the completion of the
    /// previous one.
    pub delay_ms: f64,
    pub action: StepAction,
}

static SCRIPT: Lazy<Vec<Step>> = Lazy::new(|| {
    vec![
        Step {
            delay_ms: 0.0,
            action: StepAction::Burst {
                fx: 0.5,
                fy: 0.55,
                count: 90,
            },
        },
        Step {
            delay_ms: 300.0,
            action: StepAction::Headline("Hey love..."),
        },
        Step {
            delay_ms: 800.0,
            action: StepAction::Subtitle("I made you a little something.."),
        },
        Step {
            delay_ms: 1800.0,
            action: StepAction::TypeLine {
                slot: 0,
                text: "You've been on my mind... so I made you a tiny surprise.",
            },
        },
        Step {
            delay_ms: 800.0,
            action: StepAction::TypeLine {
                slot: 1,
                text: "Every heart here is a little thank-you for being in my life",
            },
        },
        Step {
            delay_ms: 1000.0,
            action: StepAction::TypeLine {
                slot: 2,
                text: "And I have an important question...",
            },
        },
        Step {
            delay_ms: 1200.0,
            action: StepAction::FocusCard,
        },
        Step {
            delay_ms: 400.0,
            action: StepAction::ShowQuestion,
        },
    ]
});

pub fn script() -> &'static [Step] {
    &SCRIPT
}

/// Per-character delay: base speed with a small natural variance,
/// floored so fast configurations still render progressively.
pub fn type_delay(rng: &mut crate::motion::Rng, speed_ms: f64) -> f64 {
    (speed_ms + rng.uniform(-8.0, 12.0)).max(TYPE_DELAY_FLOOR_MS)
}

/// Drives a step list against a caller-supplied clock. `fire_due`
/// returns every action whose due time has passed; `rebase` marks the
/// completion of the previous action so the next delay starts from
/// there (type-writer steps take real time to apply).
#[derive(Debug)]
pub struct Scheduler {
    steps: Vec<Step>,
    cursor: usize,
    armed_at: f64,
    cancelled: bool,
}

impl Scheduler {
    pub fn new(steps: Vec<Step>, now: f64) -> Self {
        Scheduler {
            steps,
            cursor: 0,
            armed_at: now,
            cancelled: false,
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_done(&self) -> bool {
        self.cancelled || self.cursor >= self.steps.len()
    }

    /// Milliseconds from `now` until the next step fires, `None` when
    /// the sequence is finished or cancelled.
    pub fn time_to_next(&self, now: f64) -> Option<f64> {
        if self.is_done() {
            return None;
        }
        let due = self.armed_at + self.steps[self.cursor].delay_ms;
        Some((due - now).max(0.0))
    }

    /// Pop every action due at `now`, in script order.
    pub fn fire_due(&mut self, now: f64) -> Vec<StepAction> {
        let mut fired = Vec::new();
        while !self.is_done() {
            let step = &self.steps[self.cursor];
            let due = self.armed_at + step.delay_ms;
            if due > now {
                break;
            }
            self.armed_at = due;
            fired.push(step.action);
            self.cursor += 1;
        }
        fired
    }

    /// Restart delay accounting from `now` (called after an action whose
    /// application itself consumed wall-clock time).
    pub fn rebase(&mut self, now: f64) {
        self.armed_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::Rng;

    fn three_steps() -> Vec<Step> {
        vec![
            Step {
                delay_ms: 100.0,
                action: StepAction::Headline("a"),
            },
            Step {
                delay_ms: 200.0,
                action: StepAction::Subtitle("b"),
            },
            Step {
                delay_ms: 50.0,
                action: StepAction::FocusCard,
            },
        ]
    }

    #[test]
    fn fires_nothing_before_first_delay() {
        let mut sched = Scheduler::new(three_steps(), 0.0);
        assert!(sched.fire_due(99.0).is_empty());
        assert_eq!(sched.time_to_next(99.0), Some(1.0));
    }

    #[test]
    fn fires_in_order_at_cumulative_times() {
        let mut sched = Scheduler::new(three_steps(), 1_000.0);
        assert_eq!(sched.fire_due(1_100.0), vec![StepAction::Headline("a")]);
        assert!(sched.fire_due(1_250.0).is_empty());
        assert_eq!(sched.fire_due(1_300.0), vec![StepAction::Subtitle("b")]);
        assert_eq!(sched.fire_due(1_350.0), vec![StepAction::FocusCard]);
        assert!(sched.is_done());
        assert_eq!(sched.time_to_next(1_350.0), None);
    }

    #[test]
    fn fast_forward_fires_everything_in_order() {
        let mut sched = Scheduler::new(three_steps(), 0.0);
        let fired = sched.fire_due(1_000_000.0);
        assert_eq!(
            fired,
            vec![
                StepAction::Headline("a"),
                StepAction::Subtitle("b"),
                StepAction::FocusCard,
            ]
        );
        assert!(sched.is_done());
    }

    #[test]
    fn cancel_stops_everything_immediately() {
        let mut sched = Scheduler::new(three_steps(), 0.0);
        assert_eq!(sched.fire_due(100.0).len(), 1);
        sched.cancel();
        assert!(sched.fire_due(1_000_000.0).is_empty());
        assert_eq!(sched.time_to_next(0.0), None);
        assert!(sched.is_done());
    }

    #[test]
    fn early_wake_without_fire_keeps_remaining_delay() {
        let mut sched = Scheduler::new(
            vec![Step {
                delay_ms: 300.0,
                action: StepAction::FocusCard,
            }],
            0.5,
        );
        // the timer can wake fractionally before the due time; nothing
        // fires, and the remaining wait must be the fraction, not the
        // full delay over again
        assert!(sched.fire_due(300.0).is_empty());
        assert_eq!(sched.time_to_next(300.0), Some(0.5));
        assert_eq!(sched.fire_due(300.5), vec![StepAction::FocusCard]);
    }

    #[test]
    fn rebase_shifts_the_next_due_time() {
        let mut sched = Scheduler::new(three_steps(), 0.0);
        assert_eq!(sched.fire_due(100.0).len(), 1);
        // applying the action took 5 seconds of real time
        sched.rebase(5_100.0);
        assert!(sched.fire_due(5_299.0).is_empty());
        assert_eq!(sched.fire_due(5_300.0), vec![StepAction::Subtitle("b")]);
    }

    #[test]
    fn script_ends_with_question_reveal() {
        let steps = script();
        assert!(matches!(
            steps.last().map(|s| s.action),
            Some(StepAction::ShowQuestion)
        ));
        // one typed line per slot, in slot order
        let slots: Vec<usize> = steps
            .iter()
            .filter_map(|s| match s.action {
                StepAction::TypeLine { slot, .. } => Some(slot),
                _ => None,
            })
            .collect();
        assert_eq!(slots, vec![0, 1, 2]);
    }

    #[test]
    fn type_delay_respects_floor() {
        let mut rng = Rng::new();
        for _ in 0..500 {
            let d = type_delay(&mut rng, TYPE_SPEED_MS);
            assert!((TYPE_DELAY_FLOOR_MS..=TYPE_SPEED_MS + 12.0).contains(&d));
        }
    }
}
