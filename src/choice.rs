//! The decision point: an explicit phase machine for the whole page plus
//! the evasive "no" control's placement math.

use crate::motion::Rng;

/// Explicit page state, replacing hidden/visible DOM flags. Transitions
/// consume the old phase; unsupported events keep the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenePhase {
    Idle,
    Narrating,
    AwaitingChoice,
    ResolvedYes,
    ResolvedNo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    Start,
    QuestionShown,
    ChooseYes,
    ChooseNo,
    Reset,
}

impl ScenePhase {
    pub fn transition(self, event: PhaseEvent) -> Self {
        use ScenePhase::*;
        match (self, event) {
            (Idle, PhaseEvent::Start) => Narrating,
            (Narrating, PhaseEvent::QuestionShown) => AwaitingChoice,
            (AwaitingChoice, PhaseEvent::ChooseYes) => ResolvedYes,
            (AwaitingChoice, PhaseEvent::ChooseNo) => ResolvedNo,
            (_, PhaseEvent::Reset) => Idle,
            // invalid transitions keep the current phase
            _ => self,
        }
    }

    /// Both resolved phases are terminal until reset.
    pub fn is_resolved(&self) -> bool {
        matches!(self, ScenePhase::ResolvedYes | ScenePhase::ResolvedNo)
    }
}

/// Screen-space rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectPx {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl RectPx {
    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width * 0.5, self.top + self.height * 0.5)
    }
}

/// Inner margin the dodging control keeps from the panel edge.
pub const DODGE_PAD: f64 = 20.0;
/// Minimum displacement (per axis) the dodge tries to achieve.
pub const DODGE_MIN_DISTANCE: f64 = 50.0;
const DODGE_ATTEMPTS: usize = 10;

/// Pick a new top-left for the control inside the panel's padded bounds,
/// resampling up to ten times until the new spot is at least 50px away
/// from the old one on some axis. Falls back to the last sample when the
/// panel is too cramped to satisfy the distance.
pub fn dodge_position(rng: &mut Rng, panel: &RectPx, control: &RectPx) -> (f64, f64) {
    let min_x = panel.left + DODGE_PAD;
    let min_y = panel.top + DODGE_PAD;
    let max_x = (panel.left + panel.width - control.width - DODGE_PAD).max(min_x);
    let max_y = (panel.top + panel.height - control.height - DODGE_PAD).max(min_y);

    let mut new_x = min_x;
    let mut new_y = min_y;
    for _ in 0..DODGE_ATTEMPTS {
        new_x = rng.uniform(min_x, max_x.max(min_x + f64::EPSILON));
        new_y = rng.uniform(min_y, max_y.max(min_y + f64::EPSILON));
        let far_enough = (new_x - control.left).abs() >= DODGE_MIN_DISTANCE
            || (new_y - control.top).abs() >= DODGE_MIN_DISTANCE;
        if far_enough {
            break;
        }
    }
    (new_x, new_y)
}

/// Rotation (degrees) and scale for the brief dodge flourish.
pub fn dodge_flourish(rng: &mut Rng) -> (f64, f64) {
    (rng.uniform(-15.0, 15.0), rng.uniform(0.95, 1.05))
}
