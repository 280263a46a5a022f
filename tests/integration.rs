// Integration tests (native) for the `heart-bloom` crate.
// These avoid wasm-specific functionality and exercise the pure logic on
// a virtual clock so they can run under `cargo test` on the host.

use heart_bloom::choice::{self, PhaseEvent, RectPx, ScenePhase, DODGE_PAD};
use heart_bloom::motion::Rng;
use heart_bloom::particles::ParticleField;
use heart_bloom::timeline::{self, Scheduler, StepAction};

// Walk the real narrative script on a virtual clock and check that it
// fires in order and ends by revealing the question.
#[test]
fn narrative_script_plays_out_on_a_virtual_clock() {
    let mut sched = Scheduler::new(timeline::script().to_vec(), 0.0);
    let mut clock = 0.0;
    let mut fired = Vec::new();

    while let Some(wait) = sched.time_to_next(clock) {
        clock += wait;
        fired.extend(sched.fire_due(clock));
    }

    assert_eq!(fired.len(), timeline::script().len());
    assert!(matches!(
        fired.first(),
        Some(StepAction::Burst { count: 90, .. })
    ));
    assert!(matches!(fired.last(), Some(StepAction::ShowQuestion)));
    // total scripted delay: 0+300+800+1800+800+1000+1200+400
    assert_eq!(clock, 6300.0);
}

// A reset mid-narrative cancels the rest of the script outright.
#[test]
fn cancelling_mid_script_drops_remaining_steps() {
    let mut sched = Scheduler::new(timeline::script().to_vec(), 0.0);
    assert!(!sched.fire_due(400.0).is_empty());
    sched.cancel();
    assert!(sched.is_done());
    assert!(sched.fire_due(f64::MAX).is_empty());
}

// Chase the "no" control around its panel: every hop stays inside the
// padded bounds and the page stays in the awaiting phase until a real
// click resolves it.
#[test]
fn evasive_control_never_escapes_and_only_a_click_resolves() {
    let mut rng = Rng::new();
    let panel = RectPx {
        left: 200.0,
        top: 150.0,
        width: 500.0,
        height: 350.0,
    };
    let mut control = RectPx {
        left: 420.0,
        top: 300.0,
        width: 110.0,
        height: 44.0,
    };

    let mut phase = ScenePhase::Idle
        .transition(PhaseEvent::Start)
        .transition(PhaseEvent::QuestionShown);
    assert_eq!(phase, ScenePhase::AwaitingChoice);

    for _ in 0..40 {
        let (x, y) = choice::dodge_position(&mut rng, &panel, &control);
        assert!(x >= panel.left + DODGE_PAD);
        assert!(x + control.width <= panel.left + panel.width - DODGE_PAD + 1e-9);
        assert!(y >= panel.top + DODGE_PAD);
        assert!(y + control.height <= panel.top + panel.height - DODGE_PAD + 1e-9);
        control.left = x;
        control.top = y;
        // a dodge is not a decision
        assert_eq!(phase, ScenePhase::AwaitingChoice);
    }

    phase = phase.transition(PhaseEvent::ChooseNo);
    assert_eq!(phase, ScenePhase::ResolvedNo);
    assert!(phase.is_resolved());
}

// Run a celebratory burst through simulated frames until every particle
// has expired; the field must end empty and never grow mid-flight.
#[test]
fn celebration_burst_burns_out_completely() {
    let mut rng = Rng::new();
    let mut field = ParticleField::new();
    field.burst(&mut rng, 400.0, 300.0, 280, 0.0);
    assert_eq!(field.len(), 280);

    let mut clock = 0.0;
    let mut previous = field.len();
    while !field.is_empty() {
        clock += 16.0;
        field.step(clock);
        assert!(field.len() <= previous, "particles resurrected");
        previous = field.len();
        assert!(clock <= 2000.0, "particles outlived their maximum life");
    }
}

// Reset returns the phase machine to idle from every state, and a fresh
// start afterwards behaves like the first run.
#[test]
fn reset_then_restart_behaves_like_first_run() {
    let resolved = ScenePhase::Idle
        .transition(PhaseEvent::Start)
        .transition(PhaseEvent::QuestionShown)
        .transition(PhaseEvent::ChooseYes);
    let idle = resolved.transition(PhaseEvent::Reset);
    assert_eq!(idle, ScenePhase::Idle);

    let again = idle
        .transition(PhaseEvent::Start)
        .transition(PhaseEvent::QuestionShown)
        .transition(PhaseEvent::ChooseNo);
    assert_eq!(again, ScenePhase::ResolvedNo);
}

// The type-writer pacing keeps a line's total reveal time within sane
// human-readable bounds.
#[test]
fn typed_line_duration_is_bounded() {
    let mut rng = Rng::new();
    let text = "You've been on my mind... so I made you a tiny surprise.";
    let total: f64 = text
        .chars()
        .map(|_| timeline::type_delay(&mut rng, timeline::TYPE_SPEED_MS))
        .sum();
    let chars = text.chars().count() as f64;
    assert!(total >= chars * timeline::TYPE_DELAY_FLOOR_MS);
    assert!(total <= chars * (timeline::TYPE_SPEED_MS + 12.0));
}
