//! End-to-end exercises of the trial state machine against a hand-advanced
//! clock and an in-memory reporter.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use vpm_core::{
    ChangeKind, Item, ItemParams, OpaqueId, OptionDescriptor, ReportError, SessionManifest,
    StimulusDescriptor, Submodality, TaggedOutcome, TrialOutcome, TrialPhase, TrialRecord,
    TrialReporter, NO_ANSWER,
};
use vpm_session::{
    SessionConfig, SessionRunner, STATUS_CHOOSE_CHANGE, STATUS_END_OF_SERIES, STATUS_NO_ITEMS,
    STATUS_SHOWING_BASE, STATUS_SUBMIT_FAILED,
};
use vpm_timing::{Clock, ManualClock};

#[derive(Default)]
struct ReporterState {
    submitted: Vec<(u64, TrialRecord)>,
    outcomes: VecDeque<TaggedOutcome>,
}

/// Captures submissions and hands back whatever outcomes the test queues.
/// Clones share state, so the test keeps a handle while the runner owns one.
#[derive(Clone, Default)]
struct FakeReporter {
    state: Rc<RefCell<ReporterState>>,
}

impl FakeReporter {
    fn push_outcome(&self, generation: u64, outcome: Result<TrialOutcome, ReportError>) {
        self.state
            .borrow_mut()
            .outcomes
            .push_back((generation, outcome));
    }

    fn submissions(&self) -> Vec<(u64, TrialRecord)> {
        self.state.borrow().submitted.clone()
    }

    fn last_submission(&self) -> (u64, TrialRecord) {
        self.submissions()
            .last()
            .cloned()
            .expect("no trial was submitted")
    }
}

impl TrialReporter for FakeReporter {
    fn submit(&mut self, generation: u64, record: TrialRecord) {
        self.state.borrow_mut().submitted.push((generation, record));
    }

    fn poll_outcome(&mut self) -> Option<TaggedOutcome> {
        self.state.borrow_mut().outcomes.pop_front()
    }
}

fn symbol_item(id: i64, flash_ms: Option<u64>, option_count: usize) -> Item {
    let symbols = vec!["∆".to_owned(), "Ω".to_owned(), "§".to_owned()];
    Item {
        id: OpaqueId::from(id),
        difficulty_level: Some(1),
        stimulus: StimulusDescriptor::Symbols {
            symbols: symbols.clone(),
        },
        options: (0..option_count)
            .map(|_| OptionDescriptor::Symbols {
                symbols: symbols.clone(),
            })
            .collect(),
        correct_index: Some(0),
        params: ItemParams { flash_ms },
    }
}

fn scene_item(id: i64, flash_ms: Option<u64>) -> Item {
    Item {
        id: OpaqueId::from(id),
        difficulty_level: Some(2),
        stimulus: StimulusDescriptor::Scene {
            base: "escena".to_owned(),
        },
        options: vec![
            OptionDescriptor::Change {
                change: ChangeKind::SwapColors,
            },
            OptionDescriptor::Change {
                change: ChangeKind::RemoveDot,
            },
            OptionDescriptor::Change {
                change: ChangeKind::Rotate15,
            },
        ],
        correct_index: Some(1),
        params: ItemParams { flash_ms },
    }
}

fn runner_with(
    items: Vec<Item>,
    config: SessionConfig,
) -> (
    SessionRunner<ManualClock, FakeReporter>,
    ManualClock,
    FakeReporter,
) {
    let clock = ManualClock::new();
    let reporter = FakeReporter::default();
    let manifest = SessionManifest {
        session_id: OpaqueId::from(77),
        items,
    };
    let runner = SessionRunner::new(manifest, config, clock.clone(), reporter.clone());
    (runner, clock, reporter)
}

fn outcome(is_correct: bool, response_time_ms: i64) -> Result<TrialOutcome, ReportError> {
    Ok(TrialOutcome {
        is_correct,
        response_time_ms,
    })
}

#[test]
fn flash_lasts_exactly_the_item_duration() {
    let (mut runner, clock, _) =
        runner_with(vec![symbol_item(1, Some(1800), 3)], SessionConfig::default());
    runner.start();
    assert_eq!(runner.phase(), TrialPhase::Presenting);

    clock.advance(1799);
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Presenting);

    clock.advance(1);
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::AwaitingInput);
}

#[test]
fn missing_flash_duration_falls_back_to_default() {
    let (mut runner, clock, _) =
        runner_with(vec![symbol_item(1, None, 3)], SessionConfig::default());
    runner.start();

    clock.advance(1499);
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Presenting);

    clock.advance(1);
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::AwaitingInput);
}

#[test]
fn flash_duration_is_clamped_at_both_ends() {
    let (mut runner, clock, _) =
        runner_with(vec![symbol_item(1, Some(50), 3)], SessionConfig::default());
    runner.start();
    clock.advance(299);
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Presenting);
    clock.advance(1);
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::AwaitingInput);

    let (mut runner, clock, _) = runner_with(
        vec![symbol_item(1, Some(60_000), 3)],
        SessionConfig::default(),
    );
    runner.start();
    clock.advance(3_999);
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Presenting);
    clock.advance(1);
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::AwaitingInput);
}

#[test]
fn choices_during_the_flash_are_ignored() {
    let (mut runner, clock, reporter) =
        runner_with(vec![symbol_item(1, Some(1000), 3)], SessionConfig::default());
    runner.start();

    runner.handle_choice(0);
    clock.advance(500);
    runner.tick();
    runner.handle_choice(1);

    assert_eq!(runner.phase(), TrialPhase::Presenting);
    assert!(reporter.submissions().is_empty());
}

#[test]
fn only_the_first_choice_of_a_trial_is_submitted() {
    let (mut runner, clock, reporter) =
        runner_with(vec![symbol_item(1, Some(1000), 3)], SessionConfig::default());
    runner.start();
    clock.advance(1000);
    runner.tick();

    runner.handle_choice(0);
    runner.handle_choice(1);
    clock.advance(100);
    runner.tick();
    runner.handle_choice(2);

    let submitted = reporter.submissions();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].1.chosen_index, 0);
    assert_eq!(runner.phase(), TrialPhase::Submitting);
}

#[test]
fn out_of_range_choice_neither_submits_nor_consumes_the_gate() {
    let (mut runner, clock, reporter) =
        runner_with(vec![symbol_item(1, Some(1000), 3)], SessionConfig::default());
    runner.start();
    clock.advance(1000);
    runner.tick();

    runner.handle_choice(9);
    assert!(reporter.submissions().is_empty());
    assert_eq!(runner.phase(), TrialPhase::AwaitingInput);

    runner.handle_choice(2);
    let (_, record) = reporter.last_submission();
    assert_eq!(record.chosen_index, 2);
}

#[test]
fn item_without_options_submits_the_sentinel() {
    let (mut runner, clock, reporter) =
        runner_with(vec![symbol_item(1, Some(500), 0)], SessionConfig::default());
    runner.start();
    clock.advance(500);
    runner.tick();

    let (generation, record) = reporter.last_submission();
    assert_eq!(record.chosen_index, NO_ANSWER);
    assert_eq!(record.started_ms, record.responded_ms);
    assert_eq!(runner.phase(), TrialPhase::Submitting);

    reporter.push_outcome(generation, outcome(false, 0));
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Feedback);
}

#[test]
fn full_session_walks_both_trials_to_the_end() {
    let config = SessionConfig::default();
    let ua = config.user_agent.clone();
    let (mut runner, clock, reporter) = runner_with(
        vec![symbol_item(10, Some(1000), 3), symbol_item(11, Some(1000), 3)],
        config,
    );

    runner.start();
    assert_eq!(runner.progress(), Some((1, 2)));
    assert_eq!(runner.status(), "");

    clock.advance(1000);
    runner.tick();
    let opened_wall = clock.wall_ms();

    clock.advance(842);
    runner.handle_choice(0);
    let (generation, record) = reporter.last_submission();
    assert_eq!(record.session_id, OpaqueId::from(77));
    assert_eq!(record.item_id, OpaqueId::from(10));
    assert_eq!(record.started_ms, opened_wall);
    assert_eq!(record.responded_ms, opened_wall + 842);
    assert_eq!(record.chosen_index, 0);
    assert_eq!(record.client_meta.ua, ua);

    reporter.push_outcome(generation, outcome(true, 842));
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Feedback);
    assert_eq!(runner.status(), "Correcto (842 ms)");

    clock.advance(599);
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Feedback);
    clock.advance(1);
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Presenting);
    assert_eq!(runner.progress(), Some((2, 2)));

    clock.advance(1000);
    runner.tick();
    clock.advance(1203);
    runner.handle_choice(1);
    let (generation, record) = reporter.last_submission();
    assert_eq!(record.item_id, OpaqueId::from(11));
    reporter.push_outcome(generation, outcome(false, 1203));
    runner.tick();
    assert_eq!(runner.status(), "Incorrecto (1203 ms)");

    clock.advance(600);
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Finished);
    assert_eq!(runner.status(), STATUS_END_OF_SERIES);
    assert_eq!(runner.progress(), None);
    assert!(runner.current_item().is_none());

    let generations: Vec<u64> = reporter.submissions().iter().map(|(g, _)| *g).collect();
    assert_eq!(generations.len(), 2);
    assert!(generations[0] < generations[1]);
}

#[test]
fn failed_submission_reports_the_error_and_still_advances() {
    let (mut runner, clock, reporter) = runner_with(
        vec![symbol_item(1, Some(1000), 3), symbol_item(2, Some(1000), 3)],
        SessionConfig::default(),
    );
    runner.start();
    clock.advance(1000);
    runner.tick();
    runner.handle_choice(0);

    let (generation, _) = reporter.last_submission();
    reporter.push_outcome(
        generation,
        Err(ReportError::Network("connection refused".to_owned())),
    );
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Feedback);
    assert_eq!(runner.status(), STATUS_SUBMIT_FAILED);

    clock.advance(600);
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Presenting);
    assert_eq!(runner.progress(), Some((2, 2)));
}

#[test]
fn outcome_from_a_previous_trial_is_discarded() {
    let (mut runner, clock, reporter) = runner_with(
        vec![symbol_item(1, Some(1000), 3), symbol_item(2, Some(1000), 3)],
        SessionConfig::default(),
    );
    runner.start();
    clock.advance(1000);
    runner.tick();
    runner.handle_choice(0);
    let (first_generation, _) = reporter.last_submission();
    reporter.push_outcome(first_generation, outcome(true, 100));
    runner.tick();
    clock.advance(600);
    runner.tick();

    clock.advance(1000);
    runner.tick();
    runner.handle_choice(1);
    assert_eq!(runner.phase(), TrialPhase::Submitting);

    // A duplicate of the first trial's outcome shows up late.
    reporter.push_outcome(first_generation, outcome(true, 9_999));
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Submitting);
    assert_eq!(runner.status(), "");

    let (second_generation, _) = reporter.last_submission();
    reporter.push_outcome(second_generation, outcome(true, 250));
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Feedback);
    assert_eq!(runner.status(), "Correcto (250 ms)");
}

#[test]
fn duplicate_outcome_during_feedback_does_not_restart_the_settle() {
    let (mut runner, clock, reporter) = runner_with(
        vec![symbol_item(1, Some(1000), 3), symbol_item(2, Some(1000), 3)],
        SessionConfig::default(),
    );
    runner.start();
    clock.advance(1000);
    runner.tick();
    runner.handle_choice(0);
    let (generation, _) = reporter.last_submission();
    reporter.push_outcome(generation, outcome(true, 100));
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Feedback);

    reporter.push_outcome(generation, outcome(true, 100));
    clock.advance(300);
    runner.tick();

    // Had the duplicate been accepted the settle would restart here and the
    // next trial would begin 600ms later than this.
    clock.advance(300);
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Presenting);
    assert_eq!(runner.progress(), Some((2, 2)));
}

#[test]
fn empty_manifest_finishes_immediately_with_a_notice() {
    let (mut runner, clock, reporter) = runner_with(vec![], SessionConfig::default());
    runner.start();
    assert_eq!(runner.phase(), TrialPhase::Finished);
    assert_eq!(runner.status(), STATUS_NO_ITEMS);
    assert_eq!(runner.progress(), None);

    clock.advance(10_000);
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Finished);
    assert!(reporter.submissions().is_empty());
}

#[test]
fn scene_sessions_narrate_each_screen() {
    let config = SessionConfig::for_submodality(Submodality::Scene);
    let (mut runner, clock, reporter) = runner_with(vec![scene_item(5, Some(1200))], config);

    runner.start();
    assert_eq!(runner.status(), STATUS_SHOWING_BASE);

    clock.advance(1200);
    runner.tick();
    assert_eq!(runner.status(), STATUS_CHOOSE_CHANGE);

    runner.handle_choice(1);
    let (generation, record) = reporter.last_submission();
    assert_eq!(record.chosen_index, 1);
    reporter.push_outcome(generation, outcome(true, 431));
    runner.tick();
    assert_eq!(runner.status(), "Correcto (431 ms)");

    // Scene preset settles for 700ms, not 600.
    clock.advance(699);
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Feedback);
    clock.advance(1);
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::Finished);
    assert_eq!(runner.status(), STATUS_END_OF_SERIES);
}

#[test]
fn start_is_idempotent_once_running() {
    let (mut runner, clock, reporter) =
        runner_with(vec![symbol_item(1, Some(1000), 3)], SessionConfig::default());
    runner.start();
    clock.advance(400);
    runner.tick();
    runner.start();

    // A second start must not rewind the flash.
    clock.advance(600);
    runner.tick();
    assert_eq!(runner.phase(), TrialPhase::AwaitingInput);
    assert!(reporter.submissions().is_empty());
}
