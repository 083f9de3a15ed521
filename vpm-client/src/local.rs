//! Offline scoring for demo sessions.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use tracing::debug;
use vpm_core::{Item, OpaqueId, TaggedOutcome, TrialOutcome, TrialRecord, TrialReporter};

use crate::provision::SessionScore;

struct AnswerKey {
    correct_index: Option<usize>,
    difficulty_level: u32,
}

#[derive(Default)]
struct LevelTally {
    n: u64,
    ok: u64,
}

#[derive(Default)]
struct ScorerState {
    answer_keys: HashMap<OpaqueId, AnswerKey>,
    pending: VecDeque<TaggedOutcome>,
    correct: u64,
    by_level: HashMap<u32, LevelTally>,
    rts: Vec<i64>,
}

/// Scores trials from the manifest's own answer key, standing in for the
/// backend when running offline. Clones share state, so the application can
/// keep a handle for the end-of-session summary while the runner owns the
/// reporter. Items without an answer key score as incorrect.
#[derive(Clone)]
pub struct LocalScorer {
    state: Rc<RefCell<ScorerState>>,
}

impl LocalScorer {
    pub fn new(items: &[Item]) -> Self {
        let answer_keys = items
            .iter()
            .map(|item| {
                let key = AnswerKey {
                    correct_index: item.correct_index,
                    difficulty_level: item.difficulty_level.unwrap_or(1),
                };
                (item.id.clone(), key)
            })
            .collect();
        Self {
            state: Rc::new(RefCell::new(ScorerState {
                answer_keys,
                ..Default::default()
            })),
        }
    }

    /// Aggregates the scored trials with the same arithmetic as the
    /// backend's score endpoint.
    pub fn summary(&self) -> SessionScore {
        let state = self.state.borrow();
        let n = state.rts.len() as u64;
        if n == 0 {
            return SessionScore {
                n: 0,
                accuracy: 0.0,
                rt_avg_ms: 0.0,
                rt_median_ms: 0.0,
                level_reached: 0,
                message: Some("No trials yet".to_owned()),
            };
        }
        let sum: i64 = state.rts.iter().sum();
        let mut sorted = state.rts.clone();
        sorted.sort_unstable();
        // The endpoint truncates the mean and never averages the median: an
        // even count takes the upper middle element.
        let rt_avg_ms = (sum / n as i64) as f64;
        let rt_median_ms = sorted[sorted.len() / 2] as f64;
        // A level counts as reached once 60% of its trials are correct.
        // Sessions where no level gets there report level 1.
        let level_reached = state
            .by_level
            .iter()
            .filter(|(_, tally)| tally.ok as f64 / tally.n as f64 >= 0.6)
            .map(|(level, _)| *level)
            .max()
            .unwrap_or(1);
        SessionScore {
            n,
            accuracy: ((state.correct as f64 / n as f64) * 1000.0).round() / 1000.0,
            rt_avg_ms,
            rt_median_ms,
            level_reached,
            message: None,
        }
    }
}

impl TrialReporter for LocalScorer {
    fn submit(&mut self, generation: u64, record: TrialRecord) {
        let mut state = self.state.borrow_mut();
        let (is_correct, level) = match state.answer_keys.get(&record.item_id) {
            Some(key) => (
                key.correct_index
                    .is_some_and(|correct| record.chosen_index == correct as i64),
                key.difficulty_level,
            ),
            None => (false, 1),
        };
        let response_time_ms = record.responded_ms - record.started_ms;
        if is_correct {
            state.correct += 1;
        }
        let tally = state.by_level.entry(level).or_default();
        tally.n += 1;
        tally.ok += u64::from(is_correct);
        state.rts.push(response_time_ms);
        debug!(item = %record.item_id, is_correct, response_time_ms, "trial scored locally");
        state.pending.push_back((
            generation,
            Ok(TrialOutcome {
                is_correct,
                response_time_ms,
            }),
        ));
    }

    fn poll_outcome(&mut self) -> Option<TaggedOutcome> {
        self.state.borrow_mut().pending.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpm_core::{ClientMeta, ItemParams, OptionDescriptor, StimulusDescriptor};

    fn item(id: i64, correct_index: Option<usize>, difficulty_level: u32) -> Item {
        let symbols = vec!["∆".to_owned(), "Ω".to_owned()];
        Item {
            id: OpaqueId::from(id),
            difficulty_level: Some(difficulty_level),
            stimulus: StimulusDescriptor::Symbols {
                symbols: symbols.clone(),
            },
            options: vec![
                OptionDescriptor::Symbols {
                    symbols: symbols.clone(),
                },
                OptionDescriptor::Symbols { symbols },
            ],
            correct_index,
            params: ItemParams::default(),
        }
    }

    fn record(item_id: i64, chosen_index: i64, rt_ms: i64) -> TrialRecord {
        let started_ms = 1_700_000_000_000;
        TrialRecord {
            session_id: OpaqueId::from(9),
            item_id: OpaqueId::from(item_id),
            started_ms,
            responded_ms: started_ms + rt_ms,
            chosen_index,
            client_meta: ClientMeta {
                ua: "vpm-test".to_owned(),
            },
        }
    }

    #[test]
    fn scores_against_the_answer_key() {
        let items = vec![item(1, Some(0), 1), item(2, Some(1), 1)];
        let mut scorer = LocalScorer::new(&items);

        scorer.submit(1, record(1, 0, 420));
        scorer.submit(2, record(2, 0, 911));

        let (generation, outcome) = scorer.poll_outcome().unwrap();
        let verdict = outcome.unwrap();
        assert_eq!(generation, 1);
        assert!(verdict.is_correct);
        assert_eq!(verdict.response_time_ms, 420);

        let (generation, outcome) = scorer.poll_outcome().unwrap();
        let verdict = outcome.unwrap();
        assert_eq!(generation, 2);
        assert!(!verdict.is_correct);
        assert_eq!(verdict.response_time_ms, 911);

        assert!(scorer.poll_outcome().is_none());
    }

    #[test]
    fn items_without_an_answer_key_score_incorrect() {
        let items = vec![item(1, None, 1)];
        let mut scorer = LocalScorer::new(&items);

        scorer.submit(1, record(1, 0, 100));
        let (_, outcome) = scorer.poll_outcome().unwrap();
        assert!(!outcome.unwrap().is_correct);
    }

    #[test]
    fn unknown_items_score_incorrect() {
        let mut scorer = LocalScorer::new(&[]);
        scorer.submit(1, record(99, 0, 100));
        let (_, outcome) = scorer.poll_outcome().unwrap();
        assert!(!outcome.unwrap().is_correct);
    }

    #[test]
    fn summary_aggregates_like_the_backend() {
        let items = vec![item(1, Some(0), 1), item(2, Some(0), 2), item(3, Some(0), 3)];
        let mut scorer = LocalScorer::new(&items);
        let handle = scorer.clone();

        scorer.submit(1, record(1, 0, 400));
        scorer.submit(2, record(2, 1, 800));
        scorer.submit(3, record(3, 0, 600));

        let score = handle.summary();
        assert_eq!(score.n, 3);
        assert!((score.accuracy - 0.667).abs() < 1e-9);
        assert!((score.rt_avg_ms - 600.0).abs() < 1e-9);
        assert!((score.rt_median_ms - 600.0).abs() < 1e-9);
        assert_eq!(score.level_reached, 3);
        assert!(score.message.is_none());
    }

    #[test]
    fn summary_median_is_the_upper_middle_on_even_counts() {
        let items = vec![item(1, Some(0), 1), item(2, Some(0), 1)];
        let mut scorer = LocalScorer::new(&items);
        let handle = scorer.clone();

        scorer.submit(1, record(1, 0, 400));
        scorer.submit(2, record(2, 0, 801));

        let score = handle.summary();
        assert!((score.rt_median_ms - 801.0).abs() < 1e-9);
        assert!((score.rt_avg_ms - 600.0).abs() < 1e-9);
    }

    #[test]
    fn summary_with_no_correct_trials_reports_level_one() {
        let items = vec![item(1, Some(0), 2), item(2, Some(0), 3)];
        let mut scorer = LocalScorer::new(&items);
        let handle = scorer.clone();

        scorer.submit(1, record(1, 1, 500));
        scorer.submit(2, record(2, 1, 700));

        let score = handle.summary();
        assert!(score.accuracy.abs() < 1e-9);
        assert_eq!(score.level_reached, 1);
    }

    #[test]
    fn summary_holds_back_levels_below_sixty_percent() {
        // Level 1 lands exactly at 60%, level 2 at one correct in three.
        let items = vec![
            item(1, Some(0), 1),
            item(2, Some(0), 1),
            item(3, Some(0), 1),
            item(4, Some(0), 1),
            item(5, Some(0), 1),
            item(6, Some(0), 2),
            item(7, Some(0), 2),
            item(8, Some(0), 2),
        ];
        let mut scorer = LocalScorer::new(&items);
        let handle = scorer.clone();

        scorer.submit(1, record(1, 0, 500));
        scorer.submit(2, record(2, 0, 500));
        scorer.submit(3, record(3, 0, 500));
        scorer.submit(4, record(4, 1, 500));
        scorer.submit(5, record(5, 1, 500));
        scorer.submit(6, record(6, 0, 500));
        scorer.submit(7, record(7, 1, 500));
        scorer.submit(8, record(8, 1, 500));

        let score = handle.summary();
        assert!((score.accuracy - 0.5).abs() < 1e-9);
        assert_eq!(score.level_reached, 1);
    }

    #[test]
    fn summary_without_trials_carries_a_message() {
        let scorer = LocalScorer::new(&[]);
        let score = scorer.summary();
        assert_eq!(score.n, 0);
        assert_eq!(score.message.as_deref(), Some("No trials yet"));
    }
}
