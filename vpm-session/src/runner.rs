use std::sync::Arc;

use tracing::{debug, info, warn};
use vpm_core::{
    ClientMeta, Item, OpaqueId, ReportError, SessionManifest, Submodality, TrialOutcome,
    TrialPhase, TrialRecord, TrialReporter, NO_ANSWER,
};
use vpm_timing::{Clock, PhaseScheduler};

use crate::config::SessionConfig;
use crate::cursor::SessionCursor;
use crate::gate::InputGate;

pub const STATUS_END_OF_SERIES: &str = "Fin de la serie.";
pub const STATUS_NO_ITEMS: &str = "Sin ítems para mostrar";
pub const STATUS_SUBMIT_FAILED: &str = "Error enviando respuesta";
pub const STATUS_SHOWING_BASE: &str = "Mostrando escena base…";
pub const STATUS_CHOOSE_CHANGE: &str = "Elige el cambio realizado";

/// Drives one session through its item sequence.
///
/// Strictly poll-based: the host calls `tick` once per frame and the runner
/// compares deadlines against the clock, so there are no callbacks and no
/// timer threads. Each trial gets a fresh generation number; timer firings
/// and submission outcomes tagged with an older generation are discarded,
/// which keeps a late response from one trial out of the next.
pub struct SessionRunner<C: Clock, R: TrialReporter> {
    session_id: OpaqueId,
    items: Arc<[Item]>,
    config: SessionConfig,
    cursor: SessionCursor,
    generation: u64,
    scheduler: PhaseScheduler,
    gate: InputGate,
    clock: C,
    reporter: R,
    status: String,
}

impl<C: Clock, R: TrialReporter> SessionRunner<C, R> {
    pub fn new(manifest: SessionManifest, config: SessionConfig, clock: C, reporter: R) -> Self {
        let gate = InputGate::new(config.lockout_ms);
        Self {
            session_id: manifest.session_id,
            items: manifest.items.into(),
            config,
            cursor: SessionCursor::new(),
            generation: 0,
            scheduler: PhaseScheduler::new(),
            gate,
            clock,
            reporter,
            status: String::new(),
        }
    }

    /// Begins the first trial. An empty manifest finishes immediately with a
    /// visible status instead of crashing.
    pub fn start(&mut self) {
        if self.cursor.phase != TrialPhase::Idle {
            return;
        }
        if self.items.is_empty() {
            warn!(session_id = %self.session_id, "session has no items");
            self.cursor.phase = TrialPhase::Finished;
            self.status = STATUS_NO_ITEMS.to_owned();
            return;
        }
        info!(
            session_id = %self.session_id,
            items = self.items.len(),
            submodality = %self.config.submodality,
            "session started"
        );
        self.begin_trial(0);
    }

    /// Polls the scheduler and the reporter. Call once per frame.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        if let Some(generation) = self.scheduler.poll(now) {
            if generation == self.generation {
                self.on_deadline();
            } else {
                debug!(generation, current = self.generation, "stale deadline ignored");
            }
        }
        while let Some((generation, outcome)) = self.reporter.poll_outcome() {
            if generation == self.generation && self.cursor.phase == TrialPhase::Submitting {
                self.on_outcome(outcome);
            } else {
                debug!(generation, current = self.generation, "stale outcome discarded");
            }
        }
    }

    /// Subject picked option `index`, by key or by pointer. Ignored unless
    /// the current phase accepts input and the gate admits the choice.
    pub fn handle_choice(&mut self, index: usize) {
        if !self.cursor.phase.allows_input() {
            return;
        }
        let now = self.clock.now();
        let option_count = self.items[self.cursor.index].options.len();
        if !self.gate.submit(now, index, option_count) {
            return;
        }
        self.accept_choice(index as i64);
    }

    fn begin_trial(&mut self, index: usize) {
        self.cursor.index = index;
        self.cursor.phase = TrialPhase::Presenting;
        self.cursor.started_ms = 0;
        self.generation += 1;
        self.gate.disarm();

        let flash_ms = self.items[index].flash_ms();
        self.scheduler.schedule(self.clock.now(), flash_ms, self.generation);
        self.status = match self.config.submodality {
            Submodality::Scene => STATUS_SHOWING_BASE.to_owned(),
            Submodality::Symbols => String::new(),
        };
        debug!(
            trial = index,
            flash_ms,
            generation = self.generation,
            "presenting stimulus"
        );
    }

    fn on_deadline(&mut self) {
        match self.cursor.phase {
            TrialPhase::Presenting => self.open_input(),
            TrialPhase::Feedback => self.advance(),
            _ => {}
        }
    }

    /// Flash is over: show the option screen and open the gate.
    fn open_input(&mut self) {
        self.cursor.phase = TrialPhase::AwaitingInput;
        self.cursor.started_ms = self.clock.wall_ms();
        self.status = match self.config.submodality {
            Submodality::Scene => STATUS_CHOOSE_CHANGE.to_owned(),
            Submodality::Symbols => String::new(),
        };

        if self.items[self.cursor.index].options.is_empty() {
            debug!(trial = self.cursor.index, "item has no options, submitting sentinel");
            self.accept_choice(NO_ANSWER);
            return;
        }
        self.gate.arm();
    }

    fn accept_choice(&mut self, chosen_index: i64) {
        let item = &self.items[self.cursor.index];
        let record = TrialRecord {
            session_id: self.session_id.clone(),
            item_id: item.id.clone(),
            started_ms: self.cursor.started_ms,
            responded_ms: self.clock.wall_ms(),
            chosen_index,
            client_meta: ClientMeta {
                ua: self.config.user_agent.clone(),
            },
        };
        self.cursor.phase = TrialPhase::Submitting;
        self.gate.disarm();
        self.scheduler.cancel();
        debug!(
            trial = self.cursor.index,
            chosen = chosen_index,
            generation = self.generation,
            "submitting trial"
        );
        self.reporter.submit(self.generation, record);
    }

    fn on_outcome(&mut self, outcome: Result<TrialOutcome, ReportError>) {
        self.status = match outcome {
            Ok(verdict) => {
                debug!(
                    trial = self.cursor.index,
                    correct = verdict.is_correct,
                    rt_ms = verdict.response_time_ms,
                    "trial scored"
                );
                verdict_status(&verdict)
            }
            Err(err) => {
                warn!(trial = self.cursor.index, error = %err, "trial submission failed");
                STATUS_SUBMIT_FAILED.to_owned()
            }
        };
        self.cursor.phase = TrialPhase::Feedback;
        self.scheduler
            .schedule(self.clock.now(), self.config.feedback_settle_ms, self.generation);
    }

    /// Feedback settled: next item, or the end of the series.
    fn advance(&mut self) {
        let next = self.cursor.index + 1;
        if next >= self.items.len() {
            self.cursor.index = self.items.len();
            self.cursor.phase = TrialPhase::Finished;
            self.status = STATUS_END_OF_SERIES.to_owned();
            info!(session_id = %self.session_id, trials = self.items.len(), "session finished");
        } else {
            self.status.clear();
            self.begin_trial(next);
        }
    }

    pub fn phase(&self) -> TrialPhase {
        self.cursor.phase
    }

    pub fn cursor(&self) -> &SessionCursor {
        &self.cursor
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn session_id(&self) -> &OpaqueId {
        &self.session_id
    }

    pub fn submodality(&self) -> Submodality {
        self.config.submodality
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// The item being presented, if the session is still running.
    pub fn current_item(&self) -> Option<&Item> {
        self.items.get(self.cursor.index)
    }

    /// 1-based progress for the HUD; `None` outside of running trials.
    pub fn progress(&self) -> Option<(usize, usize)> {
        if self.cursor.phase == TrialPhase::Idle || self.cursor.phase.is_finished() {
            None
        } else {
            Some((self.cursor.index + 1, self.items.len()))
        }
    }
}

fn verdict_status(outcome: &TrialOutcome) -> String {
    if outcome.is_correct {
        format!("Correcto ({} ms)", outcome.response_time_ms)
    } else {
        format!("Incorrecto ({} ms)", outcome.response_time_ms)
    }
}
