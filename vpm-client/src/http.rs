//! Background submission of trial records.
//!
//! The render loop must never wait on the network, so records cross to a
//! worker thread over a channel and verdicts come back the same way. Every
//! message keeps the trial's generation tag; the session runner discards
//! any that arrive after their trial is gone.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};
use vpm_core::{ReportError, TaggedOutcome, TrialOutcome, TrialRecord, TrialReporter};

const REQUEST_TIMEOUT_S: u64 = 10;

struct Job {
    generation: u64,
    record: TrialRecord,
}

/// Submits trial records to `POST /api/v1/trials` from a dedicated thread.
pub struct HttpReporter {
    jobs: Sender<Job>,
    outcomes: Receiver<TaggedOutcome>,
    /// Failures synthesized locally when the worker is unreachable.
    stranded: VecDeque<TaggedOutcome>,
}

impl HttpReporter {
    pub fn new(base_url: &str) -> Self {
        let (jobs, job_rx) = mpsc::channel();
        let (outcome_tx, outcomes) = mpsc::channel();
        let endpoint = format!("{}/api/v1/trials", base_url.trim_end_matches('/'));
        thread::Builder::new()
            .name("vpm-reporter".to_owned())
            .spawn(move || worker_loop(&endpoint, job_rx, outcome_tx))
            .expect("failed to spawn reporter thread");
        Self {
            jobs,
            outcomes,
            stranded: VecDeque::new(),
        }
    }
}

impl TrialReporter for HttpReporter {
    fn submit(&mut self, generation: u64, record: TrialRecord) {
        if self.jobs.send(Job { generation, record }).is_err() {
            warn!(generation, "reporter thread is gone, failing the submission locally");
            self.stranded
                .push_back((generation, Err(ReportError::WorkerGone)));
        }
    }

    fn poll_outcome(&mut self) -> Option<TaggedOutcome> {
        if let Some(tagged) = self.stranded.pop_front() {
            return Some(tagged);
        }
        self.outcomes.try_recv().ok()
    }
}

fn worker_loop(endpoint: &str, jobs: Receiver<Job>, outcomes: Sender<TaggedOutcome>) {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_S))
        .build()
        .expect("failed to build HTTP client");

    while let Ok(job) = jobs.recv() {
        let result = post_record(&client, endpoint, &job.record);
        match &result {
            Ok(verdict) => debug!(
                generation = job.generation,
                correct = verdict.is_correct,
                "trial record acknowledged"
            ),
            Err(err) => warn!(generation = job.generation, error = %err, "trial record rejected"),
        }
        if outcomes.send((job.generation, result)).is_err() {
            // Session is gone; nothing left to report to.
            break;
        }
    }
}

fn post_record(
    client: &reqwest::blocking::Client,
    endpoint: &str,
    record: &TrialRecord,
) -> Result<TrialOutcome, ReportError> {
    let response = client.post(endpoint).json(record).send().map_err(|e| {
        if e.is_timeout() {
            ReportError::Timeout(REQUEST_TIMEOUT_S)
        } else if e.is_connect() {
            ReportError::Network(format!("backend not reachable at {endpoint}"))
        } else {
            ReportError::Network(e.to_string())
        }
    })?;

    let status = response.status().as_u16();
    if status >= 400 {
        let message = response.text().unwrap_or_default();
        return Err(ReportError::Backend { status, message });
    }
    response
        .json()
        .map_err(|e| ReportError::BadResponse(e.to_string()))
}
