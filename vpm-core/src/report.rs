//! Trial submission types.
//!
//! The record/outcome pair mirrors the scoring backend's wire format. Defined
//! in `vpm-core` so the session runner can stay agnostic of the transport
//! behind the `TrialReporter` seam.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::item::OpaqueId;

/// Sentinel `chosen_index` submitted when a trial ends without a choice,
/// e.g. an item that arrived with no options.
pub const NO_ANSWER: i64 = -1;

/// Client details forwarded with every submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMeta {
    pub ua: String,
}

/// One completed trial, as posted to the scoring backend.
///
/// `started_ms` is the wall-clock instant input became eligible and
/// `responded_ms` the instant the choice was accepted; the backend derives
/// the reaction time from the two rather than trusting a client delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub session_id: OpaqueId,
    pub item_id: OpaqueId,
    pub started_ms: i64,
    pub responded_ms: i64,
    pub chosen_index: i64,
    pub client_meta: ClientMeta,
}

/// The backend's verdict for one submitted trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub is_correct: bool,
    pub response_time_ms: i64,
}

/// Failures while submitting a trial or provisioning a session.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The backend returned an error response.
    #[error("backend error (HTTP {status}): {message}")]
    Backend { status: u16, message: String },

    /// The backend answered with a body we could not interpret.
    #[error("malformed backend response: {0}")]
    BadResponse(String),

    /// The submission worker is no longer running.
    #[error("submission worker is gone")]
    WorkerGone,
}

/// A submission result tagged with the trial generation it was issued for.
/// Stale generations are discarded by the session runner.
pub type TaggedOutcome = (u64, Result<TrialOutcome, ReportError>);

/// Transport seam between the session runner and the scoring backend.
///
/// `submit` must not block; outcomes surface later through `poll_outcome`,
/// which is polled once per frame. Every submitted record eventually yields
/// exactly one outcome, successful or not.
pub trait TrialReporter {
    fn submit(&mut self, generation: u64, record: TrialRecord);
    fn poll_outcome(&mut self) -> Option<TaggedOutcome>;
}

impl<T: TrialReporter + ?Sized> TrialReporter for Box<T> {
    fn submit(&mut self, generation: u64, record: TrialRecord) {
        (**self).submit(generation, record);
    }

    fn poll_outcome(&mut self) -> Option<TaggedOutcome> {
        (**self).poll_outcome()
    }
}
