//! Client side of the scoring backend's JSON API.
//!
//! Provisions sessions, submits trial records from a background thread so
//! the render loop never waits on the network, and carries a local scorer
//! for offline demo runs.

pub mod http;
pub mod local;
pub mod provision;

pub use http::HttpReporter;
pub use local::LocalScorer;
pub use provision::{fetch_session, fetch_session_score, ProvisionError, SessionScore};
