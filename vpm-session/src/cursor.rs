use vpm_core::TrialPhase;

/// The runner's sole mutable progress state: which item, which phase, and
/// when input opened for the active trial.
///
/// `index` only ever moves forward; at `Finished` it equals the item count.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCursor {
    pub index: usize,
    pub phase: TrialPhase,
    /// Wall-clock ms at which input became eligible; 0 until the first
    /// option screen of the trial.
    pub started_ms: i64,
}

impl SessionCursor {
    pub fn new() -> Self {
        Self {
            index: 0,
            phase: TrialPhase::Idle,
            started_ms: 0,
        }
    }
}

impl Default for SessionCursor {
    fn default() -> Self {
        Self::new()
    }
}
