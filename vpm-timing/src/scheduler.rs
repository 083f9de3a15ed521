/// Bounds applied to every scheduled phase delay. A manifest with a wild
/// `flash_ms` still yields a presentable trial.
pub const MIN_PHASE_DELAY_MS: u64 = 300;
pub const MAX_PHASE_DELAY_MS: u64 = 4000;

pub fn clamp_phase_delay(delay_ms: u64) -> u64 {
    delay_ms.clamp(MIN_PHASE_DELAY_MS, MAX_PHASE_DELAY_MS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    due: u64,
    generation: u64,
}

/// Single-slot deadline for the next phase transition.
///
/// A trial never has more than one transition in flight, so scheduling
/// replaces whatever was pending. Deadlines are polled against the
/// monotonic clock rather than delivered by callback; `poll` hands back the
/// generation the deadline was scheduled under so the caller can discard
/// deadlines that outlived their trial.
#[derive(Debug, Default)]
pub struct PhaseScheduler {
    pending: Option<Pending>,
}

impl PhaseScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules the next transition `delay_ms` (clamped) after `now`.
    pub fn schedule(&mut self, now: u64, delay_ms: u64, generation: u64) {
        let due = now + clamp_phase_delay(delay_ms);
        self.pending = Some(Pending { due, generation });
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Fires at most once per scheduled deadline: returns the generation of
    /// the due transition and clears the slot.
    pub fn poll(&mut self, now: u64) -> Option<u64> {
        match self.pending {
            Some(p) if now >= p.due => {
                self.pending = None;
                Some(p.generation)
            }
            _ => None,
        }
    }
}
