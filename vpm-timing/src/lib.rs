pub mod clock;
pub mod scheduler;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use scheduler::{
    clamp_phase_delay, PhaseScheduler, MAX_PHASE_DELAY_MS, MIN_PHASE_DELAY_MS,
};
