/// Default debounce window after an accepted choice.
pub const DEFAULT_LOCKOUT_MS: u64 = 400;

/// Single admission point for subject input.
///
/// A choice is accepted only while the gate is armed, outside the lockout
/// window, and with an index inside the option set. Acceptance disarms the
/// gate and starts the lockout, so a burst of N submissions yields exactly
/// one accepted choice. Rejections are silent; double-submission is an
/// expected interaction, not an error.
#[derive(Debug)]
pub struct InputGate {
    lockout_ms: u64,
    armed: bool,
    locked_until: u64,
}

impl InputGate {
    pub fn new(lockout_ms: u64) -> Self {
        Self {
            lockout_ms,
            armed: false,
            locked_until: 0,
        }
    }

    /// Opens the gate for the current option screen. Arming during an
    /// active lockout is allowed; submissions stay rejected until the
    /// lockout expires.
    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_locked(&self, now: u64) -> bool {
        now < self.locked_until
    }

    /// Returns whether the choice is accepted. On acceptance the gate
    /// disarms and the lockout starts at `now`.
    pub fn submit(&mut self, now: u64, index: usize, option_count: usize) -> bool {
        if !self.armed || now < self.locked_until || index >= option_count {
            return false;
        }
        self.armed = false;
        self.locked_until = now + self.lockout_ms;
        true
    }
}

impl Default for InputGate {
    fn default() -> Self {
        Self::new(DEFAULT_LOCKOUT_MS)
    }
}
