/// Presentation states of a single trial, in the order they are entered.
///
/// Transitions are driven by the session runner; apart from the jump out of
/// `AwaitingInput` on an accepted choice, every transition fires on a
/// scheduled deadline.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum TrialPhase {
    Idle,
    Presenting,
    AwaitingInput,
    Submitting,
    Feedback,
    Finished,
}

impl Default for TrialPhase {
    fn default() -> Self {
        TrialPhase::Idle
    }
}

impl TrialPhase {
    /// Whether subject input may be considered at all in this phase. The
    /// input gate applies its own arming and lockout checks on top.
    pub fn allows_input(&self) -> bool {
        matches!(self, TrialPhase::AwaitingInput)
    }

    /// Whether the option set is on screen.
    pub fn shows_options(&self) -> bool {
        matches!(
            self,
            TrialPhase::AwaitingInput | TrialPhase::Submitting | TrialPhase::Feedback
        )
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, TrialPhase::Finished)
    }
}
