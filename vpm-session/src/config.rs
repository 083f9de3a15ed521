use vpm_core::Submodality;

use crate::gate::DEFAULT_LOCKOUT_MS;

/// Session-level presentation parameters. Per-item values (flash duration)
/// come from the manifest; these are the fixed surroundings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub submodality: Submodality,
    /// How long the verdict stays on screen before the next trial.
    pub feedback_settle_ms: u64,
    /// Debounce window after an accepted choice.
    pub lockout_ms: u64,
    /// Forwarded to the backend in each record's client metadata.
    pub user_agent: String,
}

impl SessionConfig {
    /// Variant presets: the scene variant lingers slightly longer on
    /// feedback than the symbol variant.
    pub fn for_submodality(submodality: Submodality) -> Self {
        let feedback_settle_ms = match submodality {
            Submodality::Symbols => 600,
            Submodality::Scene => 700,
        };
        Self {
            submodality,
            feedback_settle_ms,
            lockout_ms: DEFAULT_LOCKOUT_MS,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::for_submodality(Submodality::Symbols)
    }
}

pub fn default_user_agent() -> String {
    format!("vpm/{} ({})", env!("CARGO_PKG_VERSION"), std::env::consts::OS)
}
