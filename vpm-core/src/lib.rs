pub mod item;
pub mod phase;
pub mod report;
pub mod session;

pub use item::{ChangeKind, Item, ItemParams, OpaqueId, OptionDescriptor, StimulusDescriptor};
pub use phase::TrialPhase;
pub use report::{
    ClientMeta, ReportError, TaggedOutcome, TrialOutcome, TrialRecord, TrialReporter, NO_ANSWER,
};
pub use session::{SessionManifest, Submodality};
