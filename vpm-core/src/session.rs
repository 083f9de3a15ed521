use std::fmt;

use serde::{Deserialize, Serialize};

use crate::item::{Item, OpaqueId};

/// Which perceptual-memory variant a session exercises. Wire names follow
/// the backend's mode codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Submodality {
    #[serde(rename = "VIS_S")]
    Symbols,
    #[serde(rename = "VIS_I")]
    Scene,
}

impl Submodality {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Submodality::Symbols => "VIS_S",
            Submodality::Scene => "VIS_I",
        }
    }
}

impl fmt::Display for Submodality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A provisioned session: the id to report against plus the ordered item
/// sequence. The order is fixed by the backend and never reshuffled here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionManifest {
    pub session_id: OpaqueId,
    pub items: Vec<Item>,
}

impl SessionManifest {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
