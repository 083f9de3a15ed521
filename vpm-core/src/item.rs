use std::fmt;

use serde::{Deserialize, Serialize};

/// Flash duration applied when an item's params leave it unspecified.
pub const DEFAULT_FLASH_MS: u64 = 1500;

/// Identifier assigned by the scoring backend. The backend may issue numeric
/// or string ids; the client never interprets them, only echoes them back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpaqueId {
    Num(i64),
    Text(String),
}

impl fmt::Display for OpaqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpaqueId::Num(n) => write!(f, "{n}"),
            OpaqueId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for OpaqueId {
    fn from(n: i64) -> Self {
        OpaqueId::Num(n)
    }
}

impl From<&str> for OpaqueId {
    fn from(s: &str) -> Self {
        OpaqueId::Text(s.to_owned())
    }
}

/// Named scene manipulation for the scene-change variant.
///
/// The wire format is the raw string; unknown names are preserved so they can
/// still be shown as option labels, and render as "no change".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChangeKind {
    #[default]
    None,
    RemoveDot,
    SwapColors,
    MirrorLeft,
    RemoveSegment,
    RemoveSmallShape,
    Rotate15,
    Other(String),
}

impl ChangeKind {
    pub fn wire_name(&self) -> &str {
        match self {
            ChangeKind::None => "none",
            ChangeKind::RemoveDot => "remove-dot",
            ChangeKind::SwapColors => "swap-colors",
            ChangeKind::MirrorLeft => "mirror-left",
            ChangeKind::RemoveSegment => "remove-segment",
            ChangeKind::RemoveSmallShape => "remove-small-shape",
            ChangeKind::Rotate15 => "rotate-15",
            ChangeKind::Other(name) => name,
        }
    }
}

impl From<String> for ChangeKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "none" => ChangeKind::None,
            "remove-dot" => ChangeKind::RemoveDot,
            "swap-colors" => ChangeKind::SwapColors,
            "mirror-left" => ChangeKind::MirrorLeft,
            "remove-segment" => ChangeKind::RemoveSegment,
            "remove-small-shape" => ChangeKind::RemoveSmallShape,
            "rotate-15" => ChangeKind::Rotate15,
            _ => ChangeKind::Other(name),
        }
    }
}

impl From<ChangeKind> for String {
    fn from(change: ChangeKind) -> Self {
        change.wire_name().to_owned()
    }
}

/// What gets flashed. The two shipped variants use `Symbols` and `Scene`;
/// anything else is carried opaquely so a malformed manifest still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StimulusDescriptor {
    Symbols { symbols: Vec<String> },
    Scene { base: String },
    Other(serde_json::Value),
}

impl StimulusDescriptor {
    pub fn symbols(&self) -> &[String] {
        match self {
            StimulusDescriptor::Symbols { symbols } => symbols,
            _ => &[],
        }
    }
}

/// One selectable answer. Symbol items carry candidate orderings, scene items
/// carry the name of a manipulation; a bare `{}` reads as "no change".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionDescriptor {
    Symbols {
        symbols: Vec<String>,
    },
    Change {
        #[serde(default)]
        change: ChangeKind,
    },
}

impl OptionDescriptor {
    pub fn symbols(&self) -> &[String] {
        match self {
            OptionDescriptor::Symbols { symbols } => symbols,
            OptionDescriptor::Change { .. } => &[],
        }
    }

    pub fn change(&self) -> ChangeKind {
        match self {
            OptionDescriptor::Change { change } => change.clone(),
            OptionDescriptor::Symbols { .. } => ChangeKind::None,
        }
    }
}

/// Per-item presentation parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemParams {
    pub flash_ms: Option<u64>,
}

/// One trial as provisioned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: OpaqueId,
    #[serde(default)]
    pub difficulty_level: Option<u32>,
    pub stimulus: StimulusDescriptor,
    #[serde(default)]
    pub options: Vec<OptionDescriptor>,
    #[serde(default)]
    pub correct_index: Option<usize>,
    #[serde(default)]
    pub params: ItemParams,
}

impl Item {
    /// Flash duration for this item, before scheduler clamping.
    pub fn flash_ms(&self) -> u64 {
        self.params.flash_ms.unwrap_or(DEFAULT_FLASH_MS)
    }
}
