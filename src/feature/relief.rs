use serde::{Deserialize, Serialize};

use crate::spatial::FeatureArea;

/// The kind of a relief feature surfaced by the geology layer.
#[derive(PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum ReliefKind {
    Cave,
    Sinkhole,
    RockOutcrop,
}

impl ReliefKind {
    pub fn name(&self) -> &str {
        match self {
            ReliefKind::Cave => "Cave",
            ReliefKind::Sinkhole => "Sinkhole",
            ReliefKind::RockOutcrop => "Rock outcrop",
        }
    }
}

/// A point relief feature with a small surrounding area.
#[derive(PartialEq, Clone, Serialize, Deserialize, Debug)]
pub struct Relief {
    pub kind: ReliefKind,
    pub area: FeatureArea,
}
