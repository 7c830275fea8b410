//! Beacon data types

use std::fmt;

use serde::Serialize;
use tokio::time::Instant;

/// Coarse distance bucket for a detected beacon.
///
/// `Unknown` is reserved for the absence-of-beacon case and is never produced
/// from a numeric distance estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Proximity {
    Immediate,
    Near,
    Far,
    Unknown,
}

impl fmt::Display for Proximity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Immediate => "immediate",
            Self::Near => "near",
            Self::Far => "far",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// A single decoded beacon sighting.
///
/// Recreated on every decode; a repeat sighting of the same device replaces
/// the previous record in the registry rather than mutating it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Beacon {
    /// Canonical dashed-hex beacon UUID (namespace filter, not identity).
    pub uuid: String,

    /// Compact base-36 identifier derived from the major/minor fields.
    /// Registry key: two records are the same device iff this matches.
    pub join_code: String,

    /// Estimated distance in meters, derived from signal strength.
    pub distance: f64,

    /// Distance bucket derived from `distance`.
    pub proximity: Proximity,

    /// When this sighting was decoded.
    #[serde(skip)]
    pub last_seen: Instant,
}

impl Beacon {
    /// Whether two records refer to the same physical device.
    pub fn same_identity(&self, other: &Beacon) -> bool {
        self.uuid == other.uuid && self.join_code == other.join_code
    }
}

impl fmt::Display for Beacon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UUID: {} CODE: {} PROXIMITY: {}",
            self.uuid, self.join_code, self.proximity
        )
    }
}
