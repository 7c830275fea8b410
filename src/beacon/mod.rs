//! Beacon decoding module

pub mod codec;
pub mod proximity;
mod types;

pub use codec::{BeaconCodec, IBEACON_MARKER, IBEACON_MARKER_SHORT};
pub use types::{Beacon, Proximity};
