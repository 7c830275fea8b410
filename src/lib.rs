//! BLE beacon detection SDK.
//!
//! Decodes iBeacon-style manufacturer data from raw BLE advertisements,
//! tracks each distinct beacon's presence over time, and periodically emits
//! deduplicated, change-detected notifications (full beacon list + single
//! "best" beacon) to consumers.
//!
//! The platform radio driver is an external collaborator: anything that can
//! deliver raw manufacturer data + RSSI through the [`BleRadio`] contract
//! works. The SDK itself never touches the radio hardware.

pub mod beacon;
pub mod config;
pub mod detector;
pub mod error;
pub mod registry;
pub mod reporter;

pub use beacon::{Beacon, BeaconCodec, Proximity};
pub use config::Config;
pub use detector::{BeaconDetector, BleRadio, DetectorEvent, RadioEvent};
pub use error::DetectorError;
pub use registry::BeaconRegistry;
pub use reporter::{Report, Reporter};
