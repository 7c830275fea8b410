//! Error types

use thiserror::Error;

/// Errors surfaced by the detector facade.
///
/// Not seeing a beacon is never an error; these cover the radio boundary and
/// the detector task lifecycle only.
#[derive(Debug, Clone, Error)]
pub enum DetectorError {
    /// The platform radio failed to start scanning. The message is passed
    /// through verbatim; retry policy belongs to the caller.
    #[error("failed to start BLE scan: {0}")]
    ScanStart(String),

    /// The detector task has shut down and no longer accepts events.
    #[error("detector is no longer running")]
    NotRunning,
}
