//! Detector configuration

use std::time::Duration;

use crate::beacon::IBEACON_MARKER;

/// Beacon UUID tracked when none is configured.
pub const DEFAULT_BEACON_UUID: &str = "bf23c311-24ae-414b-b153-cf097836947f";

/// Shortest allowed dismiss timeout; raw beacon detection intervals are long
/// enough that anything shorter drops live beacons.
const MIN_DISMISS_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_DISMISS_TIMEOUT: Duration = Duration::from_secs(10);

/// Shortest allowed reporting interval, also the default.
const MIN_REPORT_INTERVAL: Duration = Duration::from_millis(2000);

/// Immutable detector configuration.
///
/// Values below the floors are clamped rather than rejected, so a slightly
/// misconfigured consumer still gets a working detector.
#[derive(Debug, Clone)]
pub struct Config {
    /// Beacon UUID a payload must carry to be tracked.
    pub beacon_uuid: String,

    /// How long a beacon may go unseen before it is evicted.
    pub dismiss_timeout: Duration,

    /// Interval between reporting sweeps.
    pub report_interval: Duration,

    /// Device-type marker expected at the start of manufacturer data.
    /// Platforms that strip the company ID use `IBEACON_MARKER_SHORT`.
    pub device_marker: Vec<u8>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            beacon_uuid: DEFAULT_BEACON_UUID.to_string(),
            dismiss_timeout: DEFAULT_DISMISS_TIMEOUT,
            report_interval: MIN_REPORT_INTERVAL,
            device_marker: IBEACON_MARKER.to_vec(),
        }
    }
}

impl Config {
    /// Build a config from optional consumer-supplied values, clamping
    /// anything below the floors.
    pub fn new(
        beacon_uuid: Option<String>,
        dismiss_timeout_secs: Option<u64>,
        report_interval_ms: Option<u64>,
    ) -> Self {
        let defaults = Self::default();

        Self {
            beacon_uuid: beacon_uuid.unwrap_or(defaults.beacon_uuid),
            dismiss_timeout: dismiss_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.dismiss_timeout)
                .max(MIN_DISMISS_TIMEOUT),
            report_interval: report_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.report_interval)
                .max(MIN_REPORT_INTERVAL),
            device_marker: defaults.device_marker,
        }
    }

    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let beacon_uuid = std::env::var("BEACON_UUID").ok();

        let dismiss_timeout_secs = std::env::var("BEACON_DISMISS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok());

        let report_interval_ms = std::env::var("REPORT_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok());

        let mut config = Self::new(beacon_uuid, dismiss_timeout_secs, report_interval_ms);

        if let Some(marker) = std::env::var("BEACON_MARKER")
            .ok()
            .and_then(|s| hex::decode(s).ok())
        {
            config.device_marker = marker;
        }

        config
    }
}
