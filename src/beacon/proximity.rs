//! RSSI-to-distance estimation
//!
//! Log-distance path loss model with a path loss exponent of 2, per
//! https://www.rn.inf.tu-dresden.de/dargie/papers/icwcuca.pdf. The exponent
//! and divisor are load-bearing: deployed beacons are calibrated against this
//! exact curve, so changing the constants breaks distance compatibility.

use super::types::Proximity;

/// Estimate distance in meters and the matching proximity bucket from the
/// beacon's calibrated transmit power and the measured signal strength, both
/// in dBm.
pub fn estimate(tx_power: i16, rssi: i16) -> (f64, Proximity) {
    let distance = 10f64.powf(f64::from(tx_power - rssi) / 20.0);
    (distance, Proximity::from_distance(distance))
}

impl Proximity {
    /// Bucket a distance estimate. Thresholds are exact: < 1 m is immediate,
    /// < 3 m is near, everything else is far.
    pub fn from_distance(distance: f64) -> Self {
        if distance < 1.0 {
            Self::Immediate
        } else if distance < 3.0 {
            Self::Near
        } else {
            Self::Far
        }
    }
}
