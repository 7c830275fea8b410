//! iBeacon manufacturer-data decoder
//!
//! Payload layout after the device-type marker, contiguous and big-endian:
//! 16-byte beacon UUID, 2-byte major, 2-byte minor, 1-byte calibrated
//! transmit power (signed, encoded as value + 256). The marker itself varies
//! by platform: stacks that expose the full manufacturer data carry the
//! 4-byte `4c 00 02 15` prefix, while stacks that strip the company ID leave
//! only `02 15`.

use tokio::time::Instant;

use super::proximity;
use super::types::Beacon;

/// Full device-type marker: Apple company ID + iBeacon type + length.
pub const IBEACON_MARKER: [u8; 4] = [0x4c, 0x00, 0x02, 0x15];

/// Marker variant for platforms that strip the 2-byte company ID.
pub const IBEACON_MARKER_SHORT: [u8; 2] = [0x02, 0x15];

/// Payload bytes following the marker: UUID + major + minor + tx power.
const BODY_LEN: usize = 16 + 2 + 2 + 1;

/// Decoder for a fixed device-type marker.
#[derive(Debug, Clone)]
pub struct BeaconCodec {
    marker: Vec<u8>,
}

impl BeaconCodec {
    pub fn new(marker: &[u8]) -> Self {
        Self {
            marker: marker.to_vec(),
        }
    }

    /// Decode raw manufacturer data into a beacon sighting.
    ///
    /// Returns `None` for anything that is not a beacon (missing marker,
    /// truncated body). Absence is a normal outcome, not an error. The caller
    /// supplies `now` so repeated decodes stay deterministic.
    pub fn decode(&self, data: &[u8], rssi: i16, now: Instant) -> Option<Beacon> {
        let body = data.strip_prefix(self.marker.as_slice())?;
        if body.len() < BODY_LEN {
            return None;
        }

        let uuid = format_uuid(&body[..16]);
        let major = u16::from_be_bytes([body[16], body[17]]);
        let minor = u16::from_be_bytes([body[18], body[19]]);

        // Join codes are transported as base-36 re-encoded major/minor pairs.
        // The rendering must match JS `parseInt(hex, 16).toString(36)`
        // byte-for-byte for interop with deployed beacons.
        let join_code = to_base36((u32::from(major) << 16) | u32::from(minor));

        let tx_power = i16::from(body[20]) - 256;
        let (distance, prox) = proximity::estimate(tx_power, rssi);

        Some(Beacon {
            uuid,
            join_code,
            distance,
            proximity: prox,
            last_seen: now,
        })
    }
}

/// Re-punctuate 16 UUID bytes into the canonical 8-4-4-4-12 dashed form.
fn format_uuid(bytes: &[u8]) -> String {
    format!(
        "{}-{}-{}-{}-{}",
        hex::encode(&bytes[..4]),
        hex::encode(&bytes[4..6]),
        hex::encode(&bytes[6..8]),
        hex::encode(&bytes[8..10]),
        hex::encode(&bytes[10..16]),
    )
}

/// Render a u32 in lowercase base 36, matching JS `Number.toString(36)`.
fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut buf = [0u8; 7]; // u32::MAX is 6 base-36 digits
    let mut pos = buf.len();
    while value > 0 {
        pos -= 1;
        buf[pos] = DIGITS[(value % 36) as usize];
        value /= 36;
    }

    String::from_utf8_lossy(&buf[pos..]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacon::types::Proximity;

    const PAYLOAD: &str =
        "4c000215bf23c31124ae414bb153cf097836947f00010002c5";

    fn codec() -> BeaconCodec {
        BeaconCodec::new(&IBEACON_MARKER)
    }

    #[test]
    fn test_decode_valid_payload() {
        let data = hex::decode(PAYLOAD).unwrap();
        let beacon = codec().decode(&data, -59, Instant::now()).unwrap();

        assert_eq!(beacon.uuid, "bf23c311-24ae-414b-b153-cf097836947f");
        // parseInt("00010002", 16).toString(36) == "1eki"
        assert_eq!(beacon.join_code, "1eki");
        // tx power 0xc5 => -59 dBm, equal to rssi => exactly one meter
        assert_eq!(beacon.distance, 1.0);
        assert_eq!(beacon.proximity, Proximity::Near);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let data = hex::decode(PAYLOAD).unwrap();
        let now = Instant::now();
        let a = codec().decode(&data, -72, now).unwrap();
        let b = codec().decode(&data, -72, now).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_marker_mismatch_is_not_a_beacon() {
        let data = hex::decode(PAYLOAD).unwrap();
        let mut wrong = data.clone();
        wrong[0] = 0x4d;
        assert!(codec().decode(&wrong, -59, Instant::now()).is_none());

        // Arbitrary non-beacon manufacturer data
        assert!(codec().decode(&[0x75, 0x00, 0x01], -59, Instant::now()).is_none());
        assert!(codec().decode(&[], -59, Instant::now()).is_none());
    }

    #[test]
    fn test_truncated_body_is_not_a_beacon() {
        let data = hex::decode(PAYLOAD).unwrap();
        assert!(codec().decode(&data[..data.len() - 1], -59, Instant::now()).is_none());
        assert!(codec().decode(&IBEACON_MARKER, -59, Instant::now()).is_none());
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let mut data = hex::decode(PAYLOAD).unwrap();
        data.extend_from_slice(&[0xde, 0xad]);
        let beacon = codec().decode(&data, -59, Instant::now()).unwrap();
        assert_eq!(beacon.join_code, "1eki");
    }

    #[test]
    fn test_short_marker_variant() {
        // Same body, company ID stripped by the platform stack.
        let data = hex::decode(&PAYLOAD[4..]).unwrap();
        let codec = BeaconCodec::new(&IBEACON_MARKER_SHORT);
        let beacon = codec.decode(&data, -59, Instant::now()).unwrap();
        assert_eq!(beacon.uuid, "bf23c311-24ae-414b-b153-cf097836947f");
        assert_eq!(beacon.join_code, "1eki");
    }

    #[test]
    fn test_tx_power_is_signed() {
        // 0xb0 => 176 - 256 = -80 dBm
        let mut data = hex::decode(PAYLOAD).unwrap();
        *data.last_mut().unwrap() = 0xb0;
        let beacon = codec().decode(&data, -59, Instant::now()).unwrap();
        // tx below rssi => well under a meter
        assert!(beacon.distance < 1.0);
        assert_eq!(beacon.proximity, Proximity::Immediate);
    }

    #[test]
    fn test_base36_rendering() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(0x0001_0002), "1eki");
        assert_eq!(to_base36(u32::MAX), "1z141z3");
    }
}
