//! Beacon detection demo against a simulated radio.
//!
//! Feeds synthetic iBeacon advertisements (and some non-beacon noise)
//! through the full decode / track / report pipeline and logs every
//! notification a consumer would receive. One beacon keeps advertising, the
//! other goes silent halfway through so the dismiss timeout is visible.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use spot_beacon::config::DEFAULT_BEACON_UUID;
use spot_beacon::{BeaconDetector, BleRadio, Config, DetectorError, DetectorEvent, RadioEvent};

/// Build a full iBeacon manufacturer-data payload.
fn beacon_payload(uuid_bytes: &[u8], major: u16, minor: u16, tx_power: u8) -> Vec<u8> {
    let mut data = spot_beacon::beacon::IBEACON_MARKER.to_vec();
    data.extend_from_slice(uuid_bytes);
    data.extend_from_slice(&major.to_be_bytes());
    data.extend_from_slice(&minor.to_be_bytes());
    data.push(tx_power);
    data
}

/// Radio driver that advertises two synthetic beacons.
struct SimulatedRadio {
    uuid_bytes: Vec<u8>,
    feeder: Option<JoinHandle<()>>,
    events: Option<mpsc::Sender<RadioEvent>>,
}

impl SimulatedRadio {
    fn new(uuid_bytes: Vec<u8>) -> Self {
        Self {
            uuid_bytes,
            feeder: None,
            events: None,
        }
    }
}

impl BleRadio for SimulatedRadio {
    fn start(&mut self, events: mpsc::Sender<RadioEvent>) -> Result<(), DetectorError> {
        let _ = events.try_send(RadioEvent::ScanStarted);

        let uuid_bytes = self.uuid_bytes.clone();
        let tx = events.clone();
        self.events = Some(events);

        self.feeder = Some(tokio::spawn(async move {
            for second in 0..20u16 {
                // Beacon "1eki" stays around the whole run, drifting away.
                let _ = tx
                    .send(RadioEvent::Advertisement {
                        manufacturer_data: beacon_payload(&uuid_bytes, 1, 2, 0xc5),
                        rssi: -55 - (second as i16),
                    })
                    .await;

                // Beacon "1ekj" goes silent after six seconds.
                if second < 6 {
                    let _ = tx
                        .send(RadioEvent::Advertisement {
                            manufacturer_data: beacon_payload(&uuid_bytes, 1, 3, 0xc5),
                            rssi: -70,
                        })
                        .await;
                }

                // Non-beacon manufacturer data, silently dropped.
                let _ = tx
                    .send(RadioEvent::Advertisement {
                        manufacturer_data: vec![0x75, 0x00, 0x42, 0x04],
                        rssi: -40,
                    })
                    .await;

                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }));

        Ok(())
    }

    fn stop(&mut self) {
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
        if let Some(events) = &self.events {
            let _ = events.try_send(RadioEvent::ScanStopped);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .init();

    let config = Config::from_env();
    info!("Configuration:");
    info!("  Beacon UUID: {}", config.beacon_uuid);
    info!("  Dismiss timeout: {:?}", config.dismiss_timeout);
    info!("  Report interval: {:?}", config.report_interval);

    let uuid_bytes = hex::decode(DEFAULT_BEACON_UUID.replace('-', ""))?;
    let radio = SimulatedRadio::new(uuid_bytes);

    let (mut detector, mut events) = BeaconDetector::new(config, radio);
    detector.start();

    let run_for = tokio::time::sleep(Duration::from_secs(20));
    tokio::pin!(run_for);
    let mut stopping = false;

    loop {
        tokio::select! {
            Some(event) = events.recv() => match event {
                DetectorEvent::ScanStart => info!("[consumer] scan started"),
                DetectorEvent::ScanStop => {
                    info!("[consumer] scan stopped");
                    break;
                }
                DetectorEvent::ScanStartError(error) => {
                    info!("[consumer] scan start error: {:?}", error);
                    break;
                }
                DetectorEvent::Beacons(list) => {
                    info!("[consumer] beacons ({})", list.len());
                    for beacon in &list {
                        info!("[consumer]   {} at {:.2} m", beacon, beacon.distance);
                    }
                }
                DetectorEvent::BestBeacon(Some(beacon)) => {
                    info!("[consumer] best beacon: {}", beacon);
                }
                DetectorEvent::BestBeacon(None) => {
                    info!("[consumer] no best beacon");
                }
            },
            () = &mut run_for, if !stopping => {
                stopping = true;
                detector.stop();
            }
        }
    }

    info!("Shutdown complete.");
    Ok(())
}
