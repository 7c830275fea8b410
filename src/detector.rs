//! Beacon detector facade
//!
//! Bridges a platform radio driver to the reporting engine. One spawned task
//! owns the reporter and serializes discovery events with periodic reporting
//! ticks, so no locking is needed anywhere in the core. Sweeps only run
//! between scan-start and scan-stop; stopping guarantees no further sweeps.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::beacon::{Beacon, BeaconCodec};
use crate::config::Config;
use crate::error::DetectorError;
use crate::reporter::{Report, Reporter};

/// Inbound signals from the platform radio collaborator.
#[derive(Debug, Clone)]
pub enum RadioEvent {
    /// A raw advertisement was received: manufacturer data plus signal
    /// strength in dBm. May or may not be a beacon.
    Advertisement { manufacturer_data: Vec<u8>, rssi: i16 },
    /// Scanning is now active.
    ScanStarted,
    /// Scanning has stopped.
    ScanStopped,
    /// Scanning failed to start; opaque error passthrough.
    ScanStartFailed(Option<String>),
}

/// Outbound notifications for SDK consumers. Purely push-based.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorEvent {
    ScanStart,
    ScanStop,
    ScanStartError(Option<String>),
    /// The reportable beacon set changed; full sorted list.
    Beacons(Vec<Beacon>),
    /// The best beacon changed; `None` when no beacon remains.
    BestBeacon(Option<Beacon>),
}

impl From<Report> for DetectorEvent {
    fn from(report: Report) -> Self {
        match report {
            Report::Beacons(list) => Self::Beacons(list),
            Report::BestBeacon(best) => Self::BestBeacon(best),
        }
    }
}

/// Platform radio driver contract.
///
/// Implementations own the OS-specific scanning machinery and deliver
/// [`RadioEvent`]s through the sender handed to [`BleRadio::start`]. The SDK
/// never drives the radio beyond start and stop.
pub trait BleRadio: Send + 'static {
    /// Begin scanning, delivering events to `events`. A synchronous failure
    /// may be returned here; asynchronous failures are delivered as
    /// [`RadioEvent::ScanStartFailed`].
    fn start(&mut self, events: mpsc::Sender<RadioEvent>) -> Result<(), DetectorError>;

    /// Stop scanning. Must be safe to call in any state.
    fn stop(&mut self);
}

/// Beacon detector: wires a radio driver into the reporting engine.
///
/// Created with [`BeaconDetector::new`], which also returns the consumer
/// notification stream. Dropping the detector cancels the reporting task.
pub struct BeaconDetector<R: BleRadio> {
    radio: R,
    radio_tx: mpsc::Sender<RadioEvent>,
    task: JoinHandle<()>,
}

impl<R: BleRadio> BeaconDetector<R> {
    /// Spawn the detector task and return the detector together with the
    /// consumer event receiver.
    pub fn new(config: Config, radio: R) -> (Self, mpsc::Receiver<DetectorEvent>) {
        let (radio_tx, radio_rx) = mpsc::channel(256);
        let (event_tx, event_rx) = mpsc::channel(64);

        let task = tokio::spawn(run_loop(config, radio_rx, event_tx));

        (
            Self {
                radio,
                radio_tx,
                task,
            },
            event_rx,
        )
    }

    /// Start beacon detection. Start failures are surfaced to the consumer
    /// as [`DetectorEvent::ScanStartError`], not returned.
    pub fn start(&mut self) {
        if let Err(e) = self.radio.start(self.radio_tx.clone()) {
            warn!("error starting beacon scanner: {}", e);
            let _ = self
                .radio_tx
                .try_send(RadioEvent::ScanStartFailed(Some(e.to_string())));
        }
    }

    /// Stop beacon detection. Safe to call in any state, including before
    /// the first reporting tick.
    pub fn stop(&mut self) {
        self.radio.stop();
    }

    /// Deliver a radio event directly, for platform drivers that live
    /// outside the [`BleRadio`] object.
    pub async fn deliver(&self, event: RadioEvent) -> Result<(), DetectorError> {
        self.radio_tx
            .send(event)
            .await
            .map_err(|_| DetectorError::NotRunning)
    }

    /// Sender for delivering radio events from another task.
    pub fn radio_events(&self) -> mpsc::Sender<RadioEvent> {
        self.radio_tx.clone()
    }
}

impl<R: BleRadio> Drop for BeaconDetector<R> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Detector event loop. Owns the reporter; processes discovery events and
/// reporting ticks in arrival order on a single task.
async fn run_loop(
    config: Config,
    mut radio_rx: mpsc::Receiver<RadioEvent>,
    events: mpsc::Sender<DetectorEvent>,
) {
    let codec = BeaconCodec::new(&config.device_marker);
    let mut reporter = Reporter::new(config.dismiss_timeout);

    let mut scanning = false;
    let mut ticker = interval_at(Instant::now() + config.report_interval, config.report_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            maybe_event = radio_rx.recv() => {
                let Some(event) = maybe_event else {
                    // All senders dropped; nothing can reach us anymore.
                    break;
                };

                match event {
                    RadioEvent::Advertisement { manufacturer_data, rssi } => {
                        if let Some(beacon) = codec.decode(&manufacturer_data, rssi, Instant::now()) {
                            // Non-matching namespaces are silently dropped.
                            if beacon.uuid == config.beacon_uuid {
                                reporter.observe(beacon);
                            }
                        }
                    }
                    RadioEvent::ScanStarted => {
                        scanning = true;
                        ticker = interval_at(
                            Instant::now() + config.report_interval,
                            config.report_interval,
                        );
                        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                        info!("BLE scanning started");
                        let _ = events.send(DetectorEvent::ScanStart).await;
                    }
                    RadioEvent::ScanStopped => {
                        scanning = false;
                        info!("BLE scanning stopped");
                        let _ = events.send(DetectorEvent::ScanStop).await;
                    }
                    RadioEvent::ScanStartFailed(error) => {
                        warn!(?error, "BLE scan failed to start");
                        let _ = events.send(DetectorEvent::ScanStartError(error)).await;
                    }
                }
            }
            _ = ticker.tick(), if scanning => {
                for report in reporter.sweep(Instant::now()) {
                    let _ = events.send(report.into()).await;
                }
            }
        }
    }
}
