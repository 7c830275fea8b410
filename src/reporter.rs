//! Reporting sweep - eviction, change detection and notification selection
//!
//! One sweep runs per reporting interval while scanning: evict stale
//! beacons, snapshot the registry in canonical order, and decide whether the
//! consumer needs to hear about it. Unchanged state emits nothing, so a
//! consumer only ever sees transitions.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::beacon::Beacon;
use crate::registry::BeaconRegistry;

/// A notification produced by a sweep, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// The reportable beacon set changed; carries the full sorted list.
    Beacons(Vec<Beacon>),
    /// The best beacon changed, or there no longer is one.
    BestBeacon(Option<Beacon>),
}

/// Owns the registry and the last-reported snapshot state.
///
/// All mutation happens inside [`Reporter::observe`] and
/// [`Reporter::sweep`]; the detector task serializes the two.
#[derive(Debug)]
pub struct Reporter {
    registry: BeaconRegistry,
    dismiss_timeout: Duration,
    last_reported: Vec<Beacon>,
    last_best: Option<Beacon>,
}

impl Reporter {
    pub fn new(dismiss_timeout: Duration) -> Self {
        Self {
            registry: BeaconRegistry::new(),
            dismiss_timeout,
            last_reported: Vec::new(),
            last_best: None,
        }
    }

    /// Record a decoded sighting.
    pub fn observe(&mut self, beacon: Beacon) {
        debug!(%beacon, "beacon sighted");
        self.registry.upsert(beacon);
    }

    /// Run one reporting sweep and return the notifications to emit.
    pub fn sweep(&mut self, now: Instant) -> Vec<Report> {
        let mut reports = Vec::new();

        self.registry.evict_stale(now, self.dismiss_timeout);
        let current = self.registry.snapshot_sorted();

        if self.list_changed(&current) {
            info!(count = current.len(), "beacon list updated");
            reports.push(Report::Beacons(current.clone()));
            self.last_reported = current.clone();
        }

        // Best beacon is recomputed every sweep, independent of whether the
        // list itself changed.
        let best = pick_best(&current).cloned();
        if self.best_changed(best.as_ref()) {
            match &best {
                Some(beacon) => info!(%beacon, "best beacon updated"),
                None => info!("no current best beacon"),
            }
            reports.push(Report::BestBeacon(best.clone()));
            self.last_best = best;
        }

        reports
    }

    /// Identity-field list comparison: a positional uuid or join-code change
    /// (or a length change) makes the list reportable. Distance jitter and
    /// refreshed timestamps alone do not.
    fn list_changed(&self, current: &[Beacon]) -> bool {
        current.len() != self.last_reported.len()
            || current
                .iter()
                .zip(&self.last_reported)
                .any(|(a, b)| !a.same_identity(b))
    }

    /// Best-beacon hysteresis: re-emit only when the join code or proximity
    /// bucket changes, or on transitions to/from having no beacon at all.
    fn best_changed(&self, best: Option<&Beacon>) -> bool {
        match (best, &self.last_best) {
            (None, None) => false,
            (Some(current), Some(previous)) => {
                current.join_code != previous.join_code
                    || current.proximity != previous.proximity
            }
            _ => true,
        }
    }
}

/// Select the best beacon: stable ascending sort by distance, last element
/// wins. Maximum distance as "best" (and last-wins on ties) is deployed
/// behavior that consumers depend on.
fn pick_best(current: &[Beacon]) -> Option<&Beacon> {
    let mut by_distance: Vec<&Beacon> = current.iter().collect();
    by_distance.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    by_distance.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacon::Proximity;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn beacon(join_code: &str, distance: f64, last_seen: Instant) -> Beacon {
        Beacon {
            uuid: "bf23c311-24ae-414b-b153-cf097836947f".to_string(),
            join_code: join_code.to_string(),
            distance,
            proximity: Proximity::from_distance(distance),
            last_seen,
        }
    }

    #[test]
    fn test_empty_registry_first_sweep_emits_nothing() {
        let mut reporter = Reporter::new(TIMEOUT);
        assert!(reporter.sweep(Instant::now()).is_empty());
    }

    #[test]
    fn test_new_beacon_reports_list_then_best() {
        let mut reporter = Reporter::new(TIMEOUT);
        let now = Instant::now();
        let b = beacon("a", 1.5, now);

        reporter.observe(b.clone());
        let reports = reporter.sweep(now);

        assert_eq!(
            reports,
            vec![
                Report::Beacons(vec![b.clone()]),
                Report::BestBeacon(Some(b)),
            ]
        );
    }

    #[test]
    fn test_unchanged_second_sweep_is_silent() {
        let mut reporter = Reporter::new(TIMEOUT);
        let now = Instant::now();

        reporter.observe(beacon("a", 1.5, now));
        assert_eq!(reporter.sweep(now).len(), 2);
        assert!(reporter.sweep(now + Duration::from_secs(2)).is_empty());
    }

    #[test]
    fn test_distance_jitter_does_not_rereport() {
        let mut reporter = Reporter::new(TIMEOUT);
        let now = Instant::now();

        reporter.observe(beacon("a", 1.5, now));
        reporter.sweep(now);

        // Same device, same bucket, slightly different distance.
        let later = now + Duration::from_secs(2);
        reporter.observe(beacon("a", 1.7, later));
        assert!(reporter.sweep(later).is_empty());
    }

    #[test]
    fn test_bucket_change_rereports_best_only() {
        let mut reporter = Reporter::new(TIMEOUT);
        let now = Instant::now();

        reporter.observe(beacon("a", 1.5, now));
        reporter.sweep(now);

        let later = now + Duration::from_secs(2);
        let moved = beacon("a", 3.5, later);
        reporter.observe(moved.clone());

        let reports = reporter.sweep(later);
        assert_eq!(reports, vec![Report::BestBeacon(Some(moved))]);
    }

    #[test]
    fn test_farthest_beacon_is_best() {
        let mut reporter = Reporter::new(TIMEOUT);
        let now = Instant::now();

        reporter.observe(beacon("near", 0.5, now));
        reporter.observe(beacon("far", 4.0, now));

        let reports = reporter.sweep(now);
        match reports.last() {
            Some(Report::BestBeacon(Some(best))) => assert_eq!(best.join_code, "far"),
            other => panic!("expected best beacon report, got {:?}", other),
        }
    }

    #[test]
    fn test_equal_distance_tie_breaks_to_last_in_snapshot_order() {
        let mut reporter = Reporter::new(TIMEOUT);
        let now = Instant::now();

        // Same uuid, so snapshot order is by join code: a then b. The stable
        // distance sort keeps that order, and the last element wins.
        reporter.observe(beacon("a", 1.0, now));
        reporter.observe(beacon("b", 1.0, now));

        let reports = reporter.sweep(now);
        match reports.last() {
            Some(Report::BestBeacon(Some(best))) => assert_eq!(best.join_code, "b"),
            other => panic!("expected best beacon report, got {:?}", other),
        }
    }

    #[test]
    fn test_single_best_even_when_rounding_splits_buckets() {
        let mut reporter = Reporter::new(TIMEOUT);
        let now = Instant::now();

        // Two beacons straddling the 3 m boundary with equal distances after
        // rounding elsewhere; exactly one may be selected per sweep.
        let mut far = beacon("x", 3.0, now);
        far.proximity = Proximity::Far;
        let mut near = beacon("y", 3.0, now);
        near.proximity = Proximity::Near;
        reporter.observe(far);
        reporter.observe(near);

        let reports = reporter.sweep(now);
        let best_count = reports
            .iter()
            .filter(|r| matches!(r, Report::BestBeacon(_)))
            .count();
        assert_eq!(best_count, 1);
    }

    #[test]
    fn test_eviction_reports_empty_list_and_no_best() {
        let mut reporter = Reporter::new(TIMEOUT);
        let now = Instant::now();

        reporter.observe(beacon("a", 1.5, now));
        reporter.sweep(now);

        let later = now + Duration::from_secs(7);
        let reports = reporter.sweep(later);
        assert_eq!(
            reports,
            vec![Report::Beacons(Vec::new()), Report::BestBeacon(None)]
        );

        // The none-state is only reported once.
        assert!(reporter.sweep(later + Duration::from_secs(2)).is_empty());
    }

    #[test]
    fn test_membership_change_reports_new_list() {
        let mut reporter = Reporter::new(TIMEOUT);
        let now = Instant::now();

        reporter.observe(beacon("a", 1.5, now));
        reporter.sweep(now);

        let later = now + Duration::from_secs(2);
        reporter.observe(beacon("a", 1.5, later));
        reporter.observe(beacon("b", 0.5, later));

        let reports = reporter.sweep(later);
        match &reports[0] {
            Report::Beacons(list) => {
                assert_eq!(list.len(), 2);
                assert_eq!(list[0].join_code, "a");
                assert_eq!(list[1].join_code, "b");
            }
            other => panic!("expected list report, got {:?}", other),
        }
    }
}
