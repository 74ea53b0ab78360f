//! Tests for mc-output.

#[cfg(test)]
mod helpers {
    use mc_carpark::SimEvent;
    use mc_core::{LevelId, LotId, SimDuration, SimTime, SlotRef, VehicleId};

    pub fn slot(level: u16, lot: u16) -> SlotRef {
        SlotRef::new(LevelId(level), LotId(lot))
    }

    pub fn parked(vehicle: u32, at_ms: u64, wait_ms: u64, service_ms: u64) -> SimEvent {
        SimEvent::Parked {
            vehicle: VehicleId(vehicle),
            slot:    slot(0, 0),
            at:      SimTime(at_ms),
            wait:    SimDuration(wait_ms),
            service: SimDuration(service_ms),
        }
    }

    pub fn released(vehicle: u32, at_ms: u64, service_ms: u64) -> SimEvent {
        SimEvent::Released {
            vehicle: VehicleId(vehicle),
            slot:    slot(0, 0),
            at:      SimTime(at_ms),
            service: SimDuration(service_ms),
        }
    }

    pub fn exited(vehicle: u32, at_ms: u64, wait_ms: u64) -> SimEvent {
        SimEvent::Exited { vehicle: VehicleId(vehicle), at: SimTime(at_ms), wait: SimDuration(wait_ms) }
    }

    pub fn occupancy(at_ms: u64, occupied: &[usize], capacity: &[usize]) -> SimEvent {
        SimEvent::Occupancy { at: SimTime(at_ms), occupied: occupied.to_vec(), capacity: capacity.to_vec() }
    }
}

// ── StatsCollector ────────────────────────────────────────────────────────────

#[cfg(test)]
mod stats_tests {
    use mc_carpark::SimEvent;
    use mc_core::{SimDuration, SimTime, VehicleId};
    use mc_sim::SimObserver;

    use super::helpers::{exited, occupancy, parked, released};
    use crate::{ServiceKind, StatsCollector};

    #[test]
    fn empty_collector_has_no_means() {
        let stats = StatsCollector::new();
        assert_eq!(stats.mean_wait(ServiceKind::Park), None);
        assert_eq!(stats.mean_service(ServiceKind::Retrieve), None);
        assert_eq!(stats.mean_occupancy(0), None);
        assert_eq!(stats.peak_occupied(), 0);
    }

    #[test]
    fn counts_follow_lifecycle() {
        let mut stats = StatsCollector::new();
        for v in 0..3 {
            stats.on_event(&SimEvent::Arrived { vehicle: VehicleId(v), at: SimTime(0) });
        }
        stats.on_event(&parked(0, 60_000, 60_000, 30_000));
        stats.on_event(&parked(1, 90_000, 90_000, 30_000));
        assert_eq!(stats.waiting(), 1);
        assert_eq!(stats.inside(), 2);

        stats.on_event(&released(0, 600_000, 12_000));
        stats.on_event(&exited(0, 630_000, 48_000));
        assert_eq!(stats.exited, 1);
        assert_eq!(stats.inside(), 1);

        stats.on_event(&SimEvent::Aborted { vehicle: VehicleId(2), at: SimTime(1), reason: "test".into() });
        assert_eq!(stats.waiting(), 0);
    }

    #[test]
    fn retrieval_joins_release_and_exit() {
        let mut stats = StatsCollector::new();
        stats.record(&released(4, 100_000, 12_000));
        let done = stats.record(&exited(4, 130_000, 42_000));
        let (kind, sample) = done.unwrap();
        assert_eq!(kind, ServiceKind::Retrieve);
        assert_eq!(sample.vehicle, VehicleId(4));
        assert_eq!(sample.wait, SimDuration(42_000));
        assert_eq!(sample.service, SimDuration(12_000));
    }

    #[test]
    fn means_are_in_minutes() {
        let mut stats = StatsCollector::new();
        stats.record(&parked(0, 0, 60_000, 30_000));
        stats.record(&parked(1, 0, 180_000, 90_000));
        assert_eq!(stats.mean_wait(ServiceKind::Park), Some(2.0));
        assert_eq!(stats.mean_service(ServiceKind::Park), Some(1.0));
        assert_eq!(stats.samples(ServiceKind::Park).len(), 2);
        assert!(stats.samples(ServiceKind::Retrieve).is_empty());
    }

    #[test]
    fn occupancy_series_and_ratio() {
        let mut stats = StatsCollector::new();
        stats.record(&occupancy(0, &[0, 0], &[4, 2]));
        stats.record(&occupancy(300_000, &[2, 1], &[4, 2]));
        stats.record(&occupancy(600_000, &[4, 2], &[4, 2]));

        assert_eq!(stats.occupancy.len(), 3);
        assert_eq!(stats.mean_occupancy(0), Some(0.5));
        assert_eq!(stats.mean_occupancy(1), Some(0.5));
        assert_eq!(stats.mean_occupancy(2), None);
        assert_eq!(stats.peak_occupied(), 6);

        let report = stats.report();
        assert_eq!(report.occupancy, vec![0.5, 0.5]);
        assert!(report.to_string().contains("L1 50.0%"));
    }

    #[test]
    fn zero_capacity_level_ratio_is_zero() {
        let mut stats = StatsCollector::new();
        stats.record(&occupancy(0, &[0], &[0]));
        assert_eq!(stats.mean_occupancy(0), Some(0.0));
    }
}

// ── CsvWriter ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use crate::csv::CsvWriter;
    use crate::row::{OccupancyRow, ServiceKind, ServiceRow};
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn headers(path: &std::path::Path) -> Vec<String> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.headers().unwrap().iter().map(str::to_owned).collect()
    }

    #[test]
    fn csv_files_created_with_headers() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        assert_eq!(
            headers(&dir.path().join("service_times.csv")),
            ["vehicle", "kind", "at_min", "wait_min", "service_min"]
        );
        assert_eq!(
            headers(&dir.path().join("occupancy.csv")),
            ["at_min", "level", "occupied", "capacity", "ratio"]
        );
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tmp();
        let nested = dir.path().join("runs").join("balanced");
        let _w = CsvWriter::new(&nested).unwrap();
        assert!(nested.join("occupancy.csv").exists());
    }

    #[test]
    fn service_rows_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_service(&ServiceRow {
            vehicle:     7,
            kind:        ServiceKind::Retrieve,
            at_min:      12.5,
            wait_min:    0.7,
            service_min: 0.15,
        })
        .unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("service_times.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "7");
        assert_eq!(&rows[0][1], "retrieve");
        assert_eq!(&rows[0][2], "12.50");
        assert_eq!(&rows[0][3], "0.70");
    }

    #[test]
    fn occupancy_rows_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        let rows = [
            OccupancyRow { at_min: 5.0, level: 0, occupied: 3, capacity: 4 },
            OccupancyRow { at_min: 5.0, level: 1, occupied: 0, capacity: 4 },
        ];
        w.write_occupancy(&rows).unwrap();
        w.write_occupancy(&[]).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("occupancy.csv")).unwrap();
        let read: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(read.len(), 2);
        assert_eq!(&read[0][4], "0.7500");
        assert_eq!(&read[1][1], "1");
    }

    #[test]
    fn collected_stats_dump() {
        use super::helpers::{exited, occupancy, parked, released};
        use crate::{StatsCollector, write_stats};

        let mut stats = StatsCollector::new();
        stats.record(&occupancy(0, &[0, 0], &[2, 2]));
        stats.record(&parked(0, 60_000, 60_000, 30_000));
        stats.record(&released(0, 600_000, 12_000));
        stats.record(&exited(0, 630_000, 48_000));
        stats.record(&occupancy(300_000, &[1, 0], &[2, 2]));

        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        write_stats(&mut w, &stats).unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("service_times.csv")).unwrap();
        let kinds: Vec<String> = rdr.records().map(|r| r.unwrap()[1].to_owned()).collect();
        assert_eq!(kinds, ["park", "retrieve"]);
        let mut rdr = csv::Reader::from_path(dir.path().join("occupancy.csv")).unwrap();
        assert_eq!(rdr.records().count(), 4);
    }
}

// ── End-to-end ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod integration {
    use mc_carpark::Policy;
    use mc_core::{CarparkConfig, LotGeometry, SimDuration};
    use mc_sim::{ArrivalSchedule, SimBuilder, SimConfig, StaySampler};

    use crate::{CsvWriter, ServiceKind, SimOutputObserver};

    fn two_lots() -> CarparkConfig {
        CarparkConfig {
            levels:             1,
            lots:               vec![
                LotGeometry { lateral: 3, turn: true },
                LotGeometry { lateral: 4, turn: false },
            ],
            level_capacity:     None,
            track_length:       5,
            lift_positions:     vec![1],
            default_lift_level: 0,
            shuttles_per_level: 1,
            shuttle_home:       1,
            drive_in_out_min:   (0.5, 0.5),
            lobby:              None,
            ..CarparkConfig::changi()
        }
    }

    #[test]
    fn run_writes_every_service_and_sample() {
        let dir = tempfile::tempdir().unwrap();
        let mut sim = SimBuilder::new(SimConfig::default(), two_lots(), Policy::NearestFirst)
            .arrivals(ArrivalSchedule::new(vec![2, 1]))
            .stay(StaySampler::Fixed(SimDuration::from_minutes(12.0)))
            .build()
            .unwrap();

        let mut obs = SimOutputObserver::new(CsvWriter::new(dir.path()).unwrap());
        let summary = sim.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none());

        let stats = obs.stats();
        assert_eq!(stats.parked, 3);
        assert_eq!(stats.exited, 3);
        assert_eq!(stats.summary(), Some(&summary));
        assert_eq!(stats.occupancy.len(), summary.samples);

        // Drive-in is a fixed half minute; queueing only adds to the wait.
        for s in stats.samples(ServiceKind::Park) {
            assert!(s.wait.0 >= s.service.0 + 30_000);
        }
        for s in stats.samples(ServiceKind::Retrieve) {
            assert!(s.wait > s.service && !s.service.is_zero());
        }
        assert!(stats.peak_occupied() <= 2);

        let mut rdr = csv::Reader::from_path(dir.path().join("service_times.csv")).unwrap();
        assert_eq!(rdr.records().count(), 6);
        let mut rdr = csv::Reader::from_path(dir.path().join("occupancy.csv")).unwrap();
        assert_eq!(rdr.records().count(), summary.samples);
    }
}
