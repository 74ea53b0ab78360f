//! Unit tests for mc-core primitives.

#[cfg(test)]
mod ids {
    use crate::{LevelId, LotId, SlotRef, VehicleId};

    #[test]
    fn index_roundtrip() {
        let id = VehicleId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(VehicleId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn overflowing_conversion_fails() {
        assert!(LotId::try_from(70_000usize).is_err());
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(VehicleId::INVALID.0, u32::MAX);
        assert_eq!(LevelId::INVALID.0, u16::MAX);
        assert_eq!(LotId::default(), LotId::INVALID);
    }

    #[test]
    fn display() {
        assert_eq!(VehicleId(7).to_string(), "VehicleId(7)");
        assert_eq!(SlotRef::new(LevelId(1), LotId(12)).to_string(), "L1/12");
    }

    #[test]
    fn slot_ordering_is_level_major() {
        let a = SlotRef::new(LevelId(0), LotId(30));
        let b = SlotRef::new(LevelId(1), LotId(0));
        assert!(a < b);
    }
}

#[cfg(test)]
mod time {
    use crate::{SimDuration, SimTime, round2};

    #[test]
    fn minutes_convert_exactly_at_two_decimals() {
        assert_eq!(SimDuration::from_minutes(0.05).as_millis(), 3_000);
        assert_eq!(SimDuration::from_minutes(1.23).as_millis(), 73_800);
        assert_eq!(SimDuration::from_secs(30), SimDuration::from_minutes(0.5));
    }

    #[test]
    fn negative_and_nan_clamp_to_zero() {
        assert!(SimDuration::from_minutes(-1.0).is_zero());
        assert!(SimDuration::from_minutes(f64::NAN).is_zero());
    }

    #[test]
    fn instant_arithmetic() {
        let t = SimTime::ZERO + SimDuration::from_minutes(2.0);
        assert_eq!(t, SimTime::from_minutes(2.0));
        assert_eq!(t - SimTime::ZERO, SimDuration::from_millis(120_000));
        assert_eq!(SimTime::ZERO.since(t), SimDuration::ZERO);
    }

    #[test]
    fn durations_sum() {
        let total: SimDuration = [0.05, 0.27, 0.14]
            .into_iter()
            .map(SimDuration::from_minutes)
            .sum();
        assert_eq!(total, SimDuration::from_minutes(0.46));
    }

    #[test]
    fn round2_half_up() {
        assert_eq!(round2(0.0533), 0.05);
        assert_eq!(round2(0.1428), 0.14);
        assert_eq!(round2(1.0), 1.0);
    }

    #[test]
    fn display() {
        assert_eq!(SimDuration::from_minutes(1.5).to_string(), "1.50min");
        assert_eq!(SimTime::from_minutes(3.0).to_string(), "t=3.00");
    }
}

#[cfg(test)]
mod rng {
    use crate::SimRng;

    #[test]
    fn deterministic_sequence() {
        let mut a = SimRng::new(42);
        let mut b = SimRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.gen_range(0..u64::MAX), b.gen_range(0..u64::MAX));
        }
    }

    #[test]
    fn children_are_independent_of_each_other() {
        let mut root = SimRng::new(7);
        let mut c1 = root.child(1);
        let mut c2 = root.child(2);
        let v1: Vec<u64> = (0..8).map(|_| c1.gen_range(0..u64::MAX)).collect();
        let v2: Vec<u64> = (0..8).map(|_| c2.gen_range(0..u64::MAX)).collect();
        assert_ne!(v1, v2);
    }

    #[test]
    fn gen_range_in_bounds() {
        let mut rng = SimRng::new(3);
        for _ in 0..1_000 {
            let x: u32 = rng.gen_range(0..=5);
            assert!(x <= 5);
        }
    }

    #[test]
    fn choose_empty_is_none() {
        let mut rng = SimRng::new(0);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
    }
}

#[cfg(test)]
mod config {
    use crate::{CarparkConfig, CoreError, LevelId, LobbyConfig};

    #[test]
    fn changi_layout() {
        let cfg = CarparkConfig::changi();
        cfg.validate().unwrap();
        assert_eq!(cfg.lots.len(), 39);
        assert_eq!(cfg.total_slots(), 78);
        assert_eq!(cfg.slot_permit_capacity(true), 78);
        assert_eq!(cfg.lots.iter().filter(|l| l.turn).count(), 26);
        assert!(cfg.lots.iter().all(|l| l.lateral <= cfg.track_length));
    }

    #[test]
    fn changi_cache_reserves_slots() {
        let cfg = CarparkConfig::changi_cache();
        cfg.validate().unwrap();
        assert_eq!(cfg.capacity(LevelId(0)), 6);
        assert_eq!(cfg.total_slots(), 6 + 39 + 39);
        assert_eq!(cfg.reserved_slots(true), 3);
        assert_eq!(cfg.slot_permit_capacity(true), 84 - 3);
    }

    #[test]
    fn unused_lobby_reserves_nothing() {
        let cfg = CarparkConfig::changi_cache();
        assert_eq!(cfg.reserved_slots(false), 0);
        assert_eq!(cfg.slot_permit_capacity(false), 84);
    }

    #[test]
    fn rejects_zero_levels() {
        let cfg = CarparkConfig { levels: 0, ..CarparkConfig::changi() };
        assert!(matches!(cfg.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn rejects_missing_lifts() {
        let cfg = CarparkConfig { lift_positions: vec![], ..CarparkConfig::changi() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_mismatched_level_capacity() {
        let cfg = CarparkConfig {
            level_capacity: Some(vec![1]),
            ..CarparkConfig::changi()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_drive_range() {
        let cfg = CarparkConfig { drive_in_out_min: (0.5, 0.1), ..CarparkConfig::changi() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_lobby_reserving_everything() {
        let cfg = CarparkConfig {
            levels:         1,
            level_capacity: Some(vec![2]),
            lobby: Some(LobbyConfig { positions: vec![13], reserved_slots: 2 }),
            ..CarparkConfig::changi()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_shuttles_is_structurally_valid() {
        // Detected at run time as policy exhaustion, not here.
        let cfg = CarparkConfig { shuttles_per_level: 0, ..CarparkConfig::changi() };
        assert!(cfg.validate().is_ok());
    }
}
