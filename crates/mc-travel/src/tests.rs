//! Unit tests for mc-travel.

#[cfg(test)]
mod helpers {
    use mc_core::{CarparkConfig, LotGeometry};

    /// One level, three lots, one lift at lateral 0.
    pub fn tiny() -> CarparkConfig {
        CarparkConfig {
            levels:         1,
            lots:           vec![
                LotGeometry { lateral: 0, turn: false },
                LotGeometry { lateral: 2, turn: true },
                LotGeometry { lateral: 5, turn: false },
            ],
            level_capacity: None,
            track_length:   5,
            lift_positions: vec![0],
            shuttle_home:   0,
            ..CarparkConfig::changi()
        }
    }
}

#[cfg(test)]
mod model {
    use mc_core::{CarparkConfig, LevelId, LotGeometry, SimDuration};

    use crate::{Stage, TravelParams};

    fn changi_params() -> TravelParams {
        TravelParams::from_config(&CarparkConfig::changi()).unwrap()
    }

    #[test]
    fn changi_north_lot_components() {
        let p = changi_params();
        let t = p.stage_times(9, &LotGeometry { lateral: 1, turn: true });
        assert_eq!(t.lift_pallet, 0.05); // 2.4 / 45
        assert_eq!(t.origin_lot, 0.21); // 2.4 * 8 / 90
        assert_eq!(t.turning, 0.14); // 180 / (3.5 * 360)
        assert_eq!(t.pallet_lot, 0.05);
        assert_eq!(t.total, 0.45);
        assert_eq!(t.total_without_turn(), 0.31);
    }

    #[test]
    fn side_bay_lots_do_not_turn() {
        let p = changi_params();
        let t = p.stage_times(18, &LotGeometry { lateral: 20, turn: false });
        assert_eq!(t.turning, 0.0);
        assert_eq!(t.origin_lot, 0.05); // 2.4 * 2 / 90 = 0.0533
        assert_eq!(t.total, 0.15);
    }

    #[test]
    fn durations_are_whole_hundredths() {
        let p = changi_params();
        let t = p.stage_times(12, &LotGeometry { lateral: 26, turn: true });
        let sum: SimDuration = Stage::PARK_ORDER.iter().map(|&s| t.duration(s)).sum();
        assert_eq!(sum, t.total_duration());
        assert_eq!(t.duration(Stage::LiftPallet), SimDuration::from_secs(3));
    }

    #[test]
    fn lift_travel_is_symmetric() {
        let p = changi_params();
        let up = p.lift_travel(LevelId(0), LevelId(1));
        assert_eq!(up, p.lift_travel(LevelId(1), LevelId(0)));
        // 2.5 m / 65 m/min
        assert_eq!(up, SimDuration::from_minutes(2.5 / 65.0));
        assert!(p.lift_travel(LevelId(1), LevelId(1)).is_zero());
    }

    #[test]
    fn shuttle_travel_scales_with_distance() {
        let p = changi_params();
        assert_eq!(p.shuttle_travel(13, 9), SimDuration::from_minutes(2.4 * 4.0 / 90.0));
        assert!(p.shuttle_travel(13, 13).is_zero());
    }

    #[test]
    fn rejects_non_positive_speed() {
        let mut cfg = CarparkConfig::changi();
        cfg.speeds.pallet_m_per_min = 0.0;
        assert!(TravelParams::from_config(&cfg).is_err());
        cfg.speeds.pallet_m_per_min = f64::NAN;
        assert!(TravelParams::from_config(&cfg).is_err());
    }
}

#[cfg(test)]
mod table {
    use mc_core::{CarparkConfig, LiftId, LobbyConfig, LotGeometry, LotId};

    use super::helpers::tiny;
    use crate::{TravelError, TravelModel};

    #[test]
    fn one_table_per_lift_with_every_lot() {
        let cfg = CarparkConfig::changi();
        let model = TravelModel::build(&cfg).unwrap();
        assert_eq!(model.lift_count(), 4);
        assert_eq!(model.lobby_count(), 0);
        for l in 0..4 {
            let table = model.lift(LiftId(l)).unwrap();
            assert_eq!(table.len(), 39);
            assert_eq!(table.origin(), cfg.lift_positions[l as usize]);
        }
        assert!(model.lift(LiftId(4)).is_none());
    }

    #[test]
    fn same_origin_gives_identical_tables() {
        let cfg = CarparkConfig { lift_positions: vec![9, 9], ..CarparkConfig::changi() };
        let model = TravelModel::build(&cfg).unwrap();
        assert_eq!(model.lift(LiftId(0)), model.lift(LiftId(1)));
    }

    #[test]
    fn nearest_prefers_smallest_total_then_first() {
        let model = TravelModel::build(&tiny()).unwrap();
        let table = model.lift(LiftId(0)).unwrap();
        assert_eq!(table.nearest([LotId(2), LotId(1), LotId(0)]), Some(LotId(0)));
        // lot 2 is further laterally but lot 1 needs a turn.
        assert_eq!(table.nearest([LotId(1), LotId(2)]), Some(LotId(2)));
        assert_eq!(table.nearest([LotId(9)]), None);
        assert_eq!(table.nearest(std::iter::empty()), None);
    }

    #[test]
    fn lobby_tables_are_built() {
        let model = TravelModel::build(&CarparkConfig::changi_cache()).unwrap();
        assert_eq!(model.lobby_count(), 1);
        assert_eq!(model.lobby(LiftId(0)).unwrap().origin(), 13);
    }

    #[test]
    fn unreachable_lot_fails_fast() {
        let mut cfg = tiny();
        cfg.lots.push(LotGeometry { lateral: 6, turn: false });
        match TravelModel::build(&cfg) {
            Err(TravelError::UnreachableLot { lot, lateral, .. }) => {
                assert_eq!(lot, LotId(3));
                assert_eq!(lateral, 6);
            }
            other => panic!("expected UnreachableLot, got {other:?}"),
        }
    }

    #[test]
    fn off_track_units_fail_fast() {
        let cfg = CarparkConfig { lift_positions: vec![0, 7], ..tiny() };
        assert!(matches!(
            TravelModel::build(&cfg),
            Err(TravelError::OffTrack { what: "lift", index: 1, .. })
        ));

        let cfg = CarparkConfig {
            lobby: Some(LobbyConfig { positions: vec![99], reserved_slots: 1 }),
            ..tiny()
        };
        assert!(matches!(
            TravelModel::build(&cfg),
            Err(TravelError::OffTrack { what: "lobby unit", .. })
        ));
    }

    #[test]
    fn empty_layout_is_rejected() {
        let cfg = CarparkConfig { lots: vec![], ..tiny() };
        assert!(matches!(TravelModel::build(&cfg), Err(TravelError::EmptyLayout)));
    }

    #[test]
    fn structural_errors_pass_through() {
        let cfg = CarparkConfig { levels: 0, ..tiny() };
        assert!(matches!(TravelModel::build(&cfg), Err(TravelError::Core(_))));
    }
}
