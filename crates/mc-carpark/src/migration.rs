//! Cache-tier migration: relocate a vehicle from the ground tier to an
//! upper level while it is parked, so the ground lot is free for the next
//! arrival.
//!
//! # Stage markers
//!
//! | Marker | Stage                                                       |
//! |--------|-------------------------------------------------------------|
//! | 0      | waiting for a target level and idle units                   |
//! | 1      | units acquired; ground shuttle moves to the vehicle's lot   |
//! | 2      | lift travels to the ground level                            |
//! | 3      | `pallet_lot` reversed: vehicle onto the pallet              |
//! | 4      | `origin_lot` then `lift_pallet` reversed: vehicle into lift |
//! | 5      | lift ascends with the vehicle                               |
//! | 6      | target shuttle moves to the bay                             |
//! | 7      | target lot claimed; `lift_pallet` into the target shuttle   |
//! | 8      | `origin_lot`, `turning`, `pallet_lot` into the target lot   |
//! | 9      | committed                                                   |
//!
//! Units are taken in one step with `try_*` calls, so a migration never
//! waits while holding anything.  Cancellation is observed at the end of
//! the in-flight sub-stage, except the ascent, which reverses on the spot.
//! Up to marker 6 the undo log is unwound; from marker 7 the migration is
//! finished instead, since the target lot is already claimed.
//!
//! The ground lot stays occupied until commit, so a cancelled migration
//! always has somewhere to put the vehicle back.

use mc_core::{LevelId, SimDuration, SlotRef, VehicleId};
use mc_sched::{CancelToken, Ticket};
use mc_travel::{Stage, StageTimes};
use tracing::{debug, error, info};

use crate::policy::{self, GROUND};
use crate::workflow::RETRIEVE_ORDER;
use crate::{Carpark, CarparkError, CarparkResult, EntityRef, Lift, MigrationOutcome, Position, Shuttle, SimEvent};

/// What cancellation does at a given marker.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RollbackPlan {
    /// Nothing acquired yet, or already committed.
    Nothing,
    /// Finish the sub-stage, then unwind the undo log.
    Undo,
    /// Finish the migration.
    RollForward,
}

/// Map a stage marker to its cancellation behaviour.
pub fn rollback_plan(vehicle: VehicleId, marker: u8) -> CarparkResult<RollbackPlan> {
    match marker {
        0 | 9 => Ok(RollbackPlan::Nothing),
        1..=6 => Ok(RollbackPlan::Undo),
        7 | 8 => Ok(RollbackPlan::RollForward),
        _ => Err(CarparkError::InvalidStateTransition { vehicle, marker }),
    }
}

/// One completed step, undone in reverse order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Undo {
    MigrationPermit,
    ReserveLevel,
    TargetShuttle,
    Lift,
    GroundShuttle,
    Extracted,
    Ascended,
}

/// Everything an in-flight migration holds.
struct Run {
    vehicle:        VehicleId,
    origin:         SlotRef,
    target:         LevelId,
    marker:         u8,
    undo:           Vec<Undo>,
    ticket:         Ticket,
    lift:           Lift,
    ground_shuttle: Shuttle,
    target_shuttle: Shuttle,
    /// Extraction stages completed so far, in order.
    extracted:      Vec<Stage>,
    /// Lift bay to the ground lot.
    out_times:      StageTimes,
    target_slot:    Option<SlotRef>,
}

enum Progress {
    Done,
    Cancelled,
}

impl Carpark {
    /// Relocate a ground-tier vehicle to an upper level unless `token` is
    /// cancelled first.  Returns where the vehicle ends up.
    pub async fn migrate(&self, vehicle: VehicleId, token: CancelToken) -> CarparkResult<MigrationOutcome> {
        let origin = self.parked_slot(vehicle)?;
        if !self.migrates(origin) {
            return Ok(MigrationOutcome::RolledBack { marker: 0, slot: origin });
        }
        let Some(mut run) = self.acquire_migration(vehicle, origin, &token).await else {
            debug!(vehicle = %vehicle, "migration cancelled before start");
            return Ok(MigrationOutcome::RolledBack { marker: 0, slot: origin });
        };

        match self.advance(&mut run, &token).await {
            Ok(Progress::Done) => Ok(self.commit(run)),
            Ok(Progress::Cancelled) => {
                let marker = run.marker;
                let slot = self.unwind(run).await;
                Ok(MigrationOutcome::RolledBack { marker, slot })
            }
            Err(err) => {
                error!(vehicle = %vehicle, marker = run.marker, error = %err, "migration failed, compensating");
                self.unwind(run).await;
                Err(err)
            }
        }
    }

    // ── Acquisition ───────────────────────────────────────────────────────

    async fn acquire_migration(&self, vehicle: VehicleId, origin: SlotRef, token: &CancelToken) -> Option<Run> {
        loop {
            if token.is_cancelled() {
                return None;
            }
            let signal = self.changed.notified();
            if let Some(run) = self.try_acquire_migration(vehicle, origin) {
                return Some(run);
            }
            if token.guard(signal).await.is_err() {
                return None;
            }
        }
    }

    /// Take the migration permit, a target reservation, the target shuttle,
    /// the lift nearest the ground lot and the ground shuttle, all or
    /// nothing.
    fn try_acquire_migration(&self, vehicle: VehicleId, origin: SlotRef) -> Option<Run> {
        let permit = self.migration_permit.as_ref()?;
        let ground_pool = self.shuttles.get(GROUND.index())?;
        if permit.available() == 0 || ground_pool.is_empty() {
            return None;
        }
        let target = self.with_state(|s| {
            s.levels
                .iter()
                .enumerate()
                .skip(1)
                .find(|(i, l)| l.free > 0 && self.shuttles.get(*i).is_some_and(|p| !p.is_empty()))
                .map(|(i, _)| LevelId(i as u16))
        })?;
        let lift_id = self.lifts.inspect(|idle| {
            idle.iter()
                .map(|l| (l.id, l.table.get(origin.lot).map_or(f64::INFINITY, |t| t.total_without_turn())))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id)
        })?;

        let target_pool = &self.shuttles[target.index()];
        let ticket = permit.try_request()?;
        let target_shuttle = target_pool.try_get()?;
        let Some(lift) = self.lifts.try_get_where(|l| l.id == lift_id) else {
            target_pool.put(target_shuttle);
            return None;
        };
        let Some(ground_shuttle) = ground_pool.try_get() else {
            target_pool.put(target_shuttle);
            self.lifts.put(lift);
            return None;
        };
        self.state.borrow_mut().reserve(target);

        debug!(
            vehicle = %vehicle,
            from = %origin,
            target = %target,
            lift = %lift.id,
            now = %self.now(),
            "migration units acquired"
        );
        Some(Run {
            vehicle,
            origin,
            target,
            marker: 0,
            undo: vec![
                Undo::MigrationPermit,
                Undo::ReserveLevel,
                Undo::TargetShuttle,
                Undo::Lift,
                Undo::GroundShuttle,
            ],
            ticket,
            out_times: self.times(&lift, origin.lot),
            lift,
            ground_shuttle,
            target_shuttle,
            extracted: Vec::new(),
            target_slot: None,
        })
    }

    // ── Forward path ──────────────────────────────────────────────────────

    fn set_marker(&self, run: &mut Run, marker: u8) {
        run.marker = marker;
        self.with_vehicle(run.vehicle, |v| v.marker = marker);
        debug!(vehicle = %run.vehicle, marker, now = %self.now(), "migration stage");
    }

    /// Wait out `duration`.  Cancellation wakes the wait early, but the
    /// remaining time still elapses so the sub-stage completes.
    async fn finish_stage(&self, token: &CancelToken, duration: SimDuration) {
        let deadline = self.now() + duration;
        if token.guard(self.sched.sleep_until(deadline)).await.is_err() {
            self.sched.sleep_until(deadline).await;
        }
    }

    /// Whether the forward path should stop and unwind.
    fn should_unwind(&self, run: &Run, token: &CancelToken) -> CarparkResult<bool> {
        if !token.is_cancelled() {
            return Ok(false);
        }
        Ok(rollback_plan(run.vehicle, run.marker)? == RollbackPlan::Undo)
    }

    async fn transfer_step(
        &self,
        run:    &mut Run,
        token:  &CancelToken,
        stage:  Stage,
        times:  StageTimes,
        target: bool,
        toward: u32,
    ) {
        let vehicle = run.vehicle;
        let shuttle = if target { &mut run.target_shuttle } else { &mut run.ground_shuttle };
        let duration = self.begin_transfer(vehicle, stage, &times, shuttle, toward);
        self.finish_stage(token, duration).await;
        Self::end_transfer(stage, shuttle, toward);
    }

    async fn advance(&self, run: &mut Run, token: &CancelToken) -> CarparkResult<Progress> {
        let lot_lateral = self.lot_lateral(run.origin.lot);
        let bay = run.lift.lateral;

        self.set_marker(run, 1);
        let d = self.begin_shuttle_move(&run.ground_shuttle, lot_lateral);
        self.finish_stage(token, d).await;
        run.ground_shuttle.lateral = lot_lateral;
        if self.should_unwind(run, token)? {
            return Ok(Progress::Cancelled);
        }

        self.set_marker(run, 2);
        let d = self.begin_lift_move(&run.lift, GROUND);
        self.finish_stage(token, d).await;
        run.lift.level = GROUND;
        if self.should_unwind(run, token)? {
            return Ok(Progress::Cancelled);
        }

        let out_times = run.out_times;
        for (marker, stages) in [(3, &RETRIEVE_ORDER[..1]), (4, &RETRIEVE_ORDER[1..])] {
            self.set_marker(run, marker);
            if marker == 3 {
                run.undo.push(Undo::Extracted);
            }
            for &stage in stages {
                self.transfer_step(run, token, stage, out_times, false, bay).await;
                run.extracted.push(stage);
                if self.should_unwind(run, token)? {
                    return Ok(Progress::Cancelled);
                }
            }
        }

        self.set_marker(run, 5);
        if !self.ascend(run, token).await {
            return Ok(Progress::Cancelled);
        }
        if self.should_unwind(run, token)? {
            return Ok(Progress::Cancelled);
        }

        self.set_marker(run, 6);
        let d = self.begin_shuttle_move(&run.target_shuttle, bay);
        self.finish_stage(token, d).await;
        run.target_shuttle.lateral = bay;
        if self.should_unwind(run, token)? {
            return Ok(Progress::Cancelled);
        }

        let lot = {
            let mut state = self.state.borrow_mut();
            let lot = state.level(run.target).and_then(|l| policy::nearest_lot(l, &run.lift.table));
            lot.filter(|&lot| state.claim(run.target, lot))
        };
        let Some(lot) = lot else {
            return Err(CarparkError::NoFreeLot { vehicle: run.vehicle, level: run.target });
        };
        run.undo.retain(|u| *u != Undo::ReserveLevel);
        run.target_slot = Some(SlotRef::new(run.target, lot));
        let in_times = self.times(&run.lift, lot);
        let target_lateral = self.lot_lateral(lot);

        self.set_marker(run, 7);
        self.transfer_step(run, token, Stage::LiftPallet, in_times, true, target_lateral).await;

        self.set_marker(run, 8);
        for stage in [Stage::OriginLot, Stage::Turning, Stage::PalletLot] {
            self.transfer_step(run, token, stage, in_times, true, target_lateral).await;
        }
        if token.is_cancelled() && rollback_plan(run.vehicle, run.marker)? == RollbackPlan::RollForward {
            debug!(vehicle = %run.vehicle, "cancelled after target claim, finished anyway");
        }
        Ok(Progress::Done)
    }

    /// Lift the vehicle to the target level.  On cancellation mid-ascent
    /// the lift reverses for the time already travelled and `false` is
    /// returned.
    async fn ascend(&self, run: &mut Run, token: &CancelToken) -> bool {
        let start = self.now();
        let from = run.lift.level;
        let duration = self.begin_lift_move(&run.lift, run.target);
        let arrived = token.guard(self.sched.sleep(duration)).await.is_ok();
        if arrived {
            run.lift.level = run.target;
            run.undo.push(Undo::Ascended);
            return true;
        }
        let elapsed = self.now().since(start);
        self.emit(SimEvent::Motion {
            entity: EntityRef::Lift(run.lift.id),
            from: Position::InShaft { from, to: run.target, travelled: elapsed },
            to: Position::Level(from),
            start: self.now(),
            duration: elapsed,
        });
        self.sched.sleep(elapsed).await;
        debug!(vehicle = %run.vehicle, now = %self.now(), "ascent reversed");
        false
    }

    fn commit(&self, run: Run) -> MigrationOutcome {
        let Run { vehicle, origin, marker: _, ticket, lift, ground_shuttle, target_shuttle, target_slot, .. } = run;
        let to = target_slot.unwrap_or(origin);
        let at = self.now();

        self.state.borrow_mut().release(origin.level, origin.lot);
        self.with_vehicle(vehicle, |v| {
            v.slot = Some(to);
            v.marker = 9;
        });
        self.emit(SimEvent::Migrated { vehicle, from: origin, to, at });
        info!(vehicle = %vehicle, from = %origin, to = %to, now = %at, "migrated");

        self.release_lift(lift);
        self.release_shuttle(target_shuttle);
        self.release_shuttle(ground_shuttle);
        drop(ticket);
        self.changed.notify_all();
        MigrationOutcome::Committed(to)
    }

    // ── Rollback ──────────────────────────────────────────────────────────

    /// Pop the undo log, putting the vehicle back in its ground lot and
    /// every unit back in its pool.  Returns the vehicle's slot.
    async fn unwind(&self, run: Run) -> SlotRef {
        let Run {
            vehicle,
            origin,
            target,
            marker,
            mut undo,
            ticket,
            lift,
            ground_shuttle,
            target_shuttle,
            extracted,
            out_times,
            ..
        } = run;
        let mut ticket = Some(ticket);
        let mut lift = Some(lift);
        let mut ground_shuttle = Some(ground_shuttle);
        let mut target_shuttle = Some(target_shuttle);
        let lot_lateral = self.lot_lateral(origin.lot);

        while let Some(step) = undo.pop() {
            match step {
                Undo::Ascended => {
                    if let Some(lift) = lift.as_mut() {
                        self.move_lift(lift, GROUND).await;
                    }
                }
                Undo::Extracted => {
                    if let Some(shuttle) = ground_shuttle.as_mut() {
                        for &stage in extracted.iter().rev() {
                            self.transfer(vehicle, stage, &out_times, shuttle, lot_lateral).await;
                        }
                    }
                }
                Undo::GroundShuttle => {
                    if let Some(shuttle) = ground_shuttle.take() {
                        self.release_shuttle(shuttle);
                    }
                }
                Undo::Lift => {
                    if let Some(lift) = lift.take() {
                        self.put_lift(lift);
                    }
                }
                Undo::TargetShuttle => {
                    if let Some(shuttle) = target_shuttle.take() {
                        self.release_shuttle(shuttle);
                    }
                }
                Undo::ReserveLevel => {
                    self.state.borrow_mut().cancel_reservation(target);
                }
                Undo::MigrationPermit => {
                    drop(ticket.take());
                }
            }
        }
        self.changed.notify_all();

        let at = self.now();
        self.with_vehicle(vehicle, |v| v.marker = 0);
        self.emit(SimEvent::MigrationRolledBack { vehicle, marker, slot: origin, at });
        info!(vehicle = %vehicle, marker, slot = %origin, now = %at, "migration rolled back");
        origin
    }
}
