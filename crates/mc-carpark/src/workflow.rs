//! Park and exit workflows and the full vehicle lifecycle.
//!
//! # Park
//!
//! ```text
//! select level ─► shuttle ─► lift ─► lift to ground ─► drive-in
//!   ─► lift to level ─► shuttle to bay ─► claim lot
//!   ─► lift_pallet ─► origin_lot ─► turning ─► pallet_lot ─► commit
//! ```
//!
//! # Exit
//!
//! ```text
//! shuttle ─► lift (fastest idle) ─► shuttle to lot ─► lift to level
//!   ─► pallet_lot ─► origin_lot ─► lift_pallet ─► lift to ground
//!   ─► release lot ─► drive-out
//! ```
//!
//! Both acquire the level's shuttle before a lift, and migration never
//! waits while holding anything, so the acquisition graph has no cycle.

use std::rc::Rc;

use mc_core::{LevelId, LotId, SimDuration, SlotRef, VehicleId};
use mc_sched::{CancelToken, Store, Ticket};
use mc_travel::Stage;
use tracing::{debug, error, info, warn};

use crate::policy::{self, GROUND};
use crate::{Carpark, CarparkError, CarparkResult, Lift, MigrationOutcome, Policy, SimEvent, Vehicle};

/// Transfer order when taking a vehicle out of a lot.
pub(crate) const RETRIEVE_ORDER: [Stage; 3] = [Stage::PalletLot, Stage::OriginLot, Stage::LiftPallet];

impl Carpark {
    // ── Level selection ───────────────────────────────────────────────────

    /// Whether any level could ever satisfy the policy.
    fn can_ever_accept(&self) -> bool {
        self.config.shuttles_per_level > 0
            && self.with_state(|s| s.levels.iter().any(|l| l.capacity > 0))
    }

    fn try_select_level(&self) -> Option<LevelId> {
        let state = self.state.borrow();
        let idle = |level: LevelId| self.shuttles.get(level.index()).is_some_and(|p| !p.is_empty());
        match self.policy {
            Policy::NearestFirst => policy::nearest_first(&state.levels, idle),
            Policy::Randomised => policy::randomised(&state.levels, &mut self.rng.borrow_mut()),
            Policy::Balanced => policy::balanced(&state.levels),
            Policy::Cache => {
                let pick = policy::cache(&state.levels, idle, self.last_upper.get());
                if let Some(level) = pick.filter(|&l| l != GROUND) {
                    self.last_upper.set(level);
                }
                pick
            }
        }
    }

    /// Choose a level and reserve one unit of its capacity, waiting for a
    /// state change while nothing qualifies.
    pub(crate) async fn select_level(&self, vehicle: VehicleId) -> CarparkResult<LevelId> {
        if !self.can_ever_accept() {
            error!(vehicle = %vehicle, policy = %self.policy, "no level can ever accept");
            return Err(CarparkError::PolicyExhausted(self.policy));
        }
        let mut waited = false;
        loop {
            // Taken before checking so a change in between is not missed.
            let signal = self.changed.notified();
            if let Some(level) = self.try_select_level() {
                if self.state.borrow_mut().reserve(level) {
                    debug!(vehicle = %vehicle, level = %level, now = %self.now(), "level reserved");
                    return Ok(level);
                }
            }
            if !waited {
                warn!(vehicle = %vehicle, policy = %self.policy, now = %self.now(), "no level accepts, waiting");
                waited = true;
            }
            signal.await;
        }
    }

    /// Pick an unoccupied lot on `level` and claim the reservation for it.
    fn claim_lot(&self, level: LevelId, lift: &Lift) -> Option<LotId> {
        let mut state = self.state.borrow_mut();
        let lot = {
            let ls = state.level(level)?;
            match self.policy {
                Policy::Randomised => policy::random_lot(ls, &mut self.rng.borrow_mut()),
                _ => policy::nearest_lot(ls, &lift.table),
            }
        }?;
        state.claim(level, lot).then_some(lot)
    }

    // ── Park ──────────────────────────────────────────────────────────────

    /// Bring an arrived vehicle to a lot.  The caller holds a slot ticket.
    pub async fn park(&self, vehicle: VehicleId) -> CarparkResult<SlotRef> {
        let level = self.select_level(vehicle).await?;
        let mut shuttle = self.shuttles[level.index()].get().await;
        let mut lift = self.bay_pool(level).get().await;
        debug!(vehicle = %vehicle, level = %level, lift = %lift.id, shuttle = %shuttle.id, "park units acquired");

        self.move_lift(&mut lift, GROUND).await;
        let drive = self.sample_drive();
        self.vehicle_stage(vehicle, "drive_in", drive).await;

        let service_start = self.now();
        self.move_lift(&mut lift, level).await;
        self.move_shuttle(&mut shuttle, lift.lateral).await;

        let Some(lot) = self.claim_lot(level, &lift) else {
            error!(vehicle = %vehicle, level = %level, "reservation held but no lot free");
            self.state.borrow_mut().cancel_reservation(level);
            self.release_lift(lift);
            self.release_shuttle(shuttle);
            self.changed.notify_all();
            return Err(CarparkError::NoFreeLot { vehicle, level });
        };
        let slot = SlotRef::new(level, lot);
        let times = self.times(&lift, lot);
        let lot_lateral = self.lot_lateral(lot);
        for stage in Stage::PARK_ORDER {
            self.transfer(vehicle, stage, &times, &mut shuttle, lot_lateral).await;
        }

        let at = self.now();
        let arrived = self
            .with_vehicle(vehicle, |v| {
                v.slot = Some(slot);
                v.parked_at = Some(at);
                v.arrived_at
            })
            .unwrap_or(at);
        self.emit(SimEvent::Parked {
            vehicle,
            slot,
            at,
            wait: at.since(arrived),
            service: at.since(service_start),
        });
        info!(vehicle = %vehicle, slot = %slot, lift = %lift.id, now = %at, "parked");

        self.release_lift(lift);
        self.release_shuttle(shuttle);
        Ok(slot)
    }

    // ── Exit ──────────────────────────────────────────────────────────────

    /// Take the idle lift in `pool` with the fastest reach to `lot`,
    /// ignoring the turn, or wait for any lift if none is idle.
    async fn acquire_exit_lift(&self, pool: &Store<Lift>, lot: LotId) -> Lift {
        let best = pool.inspect(|idle| {
            idle.iter()
                .map(|l| (l.id, l.table.get(lot).map_or(f64::INFINITY, |t| t.total_without_turn())))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id)
        });
        match best {
            Some(id) => pool.get_where(move |l: &Lift| l.id == id).await,
            None => pool.get().await,
        }
    }

    /// Retrieve a parked vehicle and drive it out.  The slot ticket is
    /// returned once the lot is released.
    pub async fn exit(&self, vehicle: VehicleId, ticket: Ticket) -> CarparkResult<()> {
        let slot = self.parked_slot(vehicle)?;
        let requested = self.now();
        let mut shuttle = self.shuttles[slot.level.index()].get().await;
        let mut lift = self.acquire_exit_lift(self.bay_pool(slot.level), slot.lot).await;
        debug!(vehicle = %vehicle, slot = %slot, lift = %lift.id, shuttle = %shuttle.id, "exit units acquired");

        let lot_lateral = self.lot_lateral(slot.lot);
        self.move_shuttle(&mut shuttle, lot_lateral).await;
        self.move_lift(&mut lift, slot.level).await;

        let service_start = self.now();
        let times = self.times(&lift, slot.lot);
        let bay = lift.lateral;
        for stage in RETRIEVE_ORDER {
            self.transfer(vehicle, stage, &times, &mut shuttle, bay).await;
        }
        self.move_lift(&mut lift, GROUND).await;

        let at = self.now();
        self.state.borrow_mut().release(slot.level, slot.lot);
        self.with_vehicle(vehicle, |v| v.slot = None);
        self.slot_permit.release(ticket);
        self.changed.notify_all();
        self.emit(SimEvent::Released { vehicle, slot, at, service: at.since(service_start) });

        let drive = self.sample_drive();
        self.vehicle_stage(vehicle, "drive_out", drive).await;
        self.put_lift(lift);
        self.release_shuttle(shuttle);

        let at = self.now();
        self.vehicles.borrow_mut().remove(&vehicle);
        self.emit(SimEvent::Exited { vehicle, at, wait: at.since(requested) });
        info!(vehicle = %vehicle, slot = %slot, now = %at, "exited");
        Ok(())
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    fn arrive(&self, vehicle: VehicleId) -> CarparkResult<()> {
        let at = self.now();
        {
            let mut vehicles = self.vehicles.borrow_mut();
            if vehicles.contains_key(&vehicle) {
                return Err(CarparkError::DuplicateVehicle(vehicle));
            }
            vehicles.insert(vehicle, Vehicle::new(vehicle, at));
        }
        self.emit(SimEvent::Arrived { vehicle, at });
        debug!(vehicle = %vehicle, now = %at, "arrived");
        Ok(())
    }

    /// Register an arrival, wait for a slot ticket and park.
    pub async fn admit(&self, vehicle: VehicleId) -> CarparkResult<(Ticket, SlotRef)> {
        self.arrive(vehicle)?;
        let ticket = self.slot_permit.request().await;
        match self.park(vehicle).await {
            Ok(slot) => Ok((ticket, slot)),
            Err(err) => {
                self.vehicles.borrow_mut().remove(&vehicle);
                drop(ticket);
                self.changed.notify_all();
                Err(err)
            }
        }
    }

    /// Whether a vehicle parked in `slot` should be offered for migration.
    pub(crate) fn migrates(&self, slot: SlotRef) -> bool {
        self.policy == Policy::Cache && slot.level == GROUND && self.migration_permit.is_some()
    }

    /// Arrive, park, stay for `stay`, then exit.  Under Cache a vehicle
    /// parked on the ground tier tries to migrate upwards during its stay;
    /// the migration is cancelled when the stay ends.
    pub async fn visit(self: Rc<Self>, vehicle: VehicleId, stay: SimDuration) {
        let me = self.clone();
        if let Err(err) = me.run_visit(vehicle, stay).await {
            self.abort(vehicle, err);
        }
    }

    async fn run_visit(self: Rc<Self>, vehicle: VehicleId, stay: SimDuration) -> CarparkResult<()> {
        let (ticket, slot) = self.admit(vehicle).await?;
        let pickup = self.now() + stay;

        if self.migrates(slot) {
            let token = CancelToken::new();
            let me = self.clone();
            let guard = token.clone();
            let handle = self.sched.spawn(async move { me.migrate(vehicle, guard).await });
            self.sched.sleep_until(pickup).await;
            token.cancel();
            match handle.await {
                Ok(result) => self.settle_migration(vehicle, result),
                Err(err) => warn!(vehicle = %vehicle, %err, "migration task ended early"),
            }
        } else {
            self.sched.sleep_until(pickup).await;
        }

        self.exit(vehicle, ticket).await
    }

    /// A failed migration has already been compensated back to its ground
    /// slot, so the vehicle still exits normally and is not aborted.
    pub(crate) fn settle_migration(&self, vehicle: VehicleId, result: CarparkResult<MigrationOutcome>) {
        match result {
            Ok(outcome) => debug!(vehicle = %vehicle, ?outcome, "migration settled"),
            Err(err) => warn!(vehicle = %vehicle, error = %err, "migration abandoned, exiting from the ground tier"),
        }
    }

    /// Record a failed workflow.  A policy that can never accept stops the
    /// run; anything else only abandons the one vehicle's workflow.
    pub(crate) fn abort(&self, vehicle: VehicleId, err: CarparkError) {
        let at = self.now();
        error!(vehicle = %vehicle, now = %at, error = %err, "workflow aborted");
        self.emit(SimEvent::Aborted { vehicle, at, reason: err.to_string() });
        if matches!(err, CarparkError::PolicyExhausted(_)) {
            self.record_fatal(err);
        }
    }
}
