//! The carpark controller: owns occupancy state, unit pools and the event
//! buffer shared by every workflow.
//!
//! # Ownership
//!
//! ```text
//! Rc<Carpark>
//!   ├─ state            RefCell<CarparkState>     per-level counts + occupied sets
//!   ├─ lifts            Store<Lift>               shared by every level
//!   ├─ lobby            Option<Store<Lift>>       Cache policy fast lane
//!   ├─ shuttles         Vec<Store<Shuttle>>       one pool per level
//!   ├─ slot_permit      Permit                    total slots (minus lobby reserve)
//!   ├─ migration_permit Option<Permit>            lobby reserve; bounds migrations
//!   ├─ changed          Notify                    any pool or count changed
//!   └─ vehicles         RefCell<FxHashMap<..>>    arena of vehicles inside
//! ```
//!
//! No `RefCell` borrow is held across an `.await`.  Workflows hold units by
//! value, so a unit is never in two places at once.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use mc_core::{
    CarparkConfig, LevelId, LiftId, LotId, ShuttleId, SimDuration, SimRng, SimTime, SlotRef,
    VehicleId,
};
use mc_sched::{Notify, Permit, Scheduler, Store};
use mc_travel::{Stage, StageTimes, TravelModel, TravelParams};
use rustc_hash::FxHashMap;

use crate::policy::GROUND;
use crate::{
    CarparkError, CarparkResult, CarparkState, EntityRef, Lift, LiftKind, Policy, Position,
    Shuttle, SimEvent, Vehicle,
};

pub struct Carpark {
    pub(crate) me:               Weak<Carpark>,
    pub(crate) sched:            Scheduler,
    pub(crate) config:           CarparkConfig,
    pub(crate) params:           TravelParams,
    pub(crate) policy:           Policy,
    pub(crate) state:            RefCell<CarparkState>,
    pub(crate) lifts:            Store<Lift>,
    pub(crate) lobby:            Option<Store<Lift>>,
    pub(crate) shuttles:         Vec<Store<Shuttle>>,
    pub(crate) slot_permit:      Permit,
    pub(crate) migration_permit: Option<Permit>,
    pub(crate) changed:          Notify,
    pub(crate) rng:              RefCell<SimRng>,
    pub(crate) vehicles:         RefCell<FxHashMap<VehicleId, Vehicle>>,
    events:                      RefCell<Vec<SimEvent>>,
    /// Last non-ground level the Cache policy picked.
    pub(crate) last_upper:       Cell<LevelId>,
    fatal:                       RefCell<Option<CarparkError>>,
}

impl Carpark {
    /// Build travel tables, unit pools and empty occupancy for `config`.
    ///
    /// The lobby fast lane and its slot reserve are only set up under
    /// [`Policy::Cache`]; other policies get the full slot count.
    pub fn new(
        sched:  &Scheduler,
        config: CarparkConfig,
        policy: Policy,
        rng:    SimRng,
    ) -> CarparkResult<Rc<Self>> {
        let travel = TravelModel::build(&config)?;
        let start_level = LevelId(config.default_lift_level);

        let lifts = Store::from_items((0..travel.lift_count()).filter_map(|i| {
            let id = LiftId(i as u16);
            travel.lift(id).map(|table| Lift {
                id,
                kind:    LiftKind::Lift,
                level:   start_level,
                lateral: table.origin(),
                table:   Rc::new(table.clone()),
            })
        }));

        let use_lobby = policy == Policy::Cache && travel.lobby_count() > 0;
        let lobby = use_lobby.then(|| {
            Store::from_items((0..travel.lobby_count()).filter_map(|i| {
                let id = LiftId(i as u16);
                travel.lobby(id).map(|table| Lift {
                    id,
                    kind:    LiftKind::Lobby,
                    level:   GROUND,
                    lateral: table.origin(),
                    table:   Rc::new(table.clone()),
                })
            }))
        });

        let reserved = config.reserved_slots(use_lobby);
        let slot_permit = Permit::new(config.slot_permit_capacity(use_lobby));
        let migration_permit = (reserved > 0 && config.levels > 1).then(|| Permit::new(reserved));

        let shuttles = (0..config.levels)
            .map(|l| {
                Store::from_items((0..config.shuttles_per_level).map(|s| Shuttle {
                    id:      ShuttleId(s),
                    level:   LevelId(l),
                    lateral: config.shuttle_home,
                }))
            })
            .collect();

        let state = CarparkState::new(&config);
        let last_upper = LevelId(config.levels.saturating_sub(1));
        let params = *travel.params();

        tracing::debug!(
            policy = %policy,
            levels = config.levels,
            slots = config.total_slots(),
            permit = slot_permit.capacity(),
            lifts = travel.lift_count(),
            lobby = use_lobby,
            "carpark initialised"
        );

        Ok(Rc::new_cyclic(|me| Self {
            me: me.clone(),
            sched: sched.clone(),
            config,
            params,
            policy,
            state: RefCell::new(state),
            lifts,
            lobby,
            shuttles,
            slot_permit,
            migration_permit,
            changed: Notify::new(),
            rng: RefCell::new(rng),
            vehicles: RefCell::new(FxHashMap::default()),
            events: RefCell::new(Vec::new()),
            last_upper: Cell::new(last_upper),
            fatal: RefCell::new(None),
        }))
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn now(&self) -> SimTime {
        self.sched.now()
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn config(&self) -> &CarparkConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.sched
    }

    pub fn slot_permit(&self) -> &Permit {
        &self.slot_permit
    }

    pub fn migration_permit(&self) -> Option<&Permit> {
        self.migration_permit.as_ref()
    }

    /// Snapshot of per-level occupancy.
    pub fn state(&self) -> CarparkState {
        self.state.borrow().clone()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&CarparkState) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<Vehicle> {
        self.vehicles.borrow().get(&id).cloned()
    }

    /// Number of vehicles between arrival and drive-off.
    pub fn vehicles_inside(&self) -> usize {
        self.vehicles.borrow().len()
    }

    /// Idle lift ids, ascending.
    pub fn idle_lifts(&self) -> Vec<LiftId> {
        idle_ids(&self.lifts)
    }

    /// Idle lobby unit ids, ascending.  Empty when no lobby is in use.
    pub fn idle_lobby_units(&self) -> Vec<LiftId> {
        self.lobby.as_ref().map(idle_ids).unwrap_or_default()
    }

    /// Idle shuttle ids on `level`, ascending.
    pub fn idle_shuttles(&self, level: LevelId) -> Vec<ShuttleId> {
        self.shuttles
            .get(level.index())
            .map(|pool| {
                let mut ids = pool.inspect(|idle| idle.iter().map(|s| s.id).collect::<Vec<_>>());
                ids.sort_unstable();
                ids
            })
            .unwrap_or_default()
    }

    /// Drain the buffered events, oldest first.
    pub fn take_events(&self) -> Vec<SimEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// A fatal error that should stop the run, if one occurred.
    pub fn take_fatal(&self) -> Option<CarparkError> {
        self.fatal.borrow_mut().take()
    }

    /// Per-level occupied/capacity snapshot stamped `at`.  Occupancy only
    /// changes when a task runs, so a sample between two steps may carry any
    /// time up to the next pending event.
    pub fn occupancy(&self, at: SimTime) -> SimEvent {
        let (occupied, capacity): (Vec<usize>, Vec<usize>) = self.with_state(|s| {
            s.levels.iter().map(|l| (l.occupied.len(), l.capacity)).unzip()
        });
        SimEvent::Occupancy { at, occupied, capacity }
    }

    // ── Internal helpers ──────────────────────────────────────────────────

    pub(crate) fn emit(&self, event: SimEvent) {
        self.events.borrow_mut().push(event);
    }

    pub(crate) fn record_fatal(&self, err: CarparkError) {
        let mut fatal = self.fatal.borrow_mut();
        if fatal.is_none() {
            *fatal = Some(err);
        }
    }

    pub(crate) fn with_vehicle<R>(
        &self,
        id: VehicleId,
        f:  impl FnOnce(&mut Vehicle) -> R,
    ) -> Option<R> {
        self.vehicles.borrow_mut().get_mut(&id).map(f)
    }

    pub(crate) fn parked_slot(&self, id: VehicleId) -> CarparkResult<SlotRef> {
        match self.vehicles.borrow().get(&id) {
            None => Err(CarparkError::UnknownVehicle(id)),
            Some(v) => v.slot.ok_or(CarparkError::NotParked(id)),
        }
    }

    pub(crate) fn lot_lateral(&self, lot: LotId) -> u32 {
        self.config.lots.get(lot.index()).map_or(self.config.shuttle_home, |g| g.lateral)
    }

    /// Stage times from `lift`'s bay to `lot`.  Every table covers the
    /// whole layout, so the default is never used for a valid lot.
    pub(crate) fn times(&self, lift: &Lift, lot: LotId) -> StageTimes {
        lift.table.get(lot).copied().unwrap_or_default()
    }

    /// The pool serving bays for `level`: the lobby for the ground tier
    /// under Cache, the shared lifts otherwise.
    pub(crate) fn bay_pool(&self, level: LevelId) -> &Store<Lift> {
        match &self.lobby {
            Some(lobby) if level == GROUND => lobby,
            _ => &self.lifts,
        }
    }

    pub(crate) fn sample_drive(&self) -> SimDuration {
        let (lo, hi) = self.config.drive_in_out_min;
        if hi <= lo {
            return SimDuration::from_minutes(lo);
        }
        SimDuration::from_minutes(self.rng.borrow_mut().gen_range(lo..=hi))
    }

    // ── Motion primitives ─────────────────────────────────────────────────
    //
    // `begin_*` emits the motion record and returns its duration; the caller
    // sleeps and then applies the new position, so positions never change
    // before the time has elapsed.

    pub(crate) fn begin_lift_move(&self, lift: &Lift, to: LevelId) -> SimDuration {
        if lift.is_lobby() || lift.level == to {
            return SimDuration::ZERO;
        }
        let duration = self.params.lift_travel(lift.level, to);
        let entity = EntityRef::Lift(lift.id);
        self.emit(SimEvent::Motion {
            entity,
            from: Position::Level(lift.level),
            to: Position::Level(to),
            start: self.now(),
            duration,
        });
        duration
    }

    pub(crate) async fn move_lift(&self, lift: &mut Lift, to: LevelId) {
        let duration = self.begin_lift_move(lift, to);
        self.sched.sleep(duration).await;
        if !lift.is_lobby() {
            lift.level = to;
        }
    }

    pub(crate) fn begin_shuttle_move(&self, shuttle: &Shuttle, to: u32) -> SimDuration {
        if shuttle.lateral == to {
            return SimDuration::ZERO;
        }
        let duration = self.params.shuttle_travel(shuttle.lateral, to);
        self.emit(SimEvent::Motion {
            entity: EntityRef::Shuttle { level: shuttle.level, id: shuttle.id },
            from: Position::Lateral(shuttle.lateral),
            to: Position::Lateral(to),
            start: self.now(),
            duration,
        });
        duration
    }

    pub(crate) async fn move_shuttle(&self, shuttle: &mut Shuttle, to: u32) {
        let duration = self.begin_shuttle_move(shuttle, to);
        self.sched.sleep(duration).await;
        shuttle.lateral = to;
    }

    /// Emit a named vehicle stage and return its duration.
    pub(crate) fn begin_stage(&self, vehicle: VehicleId, name: &'static str, duration: SimDuration) -> SimDuration {
        let start = self.now();
        self.emit(SimEvent::Stage { vehicle, name, start, end: start + duration });
        duration
    }

    pub(crate) async fn vehicle_stage(&self, vehicle: VehicleId, name: &'static str, duration: SimDuration) {
        let duration = self.begin_stage(vehicle, name, duration);
        self.sched.sleep(duration).await;
    }

    /// Start one transfer stage between a bay and a lot.  `OriginLot` also
    /// moves the shuttle towards `toward`; apply it with
    /// [`Carpark::end_transfer`] once the duration has elapsed.
    pub(crate) fn begin_transfer(
        &self,
        vehicle: VehicleId,
        stage:   Stage,
        times:   &StageTimes,
        shuttle: &Shuttle,
        toward:  u32,
    ) -> SimDuration {
        let duration = times.duration(stage);
        if stage == Stage::OriginLot && shuttle.lateral != toward {
            self.emit(SimEvent::Motion {
                entity: EntityRef::Shuttle { level: shuttle.level, id: shuttle.id },
                from: Position::Lateral(shuttle.lateral),
                to: Position::Lateral(toward),
                start: self.now(),
                duration,
            });
        }
        self.begin_stage(vehicle, stage.name(), duration)
    }

    pub(crate) fn end_transfer(stage: Stage, shuttle: &mut Shuttle, toward: u32) {
        if stage == Stage::OriginLot {
            shuttle.lateral = toward;
        }
    }

    pub(crate) async fn transfer(
        &self,
        vehicle: VehicleId,
        stage:   Stage,
        times:   &StageTimes,
        shuttle: &mut Shuttle,
        toward:  u32,
    ) {
        let duration = self.begin_transfer(vehicle, stage, times, shuttle, toward);
        self.sched.sleep(duration).await;
        Self::end_transfer(stage, shuttle, toward);
    }

    // ── Unit release ──────────────────────────────────────────────────────

    /// Return a unit to its pool immediately and signal waiters.
    pub(crate) fn put_lift(&self, lift: Lift) {
        match (&self.lobby, lift.kind) {
            (Some(lobby), LiftKind::Lobby) => lobby.put(lift),
            _ => self.lifts.put(lift),
        }
        self.changed.notify_all();
    }

    /// Send a lift back to the ground level in the background, then return
    /// it to its pool.
    pub(crate) fn release_lift(&self, lift: Lift) {
        let Some(me) = self.me.upgrade() else {
            self.put_lift(lift);
            return;
        };
        self.sched.spawn(async move {
            let mut lift = lift;
            me.move_lift(&mut lift, GROUND).await;
            tracing::trace!(lift = %lift.id, now = %me.now(), "lift back at ground");
            me.put_lift(lift);
        });
    }

    fn put_shuttle(&self, shuttle: Shuttle) {
        if let Some(pool) = self.shuttles.get(shuttle.level.index()) {
            pool.put(shuttle);
        }
        self.changed.notify_all();
    }

    /// Send a shuttle back to its home position in the background, then
    /// return it to its level's pool.
    pub(crate) fn release_shuttle(&self, shuttle: Shuttle) {
        let Some(me) = self.me.upgrade() else {
            self.put_shuttle(shuttle);
            return;
        };
        self.sched.spawn(async move {
            let mut shuttle = shuttle;
            let home = me.config.shuttle_home;
            me.move_shuttle(&mut shuttle, home).await;
            tracing::trace!(
                level = %shuttle.level,
                shuttle = %shuttle.id,
                now = %me.now(),
                "shuttle back at home"
            );
            me.put_shuttle(shuttle);
        });
    }
}

fn idle_ids(pool: &Store<Lift>) -> Vec<LiftId> {
    let mut ids = pool.inspect(|idle| idle.iter().map(|l| l.id).collect::<Vec<_>>());
    ids.sort_unstable();
    ids
}
