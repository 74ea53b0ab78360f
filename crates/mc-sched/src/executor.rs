//! Single-threaded cooperative executor driving virtual time.
//!
//! # Step model
//!
//! ```text
//! step():
//!   1. if a task is ready       → poll it once
//!   2. else if a timer is queued → advance `now` to the earliest bucket and
//!                                  wake its wakers in push order
//!   3. else                      → idle, return false
//! ```
//!
//! Tasks woken by the same timer bucket become ready in the order their
//! timers were registered, which makes simultaneous timeouts resolve in
//! submission order.  Time only moves in step 2, so everything a task does
//! between two suspension points happens at a single instant.
//!
//! Wakers are `Send + Sync` (the ready queue sits behind a `parking_lot`
//! mutex) because `std::task::Waker` requires it; the tasks themselves are
//! `!Send` and never leave the thread that owns the `Scheduler`.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use futures::task::{ArcWake, waker};
use mc_core::{SimDuration, SimTime};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::{SchedError, SchedResult, Sleep, WakeQueue};

/// Identifier of a spawned task, unique for the lifetime of a `Scheduler`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task({})", self.0)
    }
}

type ReadyQueue = Arc<Mutex<VecDeque<TaskId>>>;

// ── Task plumbing ─────────────────────────────────────────────────────────────

struct TaskWaker {
    id:     TaskId,
    /// Set while the id sits in the ready queue so repeated wakes between
    /// two polls enqueue it only once.
    queued: AtomicBool,
    ready:  ReadyQueue,
}

impl ArcWake for TaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        if !arc_self.queued.swap(true, Ordering::AcqRel) {
            arc_self.ready.lock().push_back(arc_self.id);
        }
    }
}

struct TaskSlot {
    future: LocalBoxFuture<'static, ()>,
    flag:   Arc<TaskWaker>,
    waker:  Waker,
}

pub(crate) struct Shared {
    pub(crate) now:    Cell<SimTime>,
    pub(crate) timers: RefCell<WakeQueue<Waker>>,
    tasks:             RefCell<FxHashMap<TaskId, TaskSlot>>,
    ready:             ReadyQueue,
    next_task:         Cell<u64>,
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// Cheap, clonable handle to the executor.
///
/// Tasks capture clones of the handle to sleep and spawn.  That forms an
/// `Rc` cycle through the task table; call [`Scheduler::clear`] once a run
/// is finished to break it.
#[derive(Clone)]
pub struct Scheduler {
    shared: Rc<Shared>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            shared: Rc::new(Shared {
                now:       Cell::new(SimTime::ZERO),
                timers:    RefCell::new(WakeQueue::new()),
                tasks:     RefCell::new(FxHashMap::default()),
                ready:     Arc::new(Mutex::new(VecDeque::new())),
                next_task: Cell::new(0),
            }),
        }
    }

    /// Current virtual time.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.shared.now.get()
    }

    /// Suspend for `duration`.  A zero duration completes without yielding.
    pub fn sleep(&self, duration: SimDuration) -> Sleep {
        self.sleep_until(self.now() + duration)
    }

    /// Suspend until `deadline`.  Deadlines in the past complete immediately.
    pub fn sleep_until(&self, deadline: SimTime) -> Sleep {
        Sleep::new(self.shared.clone(), deadline)
    }

    /// Register a new task.  It is first polled on a later `step`, never
    /// inline.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let (tx, rx) = oneshot::channel();
        let id = self.spawn_boxed(
            async move {
                // The receiver may have been dropped (detached task).
                let _ = tx.send(future.await);
            }
            .boxed_local(),
        );
        JoinHandle { id, rx, shared: Rc::downgrade(&self.shared) }
    }

    fn spawn_boxed(&self, future: LocalBoxFuture<'static, ()>) -> TaskId {
        let id = TaskId(self.shared.next_task.get());
        self.shared.next_task.set(id.0 + 1);

        let flag = Arc::new(TaskWaker {
            id,
            queued: AtomicBool::new(true),
            ready:  self.shared.ready.clone(),
        });
        let waker = waker(flag.clone());
        self.shared.tasks.borrow_mut().insert(id, TaskSlot { future, flag, waker });
        self.shared.ready.lock().push_back(id);
        tracing::trace!(task = %id, now = %self.now(), "spawned");
        id
    }

    /// Execute one unit of work.  Returns `false` when nothing is ready and
    /// no timer is pending.
    pub fn step(&self) -> bool {
        if let Some(id) = self.pop_ready() {
            self.poll_task(id);
            return true;
        }
        self.fire_next_timer()
    }

    /// Run until every task has finished or is blocked forever.
    pub fn run(&self) {
        while self.step() {}
    }

    /// Run every event scheduled at or before `limit`, then set the clock to
    /// `limit` if it is still behind.
    pub fn run_until(&self, limit: SimTime) {
        loop {
            if let Some(id) = self.pop_ready() {
                self.poll_task(id);
                continue;
            }
            match self.next_timer() {
                Some(at) if at <= limit => {
                    self.fire_next_timer();
                }
                _ => break,
            }
        }
        if self.now() < limit {
            self.shared.now.set(limit);
        }
    }

    /// `true` when no task is ready to be polled.
    pub fn ready_is_empty(&self) -> bool {
        self.shared.ready.lock().is_empty()
    }

    /// Earliest pending timer, if any.
    pub fn next_timer(&self) -> Option<SimTime> {
        self.shared.timers.borrow().next_time()
    }

    /// Number of tasks that have been spawned and not yet completed.
    pub fn live_tasks(&self) -> usize {
        self.shared.tasks.borrow().len()
    }

    /// Drop every task and timer.  The clock is left where it is.
    pub fn clear(&self) {
        let tasks = std::mem::take(&mut *self.shared.tasks.borrow_mut());
        drop(tasks);
        self.shared.timers.borrow_mut().clear();
        self.shared.ready.lock().clear();
    }

    fn pop_ready(&self) -> Option<TaskId> {
        self.shared.ready.lock().pop_front()
    }

    fn fire_next_timer(&self) -> bool {
        let next = self.shared.timers.borrow_mut().pop_next();
        let Some((at, wakers)) = next else {
            return false;
        };
        if at > self.now() {
            self.shared.now.set(at);
        }
        for w in wakers {
            w.wake();
        }
        true
    }

    fn poll_task(&self, id: TaskId) {
        // Completed or aborted tasks can still have stale ids queued.
        let slot = self.shared.tasks.borrow_mut().remove(&id);
        let Some(mut slot) = slot else {
            return;
        };
        slot.flag.queued.store(false, Ordering::Release);

        let mut cx = Context::from_waker(&slot.waker);
        match slot.future.as_mut().poll(&mut cx) {
            Poll::Ready(()) => {}
            Poll::Pending => {
                self.shared.tasks.borrow_mut().insert(id, slot);
            }
        }
    }
}

// ── JoinHandle ────────────────────────────────────────────────────────────────

/// Awaitable handle to a spawned task's output.
///
/// Dropping the handle detaches the task; it keeps running.
pub struct JoinHandle<T> {
    id:     TaskId,
    rx:     oneshot::Receiver<T>,
    shared: Weak<Shared>,
}

impl<T> JoinHandle<T> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Drop the task's future immediately, without letting it observe the
    /// cancellation.  Awaiting the handle afterwards yields
    /// `Err(SchedError::Aborted)`.  Resources the task held by value are
    /// dropped with it, so cooperative cancellation through a
    /// [`CancelToken`](crate::CancelToken) is preferred for workflows that
    /// hold pool items.
    pub fn abort(&self) {
        if let Some(shared) = self.shared.upgrade() {
            let slot = shared.tasks.borrow_mut().remove(&self.id);
            drop(slot);
        }
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = SchedResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<SchedResult<T>> {
        let id = self.id;
        self.rx
            .poll_unpin(cx)
            .map(|res| res.map_err(|_| SchedError::Aborted(id)))
    }
}
