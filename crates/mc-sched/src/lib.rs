//! `mc-sched`: virtual-time cooperative scheduler and resource pools.
//!
//! Workflows are ordinary `async` blocks.  They run on a single-threaded
//! executor whose only clock is the virtual one: a `sleep` never blocks the
//! thread, it parks the task in a timer queue and the executor jumps `now`
//! straight to the next deadline.
//!
//! # Crate layout
//!
//! | Module         | Contents                                               |
//! |----------------|--------------------------------------------------------|
//! | [`executor`]   | `Scheduler`, `JoinHandle`, `TaskId`                    |
//! | [`sleep`]      | `Sleep` timer future                                   |
//! | [`wake_queue`] | `WakeQueue` (`BTreeMap<SimTime, Vec<T>>`)              |
//! | [`cancel`]     | `CancelToken`, `Interruptible`                         |
//! | [`notify`]     | `Notify`, `Notified`                                   |
//! | [`pool`]       | `Store` (FIFO and predicate pool), `Permit`, `Ticket`  |
//! | [`error`]      | `SchedError`, `SchedResult<T>`                         |
//!
//! # Suspension points
//!
//! A task can only be suspended at an `.await` on one of: `Sleep`, a pool
//! acquire that cannot be satisfied, `Notified`, or a `JoinHandle`.  All
//! shared-state mutation between two of those happens atomically with
//! respect to every other task.

pub mod cancel;
pub mod error;
pub mod executor;
pub mod notify;
pub mod pool;
pub mod sleep;
pub mod wake_queue;

#[cfg(test)]
mod tests;

pub use cancel::{CancelToken, Interruptible};
pub use error::{SchedError, SchedResult};
pub use executor::{JoinHandle, Scheduler, TaskId};
pub use notify::{Notified, Notify};
pub use pool::{Get, GetWhere, Permit, Request, Store, Ticket};
pub use sleep::Sleep;
pub use wake_queue::WakeQueue;
