//! Wake-all condition signal.
//!
//! Used where a workflow waits on a compound condition ("some level has a
//! free shuttle and a free slot") that no single pool expresses.  Whoever
//! changes any input of the condition calls `notify_all`; waiters re-check
//! and wait again if it still does not hold.
//!
//! ```text
//! loop {
//!     let signal = notify.notified();   // snapshot generation first
//!     if let Some(x) = try_condition() { break x; }
//!     signal.await;                     // completes on the next notify_all
//! }
//! ```
//!
//! Taking the snapshot before checking means a notification that lands
//! between the check and the await is never lost.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

#[derive(Default)]
struct NotifyInner {
    generation: Cell<u64>,
    wakers:     RefCell<Vec<Waker>>,
}

#[derive(Clone, Default)]
pub struct Notify {
    inner: Rc<NotifyInner>,
}

impl Notify {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete every `Notified` created before this call.
    pub fn notify_all(&self) {
        self.inner.generation.set(self.inner.generation.get() + 1);
        let wakers = std::mem::take(&mut *self.inner.wakers.borrow_mut());
        for w in wakers {
            w.wake();
        }
    }

    pub fn notified(&self) -> Notified {
        Notified { notify: self.clone(), generation: self.inner.generation.get() }
    }
}

pub struct Notified {
    notify:     Notify,
    generation: u64,
}

impl Future for Notified {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let inner = &self.notify.inner;
        if inner.generation.get() != self.generation {
            return Poll::Ready(());
        }
        let mut wakers = inner.wakers.borrow_mut();
        if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
            wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}
