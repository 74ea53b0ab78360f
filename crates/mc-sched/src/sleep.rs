//! Timer future returned by [`Scheduler::sleep`](crate::Scheduler::sleep).

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use mc_core::SimTime;

use crate::executor::Shared;

/// Completes once virtual time reaches `deadline`.
pub struct Sleep {
    shared:   Rc<Shared>,
    deadline: SimTime,
    /// Waker registered in the timer queue, if any.
    waker:    Option<Waker>,
}

impl Sleep {
    pub(crate) fn new(shared: Rc<Shared>, deadline: SimTime) -> Self {
        Self { shared, deadline, waker: None }
    }

    pub fn deadline(&self) -> SimTime {
        self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.shared.now.get() >= self.deadline {
            return Poll::Ready(());
        }
        let stale = self.waker.as_ref().is_none_or(|w| !w.will_wake(cx.waker()));
        if stale {
            let w = cx.waker().clone();
            let deadline = self.deadline;
            self.shared.timers.borrow_mut().push(deadline, w.clone());
            self.waker = Some(w);
        }
        Poll::Pending
    }
}
