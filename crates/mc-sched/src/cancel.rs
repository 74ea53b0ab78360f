//! Cooperative cancellation.
//!
//! A [`CancelToken`] is shared between the task that may be cancelled and
//! the task that cancels it.  The cancelled task wraps each suspension it is
//! willing to abandon in [`CancelToken::guard`]; the guard resolves to
//! `Err(SchedError::Interrupted)` at the next poll after `cancel()`.  Code
//! between two suspension points is never interrupted, and suspensions that
//! are not guarded (rollback work, for instance) run to completion.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use futures::FutureExt;

use crate::{SchedError, SchedResult};

#[derive(Default)]
struct CancelInner {
    cancelled: Cell<bool>,
    wakers:    RefCell<Vec<Waker>>,
}

#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Rc<CancelInner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation and wake every guarded suspension.  Idempotent.
    pub fn cancel(&self) {
        if self.inner.cancelled.replace(true) {
            return;
        }
        let wakers = std::mem::take(&mut *self.inner.wakers.borrow_mut());
        for w in wakers {
            w.wake();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.get()
    }

    /// Wrap `future` so it is abandoned once this token is cancelled.
    pub fn guard<F: Future + Unpin>(&self, future: F) -> Interruptible<F> {
        Interruptible { token: self.clone(), inner: future }
    }

    fn register(&self, waker: &Waker) {
        let mut wakers = self.inner.wakers.borrow_mut();
        if !wakers.iter().any(|w| w.will_wake(waker)) {
            wakers.push(waker.clone());
        }
    }
}

/// Future returned by [`CancelToken::guard`].
pub struct Interruptible<F> {
    token: CancelToken,
    inner: F,
}

impl<F: Future + Unpin> Future for Interruptible<F> {
    type Output = SchedResult<F::Output>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        // Checked before polling so an interrupted acquire never takes an item.
        if this.token.is_cancelled() {
            return Poll::Ready(Err(SchedError::Interrupted));
        }
        match this.inner.poll_unpin(cx) {
            Poll::Ready(v) => Poll::Ready(Ok(v)),
            Poll::Pending => {
                this.token.register(cx.waker());
                Poll::Pending
            }
        }
    }
}
