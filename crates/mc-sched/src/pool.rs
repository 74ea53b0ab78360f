//! Resource pools: item stores and a counting permit.
//!
//! | Type     | Acquire                         | Release            |
//! |----------|---------------------------------|--------------------|
//! | `Store`  | `get()`, `get_where(pred)`      | `put(item)`        |
//! | `Permit` | `request()` → `Ticket`          | `release(ticket)`  |
//!
//! # Hand-over rule
//!
//! An item (or permit slot) changes hands only inside the acquiring future's
//! own `poll`.  Releases wake *every* waiter and each re-checks the pool, so
//! a waiter that was dropped or interrupted before being polled again can
//! never swallow an item or a wake-up.  Waiters registered earlier are
//! polled earlier, which keeps service roughly first-come first-served
//! without promising strict FIFO.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

fn wake_all(waiters: &RefCell<Vec<Waker>>) {
    let wakers = std::mem::take(&mut *waiters.borrow_mut());
    for w in wakers {
        w.wake();
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

struct StoreInner<T> {
    items:   RefCell<VecDeque<T>>,
    waiters: RefCell<Vec<Waker>>,
}

/// Unbounded item pool with blocking, optionally filtered, acquisition.
///
/// The pool is bounded in practice by the number of items ever put into it.
pub struct Store<T> {
    inner: Rc<StoreInner<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn accept_any<T>(_: &T) -> bool {
    true
}

/// Future returned by [`Store::get`].
pub type Get<T> = GetWhere<T, fn(&T) -> bool>;

impl<T> Store<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(StoreInner {
                items:   RefCell::new(VecDeque::new()),
                waiters: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let store = Self::new();
        store.inner.items.borrow_mut().extend(items);
        store
    }

    /// Return an item to the pool and wake every waiter.
    pub fn put(&self, item: T) {
        self.inner.items.borrow_mut().push_back(item);
        wake_all(&self.inner.waiters);
    }

    /// Take the oldest item, suspending while the pool is empty.
    pub fn get(&self) -> Get<T> {
        self.get_where(accept_any::<T> as fn(&T) -> bool)
    }

    /// Take the oldest item matching `pred`, suspending until one exists.
    /// `pred` must not touch this store.
    pub fn get_where<P: FnMut(&T) -> bool>(&self, pred: P) -> GetWhere<T, P> {
        GetWhere { store: self.clone(), pred }
    }

    pub fn try_get(&self) -> Option<T> {
        self.inner.items.borrow_mut().pop_front()
    }

    pub fn try_get_where(&self, mut pred: impl FnMut(&T) -> bool) -> Option<T> {
        let mut items = self.inner.items.borrow_mut();
        let pos = items.iter().position(|item| pred(item))?;
        items.remove(pos)
    }

    /// Read-only view of the idle items.
    pub fn inspect<R>(&self, f: impl FnOnce(&VecDeque<T>) -> R) -> R {
        f(&self.inner.items.borrow())
    }

    /// Number of idle items.
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }
}

pub struct GetWhere<T, P> {
    store: Store<T>,
    pred:  P,
}

impl<T, P: FnMut(&T) -> bool + Unpin> Future for GetWhere<T, P> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let this = self.get_mut();
        if let Some(item) = this.store.try_get_where(&mut this.pred) {
            return Poll::Ready(item);
        }
        this.store.inner.waiters.borrow_mut().push(cx.waker().clone());
        Poll::Pending
    }
}

// ── Permit ────────────────────────────────────────────────────────────────────

struct PermitInner {
    capacity: usize,
    in_use:   Cell<usize>,
    waiters:  RefCell<Vec<Waker>>,
}

/// Counting semaphore.
#[derive(Clone)]
pub struct Permit {
    inner: Rc<PermitInner>,
}

impl Permit {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Rc::new(PermitInner {
                capacity,
                in_use: Cell::new(0),
                waiters: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Acquire one unit, suspending while all units are taken.
    pub fn request(&self) -> Request {
        Request { permit: self.clone() }
    }

    pub fn try_request(&self) -> Option<Ticket> {
        let in_use = self.inner.in_use.get();
        if in_use >= self.inner.capacity {
            return None;
        }
        self.inner.in_use.set(in_use + 1);
        Some(Ticket { permit: self.inner.clone() })
    }

    /// Give a unit back.  Equivalent to dropping the ticket.
    pub fn release(&self, ticket: Ticket) {
        debug_assert!(
            Rc::ptr_eq(&self.inner, &ticket.permit),
            "ticket released to a different permit"
        );
        drop(ticket);
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn in_use(&self) -> usize {
        self.inner.in_use.get()
    }

    pub fn available(&self) -> usize {
        self.inner.capacity - self.inner.in_use.get()
    }
}

/// Future returned by [`Permit::request`].
pub struct Request {
    permit: Permit,
}

impl Future for Request {
    type Output = Ticket;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Ticket> {
        if let Some(ticket) = self.permit.try_request() {
            return Poll::Ready(ticket);
        }
        self.permit.inner.waiters.borrow_mut().push(cx.waker().clone());
        Poll::Pending
    }
}

/// One held unit of a [`Permit`].  Returned to the permit on drop.
pub struct Ticket {
    permit: Rc<PermitInner>,
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticket").field("capacity", &self.permit.capacity).finish()
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        self.permit.in_use.set(self.permit.in_use.get() - 1);
        wake_all(&self.permit.waiters);
    }
}
