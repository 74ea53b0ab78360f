//! Unit tests for mc-sched.

#[cfg(test)]
mod helpers {
    use std::cell::RefCell;
    use std::rc::Rc;

    use mc_core::SimTime;

    use crate::Scheduler;

    pub fn mins(m: f64) -> SimTime {
        SimTime::from_minutes(m)
    }

    /// Shared append-only log of `(label, time)` pairs.
    #[derive(Clone, Default)]
    pub struct Log(Rc<RefCell<Vec<(&'static str, SimTime)>>>);

    impl Log {
        pub fn record(&self, sched: &Scheduler, label: &'static str) {
            self.0.borrow_mut().push((label, sched.now()));
        }

        pub fn entries(&self) -> Vec<(&'static str, SimTime)> {
            self.0.borrow().clone()
        }

        pub fn labels(&self) -> Vec<&'static str> {
            self.0.borrow().iter().map(|(l, _)| *l).collect()
        }
    }
}

#[cfg(test)]
mod wake_queue {
    use mc_core::SimTime;

    use crate::WakeQueue;

    #[test]
    fn pop_returns_earliest_bucket_in_push_order() {
        let mut q = WakeQueue::new();
        q.push(SimTime(7), "c");
        q.push(SimTime(5), "a");
        q.push(SimTime(5), "b");

        assert_eq!(q.len(), 3);
        assert_eq!(q.time_count(), 2);
        assert_eq!(q.next_time(), Some(SimTime(5)));

        let (at, bucket) = q.pop_next().unwrap();
        assert_eq!(at, SimTime(5));
        assert_eq!(bucket, vec!["a", "b"]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.next_time(), Some(SimTime(7)));
    }

    #[test]
    fn empty_queue() {
        let mut q: WakeQueue<u8> = WakeQueue::new();
        assert!(q.is_empty());
        assert!(q.next_time().is_none());
        assert!(q.pop_next().is_none());
    }

    #[test]
    fn clear_resets_count() {
        let mut q = WakeQueue::new();
        q.push(SimTime(1), 0u8);
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.time_count(), 0);
    }
}

#[cfg(test)]
mod executor {
    use futures::FutureExt;
    use mc_core::{SimDuration, SimTime};

    use super::helpers::{Log, mins};
    use crate::{SchedError, Scheduler};

    #[test]
    fn sleep_advances_virtual_time() {
        let sched = Scheduler::new();
        let s = sched.clone();
        let h = sched.spawn(async move {
            s.sleep(SimDuration::from_minutes(5.0)).await;
            s.now()
        });
        sched.run();
        assert_eq!(h.now_or_never(), Some(Ok(mins(5.0))));
        assert_eq!(sched.now(), mins(5.0));
    }

    #[test]
    fn simultaneous_timeouts_resolve_in_submission_order() {
        let sched = Scheduler::new();
        let log = Log::default();
        for (label, delay) in [("a", 1.0), ("b", 1.0), ("early", 0.5), ("c", 1.0)] {
            let (s, log) = (sched.clone(), log.clone());
            sched.spawn(async move {
                s.sleep(SimDuration::from_minutes(delay)).await;
                log.record(&s, label);
            });
        }
        sched.run();
        assert_eq!(log.labels(), vec!["early", "a", "b", "c"]);
    }

    #[test]
    fn zero_sleep_does_not_yield_time() {
        let sched = Scheduler::new();
        let s = sched.clone();
        let h = sched.spawn(async move {
            s.sleep(SimDuration::ZERO).await;
            s.sleep_until(SimTime::ZERO).await;
            s.now()
        });
        sched.run();
        assert_eq!(h.now_or_never(), Some(Ok(SimTime::ZERO)));
    }

    #[test]
    fn run_until_stops_at_limit() {
        let sched = Scheduler::new();
        let s = sched.clone();
        sched.spawn(async move { s.sleep(SimDuration::from_minutes(10.0)).await });

        sched.run_until(mins(5.0));
        assert_eq!(sched.now(), mins(5.0));
        assert_eq!(sched.live_tasks(), 1);
        assert_eq!(sched.next_timer(), Some(mins(10.0)));

        sched.run();
        assert_eq!(sched.now(), mins(10.0));
        assert_eq!(sched.live_tasks(), 0);
    }

    #[test]
    fn spawned_task_can_await_another() {
        let sched = Scheduler::new();
        let s = sched.clone();
        let h = sched.spawn(async move {
            let s2 = s.clone();
            let inner = s.spawn(async move {
                s2.sleep(SimDuration::from_minutes(2.0)).await;
                21
            });
            inner.await.map(|v| v * 2)
        });
        sched.run();
        assert_eq!(h.now_or_never(), Some(Ok(Ok(42))));
    }

    #[test]
    fn abort_drops_task() {
        let sched = Scheduler::new();
        let s = sched.clone();
        let h = sched.spawn(async move {
            s.sleep(SimDuration::from_minutes(1.0)).await;
            1
        });
        sched.step();
        h.abort();
        sched.run();
        let id = h.id();
        assert_eq!(h.now_or_never(), Some(Err(SchedError::Aborted(id))));
        assert_eq!(sched.live_tasks(), 0);
    }

    #[test]
    fn clear_drops_blocked_tasks() {
        let sched = Scheduler::new();
        let store: crate::Store<u8> = crate::Store::new();
        let st = store.clone();
        sched.spawn(async move { st.get().await });
        sched.run();
        assert_eq!(sched.live_tasks(), 1);
        sched.clear();
        assert_eq!(sched.live_tasks(), 0);
    }
}

#[cfg(test)]
mod pools {
    use futures::FutureExt;
    use mc_core::SimDuration;

    use super::helpers::{Log, mins};
    use crate::{CancelToken, Permit, SchedError, Scheduler, Store};

    #[test]
    fn get_suspends_until_put() {
        let sched = Scheduler::new();
        let store: Store<&str> = Store::new();

        let (s, st) = (sched.clone(), store.clone());
        let h = sched.spawn(async move {
            let item = st.get().await;
            (item, s.now())
        });
        let (s, st) = (sched.clone(), store.clone());
        sched.spawn(async move {
            s.sleep(SimDuration::from_minutes(2.0)).await;
            st.put("lift");
        });

        sched.run();
        assert_eq!(h.now_or_never(), Some(Ok(("lift", mins(2.0)))));
        assert!(store.is_empty());
    }

    #[test]
    fn get_where_picks_first_match() {
        let sched = Scheduler::new();
        let store = Store::from_items([1u32, 2, 3, 4]);
        let st = store.clone();
        let h = sched.spawn(async move { st.get_where(|&x| x % 2 == 0).await });
        sched.run();
        assert_eq!(h.now_or_never(), Some(Ok(2)));
        assert_eq!(store.inspect(|items| items.iter().copied().collect::<Vec<_>>()), vec![1, 3, 4]);
    }

    #[test]
    fn try_variants_do_not_block() {
        let store = Store::from_items(["a", "b"]);
        assert_eq!(store.try_get_where(|s| *s == "b"), Some("b"));
        assert_eq!(store.try_get_where(|s| *s == "b"), None);
        assert_eq!(store.try_get(), Some("a"));
        assert_eq!(store.try_get(), None);
    }

    #[test]
    fn interrupted_get_loses_nothing() {
        let sched = Scheduler::new();
        let store: Store<u8> = Store::new();
        let token = CancelToken::new();

        let (st, tk) = (store.clone(), token.clone());
        let interrupted = sched.spawn(async move { tk.guard(st.get()).await });

        let (s, st) = (sched.clone(), store.clone());
        let patient = sched.spawn(async move {
            s.sleep(SimDuration::from_minutes(0.5)).await;
            st.get().await
        });

        let (s, st, tk) = (sched.clone(), store.clone(), token.clone());
        sched.spawn(async move {
            s.sleep(SimDuration::from_minutes(1.0)).await;
            tk.cancel();
            st.put(9);
        });

        sched.run();
        assert_eq!(interrupted.now_or_never(), Some(Ok(Err(SchedError::Interrupted))));
        assert_eq!(patient.now_or_never(), Some(Ok(9)));
        assert!(store.is_empty());
    }

    #[test]
    fn every_waiter_is_eventually_served() {
        let sched = Scheduler::new();
        let store = Store::from_items([0u8]);
        let log = Log::default();
        for label in ["w0", "w1", "w2"] {
            let (s, st, log) = (sched.clone(), store.clone(), log.clone());
            sched.spawn(async move {
                let unit = st.get().await;
                s.sleep(SimDuration::from_minutes(1.0)).await;
                log.record(&s, label);
                st.put(unit);
            });
        }
        sched.run();
        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries.last().map(|e| e.1), Some(mins(3.0)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn permit_blocks_at_capacity() {
        let sched = Scheduler::new();
        let permit = Permit::new(1);
        let log = Log::default();
        for label in ["first", "second"] {
            let (s, p, log) = (sched.clone(), permit.clone(), log.clone());
            sched.spawn(async move {
                let ticket = p.request().await;
                log.record(&s, label);
                s.sleep(SimDuration::from_minutes(3.0)).await;
                p.release(ticket);
            });
        }
        sched.run();
        assert_eq!(log.entries(), vec![("first", mins(0.0)), ("second", mins(3.0))]);
        assert_eq!(permit.in_use(), 0);
        assert_eq!(permit.available(), 1);
    }

    #[test]
    fn dropped_ticket_is_returned() {
        let permit = Permit::new(2);
        let a = permit.try_request().unwrap();
        let _b = permit.try_request().unwrap();
        assert!(permit.try_request().is_none());
        drop(a);
        assert_eq!(permit.in_use(), 1);
        assert_eq!(permit.capacity(), 2);
    }
}

#[cfg(test)]
mod signals {
    use futures::FutureExt;
    use mc_core::{SimDuration, SimTime};

    use super::helpers::mins;
    use crate::{CancelToken, Notify, SchedError, Scheduler};

    #[test]
    fn notified_completes_on_next_notify() {
        let sched = Scheduler::new();
        let notify = Notify::new();

        let (s, n) = (sched.clone(), notify.clone());
        let h = sched.spawn(async move {
            n.notified().await;
            s.now()
        });
        let (s, n) = (sched.clone(), notify.clone());
        sched.spawn(async move {
            s.sleep(SimDuration::from_minutes(4.0)).await;
            n.notify_all();
        });
        sched.run();
        assert_eq!(h.now_or_never(), Some(Ok(mins(4.0))));
    }

    #[test]
    fn notification_after_snapshot_is_not_lost() {
        let notify = Notify::new();
        let signal = notify.notified();
        notify.notify_all();
        assert_eq!(signal.now_or_never(), Some(()));
        // A fresh snapshot waits for the next one.
        assert_eq!(notify.notified().now_or_never(), None);
    }

    #[test]
    fn guarded_sleep_is_interrupted_at_cancel_time() {
        let sched = Scheduler::new();
        let token = CancelToken::new();

        let (s, tk) = (sched.clone(), token.clone());
        let h = sched.spawn(async move {
            let start = s.now();
            let res = tk.guard(s.sleep(SimDuration::from_minutes(10.0))).await;
            (res, s.now().since(start))
        });
        let (s, tk) = (sched.clone(), token.clone());
        sched.spawn(async move {
            s.sleep(SimDuration::from_minutes(3.0)).await;
            tk.cancel();
        });

        sched.run();
        assert_eq!(
            h.now_or_never(),
            Some(Ok((Err(SchedError::Interrupted), SimDuration::from_minutes(3.0))))
        );
    }

    #[test]
    fn guard_passes_through_when_not_cancelled() {
        let sched = Scheduler::new();
        let token = CancelToken::new();
        let (s, tk) = (sched.clone(), token.clone());
        let h = sched.spawn(async move { tk.guard(s.sleep(SimDuration::from_minutes(1.0))).await });
        sched.run();
        assert_eq!(h.now_or_never(), Some(Ok(Ok(()))));
        assert!(!token.is_cancelled());
        assert_eq!(sched.now(), SimTime::from_minutes(1.0));
    }

    #[test]
    fn cancel_is_idempotent() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }
}
