//! Timeout-bounded acquisition on top of [`async_lock::RwLock`].
//!
//! A bounded acquisition drives the lock's own acquisition future on the
//! calling thread and parks between polls until the deadline. Dropping the
//! future on timeout withdraws the pending request, so a timed-out caller
//! never ends up holding the lock.

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};
use std::thread::{self, Thread};
use std::time::Instant;

use async_lock::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use crossbeam_utils::Backoff;

struct Unparker(Thread);

impl Wake for Unparker {
    fn wake(self: Arc<Self>) {
        self.0.unpark();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.0.unpark();
    }
}

/// Poll `fut` on this thread until it completes or `deadline` passes.
fn block_on_until<F: Future>(fut: F, deadline: Instant) -> Option<F::Output> {
    let mut fut = pin!(fut);
    let waker = Waker::from(Arc::new(Unparker(thread::current())));
    let mut cx = Context::from_waker(&waker);

    loop {
        if let Poll::Ready(out) = fut.as_mut().poll(&mut cx) {
            return Some(out);
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        thread::park_timeout(deadline - now);
    }
}

/// One side of an acquisition: a lock plus the mode it is wanted in.
pub(crate) trait Request {
    type Guard;

    /// Block until granted, or until `deadline` when one is given.
    fn acquire(&self, deadline: Option<Instant>) -> Option<Self::Guard>;

    fn try_acquire(&self) -> Option<Self::Guard>;
}

pub(crate) struct Read<'a, T>(pub(crate) &'a RwLock<T>);

pub(crate) struct Write<'a, T>(pub(crate) &'a RwLock<T>);

impl<'a, T> Request for Read<'a, T> {
    type Guard = RwLockReadGuard<'a, T>;

    fn acquire(&self, deadline: Option<Instant>) -> Option<Self::Guard> {
        match deadline {
            None => Some(self.0.read_blocking()),
            Some(deadline) => block_on_until(self.0.read(), deadline),
        }
    }

    fn try_acquire(&self) -> Option<Self::Guard> {
        self.0.try_read()
    }
}

impl<'a, T> Request for Write<'a, T> {
    type Guard = RwLockWriteGuard<'a, T>;

    fn acquire(&self, deadline: Option<Instant>) -> Option<Self::Guard> {
        match deadline {
            None => Some(self.0.write_blocking()),
            Some(deadline) => block_on_until(self.0.write(), deadline),
        }
    }

    fn try_acquire(&self) -> Option<Self::Guard> {
        self.0.try_write()
    }
}

/// Acquire two locks as a set.
///
/// Blocks on one side and only tries the other; if the second is contended the
/// first is released and the next round blocks on the contended side instead.
/// No global order between the two locks is assumed, so two threads acquiring
/// the same pair in opposite roles cannot deadlock. `a` and `b` must not refer
/// to the same lock. `operation` names the caller in retreat events.
pub(crate) fn acquire_pair<A, B>(
    a: &A,
    b: &B,
    deadline: Option<Instant>,
    operation: &'static str,
) -> Option<(A::Guard, B::Guard)>
where
    A: Request,
    B: Request,
{
    let backoff = Backoff::new();
    let mut a_first = true;

    loop {
        if a_first {
            let ga = a.acquire(deadline)?;
            if let Some(gb) = b.try_acquire() {
                return Some((ga, gb));
            }
        } else {
            let gb = b.acquire(deadline)?;
            if let Some(ga) = a.try_acquire() {
                return Some((ga, gb));
            }
        }

        a_first = !a_first;
        tracing::trace!(operation, "joint acquisition contended, retreating");
        backoff.snooze();
    }
}
