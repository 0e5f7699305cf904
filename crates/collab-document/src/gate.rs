//! Scoped mutual exclusion for one shared value
//!
//! [`Gate::enter`] queues callers in arrival order and hands out a
//! [`GateGuard`]. The gate opens again when the guard is dropped, which
//! covers normal return, early return on error, panics and a caller future
//! being dropped mid-wait or mid-hold. There is no manual release.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::{Mutex, MutexGuard};

/// FIFO gate around a value
#[derive(Debug)]
pub struct Gate<T> {
    inner: Mutex<T>,
    held: AtomicBool,
    waiting: AtomicUsize,
}

impl<T> Gate<T> {
    /// Wrap `value`
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
            held: AtomicBool::new(false),
            waiting: AtomicUsize::new(0),
        }
    }

    /// Wait for exclusive access
    ///
    /// Cancel safe: dropping the returned future before it completes leaves
    /// the queue as if the call never happened.
    pub async fn enter(&self) -> GateGuard<'_, T> {
        let ticket = WaitTicket::take(&self.waiting);
        let guard = self.inner.lock().await;
        drop(ticket);
        self.held.store(true, Ordering::Release);
        GateGuard {
            guard,
            held: &self.held,
        }
    }

    /// Whether a guard is currently out. Advisory only.
    pub fn is_locked(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    /// Callers currently queued in [`Gate::enter`]. Advisory only.
    pub fn waiters(&self) -> usize {
        self.waiting.load(Ordering::Acquire)
    }
}

/// Exclusive access to the gated value; releases on drop
#[derive(Debug)]
pub struct GateGuard<'a, T> {
    guard: MutexGuard<'a, T>,
    held: &'a AtomicBool,
}

impl<T> Deref for GateGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for GateGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for GateGuard<'_, T> {
    // runs before the mutex guard field is dropped
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}

struct WaitTicket<'a>(&'a AtomicUsize);

impl<'a> WaitTicket<'a> {
    fn take(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for WaitTicket<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
