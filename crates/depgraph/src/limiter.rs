//! Concurrency limiters for the threaded walker
//!
//! A [`Limiter`] hands out permits; a node callback only runs while its
//! permit is held. [`Unbounded`] never blocks, [`Bounded`] is a counting
//! permit pool.

use std::sync::{Condvar, Mutex, PoisonError};

/// Source of permits bounding in-flight callbacks
pub trait Limiter: Send + Sync {
    /// Block until a permit is available and take it
    fn acquire(&self);

    /// Return a permit taken with [`Limiter::acquire`]
    fn release(&self);

    /// Take a permit that is returned when the guard drops
    fn permit(&self) -> Permit<'_, Self> {
        self.acquire();
        Permit { limiter: self }
    }
}

/// RAII guard returning its permit on drop, whatever the callback outcome
pub struct Permit<'a, L: Limiter + ?Sized> {
    limiter: &'a L,
}

impl<L: Limiter + ?Sized> Drop for Permit<'_, L> {
    fn drop(&mut self) {
        self.limiter.release();
    }
}

/// Limiter that never blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Limiter for Unbounded {
    fn acquire(&self) {}
    fn release(&self) {}
}

/// Counting permit pool of a fixed size
#[derive(Debug)]
pub struct Bounded {
    permits: usize,
    available: Mutex<usize>,
    freed: Condvar,
}

impl Bounded {
    /// Create a pool with `permits` permits (at least one)
    pub fn new(permits: usize) -> Self {
        if permits == 0 {
            log::warn!("Bounded limiter created with 0 permits, using 1");
        }
        let permits = permits.max(1);
        Self {
            permits,
            available: Mutex::new(permits),
            freed: Condvar::new(),
        }
    }

    /// Total number of permits
    pub fn permits(&self) -> usize {
        self.permits
    }

    /// Permits not currently held
    pub fn available(&self) -> usize {
        *self.available.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Limiter for Bounded {
    fn acquire(&self) {
        let mut available = self.available.lock().unwrap_or_else(PoisonError::into_inner);
        while *available == 0 {
            log::trace!("Waiting for a permit ({} in use)", self.permits);
            available = self
                .freed
                .wait(available)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *available -= 1;
    }

    fn release(&self) {
        let mut available = self.available.lock().unwrap_or_else(PoisonError::into_inner);
        debug_assert!(
            *available < self.permits,
            "released a permit that was never acquired"
        );
        *available += 1;
        drop(available);
        self.freed.notify_one();
    }
}
