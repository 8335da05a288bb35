//! Writer-preferring readers/writer lock
//!
//! A shared/exclusive lock built from one `Mutex` and two `Condvar`s,
//! usable by any container that needs the same discipline.
//!
//! # Fairness contract
//! Any number of readers may hold the lock together. A writer needs the
//! lock to itself. The lock prefers writers: as soon as a writer is
//! waiting, newly arriving readers block until every pending and active
//! writer has finished. Waiting writers are woken one at a time; once the
//! writer side drains to zero, all blocked readers are woken together.
//! Under a continuous stream of readers a writer therefore still gets
//! through, at the cost of possible reader starvation while writers queue.

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct LockState {
    /// Readers currently inside the lock
    active_readers: usize,
    /// Writers waiting for their turn
    pending_writers: usize,
    /// Whether a writer is currently inside the lock
    writer_active: bool,
}

/// A writer-preferring readers/writer lock protecting a value of type `T`.
#[derive(Debug)]
pub struct FairRwLock<T> {
    state: Mutex<LockState>,
    readers: Condvar,
    writers: Condvar,
    data: UnsafeCell<T>,
}

// Same bounds as std's RwLock: the lock hands out &T to several threads
// at once, so T must be Sync for the lock to be shareable.
unsafe impl<T: Send> Send for FairRwLock<T> {}
unsafe impl<T: Send + Sync> Sync for FairRwLock<T> {}

impl<T> FairRwLock<T> {
    /// Create a new lock wrapping `value`.
    pub fn new(value: T) -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            readers: Condvar::new(),
            writers: Condvar::new(),
            data: UnsafeCell::new(value),
        }
    }

    /// Acquire shared access, blocking while any writer is pending or active.
    pub fn read(&self) -> ReadGuard<'_, T> {
        let mut state = self.lock_state();
        while state.writer_active || state.pending_writers > 0 {
            state = self.wait_readers(state);
        }
        state.active_readers += 1;
        drop(state);

        ReadGuard { lock: self }
    }

    /// Acquire exclusive access, blocking while any reader or writer is active.
    ///
    /// Registers writer intent before waiting, which is what blocks newly
    /// arriving readers on the other side.
    pub fn write(&self) -> WriteGuard<'_, T> {
        let mut state = self.lock_state();
        state.pending_writers += 1;
        while state.writer_active || state.active_readers > 0 {
            state = self.wait_writers(state);
        }
        state.pending_writers -= 1;
        state.writer_active = true;
        drop(state);

        WriteGuard { lock: self }
    }

    /// Consume the lock and return the inner value.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    // A poisoned state mutex means a panic while only the counters were
    // held; the counters themselves are still consistent, so continue.
    fn lock_state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_readers<'a>(&self, guard: MutexGuard<'a, LockState>) -> MutexGuard<'a, LockState> {
        self.readers
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_writers<'a>(&self, guard: MutexGuard<'a, LockState>) -> MutexGuard<'a, LockState> {
        self.writers
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Wake the next waiter(s) after a holder releases: a single writer if
    /// any is pending, otherwise every blocked reader at once.
    fn release_to_next(&self, state: &LockState) {
        if state.pending_writers > 0 {
            self.writers.notify_one();
        } else {
            self.readers.notify_all();
        }
    }
}

/// Shared access to the locked value. Released on drop.
#[derive(Debug)]
pub struct ReadGuard<'a, T> {
    lock: &'a FairRwLock<T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safety: active_readers > 0 keeps every writer out until drop.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.lock.lock_state();
        state.active_readers -= 1;
        if state.active_readers == 0 {
            self.lock.release_to_next(&state);
        }
    }
}

/// Exclusive access to the locked value. Released on drop.
#[derive(Debug)]
pub struct WriteGuard<'a, T> {
    lock: &'a FairRwLock<T>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safety: writer_active excludes all readers and other writers.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // Safety: as above, and &mut self prevents aliased access
        // through this guard.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.lock.lock_state();
        state.writer_active = false;
        self.lock.release_to_next(&state);
    }
}
