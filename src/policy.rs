//! Lock policies composed into the containers.
//!
//! Every container takes a policy type parameter and runs each single
//! operation call (`next`, `add`, `get`) through [`LockPolicy::with`]. The
//! default, [`NoLock`], compiles down to a plain call. [`Atomic`] serializes
//! calls behind a mutex, and [`AtomicNonblocking`] skips the call entirely
//! when the mutex is contended.
//!
//! The mutex-holding policies share their mutex through an `Arc`, so cloning
//! a policy yields a handle to the *same* lock. That is how contention is
//! created deliberately:
//!
//! ```rust
//! use polymorphic_collections::{Accumulator, AtomicNonblocking, Error};
//!
//! let policy = AtomicNonblocking::new();
//! let mut sink: Vec<i32> = Vec::new();
//! let mut acc = Accumulator::with_policy(&mut sink, policy.clone());
//!
//! let held = policy.guard();
//! assert_eq!(acc.add(1), Err(Error::Contended));
//! drop(held);
//! assert_eq!(acc.add(1), Ok(()));
//! ```

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

/// Strategy for wrapping a single container operation in mutual exclusion.
///
/// `with` either runs `op` (under whatever exclusion the policy provides) and
/// returns its result in `Some`, or refuses to run it and returns `None`.
/// The closure shape replaces the classic `lock()`/`unlock()` pair: the guard
/// is released when the call returns, including on panic.
pub trait LockPolicy {
    fn with<R>(&self, op: impl FnOnce() -> R) -> Option<R>;
}

/// No exclusion at all; every operation proceeds. The default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLock;

impl LockPolicy for NoLock {
    #[inline]
    fn with<R>(&self, op: impl FnOnce() -> R) -> Option<R> {
        Some(op())
    }
}

/// Blocking mutual exclusion: each operation acquires a mutex, so exactly one
/// call at a time reaches the adapter. No fairness beyond what the underlying
/// mutex provides.
#[derive(Debug, Clone, Default)]
pub struct Atomic {
    mutex: Arc<Mutex<()>>,
}

impl Atomic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds the policy's mutex until the returned guard is dropped. Calls
    /// made through a clone of this policy will block for the duration.
    pub fn guard(&self) -> PolicyGuard<'_> {
        PolicyGuard {
            _held: self.mutex.lock(),
        }
    }
}

impl LockPolicy for Atomic {
    fn with<R>(&self, op: impl FnOnce() -> R) -> Option<R> {
        let _held = self.mutex.lock();
        Some(op())
    }
}

/// Non-blocking mutual exclusion: if the mutex is already held, the operation
/// is skipped and the container reports the no-op result instead of waiting.
#[derive(Debug, Clone, Default)]
pub struct AtomicNonblocking {
    mutex: Arc<Mutex<()>>,
}

impl AtomicNonblocking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds the policy's mutex until the returned guard is dropped, making
    /// every call through a clone of this policy fail with contention.
    pub fn guard(&self) -> PolicyGuard<'_> {
        PolicyGuard {
            _held: self.mutex.lock(),
        }
    }
}

impl LockPolicy for AtomicNonblocking {
    fn with<R>(&self, op: impl FnOnce() -> R) -> Option<R> {
        let _held = self.mutex.try_lock()?;
        Some(op())
    }
}

/// RAII hold on a policy's mutex, from [`Atomic::guard`] or
/// [`AtomicNonblocking::guard`].
pub struct PolicyGuard<'a> {
    _held: MutexGuard<'a, ()>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_lock_always_proceeds() {
        assert_eq!(NoLock.with(|| 7), Some(7));
    }

    #[test]
    fn test_atomic_proceeds_when_uncontended() {
        let policy = Atomic::new();
        assert_eq!(policy.with(|| 7), Some(7));
        // The guard is released between calls.
        assert_eq!(policy.with(|| 8), Some(8));
    }

    #[test]
    fn test_nonblocking_refuses_while_held() {
        let policy = AtomicNonblocking::new();
        let clone = policy.clone();

        let held = policy.guard();
        assert_eq!(clone.with(|| 7), None);
        drop(held);
        assert_eq!(clone.with(|| 7), Some(7));
    }

    #[test]
    fn test_clones_share_the_same_mutex() {
        let policy = AtomicNonblocking::new();
        let clone = policy.clone();

        let held = clone.guard();
        assert_eq!(policy.with(|| ()), None);
        drop(held);
        assert_eq!(policy.with(|| ()), Some(()));
    }

    #[test]
    fn test_atomic_serializes_across_threads() {
        let policy = Atomic::new();
        let counter = Arc::new(Mutex::new(0u32));

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let policy = policy.clone();
                let counter = Arc::clone(&counter);
                scope.spawn(move || {
                    for _ in 0..100 {
                        policy.with(|| *counter.lock() += 1);
                    }
                });
            }
        });

        assert_eq!(*counter.lock(), 400);
    }
}
