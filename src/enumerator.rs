//! Lazy pull-based iteration over an erased source.
//!
//! An [`Enumerator`] wraps any iterable source — a borrowed collection, an
//! owned collection, a slice, an arbitrary iterator, or a closure — behind one
//! concrete handle. The item type `T` is whatever the source yields:
//! `&'a mut E` for mutably borrowed sources (so elements can be edited in
//! place), `&'a E` for shared ones, and `E` by value for owned or functional
//! sources.
//!
//! `Enumerator` implements [`Iterator`], and its `next` contract is the
//! optional-returning one: `Some(item)` while elements remain, then `None`
//! forever. There is no separate validity probe, and an exhausted enumerator
//! stays exhausted; re-enumeration means building a fresh one.
//!
//! ```rust
//! use polymorphic_collections::Enumerator;
//!
//! let mut v = vec![0, 0, 0];
//! let mut e = Enumerator::new(&mut v);
//! let mut n = 0;
//! while let Some(item) = e.next() {
//!     n += 1;
//!     *item = n;
//! }
//! drop(e);
//! assert_eq!(v, [1, 2, 3]);
//! ```
//!
//! Passing a source by value embeds it, so the enumerator stays valid after
//! the original binding would have gone away — the usual pattern for
//! returning an enumerator from a function:
//!
//! ```rust
//! use polymorphic_collections::Enumerator;
//!
//! fn digits() -> Enumerator<'static, u32> {
//!     Enumerator::new(vec![1, 2, 3])
//! }
//!
//! assert_eq!(digits().collect::<Vec<_>>(), [1, 2, 3]);
//! ```

use core::fmt;
use core::iter::Fuse;

use crate::policy::{LockPolicy, NoLock};
use crate::storage::AdapterSlot;

/// The erased operation an enumerator forwards to: produce the next item, or
/// `None` once the source is exhausted. Implementations must be fused.
pub trait EnumeratorAdapter<T> {
    fn next(&mut self) -> Option<T>;
}

/// Adapter over any iterator. Covers borrowed collections, owned collections
/// (the embedding case: the `IntoIter` owns the elements), slices, arrays and
/// plain iterators alike.
pub struct IterEnumeratorAdapter<I: Iterator> {
    iter: Fuse<I>,
}

impl<I: Iterator> EnumeratorAdapter<I::Item> for IterEnumeratorAdapter<I> {
    fn next(&mut self) -> Option<I::Item> {
        self.iter.next()
    }
}

/// Adapter over a closure producing items on demand. The sequence length is
/// whatever the closure decides; the first `None` it returns is remembered,
/// so the adapter stays exhausted even if the closure would produce again.
pub struct FnEnumeratorAdapter<F> {
    func: F,
    finished: bool,
}

impl<T, F: FnMut() -> Option<T>> EnumeratorAdapter<T> for FnEnumeratorAdapter<F> {
    fn next(&mut self) -> Option<T> {
        if self.finished {
            return None;
        }
        let item = (self.func)();
        if item.is_none() {
            self.finished = true;
        }
        item
    }
}

/// Selection rule for enumerator sources. The single blanket implementation
/// accepts anything iterable; closures enter through
/// [`Enumerator::from_fn`] instead, since a type cannot be probed for both
/// capabilities at once.
pub trait IntoEnumerator<'a, T> {
    type Adapter: EnumeratorAdapter<T> + 'a;

    fn into_enumerator_adapter(self) -> Self::Adapter;
}

impl<'a, I> IntoEnumerator<'a, I::Item> for I
where
    I: IntoIterator,
    I::IntoIter: 'a,
{
    type Adapter = IterEnumeratorAdapter<I::IntoIter>;

    fn into_enumerator_adapter(self) -> Self::Adapter {
        IterEnumeratorAdapter {
            iter: self.into_iter().fuse(),
        }
    }
}

/// Type-erased pull handle over some sequence of `T`s.
///
/// Small adapters (slice iterators, borrowed references) live in the handle's
/// inline buffer; larger ones are boxed. `is_inline` reports which happened.
/// The handle is move-only: a plain move transfers the binding, and
/// `std::mem::take` leaves an empty enumerator behind, which yields `None`.
pub struct Enumerator<'a, T, P = NoLock> {
    slot: AdapterSlot<dyn EnumeratorAdapter<T> + 'a>,
    policy: P,
}

impl<'a, T> Enumerator<'a, T> {
    /// Binds a source with the default (no-op) lock policy.
    pub fn new<S: IntoEnumerator<'a, T>>(source: S) -> Self {
        Self::with_policy(source, NoLock)
    }

    /// Binds a closure as the source. The enumeration ends the first time the
    /// closure returns `None`.
    pub fn from_fn<F>(func: F) -> Self
    where
        F: FnMut() -> Option<T> + 'a,
    {
        Self::from_fn_with_policy(func, NoLock)
    }
}

impl<'a, T, P: LockPolicy> Enumerator<'a, T, P> {
    /// An unbound enumerator; `next` yields `None`.
    pub fn empty() -> Self
    where
        P: Default,
    {
        Self {
            slot: AdapterSlot::empty(),
            policy: P::default(),
        }
    }

    /// Binds a source, wrapping every `next` call in `policy`.
    pub fn with_policy<S: IntoEnumerator<'a, T>>(source: S, policy: P) -> Self {
        let mut slot = AdapterSlot::empty();
        slot.bind(source.into_enumerator_adapter(), |p| {
            p as *mut (dyn EnumeratorAdapter<T> + 'a)
        });
        Self { slot, policy }
    }

    /// Binds a closure as the source, wrapping every `next` call in `policy`.
    pub fn from_fn_with_policy<F>(func: F, policy: P) -> Self
    where
        F: FnMut() -> Option<T> + 'a,
    {
        let mut slot = AdapterSlot::empty();
        slot.bind(
            FnEnumeratorAdapter {
                func,
                finished: false,
            },
            |p| p as *mut (dyn EnumeratorAdapter<T> + 'a),
        );
        Self { slot, policy }
    }

    /// Replaces the current binding with a new source, destroying the old
    /// adapter first. The lock policy is kept.
    pub fn rebind<S: IntoEnumerator<'a, T>>(&mut self, source: S) {
        self.slot.bind(source.into_enumerator_adapter(), |p| {
            p as *mut (dyn EnumeratorAdapter<T> + 'a)
        });
    }

    /// Whether the enumerator is bound to a source at all.
    pub fn is_bound(&self) -> bool {
        self.slot.is_bound()
    }

    /// Whether the adapter lives in the handle's inline buffer rather than on
    /// the heap.
    pub fn is_inline(&self) -> bool {
        self.slot.is_inline()
    }
}

impl<'a, T> Enumerator<'a, &'a mut T> {
    /// Binds a raw pointer plus element count as a mutable range.
    ///
    /// # Safety
    ///
    /// `ptr` must point at `len` initialized, properly aligned elements that
    /// stay valid and unaliased for `'a`; the same contract as
    /// [`core::slice::from_raw_parts_mut`].
    pub unsafe fn from_raw_parts(ptr: *mut T, len: usize) -> Self {
        let range = unsafe { core::slice::from_raw_parts_mut(ptr, len) };
        Self::new(range)
    }
}

impl<'a, T, P: LockPolicy> Iterator for Enumerator<'a, T, P> {
    type Item = T;

    /// The uniform operation. Yields `None` when the source is exhausted,
    /// when the enumerator is unbound, or when a non-blocking policy finds
    /// the handle contended.
    fn next(&mut self) -> Option<T> {
        let Self { slot, policy } = self;
        policy
            .with(move || slot.get_mut().and_then(|adapter| adapter.next()))
            .flatten()
    }
}

impl<'a, T, P: LockPolicy + Default> Default for Enumerator<'a, T, P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, T, P: LockPolicy> fmt::Debug for Enumerator<'a, T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enumerator")
            .field("bound", &self.is_bound())
            .field("inline", &self.is_inline())
            .finish()
    }
}
