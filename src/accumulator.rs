//! Push-based collection of values into an erased sink.
//!
//! An [`Accumulator`] wraps a mutably borrowed sink — a growable collection, a
//! fixed-capacity collection, a slice or array to fill in place, or a closure
//! — behind one `add` operation. Growth-capable sinks accept indefinitely;
//! bounded sinks report [`Error::CapacityExceeded`] once full, leaving their
//! existing contents untouched.
//!
//! ```rust
//! use polymorphic_collections::Accumulator;
//!
//! let mut v: Vec<i32> = Vec::new();
//! let mut acc = Accumulator::new(&mut v);
//! for n in 0..3 {
//!     acc.add(n).unwrap();
//! }
//! drop(acc);
//! assert_eq!(v, [0, 1, 2]);
//! ```

use core::fmt;

use crate::capability::Accumulate;
use crate::error::Error;
use crate::policy::{LockPolicy, NoLock};
use crate::storage::AdapterSlot;

/// The erased operation an accumulator forwards to: accept one value, or
/// report why it cannot.
pub trait AccumulatorAdapter<T> {
    fn add(&mut self, value: T) -> Result<(), Error>;
}

/// Adapter over any sink with an append capability; see [`Accumulate`].
pub struct GrowAccumulatorAdapter<'a, C: ?Sized> {
    sink: &'a mut C,
}

impl<'a, C: ?Sized> GrowAccumulatorAdapter<'a, C> {
    /// Wraps a borrowed sink. Pair this with an [`IntoAccumulator`] impl to
    /// register a downstream [`Accumulate`] type with the selector.
    pub fn new(sink: &'a mut C) -> Self {
        Self { sink }
    }
}

impl<'a, T, C: Accumulate<T> + ?Sized> AccumulatorAdapter<T> for GrowAccumulatorAdapter<'a, C> {
    fn add(&mut self, value: T) -> Result<(), Error> {
        self.sink.accumulate(value)
    }
}

/// Adapter that fills a borrowed slice from the front. The slice's length is
/// the capacity; elements past the fill point keep their prior values.
pub struct SliceAccumulatorAdapter<'a, T> {
    slice: &'a mut [T],
    filled: usize,
}

impl<'a, T> AccumulatorAdapter<T> for SliceAccumulatorAdapter<'a, T> {
    fn add(&mut self, value: T) -> Result<(), Error> {
        let dst = self
            .slice
            .get_mut(self.filled)
            .ok_or(Error::CapacityExceeded)?;
        *dst = value;
        self.filled += 1;
        Ok(())
    }
}

/// Adapter that hands each value to a closure. The closure is the sink; it
/// never reports fullness.
pub struct FnAccumulatorAdapter<F> {
    func: F,
}

impl<T, F: FnMut(T)> AccumulatorAdapter<T> for FnAccumulatorAdapter<F> {
    fn add(&mut self, value: T) -> Result<(), Error> {
        (self.func)(value);
        Ok(())
    }
}

/// Selection rule for accumulator sinks. Implemented for mutable borrows of
/// the supported sink types; closures enter through
/// [`Accumulator::from_fn`].
pub trait IntoAccumulator<'a, T> {
    type Adapter: AccumulatorAdapter<T> + 'a;

    fn into_accumulator_adapter(self) -> Self::Adapter;
}

impl<'a, T: 'a> IntoAccumulator<'a, T> for &'a mut Vec<T> {
    type Adapter = GrowAccumulatorAdapter<'a, Vec<T>>;

    fn into_accumulator_adapter(self) -> Self::Adapter {
        GrowAccumulatorAdapter { sink: self }
    }
}

impl<'a, T: 'a> IntoAccumulator<'a, T> for &'a mut std::collections::VecDeque<T> {
    type Adapter = GrowAccumulatorAdapter<'a, std::collections::VecDeque<T>>;

    fn into_accumulator_adapter(self) -> Self::Adapter {
        GrowAccumulatorAdapter { sink: self }
    }
}

impl<'a, T: Ord + 'a> IntoAccumulator<'a, T> for &'a mut std::collections::BinaryHeap<T> {
    type Adapter = GrowAccumulatorAdapter<'a, std::collections::BinaryHeap<T>>;

    fn into_accumulator_adapter(self) -> Self::Adapter {
        GrowAccumulatorAdapter { sink: self }
    }
}

impl<'a> IntoAccumulator<'a, char> for &'a mut String {
    type Adapter = GrowAccumulatorAdapter<'a, String>;

    fn into_accumulator_adapter(self) -> Self::Adapter {
        GrowAccumulatorAdapter { sink: self }
    }
}

impl<'a, T: 'a, const N: usize> IntoAccumulator<'a, T> for &'a mut heapless::Vec<T, N> {
    type Adapter = GrowAccumulatorAdapter<'a, heapless::Vec<T, N>>;

    fn into_accumulator_adapter(self) -> Self::Adapter {
        GrowAccumulatorAdapter { sink: self }
    }
}

impl<'a, T: 'a> IntoAccumulator<'a, T> for &'a mut [T] {
    type Adapter = SliceAccumulatorAdapter<'a, T>;

    fn into_accumulator_adapter(self) -> Self::Adapter {
        SliceAccumulatorAdapter {
            slice: self,
            filled: 0,
        }
    }
}

impl<'a, T: 'a, const N: usize> IntoAccumulator<'a, T> for &'a mut [T; N] {
    type Adapter = SliceAccumulatorAdapter<'a, T>;

    fn into_accumulator_adapter(self) -> Self::Adapter {
        SliceAccumulatorAdapter {
            slice: self,
            filled: 0,
        }
    }
}

/// Type-erased push handle over some sink of `T`s.
///
/// Unbound accumulators (default-constructed or taken from) report
/// [`Error::EmptyContainer`] on `add`; a non-blocking policy turns contended
/// calls into [`Error::Contended`] without touching the sink.
pub struct Accumulator<'a, T, P = NoLock> {
    slot: AdapterSlot<dyn AccumulatorAdapter<T> + 'a>,
    policy: P,
}

impl<'a, T> Accumulator<'a, T> {
    /// Binds a sink with the default (no-op) lock policy.
    pub fn new<S: IntoAccumulator<'a, T>>(sink: S) -> Self {
        Self::with_policy(sink, NoLock)
    }

    /// Binds a closure as the sink. Each accepted value is handed to the
    /// closure; the accumulator never reports fullness.
    pub fn from_fn<F>(func: F) -> Self
    where
        F: FnMut(T) + 'a,
    {
        Self::from_fn_with_policy(func, NoLock)
    }
}

impl<'a, T, P: LockPolicy> Accumulator<'a, T, P> {
    /// An unbound accumulator; `add` fails with [`Error::EmptyContainer`].
    pub fn empty() -> Self
    where
        P: Default,
    {
        Self {
            slot: AdapterSlot::empty(),
            policy: P::default(),
        }
    }

    /// Binds a sink, wrapping every `add` call in `policy`.
    pub fn with_policy<S: IntoAccumulator<'a, T>>(sink: S, policy: P) -> Self {
        let mut slot = AdapterSlot::empty();
        slot.bind(sink.into_accumulator_adapter(), |p| {
            p as *mut (dyn AccumulatorAdapter<T> + 'a)
        });
        Self { slot, policy }
    }

    /// Binds a closure as the sink, wrapping every `add` call in `policy`.
    pub fn from_fn_with_policy<F>(func: F, policy: P) -> Self
    where
        F: FnMut(T) + 'a,
    {
        let mut slot = AdapterSlot::empty();
        slot.bind(FnAccumulatorAdapter { func }, |p| {
            p as *mut (dyn AccumulatorAdapter<T> + 'a)
        });
        Self { slot, policy }
    }

    /// Replaces the current binding with a new sink, destroying the old
    /// adapter first. The lock policy is kept.
    pub fn rebind<S: IntoAccumulator<'a, T>>(&mut self, sink: S) {
        self.slot.bind(sink.into_accumulator_adapter(), |p| {
            p as *mut (dyn AccumulatorAdapter<T> + 'a)
        });
    }

    /// The uniform operation: forwards `value` to the bound sink.
    ///
    /// On failure the value is dropped; the sink keeps whatever it already
    /// holds.
    pub fn add(&mut self, value: T) -> Result<(), Error> {
        let Self { slot, policy } = self;
        policy
            .with(move || match slot.get_mut() {
                Some(adapter) => adapter.add(value),
                None => Err(Error::EmptyContainer),
            })
            .unwrap_or(Err(Error::Contended))
    }

    /// Whether the accumulator is bound to a sink at all.
    pub fn is_bound(&self) -> bool {
        self.slot.is_bound()
    }

    /// Whether the adapter lives in the handle's inline buffer rather than on
    /// the heap.
    pub fn is_inline(&self) -> bool {
        self.slot.is_inline()
    }
}

impl<'a, T, P: LockPolicy + Default> Default for Accumulator<'a, T, P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, T, P: LockPolicy> fmt::Debug for Accumulator<'a, T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accumulator")
            .field("bound", &self.is_bound())
            .field("inline", &self.is_inline())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BinaryHeap, VecDeque};
    use std::mem;

    use crate::enumerator::Enumerator;
    use crate::policy::AtomicNonblocking;

    use super::*;

    #[test]
    fn test_empty_accumulator_rejects_values() {
        let mut acc: Accumulator<'_, i32> = Accumulator::empty();
        assert!(!acc.is_bound());
        assert_eq!(acc.add(1), Err(Error::EmptyContainer));
    }

    #[test]
    fn test_accumulator_appends_to_a_vector() {
        let mut v: Vec<i32> = Vec::new();
        let mut acc = Accumulator::new(&mut v);
        for n in 0..3 {
            assert_eq!(acc.add(n), Ok(()));
        }
        drop(acc);
        assert_eq!(v, [0, 1, 2]);
    }

    #[test]
    fn test_accumulator_appends_to_a_deque_and_heap() {
        let mut dq: VecDeque<i32> = VecDeque::new();
        let mut acc = Accumulator::new(&mut dq);
        acc.add(1).unwrap();
        acc.add(2).unwrap();
        drop(acc);
        assert_eq!(dq, [1, 2]);

        let mut heap: BinaryHeap<i32> = BinaryHeap::new();
        let mut acc = Accumulator::new(&mut heap);
        acc.add(3).unwrap();
        acc.add(9).unwrap();
        acc.add(5).unwrap();
        drop(acc);
        assert_eq!(heap.pop(), Some(9));
    }

    #[test]
    fn test_accumulator_builds_a_string_from_chars() {
        let mut s = String::new();
        let mut acc = Accumulator::new(&mut s);
        for c in "hello".chars() {
            acc.add(c).unwrap();
        }
        drop(acc);
        assert_eq!(s, "hello");
    }

    #[test]
    fn test_array_sink_holds_exactly_its_length() {
        let mut buf = [0i32; 3];
        let mut acc = Accumulator::new(&mut buf);
        assert_eq!(acc.add(1), Ok(()));
        assert_eq!(acc.add(2), Ok(()));
        assert_eq!(acc.add(3), Ok(()));
        assert_eq!(acc.add(4), Err(Error::CapacityExceeded));
        drop(acc);
        // The overflow attempt changed nothing.
        assert_eq!(buf, [1, 2, 3]);
    }

    #[test]
    fn test_slice_sink_fills_from_the_front() {
        let mut buf = [9i32; 4];
        let mut acc = Accumulator::new(&mut buf[..2]);
        acc.add(1).unwrap();
        assert_eq!(acc.add(2), Ok(()));
        assert_eq!(acc.add(3), Err(Error::CapacityExceeded));
        drop(acc);
        assert_eq!(buf, [1, 2, 9, 9]);
    }

    #[test]
    fn test_heapless_sink_reports_capacity() {
        let mut v: heapless::Vec<i32, 2> = heapless::Vec::new();
        let mut acc = Accumulator::new(&mut v);
        assert_eq!(acc.add(1), Ok(()));
        assert_eq!(acc.add(2), Ok(()));
        assert_eq!(acc.add(3), Err(Error::CapacityExceeded));
        drop(acc);
        assert_eq!(v.as_slice(), [1, 2]);
    }

    #[test]
    fn test_functional_sink_receives_every_value() {
        let mut seen = Vec::new();
        {
            let mut acc = Accumulator::from_fn(|n: i32| seen.push(n * 10));
            acc.add(1).unwrap();
            acc.add(2).unwrap();
        }
        assert_eq!(seen, [10, 20]);
    }

    #[test]
    fn test_enumerator_drains_into_an_accumulator() {
        let src = vec![3, 1, 2];
        let mut dst: Vec<i32> = Vec::new();

        let e = Enumerator::new(&src);
        let mut acc = Accumulator::new(&mut dst);
        for item in e {
            acc.add(*item).unwrap();
        }
        drop(acc);
        assert_eq!(dst, src);
    }

    #[test]
    fn test_taking_an_accumulator_unbinds_the_source() {
        let mut v: Vec<i32> = Vec::new();
        let mut acc = Accumulator::new(&mut v);
        acc.add(1).unwrap();

        let mut taken = mem::take(&mut acc);
        assert_eq!(acc.add(2), Err(Error::EmptyContainer));
        assert_eq!(taken.add(3), Ok(()));

        drop(taken);
        drop(acc);
        assert_eq!(v, [1, 3]);
    }

    #[test]
    fn test_rebind_switches_sinks_and_keeps_the_policy() {
        let mut first: Vec<i32> = Vec::new();
        let mut second: Vec<i32> = Vec::new();

        let mut acc = Accumulator::new(&mut first);
        acc.add(1).unwrap();
        acc.rebind(&mut second);
        acc.add(2).unwrap();
        drop(acc);

        assert_eq!(first, [1]);
        assert_eq!(second, [2]);
    }

    #[test]
    fn test_sink_adapters_are_stored_inline() {
        let mut v: Vec<i32> = Vec::new();
        let acc = Accumulator::new(&mut v);
        assert!(acc.is_inline());
        drop(acc);

        let mut buf = [0i32; 2];
        let acc = Accumulator::new(&mut buf);
        assert!(acc.is_inline());
    }

    #[test]
    fn test_downstream_sink_registers_via_capability_and_selector() {
        // The two-step recipe from the module docs: a capability impl plus a
        // selector impl over the generic adapter.
        struct EvenSink {
            values: Vec<i32>,
        }

        impl Accumulate<i32> for EvenSink {
            fn accumulate(&mut self, value: i32) -> Result<(), Error> {
                if value % 2 == 0 {
                    self.values.push(value);
                }
                Ok(())
            }
        }

        impl<'a> IntoAccumulator<'a, i32> for &'a mut EvenSink {
            type Adapter = GrowAccumulatorAdapter<'a, EvenSink>;

            fn into_accumulator_adapter(self) -> Self::Adapter {
                GrowAccumulatorAdapter::new(self)
            }
        }

        let mut sink = EvenSink { values: Vec::new() };
        let mut acc = Accumulator::new(&mut sink);
        for n in 0..6 {
            acc.add(n).unwrap();
        }
        drop(acc);
        assert_eq!(sink.values, [0, 2, 4]);
    }

    #[test]
    fn test_contended_add_drops_the_value_and_reports() {
        let policy = AtomicNonblocking::new();
        let mut v: Vec<i32> = Vec::new();
        let mut acc = Accumulator::with_policy(&mut v, policy.clone());

        let held = policy.guard();
        assert_eq!(acc.add(1), Err(Error::Contended));
        drop(held);
        assert_eq!(acc.add(2), Ok(()));

        drop(acc);
        assert_eq!(v, [2]);
    }
}
