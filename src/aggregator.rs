//! Push-based collection of key-value pairs into an erased map.
//!
//! An [`Aggregator`] is the keyed counterpart of
//! [`Accumulator`](crate::Accumulator): its `add` takes a key and a value and
//! forwards them to the bound map's insert. Overwrite semantics are the
//! map's own — inserting an existing key replaces its value. Bounded maps
//! report [`Error::CapacityExceeded`] when a *new* key no longer fits.
//!
//! ```rust
//! use std::collections::HashMap;
//! use polymorphic_collections::Aggregator;
//!
//! let mut m: HashMap<&str, i32> = HashMap::new();
//! let mut agg = Aggregator::new(&mut m);
//! agg.add("one", 1).unwrap();
//! agg.add("two", 2).unwrap();
//! drop(agg);
//! assert_eq!(m["two"], 2);
//! ```

use core::fmt;

use crate::capability::Aggregate;
use crate::error::Error;
use crate::policy::{LockPolicy, NoLock};
use crate::storage::AdapterSlot;

/// The erased operation an aggregator forwards to: accept one pair, or report
/// why it cannot.
pub trait AggregatorAdapter<K, V> {
    fn add(&mut self, key: K, value: V) -> Result<(), Error>;
}

/// Adapter over any sink with an insert capability; see [`Aggregate`].
pub struct MapAggregatorAdapter<'a, C: ?Sized> {
    sink: &'a mut C,
}

impl<'a, C: ?Sized> MapAggregatorAdapter<'a, C> {
    /// Wraps a borrowed map sink. Pair this with an [`IntoAggregator`] impl
    /// to register a downstream [`Aggregate`] type with the selector.
    pub fn new(sink: &'a mut C) -> Self {
        Self { sink }
    }
}

impl<'a, K, V, C: Aggregate<K, V> + ?Sized> AggregatorAdapter<K, V> for MapAggregatorAdapter<'a, C> {
    fn add(&mut self, key: K, value: V) -> Result<(), Error> {
        self.sink.aggregate(key, value)
    }
}

/// Adapter that hands each pair to a closure.
pub struct FnAggregatorAdapter<F> {
    func: F,
}

impl<K, V, F: FnMut(K, V)> AggregatorAdapter<K, V> for FnAggregatorAdapter<F> {
    fn add(&mut self, key: K, value: V) -> Result<(), Error> {
        (self.func)(key, value);
        Ok(())
    }
}

/// Selection rule for aggregator sinks. Implemented for mutable borrows of
/// the supported map types; closures enter through [`Aggregator::from_fn`].
pub trait IntoAggregator<'a, K, V> {
    type Adapter: AggregatorAdapter<K, V> + 'a;

    fn into_aggregator_adapter(self) -> Self::Adapter;
}

impl<'a, K, V, S> IntoAggregator<'a, K, V> for &'a mut std::collections::HashMap<K, V, S>
where
    K: Eq + std::hash::Hash + 'a,
    V: 'a,
    S: std::hash::BuildHasher + 'a,
{
    type Adapter = MapAggregatorAdapter<'a, std::collections::HashMap<K, V, S>>;

    fn into_aggregator_adapter(self) -> Self::Adapter {
        MapAggregatorAdapter { sink: self }
    }
}

impl<'a, K: Ord + 'a, V: 'a> IntoAggregator<'a, K, V> for &'a mut std::collections::BTreeMap<K, V> {
    type Adapter = MapAggregatorAdapter<'a, std::collections::BTreeMap<K, V>>;

    fn into_aggregator_adapter(self) -> Self::Adapter {
        MapAggregatorAdapter { sink: self }
    }
}

impl<'a, K, V, S> IntoAggregator<'a, K, V> for &'a mut hashbrown::HashMap<K, V, S>
where
    K: Eq + std::hash::Hash + 'a,
    V: 'a,
    S: std::hash::BuildHasher + 'a,
{
    type Adapter = MapAggregatorAdapter<'a, hashbrown::HashMap<K, V, S>>;

    fn into_aggregator_adapter(self) -> Self::Adapter {
        MapAggregatorAdapter { sink: self }
    }
}

impl<'a, K, V, const N: usize> IntoAggregator<'a, K, V>
    for &'a mut heapless::index_map::FnvIndexMap<K, V, N>
where
    K: Eq + std::hash::Hash + 'a,
    V: 'a,
{
    type Adapter = MapAggregatorAdapter<'a, heapless::index_map::FnvIndexMap<K, V, N>>;

    fn into_aggregator_adapter(self) -> Self::Adapter {
        MapAggregatorAdapter { sink: self }
    }
}

/// Type-erased keyed push handle.
///
/// Unbound aggregators report [`Error::EmptyContainer`] on `add`; a
/// non-blocking policy turns contended calls into [`Error::Contended`]
/// without touching the sink.
pub struct Aggregator<'a, K, V, P = NoLock> {
    slot: AdapterSlot<dyn AggregatorAdapter<K, V> + 'a>,
    policy: P,
}

impl<'a, K, V> Aggregator<'a, K, V> {
    /// Binds a map sink with the default (no-op) lock policy.
    pub fn new<S: IntoAggregator<'a, K, V>>(sink: S) -> Self {
        Self::with_policy(sink, NoLock)
    }

    /// Binds a closure as the sink. Each accepted pair is handed to the
    /// closure; the aggregator never reports fullness.
    pub fn from_fn<F>(func: F) -> Self
    where
        F: FnMut(K, V) + 'a,
    {
        Self::from_fn_with_policy(func, NoLock)
    }
}

impl<'a, K, V, P: LockPolicy> Aggregator<'a, K, V, P> {
    /// An unbound aggregator; `add` fails with [`Error::EmptyContainer`].
    pub fn empty() -> Self
    where
        P: Default,
    {
        Self {
            slot: AdapterSlot::empty(),
            policy: P::default(),
        }
    }

    /// Binds a map sink, wrapping every `add` call in `policy`.
    pub fn with_policy<S: IntoAggregator<'a, K, V>>(sink: S, policy: P) -> Self {
        let mut slot = AdapterSlot::empty();
        slot.bind(sink.into_aggregator_adapter(), |p| {
            p as *mut (dyn AggregatorAdapter<K, V> + 'a)
        });
        Self { slot, policy }
    }

    /// Binds a closure as the sink, wrapping every `add` call in `policy`.
    pub fn from_fn_with_policy<F>(func: F, policy: P) -> Self
    where
        F: FnMut(K, V) + 'a,
    {
        let mut slot = AdapterSlot::empty();
        slot.bind(FnAggregatorAdapter { func }, |p| {
            p as *mut (dyn AggregatorAdapter<K, V> + 'a)
        });
        Self { slot, policy }
    }

    /// Replaces the current binding with a new sink, destroying the old
    /// adapter first. The lock policy is kept.
    pub fn rebind<S: IntoAggregator<'a, K, V>>(&mut self, sink: S) {
        self.slot.bind(sink.into_aggregator_adapter(), |p| {
            p as *mut (dyn AggregatorAdapter<K, V> + 'a)
        });
    }

    /// The uniform operation: forwards the pair to the bound map's insert.
    ///
    /// On failure both key and value are dropped; the map keeps whatever it
    /// already holds.
    pub fn add(&mut self, key: K, value: V) -> Result<(), Error> {
        let Self { slot, policy } = self;
        policy
            .with(move || match slot.get_mut() {
                Some(adapter) => adapter.add(key, value),
                None => Err(Error::EmptyContainer),
            })
            .unwrap_or(Err(Error::Contended))
    }

    /// Whether the aggregator is bound to a sink at all.
    pub fn is_bound(&self) -> bool {
        self.slot.is_bound()
    }

    /// Whether the adapter lives in the handle's inline buffer rather than on
    /// the heap.
    pub fn is_inline(&self) -> bool {
        self.slot.is_inline()
    }
}

impl<'a, K, V, P: LockPolicy + Default> Default for Aggregator<'a, K, V, P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, K, V, P: LockPolicy> fmt::Debug for Aggregator<'a, K, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator")
            .field("bound", &self.is_bound())
            .field("inline", &self.is_inline())
            .finish()
    }
}
