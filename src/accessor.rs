//! Keyed lookup through an erased map source.
//!
//! An [`Accessor`] wraps a borrowed map, an owned (embedded) map, or a
//! closure behind one `get` operation: present the key, receive `Some(&value)`
//! or `None`. Lookup never inserts; a miss on any source is simply `None`.
//!
//! ```rust
//! use std::collections::HashMap;
//! use polymorphic_collections::Accessor;
//!
//! let mut m = HashMap::new();
//! m.insert("one", 1);
//! let mut acc = Accessor::new(&m);
//! assert_eq!(acc.get(&"one"), Some(&1));
//! assert_eq!(acc.get(&"two"), None);
//! ```
//!
//! A closure source computes values on demand. The accessor buffers the most
//! recent result so it can hand out a reference with the same shape as the
//! map-backed case; each `get` overwrites the buffer.

use core::fmt;

use crate::capability::Lookup;
use crate::policy::{LockPolicy, NoLock};
use crate::storage::AdapterSlot;

/// The erased operation an accessor forwards to: borrow the value for a key,
/// if there is one. The receiver is `&mut self` so that functional sources
/// can maintain their result buffer.
pub trait AccessorAdapter<K, V> {
    fn get(&mut self, key: &K) -> Option<&V>;
}

/// Adapter over a borrowed source with a lookup capability; see [`Lookup`].
pub struct LookupAccessorAdapter<'a, C: ?Sized> {
    source: &'a C,
}

impl<'a, C: ?Sized> LookupAccessorAdapter<'a, C> {
    /// Wraps a borrowed source. Pair this with an [`IntoAccessor`] impl to
    /// register a downstream [`Lookup`] type with the selector.
    pub fn new(source: &'a C) -> Self {
        Self { source }
    }
}

impl<'a, K, C> AccessorAdapter<K, C::Value> for LookupAccessorAdapter<'a, C>
where
    C: Lookup<K> + ?Sized,
{
    fn get(&mut self, key: &K) -> Option<&C::Value> {
        self.source.lookup(key)
    }
}

/// Adapter that owns its source outright. Binding a map by value moves it
/// into the accessor, which then outlives the original binding.
pub struct EmbeddedAccessorAdapter<C> {
    source: C,
}

impl<C> EmbeddedAccessorAdapter<C> {
    /// Takes ownership of a source, for `IntoAccessor` impls on owned
    /// downstream types.
    pub fn new(source: C) -> Self {
        Self { source }
    }
}

impl<K, C: Lookup<K>> AccessorAdapter<K, C::Value> for EmbeddedAccessorAdapter<C> {
    fn get(&mut self, key: &K) -> Option<&C::Value> {
        self.source.lookup(key)
    }
}

/// Adapter over a closure. The closure produces values by key; the most
/// recent result is parked in `value` so a reference can be returned.
pub struct FnAccessorAdapter<F, V> {
    func: F,
    value: Option<V>,
}

impl<K, V, F: FnMut(&K) -> Option<V>> AccessorAdapter<K, V> for FnAccessorAdapter<F, V> {
    fn get(&mut self, key: &K) -> Option<&V> {
        self.value = (self.func)(key);
        self.value.as_ref()
    }
}

/// Selection rule for accessor sources: shared or mutable borrows of the
/// supported map types, or those maps by value for the embedded case.
/// Closures enter through [`Accessor::from_fn`]. Lookup through a mutable
/// borrow downgrades it; the accessor never mutates its source.
pub trait IntoAccessor<'a, K, V> {
    type Adapter: AccessorAdapter<K, V> + 'a;

    fn into_accessor_adapter(self) -> Self::Adapter;
}

impl<'a, K, V, S> IntoAccessor<'a, K, V> for &'a std::collections::HashMap<K, V, S>
where
    K: Eq + std::hash::Hash + 'a,
    V: 'a,
    S: std::hash::BuildHasher + 'a,
{
    type Adapter = LookupAccessorAdapter<'a, std::collections::HashMap<K, V, S>>;

    fn into_accessor_adapter(self) -> Self::Adapter {
        LookupAccessorAdapter { source: self }
    }
}

impl<'a, K: Ord + 'a, V: 'a> IntoAccessor<'a, K, V> for &'a std::collections::BTreeMap<K, V> {
    type Adapter = LookupAccessorAdapter<'a, std::collections::BTreeMap<K, V>>;

    fn into_accessor_adapter(self) -> Self::Adapter {
        LookupAccessorAdapter { source: self }
    }
}

impl<'a, K, V, S> IntoAccessor<'a, K, V> for &'a hashbrown::HashMap<K, V, S>
where
    K: Eq + std::hash::Hash + 'a,
    V: 'a,
    S: std::hash::BuildHasher + 'a,
{
    type Adapter = LookupAccessorAdapter<'a, hashbrown::HashMap<K, V, S>>;

    fn into_accessor_adapter(self) -> Self::Adapter {
        LookupAccessorAdapter { source: self }
    }
}

impl<'a, K, V, const N: usize> IntoAccessor<'a, K, V>
    for &'a heapless::index_map::FnvIndexMap<K, V, N>
where
    K: Eq + std::hash::Hash + 'a,
    V: 'a,
{
    type Adapter = LookupAccessorAdapter<'a, heapless::index_map::FnvIndexMap<K, V, N>>;

    fn into_accessor_adapter(self) -> Self::Adapter {
        LookupAccessorAdapter { source: self }
    }
}

impl<'a, K, V, S> IntoAccessor<'a, K, V> for &'a mut std::collections::HashMap<K, V, S>
where
    K: Eq + std::hash::Hash + 'a,
    V: 'a,
    S: std::hash::BuildHasher + 'a,
{
    type Adapter = LookupAccessorAdapter<'a, std::collections::HashMap<K, V, S>>;

    fn into_accessor_adapter(self) -> Self::Adapter {
        LookupAccessorAdapter { source: self }
    }
}

impl<'a, K: Ord + 'a, V: 'a> IntoAccessor<'a, K, V> for &'a mut std::collections::BTreeMap<K, V> {
    type Adapter = LookupAccessorAdapter<'a, std::collections::BTreeMap<K, V>>;

    fn into_accessor_adapter(self) -> Self::Adapter {
        LookupAccessorAdapter { source: self }
    }
}

impl<'a, K, V, S> IntoAccessor<'a, K, V> for &'a mut hashbrown::HashMap<K, V, S>
where
    K: Eq + std::hash::Hash + 'a,
    V: 'a,
    S: std::hash::BuildHasher + 'a,
{
    type Adapter = LookupAccessorAdapter<'a, hashbrown::HashMap<K, V, S>>;

    fn into_accessor_adapter(self) -> Self::Adapter {
        LookupAccessorAdapter { source: self }
    }
}

impl<'a, K, V, const N: usize> IntoAccessor<'a, K, V>
    for &'a mut heapless::index_map::FnvIndexMap<K, V, N>
where
    K: Eq + std::hash::Hash + 'a,
    V: 'a,
{
    type Adapter = LookupAccessorAdapter<'a, heapless::index_map::FnvIndexMap<K, V, N>>;

    fn into_accessor_adapter(self) -> Self::Adapter {
        LookupAccessorAdapter { source: self }
    }
}

impl<'a, K, V, S> IntoAccessor<'a, K, V> for std::collections::HashMap<K, V, S>
where
    K: Eq + std::hash::Hash + 'a,
    V: 'a,
    S: std::hash::BuildHasher + 'a,
{
    type Adapter = EmbeddedAccessorAdapter<std::collections::HashMap<K, V, S>>;

    fn into_accessor_adapter(self) -> Self::Adapter {
        EmbeddedAccessorAdapter { source: self }
    }
}

impl<'a, K: Ord + 'a, V: 'a> IntoAccessor<'a, K, V> for std::collections::BTreeMap<K, V> {
    type Adapter = EmbeddedAccessorAdapter<std::collections::BTreeMap<K, V>>;

    fn into_accessor_adapter(self) -> Self::Adapter {
        EmbeddedAccessorAdapter { source: self }
    }
}

impl<'a, K, V, S> IntoAccessor<'a, K, V> for hashbrown::HashMap<K, V, S>
where
    K: Eq + std::hash::Hash + 'a,
    V: 'a,
    S: std::hash::BuildHasher + 'a,
{
    type Adapter = EmbeddedAccessorAdapter<hashbrown::HashMap<K, V, S>>;

    fn into_accessor_adapter(self) -> Self::Adapter {
        EmbeddedAccessorAdapter { source: self }
    }
}

impl<'a, K, V, const N: usize> IntoAccessor<'a, K, V>
    for heapless::index_map::FnvIndexMap<K, V, N>
where
    K: Eq + std::hash::Hash + 'a,
    V: 'a,
{
    type Adapter = EmbeddedAccessorAdapter<heapless::index_map::FnvIndexMap<K, V, N>>;

    fn into_accessor_adapter(self) -> Self::Adapter {
        EmbeddedAccessorAdapter { source: self }
    }
}

/// Type-erased lookup handle over keys of type `K` and values of type `V`.
///
/// Unbound accessors answer `None` for every key, as does a contended lookup
/// under a non-blocking policy.
pub struct Accessor<'a, K, V, P = NoLock> {
    slot: AdapterSlot<dyn AccessorAdapter<K, V> + 'a>,
    policy: P,
}

impl<'a, K, V> Accessor<'a, K, V> {
    /// Binds a source with the default (no-op) lock policy.
    pub fn new<S: IntoAccessor<'a, K, V>>(source: S) -> Self {
        Self::with_policy(source, NoLock)
    }

    /// Binds a closure as the source. Each lookup invokes the closure and
    /// buffers its result.
    pub fn from_fn<F>(func: F) -> Self
    where
        F: FnMut(&K) -> Option<V> + 'a,
        V: 'a,
    {
        Self::from_fn_with_policy(func, NoLock)
    }
}

impl<'a, K, V, P: LockPolicy> Accessor<'a, K, V, P> {
    /// An unbound accessor; every lookup misses.
    pub fn empty() -> Self
    where
        P: Default,
    {
        Self {
            slot: AdapterSlot::empty(),
            policy: P::default(),
        }
    }

    /// Binds a source, wrapping every `get` call in `policy`.
    pub fn with_policy<S: IntoAccessor<'a, K, V>>(source: S, policy: P) -> Self {
        let mut slot = AdapterSlot::empty();
        slot.bind(source.into_accessor_adapter(), |p| {
            p as *mut (dyn AccessorAdapter<K, V> + 'a)
        });
        Self { slot, policy }
    }

    /// Binds a closure as the source, wrapping every `get` call in `policy`.
    pub fn from_fn_with_policy<F>(func: F, policy: P) -> Self
    where
        F: FnMut(&K) -> Option<V> + 'a,
        V: 'a,
    {
        let mut slot = AdapterSlot::empty();
        let adapter: FnAccessorAdapter<F, V> = FnAccessorAdapter { func, value: None };
        slot.bind(adapter, |p| p as *mut (dyn AccessorAdapter<K, V> + 'a));
        Self { slot, policy }
    }

    /// Replaces the current binding with a new source, destroying the old
    /// adapter first. The lock policy is kept.
    pub fn rebind<S: IntoAccessor<'a, K, V>>(&mut self, source: S) {
        self.slot.bind(source.into_accessor_adapter(), |p| {
            p as *mut (dyn AccessorAdapter<K, V> + 'a)
        });
    }

    /// The uniform operation: borrows the value for `key`, or `None` on a
    /// miss, on an unbound accessor, or when a non-blocking policy finds the
    /// handle contended.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let Self { slot, policy } = self;
        policy
            .with(move || slot.get_mut().and_then(|adapter| adapter.get(key)))
            .flatten()
    }

    /// Whether the accessor is bound to a source at all.
    pub fn is_bound(&self) -> bool {
        self.slot.is_bound()
    }

    /// Whether the adapter lives in the handle's inline buffer rather than on
    /// the heap.
    pub fn is_inline(&self) -> bool {
        self.slot.is_inline()
    }
}

impl<'a, K, V, P: LockPolicy + Default> Default for Accessor<'a, K, V, P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, K, V, P: LockPolicy> fmt::Debug for Accessor<'a, K, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("bound", &self.is_bound())
            .field("inline", &self.is_inline())
            .finish()
    }
}
