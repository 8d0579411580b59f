//! Capability traits: the structural probes the adapter selectors build on.
//!
//! Each trait captures one operation shape a source or sink can support —
//! fallible append, fallible key-value insert, borrowing key lookup. The
//! iteration capability needs no trait of its own; it is the standard
//! `IntoIterator`. Implementations cover the `std` collections plus the
//! embedded-friendly `heapless` types and `hashbrown` maps, so bounded and
//! growth-capable sinks sit behind the same probe.
//!
//! Registering a downstream collection type takes two steps: implement the
//! capability trait here, then add the matching selector impl
//! ([`IntoAccumulator`](crate::IntoAccumulator),
//! [`IntoAggregator`](crate::IntoAggregator) or
//! [`IntoAccessor`](crate::IntoAccessor)) returning the crate's generic
//! adapter for that capability, e.g.
//! [`GrowAccumulatorAdapter::new`](crate::accumulator::GrowAccumulatorAdapter::new).
//! The iteration role needs neither: any `IntoIterator` type is already
//! covered by the blanket enumerator impl.

use std::collections::{BTreeMap, BinaryHeap, HashMap, VecDeque};
use std::hash::{BuildHasher, Hash};

use heapless::index_map::FnvIndexMap;

use crate::error::Error;

/// Append-like growth: accept one more element, or report that the sink is
/// full. Unbounded sinks never fail.
pub trait Accumulate<T> {
    fn accumulate(&mut self, value: T) -> Result<(), Error>;
}

impl<T> Accumulate<T> for Vec<T> {
    fn accumulate(&mut self, value: T) -> Result<(), Error> {
        self.push(value);
        Ok(())
    }
}

impl<T> Accumulate<T> for VecDeque<T> {
    fn accumulate(&mut self, value: T) -> Result<(), Error> {
        self.push_back(value);
        Ok(())
    }
}

impl<T: Ord> Accumulate<T> for BinaryHeap<T> {
    fn accumulate(&mut self, value: T) -> Result<(), Error> {
        self.push(value);
        Ok(())
    }
}

impl Accumulate<char> for String {
    fn accumulate(&mut self, value: char) -> Result<(), Error> {
        self.push(value);
        Ok(())
    }
}

/// Bounded: fails once the fixed capacity `N` is reached.
impl<T, const N: usize> Accumulate<T> for heapless::Vec<T, N> {
    fn accumulate(&mut self, value: T) -> Result<(), Error> {
        self.push(value).map_err(|_| Error::CapacityExceeded)
    }
}

/// Key-value insertion with the sink's native overwrite semantics: inserting
/// an existing key replaces its value, exactly as the underlying map's
/// `insert` does. No additional policy is layered on top.
pub trait Aggregate<K, V> {
    fn aggregate(&mut self, key: K, value: V) -> Result<(), Error>;
}

impl<K: Eq + Hash, V, S: BuildHasher> Aggregate<K, V> for HashMap<K, V, S> {
    fn aggregate(&mut self, key: K, value: V) -> Result<(), Error> {
        self.insert(key, value);
        Ok(())
    }
}

impl<K: Ord, V> Aggregate<K, V> for BTreeMap<K, V> {
    fn aggregate(&mut self, key: K, value: V) -> Result<(), Error> {
        self.insert(key, value);
        Ok(())
    }
}

impl<K: Eq + Hash, V, S: BuildHasher> Aggregate<K, V> for hashbrown::HashMap<K, V, S> {
    fn aggregate(&mut self, key: K, value: V) -> Result<(), Error> {
        self.insert(key, value);
        Ok(())
    }
}

/// Bounded: overwriting an existing key always succeeds, but a new key on a
/// full map is rejected.
impl<K: Eq + Hash, V, const N: usize> Aggregate<K, V> for FnvIndexMap<K, V, N> {
    fn aggregate(&mut self, key: K, value: V) -> Result<(), Error> {
        self.insert(key, value)
            .map(|_| ())
            .map_err(|_| Error::CapacityExceeded)
    }
}

/// Borrowing key lookup. Never creates an entry; a miss is `None`.
pub trait Lookup<K> {
    type Value;

    fn lookup(&self, key: &K) -> Option<&Self::Value>;
}

impl<K: Eq + Hash, V, S: BuildHasher> Lookup<K> for HashMap<K, V, S> {
    type Value = V;

    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }
}

impl<K: Ord, V> Lookup<K> for BTreeMap<K, V> {
    type Value = V;

    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }
}

impl<K: Eq + Hash, V, S: BuildHasher> Lookup<K> for hashbrown::HashMap<K, V, S> {
    type Value = V;

    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }
}

impl<K: Eq + Hash, V, const N: usize> Lookup<K> for FnvIndexMap<K, V, N> {
    type Value = V;

    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_accumulates_without_bound() {
        let mut v = Vec::new();
        for i in 0..100 {
            assert_eq!(v.accumulate(i), Ok(()));
        }
        assert_eq!(v.len(), 100);
    }

    #[test]
    fn test_string_accumulates_chars() {
        let mut s = String::new();
        s.accumulate('h').unwrap();
        s.accumulate('i').unwrap();
        assert_eq!(s, "hi");
    }

    #[test]
    fn test_heapless_vec_reports_capacity() {
        let mut v: heapless::Vec<i32, 2> = heapless::Vec::new();
        assert_eq!(v.accumulate(0), Ok(()));
        assert_eq!(v.accumulate(1), Ok(()));
        assert_eq!(v.accumulate(2), Err(Error::CapacityExceeded));
        assert_eq!(v.as_slice(), [0, 1]);
    }

    #[test]
    fn test_map_aggregate_overwrites() {
        let mut m: HashMap<i32, &str> = HashMap::new();
        m.aggregate(1, "one").unwrap();
        m.aggregate(1, "uno").unwrap();
        assert_eq!(m.get(&1), Some(&"uno"));
    }

    #[test]
    fn test_index_map_aggregate_is_bounded() {
        let mut m: FnvIndexMap<i32, i32, 2> = FnvIndexMap::new();
        assert_eq!(m.aggregate(1, 10), Ok(()));
        assert_eq!(m.aggregate(2, 20), Ok(()));
        // Overwriting fits; a third distinct key does not.
        assert_eq!(m.aggregate(1, 11), Ok(()));
        assert_eq!(m.aggregate(3, 30), Err(Error::CapacityExceeded));
    }

    #[test]
    fn test_lookup_never_inserts() {
        let mut m: BTreeMap<&str, i32> = BTreeMap::new();
        m.insert("a", 1);
        assert_eq!(m.lookup(&"a"), Some(&1));
        assert_eq!(m.lookup(&"b"), None);
        assert_eq!(m.len(), 1);
    }
}
