//! # Polymorphic Collections
//!
//! Type-erased container handles that present heterogeneous sources and sinks
//! behind small, uniform interfaces.
//!
//! This crate provides four containers. Each wraps "anything with the right
//! shape" — collections, slices, iterators, closures — behind one concrete
//! type per role, so the wrapped source can vary at run time without the
//! consuming code changing shape:
//!
//! * [`Enumerator`] — pull values one at a time from any iterable source.
//! * [`Accumulator`] — push values into any append-capable sink.
//! * [`Aggregator`] — push key-value pairs into any map-like sink.
//! * [`Accessor`] — look values up by key in any map-like source.
//!
//! ## Key Features
//!
//! * **Stack Optimization:** The erased adapter is stored inline inside the
//!   container (no heap allocation) whenever it fits three pointer-words;
//!   larger adapters are boxed automatically. `is_inline()` reports which
//!   happened.
//! * **Uniform Failure Handling:** Bounded sinks (slices, arrays, `heapless`
//!   collections) report [`Error::CapacityExceeded`] instead of panicking or
//!   reallocating; unbound containers report [`Error::EmptyContainer`].
//! * **Lock Policies:** Each container takes a policy parameter — [`NoLock`]
//!   (default, zero-cost), [`Atomic`] (serialize operations behind a mutex),
//!   or [`AtomicNonblocking`] (skip the operation when contended).
//! * **Move Semantics:** Containers are move-only handles. A plain move
//!   transfers the binding; `std::mem::take` leaves an empty container
//!   behind.
//! * **Extensibility:** Downstream collection types become bindable by
//!   implementing the capability trait ([`Accumulate`], [`Aggregate`] or
//!   [`Lookup`]) plus the matching selector trait ([`IntoAccumulator`],
//!   [`IntoAggregator`] or [`IntoAccessor`]) over the crate's generic
//!   adapters; anything `IntoIterator` is already an enumerator source.
//!
//! ## Examples
//!
//! ### Enumerator
//!
//! ```rust
//! use polymorphic_collections::Enumerator;
//!
//! let mut v = vec![1, 2, 3];
//!
//! // Pull from a mutably borrowed vector; items come out as `&mut i32`.
//! let mut e = Enumerator::new(&mut v);
//! while let Some(item) = e.next() {
//!     *item *= 2;
//! }
//! drop(e);
//! assert_eq!(v, [2, 4, 6]);
//!
//! // Or from a closure.
//! let mut n = 0;
//! let e = Enumerator::from_fn(move || {
//!     n += 1;
//!     (n <= 3).then_some(n)
//! });
//! assert_eq!(e.collect::<Vec<_>>(), [1, 2, 3]);
//! ```
//!
//! ### Accumulator
//!
//! ```rust
//! use polymorphic_collections::{Accumulator, Error};
//!
//! // A growable sink accepts indefinitely...
//! let mut v: Vec<i32> = Vec::new();
//! let mut acc = Accumulator::new(&mut v);
//! acc.add(1).unwrap();
//! acc.add(2).unwrap();
//! drop(acc);
//! assert_eq!(v, [1, 2]);
//!
//! // ...while a fixed-size sink reports when it is full.
//! let mut buf = [0i32; 2];
//! let mut acc = Accumulator::new(&mut buf);
//! acc.add(1).unwrap();
//! acc.add(2).unwrap();
//! assert_eq!(acc.add(3), Err(Error::CapacityExceeded));
//! ```
//!
//! ### Aggregator
//!
//! ```rust
//! use std::collections::HashMap;
//! use polymorphic_collections::Aggregator;
//!
//! let mut m: HashMap<&str, i32> = HashMap::new();
//! let mut agg = Aggregator::new(&mut m);
//! agg.add("one", 1).unwrap();
//! agg.add("one", 100).unwrap(); // map overwrite semantics
//! drop(agg);
//! assert_eq!(m["one"], 100);
//! ```
//!
//! ### Accessor
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use polymorphic_collections::Accessor;
//!
//! let mut m = BTreeMap::new();
//! m.insert(1, "one");
//!
//! let mut acc = Accessor::new(&m);
//! assert_eq!(acc.get(&1), Some(&"one"));
//! assert_eq!(acc.get(&2), None);
//!
//! // A closure works as a computed source.
//! let mut squares = Accessor::from_fn(|k: &i32| Some(k * k));
//! assert_eq!(squares.get(&7), Some(&49));
//! ```

// --- Module Declarations ---

pub mod accessor;
pub mod accumulator;
pub mod aggregator;
pub mod algorithm;
pub mod capability;
pub mod enumerator;
pub mod error;
pub mod policy;

mod storage;

// --- Re-exports ---

pub use accessor::{Accessor, AccessorAdapter, IntoAccessor};
pub use accumulator::{Accumulator, AccumulatorAdapter, IntoAccumulator};
pub use aggregator::{Aggregator, AggregatorAdapter, IntoAggregator};
pub use algorithm::{count, count_if, equal, find, find_if, for_each};
pub use capability::{Accumulate, Aggregate, Lookup};
pub use enumerator::{Enumerator, EnumeratorAdapter, IntoEnumerator};
pub use error::Error;
pub use policy::{Atomic, AtomicNonblocking, LockPolicy, NoLock, PolicyGuard};
