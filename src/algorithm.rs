//! Free functions driving an [`Enumerator`] to completion.
//!
//! These mirror the classic sequence algorithms, phrased against the erased
//! pull interface: each one consumes items from the front of the enumerator
//! and leaves it wherever it stopped. `find` and `find_if` stop at the first
//! match, so the remaining items stay available; the counting and comparison
//! helpers run the enumerator dry.
//!
//! `Enumerator` also implements [`Iterator`], so the full adapter vocabulary
//! (`map`, `filter`, `collect`, ...) applies as well. These helpers exist for
//! the cases where the erased handle is being passed around by mutable
//! reference and a whole-sequence answer is wanted in one call.

use crate::enumerator::Enumerator;
use crate::policy::LockPolicy;

/// Applies `func` to every remaining item, returning the closure so that
/// state folded into it can be recovered.
pub fn for_each<T, P, F>(enumerator: &mut Enumerator<'_, T, P>, mut func: F) -> F
where
    P: LockPolicy,
    F: FnMut(T),
{
    for item in enumerator {
        func(item);
    }
    func
}

/// Consumes items until one equals `target`, returning it. The enumerator is
/// left positioned just past the match; `None` means it was run dry.
pub fn find<T, P>(enumerator: &mut Enumerator<'_, T, P>, target: &T) -> Option<T>
where
    T: PartialEq,
    P: LockPolicy,
{
    enumerator.find(|item| item == target)
}

/// Consumes items until `pred` accepts one, returning it.
pub fn find_if<T, P, F>(enumerator: &mut Enumerator<'_, T, P>, pred: F) -> Option<T>
where
    P: LockPolicy,
    F: FnMut(&T) -> bool,
{
    enumerator.find(pred)
}

/// Runs the enumerator dry, returning how many items equalled `target`.
pub fn count<T, P>(enumerator: &mut Enumerator<'_, T, P>, target: &T) -> usize
where
    T: PartialEq,
    P: LockPolicy,
{
    count_if(enumerator, |item| item == target)
}

/// Runs the enumerator dry, returning how many items `pred` accepted.
pub fn count_if<T, P, F>(enumerator: &mut Enumerator<'_, T, P>, mut pred: F) -> usize
where
    P: LockPolicy,
    F: FnMut(&T) -> bool,
{
    let mut n = 0;
    for item in enumerator {
        if pred(&item) {
            n += 1;
        }
    }
    n
}

/// Whether two enumerators yield equal items until both are exhausted.
///
/// Sequences of different lengths compare unequal; the comparison stops at
/// the first difference, leaving both enumerators just past it.
pub fn equal<T, U, PA, PB>(a: &mut Enumerator<'_, T, PA>, b: &mut Enumerator<'_, U, PB>) -> bool
where
    T: PartialEq<U>,
    PA: LockPolicy,
    PB: LockPolicy,
{
    loop {
        match (a.next(), b.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x == y => continue,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_each_visits_in_order_and_returns_the_closure() {
        let v = vec![1, 2, 3];
        let mut e = Enumerator::new(&v);

        let mut seen = Vec::new();
        for_each(&mut e, |item| seen.push(*item));
        assert_eq!(seen, [1, 2, 3]);
        assert_eq!(e.next(), None);
    }

    #[test]
    fn test_for_each_hands_the_closure_back_for_reuse() {
        let a = vec![1, 2];
        let b = vec![3, 4];
        let mut seen = Vec::new();
        let sink = &mut seen;

        let func = for_each(&mut Enumerator::new(&a), move |item: &i32| {
            sink.push(*item)
        });
        for_each(&mut Enumerator::new(&b), func);

        assert_eq!(seen, [1, 2, 3, 4]);
    }

    #[test]
    fn test_find_stops_at_the_first_match() {
        let v = vec![1, 2, 3, 2];
        let mut e = Enumerator::new(&v);

        assert_eq!(find(&mut e, &&2), Some(&2));
        // Items past the match are still there.
        assert_eq!(e.next(), Some(&3));
    }

    #[test]
    fn test_find_misses_on_an_exhausted_sequence() {
        let v = vec![1, 2];
        let mut e = Enumerator::new(&v);
        assert_eq!(find(&mut e, &&9), None);
        assert_eq!(e.next(), None);
    }

    #[test]
    fn test_find_if_uses_the_predicate() {
        let v = vec![1, 3, 4, 5];
        let mut e = Enumerator::new(&v);
        assert_eq!(find_if(&mut e, |n| **n % 2 == 0), Some(&4));
    }

    #[test]
    fn test_count_and_count_if() {
        let v = vec![1, 2, 2, 3, 2];
        assert_eq!(count(&mut Enumerator::new(&v), &&2), 3);
        assert_eq!(count_if(&mut Enumerator::new(&v), |n| **n > 1), 4);
        assert_eq!(count(&mut Enumerator::new(&v), &&9), 0);
    }

    #[test]
    fn test_count_on_an_empty_enumerator() {
        let mut e: Enumerator<'_, i32> = Enumerator::empty();
        assert_eq!(count_if(&mut e, |_| true), 0);
    }

    #[test]
    fn test_equal_sequences_compare_equal() {
        let a = vec![1, 2, 3];
        let b = vec![1, 2, 3];
        assert!(equal(&mut Enumerator::new(&a), &mut Enumerator::new(&b)));
    }

    #[test]
    fn test_equal_rejects_differing_and_shorter_sequences() {
        let a = vec![1, 2, 3];
        let b = vec![1, 9, 3];
        assert!(!equal(&mut Enumerator::new(&a), &mut Enumerator::new(&b)));

        let c = vec![1, 2];
        assert!(!equal(&mut Enumerator::new(&a), &mut Enumerator::new(&c)));
        assert!(!equal(&mut Enumerator::new(&c), &mut Enumerator::new(&a)));
    }

    #[test]
    fn test_equal_across_source_shapes() {
        let v = vec![0, 2, 4];
        let mut from_vec = Enumerator::new(v.iter().copied());
        let mut from_iter = Enumerator::new((0..6).step_by(2));
        assert!(equal(&mut from_vec, &mut from_iter));
    }

    #[test]
    fn test_two_empty_enumerators_are_equal() {
        let mut a: Enumerator<'_, i32> = Enumerator::empty();
        let mut b: Enumerator<'_, i32> = Enumerator::empty();
        assert!(equal(&mut a, &mut b));
    }
}
